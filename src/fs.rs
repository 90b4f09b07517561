//! Virtual filesystem abstraction.
//!
//! Discovery reads the configuration repository through the [`Filesystem`]
//! trait using logical, `/`-separated paths relative to the repository root
//! (e.g. `installations/gauss/config.yaml.patch`). Whether the bytes come
//! from a local checkout or a remote snapshot is the implementor's concern.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigLintError, Result};

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name (last path segment).
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// Read-only access to a configuration repository.
pub trait Filesystem {
    /// Read the full contents of a file.
    ///
    /// Returns [`ConfigLintError::NotFound`] when the file does not exist.
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;

    /// List a directory, sorted by name.
    ///
    /// Returns [`ConfigLintError::NotFound`] when the directory does not exist.
    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>>;

    /// Check whether a file or directory exists.
    fn exists(&self, path: &str) -> bool;
}

/// Filesystem backed by a local checkout.
#[derive(Debug, Clone)]
pub struct DiskFilesystem {
    root: PathBuf,
}

impl DiskFilesystem {
    /// Create a filesystem rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the checkout.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }
}

fn io_error(path: &str, source: std::io::Error) -> ConfigLintError {
    if source.kind() == std::io::ErrorKind::NotFound {
        ConfigLintError::NotFound {
            path: path.to_string(),
        }
    } else {
        ConfigLintError::Io {
            path: path.to_string(),
            source,
        }
    }
}

impl Filesystem for DiskFilesystem {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        std::fs::read(self.resolve(path)).map_err(|e| io_error(path, e))
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let entries = std::fs::read_dir(self.resolve(path)).map_err(|e| io_error(path, e))?;

        let mut listing = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error(path, e))?;
            let file_type = entry.file_type().map_err(|e| io_error(path, e))?;
            listing.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: file_type.is_dir(),
            });
        }
        listing.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(listing)
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }
}

/// In-memory filesystem, mainly for tests and pre-fetched snapshots.
///
/// Directories are implied by the files stored under them.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryFilesystem {
    /// Create an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file.
    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        let path = path.into().trim_start_matches('/').to_string();
        self.files.insert(path, contents.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Remove a file, returning its previous contents.
    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(path.trim_start_matches('/'))
    }

    fn dir_prefix(path: &str) -> String {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}/", trimmed)
        }
    }
}

impl Filesystem for MemoryFilesystem {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(path.trim_start_matches('/'))
            .cloned()
            .ok_or_else(|| ConfigLintError::NotFound {
                path: path.to_string(),
            })
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let prefix = Self::dir_prefix(path);
        let mut listing: BTreeMap<String, bool> = BTreeMap::new();

        for key in self.files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    listing.insert(dir.to_string(), true);
                }
                None => {
                    listing.entry(rest.to_string()).or_insert(false);
                }
            }
        }

        if listing.is_empty() {
            return Err(ConfigLintError::NotFound {
                path: path.to_string(),
            });
        }

        Ok(listing
            .into_iter()
            .map(|(name, is_dir)| DirEntry { name, is_dir })
            .collect())
    }

    fn exists(&self, path: &str) -> bool {
        let trimmed = path.trim_matches('/');
        if self.files.contains_key(trimmed) {
            return true;
        }
        let prefix = Self::dir_prefix(path);
        self.files.keys().any(|key| key.starts_with(&prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn memory() -> MemoryFilesystem {
        MemoryFilesystem::new()
            .with_file("default/config.yaml", "a: 1\n")
            .with_file("default/apps/foo/configmap-values.yaml.template", "x: 1\n")
            .with_file("installations/gauss/config.yaml.patch", "a: 2\n")
    }

    #[test]
    fn memory_reads_files() {
        let fs = memory();
        assert_eq!(fs.read_file("default/config.yaml").unwrap(), b"a: 1\n");
    }

    #[test]
    fn memory_missing_file_is_not_found() {
        let fs = memory();
        let err = fs.read_file("default/missing.yaml").unwrap_err();
        assert!(matches!(err, ConfigLintError::NotFound { .. }));
    }

    #[test]
    fn memory_lists_directories_and_files() {
        let fs = memory();
        let listing = fs.read_dir("default/").unwrap();
        assert_eq!(
            listing,
            vec![
                DirEntry {
                    name: "apps".into(),
                    is_dir: true
                },
                DirEntry {
                    name: "config.yaml".into(),
                    is_dir: false
                },
            ]
        );
    }

    #[test]
    fn memory_missing_dir_is_not_found() {
        let fs = memory();
        assert!(matches!(
            fs.read_dir("include"),
            Err(ConfigLintError::NotFound { .. })
        ));
    }

    #[test]
    fn memory_exists_for_files_and_dirs() {
        let fs = memory();
        assert!(fs.exists("installations/gauss"));
        assert!(fs.exists("installations/gauss/config.yaml.patch"));
        assert!(!fs.exists("installations/kvm"));
    }

    #[test]
    fn memory_remove_drops_file() {
        let mut fs = memory();
        assert!(fs.remove("/installations/gauss/config.yaml.patch").is_some());
        assert!(!fs.exists("installations/gauss"));
    }

    #[test]
    fn disk_reads_and_lists() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("default/apps/foo")).unwrap();
        fs::write(temp.path().join("default/config.yaml"), "a: 1\n").unwrap();

        let disk = DiskFilesystem::new(temp.path());
        assert_eq!(disk.read_file("default/config.yaml").unwrap(), b"a: 1\n");

        let listing = disk.read_dir("default/").unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].name, "apps");
        assert!(listing[0].is_dir);
        assert!(!listing[1].is_dir);
    }

    #[test]
    fn disk_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let disk = DiskFilesystem::new(temp.path());
        assert!(matches!(
            disk.read_file("default/config.yaml"),
            Err(ConfigLintError::NotFound { .. })
        ));
        assert!(!disk.exists("default"));
    }
}
