//! Discovery: the cross-reference model of a configuration repository.
//!
//! [`Discovery::new`] walks the fixed directory layout (see [`crate::layout`]),
//! parses every value file and template, and then resolves usage:
//! which override redefines which base path, and which template consumes
//! which value. The finished model is read-only; linters only inspect it.
//!
//! Files live in two arenas addressed by [`ValueFileId`] and [`TemplateId`],
//! so cross references are plain ids rather than shared pointers.

mod files;
mod resolve;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::error::{ConfigLintError, Result};
use crate::fs::Filesystem;
use crate::layout;
use crate::template::FunctionRegistry;

pub use files::{
    TemplateFile, TemplateId, TemplateKind, TemplateValue, ValueFile, ValueFileId, ValueFileKind,
    ValuePath,
};

/// The aggregate root of a discovery run.
#[derive(Debug, Clone)]
pub struct Discovery {
    value_files: Vec<ValueFile>,
    templates: Vec<TemplateFile>,

    config: ValueFileId,
    config_patches: BTreeMap<String, ValueFileId>,
    secrets: BTreeMap<String, ValueFileId>,

    app_templates: BTreeMap<String, TemplateId>,
    app_secret_templates: BTreeMap<String, TemplateId>,
    template_patches: BTreeMap<(String, String), TemplateId>,
    secret_template_patches: BTreeMap<(String, String), TemplateId>,
    includes: BTreeMap<String, TemplateId>,

    installations: Vec<String>,
    apps: Vec<String>,
    apps_per_installation: BTreeMap<String, Vec<String>>,
}

impl Discovery {
    /// Load and cross-reference the repository exposed by `fs`.
    ///
    /// Fails on the first missing required file, malformed YAML or
    /// malformed template. There is no partial discovery.
    pub fn new(fs: &dyn Filesystem, functions: &FunctionRegistry) -> Result<Self> {
        let mut discovery = Self {
            value_files: Vec::new(),
            templates: Vec::new(),
            config: ValueFileId(0),
            config_patches: BTreeMap::new(),
            secrets: BTreeMap::new(),
            app_templates: BTreeMap::new(),
            app_secret_templates: BTreeMap::new(),
            template_patches: BTreeMap::new(),
            secret_template_patches: BTreeMap::new(),
            includes: BTreeMap::new(),
            installations: Vec::new(),
            apps: Vec::new(),
            apps_per_installation: BTreeMap::new(),
        };

        discovery.config = discovery.load_value_file(fs, layout::CONFIG, ValueFileKind::Config)?;

        let installations = subdirectories(fs, layout::INSTALLATIONS_DIR)?;
        for installation in &installations {
            let patch = discovery.load_value_file(
                fs,
                &layout::config_patch_path(installation),
                ValueFileKind::ConfigPatch,
            )?;
            discovery
                .config_patches
                .insert(installation.clone(), patch);

            let secret = discovery.load_value_file(
                fs,
                &layout::secret_path(installation),
                ValueFileKind::Secret,
            )?;
            discovery.secrets.insert(installation.clone(), secret);
        }

        let default_apps = subdirectories(fs, layout::DEFAULT_APPS_DIR)?;
        for app in &default_apps {
            if let Some(id) = discovery.load_optional_template(
                fs,
                functions,
                &layout::app_template_path(app),
                TemplateKind::ConfigMap,
            )? {
                discovery.app_templates.insert(app.clone(), id);
            }
            if let Some(id) = discovery.load_optional_template(
                fs,
                functions,
                &layout::app_secret_template_path(app),
                TemplateKind::Secret,
            )? {
                discovery.app_secret_templates.insert(app.clone(), id);
            }
        }

        let mut apps: BTreeSet<String> = default_apps.iter().cloned().collect();
        for installation in &installations {
            let apps_dir = layout::installation_apps_dir(installation);
            let installation_apps = if fs.exists(&apps_dir) {
                subdirectories(fs, &apps_dir)?
            } else {
                Vec::new()
            };

            for app in &installation_apps {
                let key = (installation.clone(), app.clone());
                if let Some(id) = discovery.load_optional_template(
                    fs,
                    functions,
                    &layout::template_patch_path(installation, app),
                    TemplateKind::ConfigMapPatch,
                )? {
                    discovery.template_patches.insert(key.clone(), id);
                }
                if let Some(id) = discovery.load_optional_template(
                    fs,
                    functions,
                    &layout::secret_template_patch_path(installation, app),
                    TemplateKind::SecretPatch,
                )? {
                    discovery.secret_template_patches.insert(key, id);
                }
            }

            let active: BTreeSet<String> = default_apps
                .iter()
                .chain(installation_apps.iter())
                .cloned()
                .collect();
            apps.extend(active.iter().cloned());
            discovery
                .apps_per_installation
                .insert(installation.clone(), active.into_iter().collect());
        }

        if fs.exists(layout::INCLUDE_DIR) {
            for entry in fs.read_dir(layout::INCLUDE_DIR)? {
                let filepath = format!("{}/{}", layout::INCLUDE_DIR, entry.name);
                if entry.is_dir {
                    warn!("Skipping directory {} in {}", entry.name, layout::INCLUDE_DIR);
                    continue;
                }
                let id = discovery.load_template(fs, functions, &filepath, TemplateKind::Include)?;
                discovery.includes.insert(filepath, id);
            }
        }

        discovery.installations = installations;
        discovery.apps = apps.into_iter().collect();

        debug!(
            "Discovered {} installation(s), {} app(s), {} value file(s), {} template(s)",
            discovery.installations.len(),
            discovery.apps.len(),
            discovery.value_files.len(),
            discovery.templates.len()
        );

        discovery.populate_value_paths();

        Ok(discovery)
    }

    fn load_value_file(
        &mut self,
        fs: &dyn Filesystem,
        filepath: &str,
        kind: ValueFileKind,
    ) -> Result<ValueFileId> {
        let body = fs.read_file(filepath)?;
        let file = ValueFile::new(filepath, kind, &body)?;
        self.value_files.push(file);
        Ok(ValueFileId(self.value_files.len() - 1))
    }

    fn load_template(
        &mut self,
        fs: &dyn Filesystem,
        functions: &FunctionRegistry,
        filepath: &str,
        kind: TemplateKind,
    ) -> Result<TemplateId> {
        let body = fs.read_file(filepath)?;
        let file = TemplateFile::new(filepath, kind, &body, functions)?;
        self.templates.push(file);
        Ok(TemplateId(self.templates.len() - 1))
    }

    fn load_optional_template(
        &mut self,
        fs: &dyn Filesystem,
        functions: &FunctionRegistry,
        filepath: &str,
        kind: TemplateKind,
    ) -> Result<Option<TemplateId>> {
        match self.load_template(fs, functions, filepath, kind) {
            Ok(id) => Ok(Some(id)),
            Err(ConfigLintError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The base configuration.
    pub fn config(&self) -> &ValueFile {
        self.value_file(self.config)
    }

    pub fn config_id(&self) -> ValueFileId {
        self.config
    }

    pub fn value_file(&self, id: ValueFileId) -> &ValueFile {
        &self.value_files[id.0]
    }

    pub fn template(&self, id: TemplateId) -> &TemplateFile {
        &self.templates[id.0]
    }

    /// Every value file, base config first.
    pub fn value_files(&self) -> impl Iterator<Item = (ValueFileId, &ValueFile)> {
        self.value_files
            .iter()
            .enumerate()
            .map(|(i, file)| (ValueFileId(i), file))
    }

    /// Every template, in load order.
    pub fn templates(&self) -> impl Iterator<Item = (TemplateId, &TemplateFile)> {
        self.templates
            .iter()
            .enumerate()
            .map(|(i, file)| (TemplateId(i), file))
    }

    /// Config overrides in installation order.
    pub fn config_patches(&self) -> impl Iterator<Item = &ValueFile> {
        self.config_patches.values().map(|id| self.value_file(*id))
    }

    /// Secret files in installation order.
    pub fn secrets(&self) -> impl Iterator<Item = &ValueFile> {
        self.secrets.values().map(|id| self.value_file(*id))
    }

    /// Include fragments keyed by file path.
    pub fn includes(&self) -> impl Iterator<Item = (&str, &TemplateFile)> {
        self.includes
            .iter()
            .map(|(path, id)| (path.as_str(), self.template(*id)))
    }

    pub fn config_patch(&self, installation: &str) -> Option<&ValueFile> {
        self.config_patches
            .get(installation)
            .map(|id| self.value_file(*id))
    }

    pub fn secret(&self, installation: &str) -> Option<&ValueFile> {
        self.secrets.get(installation).map(|id| self.value_file(*id))
    }

    pub fn app_template(&self, app: &str) -> Option<&TemplateFile> {
        self.app_templates.get(app).map(|id| self.template(*id))
    }

    pub fn app_secret_template(&self, app: &str) -> Option<&TemplateFile> {
        self.app_secret_templates
            .get(app)
            .map(|id| self.template(*id))
    }

    pub fn template_patch(&self, installation: &str, app: &str) -> Option<&TemplateFile> {
        self.template_patches
            .get(&(installation.to_string(), app.to_string()))
            .map(|id| self.template(*id))
    }

    pub fn secret_template_patch(&self, installation: &str, app: &str) -> Option<&TemplateFile> {
        self.secret_template_patches
            .get(&(installation.to_string(), app.to_string()))
            .map(|id| self.template(*id))
    }

    pub fn include(&self, filepath: &str) -> Option<&TemplateFile> {
        self.includes.get(filepath).map(|id| self.template(*id))
    }

    /// Installation names, sorted.
    pub fn installations(&self) -> &[String] {
        &self.installations
    }

    /// App names across defaults and installations, sorted.
    pub fn apps(&self) -> &[String] {
        &self.apps
    }

    /// Apps deployed to an installation: every default app plus the apps
    /// the installation overrides.
    pub fn apps_for(&self, installation: &str) -> &[String] {
        self.apps_per_installation
            .get(installation)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Distinct apps behind a set of consuming templates.
    pub fn consumer_apps<'a>(
        &'a self,
        consumers: impl IntoIterator<Item = &'a TemplateId>,
    ) -> BTreeSet<&'a str> {
        consumers
            .into_iter()
            .filter_map(|id| self.template(*id).app.as_deref())
            .collect()
    }
}

/// Names of the subdirectories of a required directory.
fn subdirectories(fs: &dyn Filesystem, dir: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs.read_dir(dir)? {
        if entry.is_dir {
            names.push(entry.name);
        } else {
            warn!("Skipping file {} in {}", entry.name, dir);
        }
    }
    names.sort();
    names.dedup();
    Ok(names)
}
