//! Directory convention of a configuration repository.
//!
//! ```text
//! default/config.yaml
//! default/apps/<app>/configmap-values.yaml.template
//! default/apps/<app>/secret-values.yaml.template
//! installations/<installation>/config.yaml.patch
//! installations/<installation>/secret.yaml
//! installations/<installation>/apps/<app>/configmap-values.yaml.patch
//! installations/<installation>/apps/<app>/secret-values.yaml.patch
//! include/<name>.yaml.template
//! ```
//!
//! All paths are logical, `/`-separated and case-sensitive.

/// Base configuration applied to every installation.
pub const CONFIG: &str = "default/config.yaml";
/// Directory holding one subdirectory per app with its default templates.
pub const DEFAULT_APPS_DIR: &str = "default/apps";
/// Directory holding one subdirectory per installation.
pub const INSTALLATIONS_DIR: &str = "installations";
/// Directory holding shared template fragments.
pub const INCLUDE_DIR: &str = "include";

pub const CONFIG_PATCH_FILE: &str = "config.yaml.patch";
pub const SECRET_FILE: &str = "secret.yaml";
pub const CONFIGMAP_TEMPLATE_FILE: &str = "configmap-values.yaml.template";
pub const SECRET_TEMPLATE_FILE: &str = "secret-values.yaml.template";
pub const CONFIGMAP_PATCH_FILE: &str = "configmap-values.yaml.patch";
pub const SECRET_PATCH_FILE: &str = "secret-values.yaml.patch";
pub const INCLUDE_SUFFIX: &str = ".yaml.template";

pub fn config_patch_path(installation: &str) -> String {
    format!("{}/{}/{}", INSTALLATIONS_DIR, installation, CONFIG_PATCH_FILE)
}

pub fn secret_path(installation: &str) -> String {
    format!("{}/{}/{}", INSTALLATIONS_DIR, installation, SECRET_FILE)
}

pub fn app_dir(app: &str) -> String {
    format!("{}/{}", DEFAULT_APPS_DIR, app)
}

pub fn app_template_path(app: &str) -> String {
    format!("{}/{}", app_dir(app), CONFIGMAP_TEMPLATE_FILE)
}

pub fn app_secret_template_path(app: &str) -> String {
    format!("{}/{}", app_dir(app), SECRET_TEMPLATE_FILE)
}

pub fn installation_apps_dir(installation: &str) -> String {
    format!("{}/{}/apps", INSTALLATIONS_DIR, installation)
}

pub fn template_patch_path(installation: &str, app: &str) -> String {
    format!(
        "{}/{}/{}",
        installation_apps_dir(installation),
        app,
        CONFIGMAP_PATCH_FILE
    )
}

pub fn secret_template_patch_path(installation: &str, app: &str) -> String {
    format!(
        "{}/{}/{}",
        installation_apps_dir(installation),
        app,
        SECRET_PATCH_FILE
    )
}

/// Logical path of the include file pulled in by `include "<name>"`.
pub fn include_path(name: &str) -> String {
    format!("{}/{}{}", INCLUDE_DIR, name, INCLUDE_SUFFIX)
}

/// Value files end in `.yaml` or `.yaml.patch`.
pub fn is_value_file(path: &str) -> bool {
    path.ends_with(".yaml") || path.ends_with(".yaml.patch")
}

/// Template files end in `.template` or `values.yaml.patch`.
pub fn is_template_file(path: &str) -> bool {
    path.ends_with(".template") || path.ends_with("values.yaml.patch")
}

/// Installation and app a file belongs to, derived from its location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileIdentity {
    pub installation: Option<String>,
    pub app: Option<String>,
}

/// Derive a file's identity purely from its directory segments.
///
/// `installations/<i>/...` belongs to installation `<i>`, and to app `<a>`
/// when it lives under `installations/<i>/apps/<a>/`. `default/apps/<a>/...`
/// belongs to app `<a>`. Anything else (the base config, includes) has
/// neither.
pub fn identify(path: &str) -> FileIdentity {
    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        [INSTALLATIONS_DIR, installation, "apps", app, _, ..] => FileIdentity {
            installation: Some(installation.to_string()),
            app: Some(app.to_string()),
        },
        [INSTALLATIONS_DIR, installation, _, ..] => FileIdentity {
            installation: Some(installation.to_string()),
            app: None,
        },
        ["default", "apps", app, _, ..] => FileIdentity {
            installation: None,
            app: Some(app.to_string()),
        },
        _ => FileIdentity::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_conventional_paths() {
        assert_eq!(
            config_patch_path("gauss"),
            "installations/gauss/config.yaml.patch"
        );
        assert_eq!(secret_path("gauss"), "installations/gauss/secret.yaml");
        assert_eq!(
            app_template_path("foo"),
            "default/apps/foo/configmap-values.yaml.template"
        );
        assert_eq!(
            secret_template_patch_path("gauss", "foo"),
            "installations/gauss/apps/foo/secret-values.yaml.patch"
        );
        assert_eq!(include_path("registry"), "include/registry.yaml.template");
    }

    #[test]
    fn identifies_installation_app_files() {
        let id = identify("installations/gauss/apps/foo/configmap-values.yaml.patch");
        assert_eq!(id.installation.as_deref(), Some("gauss"));
        assert_eq!(id.app.as_deref(), Some("foo"));
    }

    #[test]
    fn identifies_installation_files() {
        let id = identify("installations/gauss/config.yaml.patch");
        assert_eq!(id.installation.as_deref(), Some("gauss"));
        assert!(id.app.is_none());
    }

    #[test]
    fn identifies_default_app_files() {
        let id = identify("default/apps/foo/secret-values.yaml.template");
        assert!(id.installation.is_none());
        assert_eq!(id.app.as_deref(), Some("foo"));
    }

    #[test]
    fn base_config_and_includes_have_no_identity() {
        assert_eq!(identify(CONFIG), FileIdentity::default());
        assert_eq!(identify("include/x.yaml.template"), FileIdentity::default());
    }

    #[test]
    fn suffix_contracts() {
        assert!(is_value_file("default/config.yaml"));
        assert!(is_value_file("installations/gauss/config.yaml.patch"));
        assert!(!is_value_file("default/config.json"));
        assert!(is_template_file("include/a.yaml.template"));
        assert!(is_template_file(
            "installations/gauss/apps/foo/secret-values.yaml.patch"
        ));
        assert!(!is_template_file("installations/gauss/config.yaml.patch"));
    }
}
