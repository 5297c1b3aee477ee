//! cloudtm settings
//!
//! Settings are optional. When no file is found the built-in defaults apply.

pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a config file directly.
pub const CONFIG_PATH_ENV: &str = "CLOUDTM_CONFIG_PATH";
/// Environment variable overriding the terraform program.
pub const TERRAFORM_ENV: &str = "CLOUDTM_TERRAFORM";

const CONFIG_FILE: &str = "config.json";
const APP_DIR: &str = "cloudtm";
const STORE_DIR: &str = ".cloudtm";

/// Contents of `config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Program invoked as terraform. A bare name is looked up on `PATH`.
    pub terraform_bin: String,
    /// Extra exclusions applied on top of the built-in snapshot rules.
    pub exclude: ExcludeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            terraform_bin: "terraform".to_string(),
            exclude: ExcludeSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExcludeSettings {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
    pub patterns: Vec<String>,
}

/// Global config file location (`~/.config/cloudtm/config.json`).
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Find the config file that applies to `project_root`.
///
/// Searched in this order:
/// 1. `CLOUDTM_CONFIG_PATH` (must exist when set)
/// 2. `<project_root>/.cloudtm/config.json`
/// 3. `~/.config/cloudtm/config.json`
pub fn find_config_file(project_root: &Path) -> Result<Option<PathBuf>> {
    if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV)
        && !explicit.is_empty()
    {
        let path = PathBuf::from(explicit);
        if path.is_file() {
            return Ok(Some(path));
        }
        return Err(ConfigError::ExplicitPathNotFound(path));
    }

    let project_config = project_root.join(STORE_DIR).join(CONFIG_FILE);
    if project_config.is_file() {
        return Ok(Some(project_config));
    }

    Ok(global_config_path().filter(|p| p.is_file()))
}

/// Read settings from `path`.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve settings for `project_root`, falling back to defaults.
pub fn load_settings(project_root: &Path) -> Result<Settings> {
    match find_config_file(project_root)? {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading settings");
            load_settings_from(&path)
        }
        None => {
            tracing::debug!("No config file found, using defaults");
            Ok(Settings::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    fn write_project_config(root: &Path, content: &str) -> PathBuf {
        let dir = root.join(STORE_DIR);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.terraform_bin, "terraform");
        assert!(settings.exclude.dirs.is_empty());
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write_project_config(
            temp_dir.path(),
            r#"{"exclude": {"patterns": ["*.zip"]}}"#,
        );

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.terraform_bin, "terraform");
        assert_eq!(settings.exclude.patterns, vec!["*.zip"]);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write_project_config(temp_dir.path(), r#"{"terraform": "tofu"}"#);

        let result = load_settings_from(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    #[serial]
    fn test_project_config_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write_project_config(temp_dir.path(), r#"{"terraform_bin": "tofu"}"#);

        temp_env::with_var_unset(CONFIG_PATH_ENV, || {
            assert_eq!(find_config_file(temp_dir.path()).unwrap(), Some(path.clone()));
            let settings = load_settings(temp_dir.path()).unwrap();
            assert_eq!(settings.terraform_bin, "tofu");
        });
    }

    #[test]
    #[serial]
    fn test_env_path_takes_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_project_config(temp_dir.path(), r#"{"terraform_bin": "tofu"}"#);
        let custom = temp_dir.path().join("custom.json");
        fs::write(&custom, r#"{"terraform_bin": "/opt/terraform"}"#).unwrap();

        temp_env::with_var(CONFIG_PATH_ENV, Some(custom.as_os_str()), || {
            let settings = load_settings(temp_dir.path()).unwrap();
            assert_eq!(settings.terraform_bin, "/opt/terraform");
        });
    }

    #[test]
    #[serial]
    fn test_env_path_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing.json");

        temp_env::with_var(CONFIG_PATH_ENV, Some(missing.as_os_str()), || {
            let result = find_config_file(temp_dir.path());
            assert!(matches!(result, Err(ConfigError::ExplicitPathNotFound(_))));
        });
    }

    #[test]
    #[serial]
    fn test_global_config_fallback() {
        let project = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();

        // dirs::config_dir() follows XDG_CONFIG_HOME on Linux
        let global_dir = home.path().join(APP_DIR);
        fs::create_dir_all(&global_dir).unwrap();
        fs::write(global_dir.join(CONFIG_FILE), r#"{"terraform_bin": "tf-global"}"#).unwrap();

        temp_env::with_vars(
            [
                (CONFIG_PATH_ENV, None),
                ("XDG_CONFIG_HOME", Some(home.path().as_os_str())),
            ],
            || {
                if cfg!(target_os = "linux") {
                    let settings = load_settings(project.path()).unwrap();
                    assert_eq!(settings.terraform_bin, "tf-global");
                }
            },
        );
    }
}
