//! Launcher settings and layered YAML loading
//!
//! Settings merge in order: built-in defaults, then the user config file,
//! then the project-root file, then runtime overrides. Later layers win
//! field by field.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::eligibility::{DEFAULT_EXTENSIONS, DEFAULT_MARKER_FILES};
use crate::error::{LauncherError, Result};

/// Filename looked up in the user config dir and the project root
pub const SETTINGS_FILE_NAME: &str = "aegis.yaml";

/// Effective launcher settings after layering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LauncherSettings {
    /// Explicit interpreter path; wins over any host-provided interpreter
    pub interpreter_path: Option<PathBuf>,
    /// Auxiliary library search paths passed as `--site` arguments;
    /// when set, the site-packages probe is skipped
    pub site_packages: Option<Vec<PathBuf>>,
    /// Attach a remote debugger to the launched server
    pub debug: bool,
    /// Debugger bind host
    pub debug_host: String,
    /// Debugger bind port
    pub debug_port: u16,
    /// Recognized document extensions
    pub extensions: Vec<String>,
    /// Recognized marker config filenames
    pub marker_files: Vec<String>,
    /// Override for the bundled server payload location
    pub artifact_path: Option<PathBuf>,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            interpreter_path: None,
            site_packages: None,
            debug: false,
            debug_host: "127.0.0.1".to_string(),
            debug_port: 5678,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            marker_files: DEFAULT_MARKER_FILES.iter().map(|s| s.to_string()).collect(),
            artifact_path: None,
        }
    }
}

/// One settings layer as read from disk; absent fields inherit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub interpreter_path: Option<PathBuf>,
    pub site_packages: Option<Vec<PathBuf>>,
    pub debug: Option<bool>,
    pub debug_host: Option<String>,
    pub debug_port: Option<u16>,
    pub extensions: Option<Vec<String>>,
    pub marker_files: Option<Vec<String>>,
    pub artifact_path: Option<PathBuf>,
}

impl SettingsPatch {
    /// Apply this layer on top of `base`
    pub fn apply(self, base: &mut LauncherSettings) {
        if self.interpreter_path.is_some() {
            base.interpreter_path = self.interpreter_path;
        }
        if self.site_packages.is_some() {
            base.site_packages = self.site_packages;
        }
        if let Some(debug) = self.debug {
            base.debug = debug;
        }
        if let Some(host) = self.debug_host {
            base.debug_host = host;
        }
        if let Some(port) = self.debug_port {
            base.debug_port = port;
        }
        if let Some(extensions) = self.extensions {
            base.extensions = extensions;
        }
        if let Some(markers) = self.marker_files {
            base.marker_files = markers;
        }
        if self.artifact_path.is_some() {
            base.artifact_path = self.artifact_path;
        }
    }
}

/// Loads and merges launcher settings from YAML files
pub struct SettingsLoader;

impl SettingsLoader {
    /// Parse one settings layer from a YAML string
    pub fn load_from_string(content: &str) -> Result<SettingsPatch> {
        serde_yaml::from_str(content)
            .map_err(|e| LauncherError::Config(format!("Failed to parse YAML: {}", e)))
    }

    /// Parse one settings layer from a YAML file
    pub fn load_from_file(path: &Path) -> Result<SettingsPatch> {
        debug!("Loading launcher settings from: {:?}", path);

        let content = std::fs::read_to_string(path)
            .map_err(|e| LauncherError::Config(format!("Failed to read {:?}: {}", path, e)))?;

        Self::load_from_string(&content)
    }

    /// Path of the per-user settings file, if a config dir exists
    pub fn user_settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("aegis").join(SETTINGS_FILE_NAME))
    }

    /// Build effective settings: defaults, then user file, then project
    /// file, then runtime overrides
    ///
    /// Missing layer files are skipped silently; unreadable or invalid
    /// files are a configuration error.
    pub fn load_layered(
        project_root: Option<&Path>,
        runtime: Option<SettingsPatch>,
    ) -> Result<LauncherSettings> {
        let mut settings = LauncherSettings::default();

        if let Some(user_path) = Self::user_settings_path() {
            if user_path.is_file() {
                Self::load_from_file(&user_path)?.apply(&mut settings);
            }
        }

        if let Some(root) = project_root {
            let project_path = root.join(SETTINGS_FILE_NAME);
            if project_path.is_file() {
                Self::load_from_file(&project_path)?.apply(&mut settings);
            }
        }

        if let Some(patch) = runtime {
            patch.apply(&mut settings);
        }

        Self::validate(&settings)?;

        info!(
            extensions = ?settings.extensions,
            markers = ?settings.marker_files,
            "Launcher settings loaded"
        );

        Ok(settings)
    }

    /// Reject settings that would disable activation entirely
    pub fn validate(settings: &LauncherSettings) -> Result<()> {
        if settings.extensions.is_empty() {
            return Err(LauncherError::Config(
                "recognized extension list is empty".to_string(),
            ));
        }
        if settings.marker_files.is_empty() {
            return Err(LauncherError::Config(
                "marker filename list is empty".to_string(),
            ));
        }
        if settings.debug && settings.debug_port == 0 {
            return Err(LauncherError::Config(
                "debug enabled but debug_port is 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = LauncherSettings::default();
        assert!(settings.interpreter_path.is_none());
        assert_eq!(settings.extensions, vec!["mcfunction", "bolt"]);
        assert_eq!(
            settings.marker_files,
            vec!["beet.json", "beet.yml", "beet.yaml"]
        );
        assert!(!settings.debug);
    }

    #[test]
    fn test_patch_overrides_fields() {
        let yaml = r#"
interpreter_path: /usr/bin/python3.11
debug: true
debug_port: 6000
"#;
        let patch = SettingsLoader::load_from_string(yaml).unwrap();

        let mut settings = LauncherSettings::default();
        patch.apply(&mut settings);

        assert_eq!(
            settings.interpreter_path,
            Some(PathBuf::from("/usr/bin/python3.11"))
        );
        assert!(settings.debug);
        assert_eq!(settings.debug_port, 6000);
        // Untouched fields keep their defaults
        assert_eq!(settings.debug_host, "127.0.0.1");
        assert_eq!(settings.extensions, vec!["mcfunction", "bolt"]);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let result = SettingsLoader::load_from_string("markers: [unclosed");
        assert!(matches!(result, Err(LauncherError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_lists() {
        let mut settings = LauncherSettings::default();
        settings.extensions.clear();
        assert!(SettingsLoader::validate(&settings).is_err());

        let mut settings = LauncherSettings::default();
        settings.marker_files.clear();
        assert!(SettingsLoader::validate(&settings).is_err());
    }

    #[test]
    fn test_validate_debug_port() {
        let mut settings = LauncherSettings::default();
        settings.debug = true;
        settings.debug_port = 0;
        assert!(SettingsLoader::validate(&settings).is_err());
    }

    #[test]
    fn test_project_layer_wins_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE_NAME),
            "marker_files: [beet.toml]\n",
        )
        .unwrap();

        let settings = SettingsLoader::load_layered(Some(dir.path()), None).unwrap();
        assert_eq!(settings.marker_files, vec!["beet.toml"]);
    }

    #[test]
    fn test_runtime_layer_wins_over_project() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE_NAME),
            "debug_port: 7000\n",
        )
        .unwrap();

        let runtime = SettingsPatch {
            debug_port: Some(9000),
            ..Default::default()
        };

        let settings = SettingsLoader::load_layered(Some(dir.path()), Some(runtime)).unwrap();
        assert_eq!(settings.debug_port, 9000);
    }
}
