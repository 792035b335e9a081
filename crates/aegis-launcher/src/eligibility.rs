//! Activation eligibility checks
//!
//! A project is eligible when the opened document has a recognized extension
//! and a marker configuration file sits directly under the project root. The
//! marker file's content is never read; presence alone signals that tool
//! support applies.

use std::path::Path;

use tracing::debug;

use crate::settings::LauncherSettings;
use crate::types::ActivationContext;

/// Document extensions recognized by default
pub const DEFAULT_EXTENSIONS: &[&str] = &["mcfunction", "bolt"];

/// Marker config filenames recognized by default
pub const DEFAULT_MARKER_FILES: &[&str] = &["beet.json", "beet.yml", "beet.yaml"];

/// Pure, synchronous eligibility predicate
#[derive(Debug, Clone)]
pub struct EligibilityChecker {
    extensions: Vec<String>,
    marker_files: Vec<String>,
}

impl EligibilityChecker {
    /// Checker with the built-in extension and marker lists
    pub fn new() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            marker_files: DEFAULT_MARKER_FILES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Checker using the lists from settings
    pub fn from_settings(settings: &LauncherSettings) -> Self {
        Self {
            extensions: settings.extensions.clone(),
            marker_files: settings.marker_files.clone(),
        }
    }

    /// True iff the extension is recognized and a marker file exists
    /// directly under the project root
    ///
    /// An unresolved project root (no workspace open) is never an error;
    /// it simply makes the project ineligible.
    pub fn is_eligible(&self, project_root: Option<&Path>, extension: Option<&str>) -> bool {
        let Some(extension) = extension else {
            return false;
        };
        if !self.extensions.iter().any(|e| e == extension) {
            return false;
        }

        let Some(root) = project_root else {
            debug!("No project root resolved, skipping activation");
            return false;
        };

        self.has_marker_file(root)
    }

    /// Convenience wrapper over an [`ActivationContext`]
    pub fn check(&self, context: &ActivationContext) -> bool {
        self.is_eligible(context.project_root.as_deref(), context.extension.as_deref())
    }

    /// True iff any recognized marker filename exists directly under `root`
    pub fn has_marker_file(&self, root: &Path) -> bool {
        self.marker_files.iter().any(|name| root.join(name).is_file())
    }

    /// The marker filenames this checker recognizes
    pub fn marker_files(&self) -> &[String] {
        &self.marker_files
    }
}

impl Default for EligibilityChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_unrecognized_extension_never_eligible() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("beet.json"), "{}").unwrap();

        let checker = EligibilityChecker::new();
        assert!(!checker.is_eligible(Some(dir.path()), Some("rs")));
        assert!(!checker.is_eligible(Some(dir.path()), Some("py")));
        assert!(!checker.is_eligible(Some(dir.path()), None));
    }

    #[test]
    fn test_no_marker_file_not_eligible() {
        let dir = tempfile::tempdir().unwrap();

        let checker = EligibilityChecker::new();
        assert!(!checker.is_eligible(Some(dir.path()), Some("mcfunction")));
    }

    #[test]
    fn test_beet_yaml_with_bolt_extension_eligible() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("beet.yaml"), "name: pack").unwrap();

        let checker = EligibilityChecker::new();
        assert!(checker.is_eligible(Some(dir.path()), Some("bolt")));
        assert!(checker.is_eligible(Some(dir.path()), Some("mcfunction")));
    }

    #[test]
    fn test_unresolved_project_root_not_eligible() {
        let checker = EligibilityChecker::new();
        assert!(!checker.is_eligible(None, Some("bolt")));
    }

    #[test]
    fn test_marker_in_subdirectory_does_not_count() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("nested");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("beet.json"), "{}").unwrap();

        let checker = EligibilityChecker::new();
        assert!(!checker.is_eligible(Some(dir.path()), Some("bolt")));
    }

    #[test]
    fn test_idempotent_with_unchanged_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("beet.yml"), "").unwrap();

        let checker = EligibilityChecker::new();
        let first = checker.is_eligible(Some(dir.path()), Some("bolt"));
        let second = checker.is_eligible(Some(dir.path()), Some("bolt"));
        assert_eq!(first, second);
        assert!(first);
    }

    #[test]
    fn test_custom_marker_list_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("beet.toml"), "").unwrap();

        let mut settings = LauncherSettings::default();
        settings.marker_files = vec!["beet.toml".to_string()];

        let checker = EligibilityChecker::from_settings(&settings);
        assert!(checker.is_eligible(Some(dir.path()), Some("bolt")));

        // Default list does not include .toml
        let default_checker = EligibilityChecker::new();
        assert!(!default_checker.is_eligible(Some(dir.path()), Some("bolt")));
    }
}
