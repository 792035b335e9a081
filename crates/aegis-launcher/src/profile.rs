//! Run-profile surface for the build tool
//!
//! Two named operation modes map onto fixed trailing subcommands of the
//! external tool. Selection is a stored boolean on the session's
//! configuration, as the IDE run-configuration surface stores it.

use serde::{Deserialize, Serialize};

use crate::types::ToolKind;

/// Build-vs-watch run profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunProfile {
    Build,
    Watch,
}

impl RunProfile {
    /// Profile from the stored watch flag
    pub fn from_watch(watch: bool) -> Self {
        if watch {
            RunProfile::Watch
        } else {
            RunProfile::Build
        }
    }

    /// Trailing interpreter arguments for this profile
    pub fn args(&self) -> Vec<String> {
        let subcommand = match self {
            RunProfile::Build => "build",
            RunProfile::Watch => "watch",
        };
        vec!["-m".to_string(), "beet".to_string(), subcommand.to_string()]
    }

    /// Display name used for generated run configurations
    pub fn display_name(&self) -> &'static str {
        match self {
            RunProfile::Build => "Beet Build",
            RunProfile::Watch => "Beet Watch",
        }
    }

    /// The session tool kind this profile launches
    pub fn tool_kind(&self) -> ToolKind {
        match self {
            RunProfile::Build => ToolKind::Build,
            RunProfile::Watch => ToolKind::Watch,
        }
    }
}

/// Persisted run-configuration options
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunProfileOptions {
    /// Run `beet watch` instead of `beet build`
    pub watch: bool,
}

impl RunProfileOptions {
    pub fn profile(&self) -> RunProfile {
        RunProfile::from_watch(self.watch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_args() {
        assert_eq!(RunProfile::Build.args(), vec!["-m", "beet", "build"]);
        assert_eq!(RunProfile::Watch.args(), vec!["-m", "beet", "watch"]);
    }

    #[test]
    fn test_watch_flag_mapping() {
        assert_eq!(RunProfile::from_watch(false), RunProfile::Build);
        assert_eq!(RunProfile::from_watch(true), RunProfile::Watch);

        let options = RunProfileOptions { watch: true };
        assert_eq!(options.profile().tool_kind(), ToolKind::Watch);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(RunProfile::Build.display_name(), "Beet Build");
        assert_eq!(RunProfile::Watch.display_name(), "Beet Watch");
    }
}
