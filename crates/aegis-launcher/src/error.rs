//! Error types for tool activation and supervision

use thiserror::Error;

use crate::report::Severity;

/// Failures of command resolution and process supervision
#[derive(Debug, Error)]
pub enum LauncherError {
    /// No usable interpreter was found (settings override or host probe)
    #[error("No Python interpreter found: {0}")]
    InterpreterNotFound(String),

    /// Bundled tool payload could not be materialized (packaging defect)
    #[error("Bundled artifact '{resource}' is missing: {detail}")]
    ArtifactMissing { resource: String, detail: String },

    /// Best-effort auxiliary path discovery failed (degraded mode)
    #[error("Auxiliary path discovery failed: {0}")]
    AuxiliaryPathDiscovery(String),

    /// The OS refused to start the process
    #[error("Failed to launch tool process: {0}")]
    LaunchFailed(String),

    /// The process exited abnormally
    #[error("Tool process crashed (exit code {code:?})")]
    ProcessCrashed { code: Option<i32> },

    /// Settings file was unreadable or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stop request cancelled an in-flight launch
    #[error("Launch cancelled")]
    Cancelled,

    /// Underlying process management failure
    #[error(transparent)]
    Process(#[from] aegis_process::ProcessError),
}

impl LauncherError {
    /// Severity the notification sink should use for this failure
    ///
    /// `Cancelled` is not user-visible and maps to Warning only so that a
    /// sink receiving it by mistake does not over-report.
    pub fn severity(&self) -> Severity {
        match self {
            LauncherError::AuxiliaryPathDiscovery(_) | LauncherError::Cancelled => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }

    /// Short notification title for this failure
    pub fn title(&self) -> &'static str {
        match self {
            LauncherError::InterpreterNotFound(_) => "Python interpreter missing",
            LauncherError::ArtifactMissing { .. } => "Bundled server missing",
            LauncherError::AuxiliaryPathDiscovery(_) => "Site-packages missing",
            LauncherError::LaunchFailed(_) | LauncherError::Process(_) => "Tool failed to start",
            LauncherError::ProcessCrashed { .. } => "Tool process crashed",
            LauncherError::Config(_) => "Invalid launcher settings",
            LauncherError::Cancelled => "Launch cancelled",
        }
    }
}

/// Result type for launcher operations
pub type Result<T> = std::result::Result<T, LauncherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        assert_eq!(
            LauncherError::InterpreterNotFound("none".into()).severity(),
            Severity::Error
        );
        assert_eq!(
            LauncherError::AuxiliaryPathDiscovery("probe failed".into()).severity(),
            Severity::Warning
        );
        assert_eq!(
            LauncherError::ProcessCrashed { code: Some(1) }.severity(),
            Severity::Error
        );
    }
}
