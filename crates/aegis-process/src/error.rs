//! Error types for process management

use std::io;
use thiserror::Error;

/// Process management errors
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Failed to spawn the tool process
    #[error("Failed to spawn process: {0}")]
    SpawnFailed(#[from] io::Error),

    /// Timed out waiting for the process
    #[error("Timed out after {seconds}s waiting for process")]
    Timeout { seconds: u64 },

    /// Failed to deliver a kill signal
    #[error("Failed to kill process: {0}")]
    KillFailed(String),

    /// Invalid spawn configuration
    #[error("Invalid process configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for process operations
pub type Result<T> = std::result::Result<T, ProcessError>;
