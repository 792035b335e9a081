//! Process manager - spawn orchestration

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::{
    child::ManagedChild,
    config::{ProcessConfig, StdioMode},
    error::{ProcessError, Result},
};

/// Spawns tool processes from a [`ProcessConfig`]
pub struct ProcessManager;

impl ProcessManager {
    /// Create a new process manager
    pub fn new() -> Self {
        Self
    }

    /// Spawn a managed process
    ///
    /// On unix the child is placed in its own process group so the whole
    /// tree can be signalled on teardown.
    pub fn spawn(&self, config: ProcessConfig) -> Result<ManagedChild> {
        if config.program.as_os_str().is_empty() {
            return Err(ProcessError::InvalidConfig("empty program".to_string()));
        }

        debug!(
            program = %config.program.display(),
            args = ?config.args,
            "Spawning process"
        );

        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args);

        if let Some(ref dir) = config.working_dir {
            cmd.current_dir(dir);
        }

        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        match config.stdio {
            StdioMode::Piped => {
                cmd.stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
            }
            StdioMode::Inherit => {
                cmd.stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
            }
            StdioMode::Null => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null());
            }
        }

        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn()?;

        info!(
            pid = ?child.id(),
            program = %config.program.display(),
            "Process spawned"
        );

        Ok(ManagedChild::new(child, config))
    }
}

impl Default for ProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_echo() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("echo").args(["hello"]);

        let child = manager.spawn(config).unwrap();
        assert!(child.pid() > 0);
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("definitely-not-a-real-binary-xyz");

        assert!(manager.spawn(config).is_err());
    }

    #[tokio::test]
    async fn test_spawn_empty_program() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("");

        assert!(matches!(
            manager.spawn(config),
            Err(ProcessError::InvalidConfig(_))
        ));
    }
}
