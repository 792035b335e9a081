//! Managed child process wrapper

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tracing::{debug, warn};

use crate::{
    config::ProcessConfig,
    error::{ProcessError, Result},
};

/// Bounded wait after a kill before giving up
const SHUTDOWN_WAIT_SECS: u64 = 5;

/// Wrapper around `tokio::process::Child` with lifecycle management
pub struct ManagedChild {
    child: Child,
    config: ProcessConfig,
    pid: u32,
}

impl ManagedChild {
    pub(crate) fn new(child: Child, config: ProcessConfig) -> Self {
        let pid = child.id().unwrap_or(0);
        Self { child, config, pid }
    }

    /// Process ID at spawn time
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Configuration this child was spawned with
    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    /// Check if the process is still running without blocking
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Wait for the process to exit on its own
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        self.child.wait().await.map_err(Into::into)
    }

    /// Stop the process tree and wait for the child to exit
    ///
    /// Escalates through [`Self::kill_tree`] so descendants spawned by the
    /// tool go down with it. Already-exited children are a no-op.
    pub async fn shutdown(&mut self) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }

        debug!(pid = %self.pid, "Shutting down process");
        self.kill_tree().await?;

        let timeout = Duration::from_secs(SHUTDOWN_WAIT_SECS);
        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(Ok(_)) => {
                debug!(pid = %self.pid, "Process shut down");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(pid = %self.pid, error = %e, "Error waiting for process exit");
                Err(ProcessError::KillFailed(e.to_string()))
            }
            Err(_) => {
                warn!(pid = %self.pid, "Timeout waiting for process to exit");
                Err(ProcessError::Timeout {
                    seconds: timeout.as_secs(),
                })
            }
        }
    }

    /// Kill the process group (process and descendants)
    ///
    /// Unix only; falls back to killing the child alone when the group
    /// signal cannot be delivered.
    #[cfg(unix)]
    pub async fn kill_tree(&mut self) -> Result<()> {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        debug!(pid = %self.pid, "Killing process tree");

        let pgid = Pid::from_raw(self.pid as i32);

        match killpg(pgid, Signal::SIGTERM) {
            Ok(_) => debug!(pid = %self.pid, "Sent SIGTERM to process group"),
            Err(e) => {
                warn!(pid = %self.pid, error = %e, "Failed to signal group, killing process only");
                let _ = self.child.kill().await;
                return Ok(());
            }
        }

        tokio::time::sleep(Duration::from_millis(200)).await;

        if self.is_running() {
            match killpg(pgid, Signal::SIGKILL) {
                Ok(_) => debug!(pid = %self.pid, "Sent SIGKILL to process group"),
                Err(e) => {
                    warn!(pid = %self.pid, error = %e, "Failed to SIGKILL group");
                    let _ = self.child.kill().await;
                }
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    pub async fn kill_tree(&mut self) -> Result<()> {
        self.child
            .kill()
            .await
            .map_err(|e| ProcessError::KillFailed(e.to_string()))
    }

    /// Take the stdin handle for transport handoff
    pub fn stdin(&mut self) -> Option<tokio::process::ChildStdin> {
        self.child.stdin.take()
    }

    /// Take the stdout handle for transport handoff
    pub fn stdout(&mut self) -> Option<tokio::process::ChildStdout> {
        self.child.stdout.take()
    }

    /// Take the stderr handle
    pub fn stderr(&mut self) -> Option<tokio::process::ChildStderr> {
        self.child.stderr.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProcessManager;

    #[tokio::test]
    async fn test_is_running() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("sleep").args(["1"]);

        let mut child = manager.spawn(config).unwrap();
        assert!(child.is_running());

        child.wait().await.unwrap();
        assert!(!child.is_running());
    }

    #[tokio::test]
    async fn test_shutdown() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("sleep").args(["10"]);

        let mut child = manager.spawn(config).unwrap();
        assert!(child.is_running());

        child.shutdown().await.unwrap();
        assert!(!child.is_running());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_kill_tree_terminates_group() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("sh").args(["-c", "sleep 30"]);

        let mut child = manager.spawn(config).unwrap();
        assert!(child.is_running());

        child.kill_tree().await.unwrap();
        let status = tokio::time::timeout(Duration::from_secs(5), child.wait())
            .await
            .unwrap()
            .unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    async fn test_shutdown_idempotent() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("true");

        let mut child = manager.spawn(config).unwrap();
        child.wait().await.unwrap();

        // Second shutdown of an exited child is a no-op
        child.shutdown().await.unwrap();
        child.shutdown().await.unwrap();
    }
}
