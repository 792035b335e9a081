//! Interpreter discovery and environment probing
//!
//! The [`InterpreterProvider`] trait is the seam a host adapter implements
//! against its own interpreter-management facility (e.g. the IDE's Python
//! SDK registry). [`PathInterpreterProvider`] is the standalone fallback
//! that searches the PATH.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{LauncherError, Result};

/// Minimum supported interpreter version
pub const MIN_PYTHON: (u32, u32) = (3, 10);

/// Source of the host's active interpreter
#[async_trait]
pub trait InterpreterProvider: Send + Sync {
    /// The currently active interpreter, if the host has one configured
    async fn active_interpreter(&self) -> Option<PathBuf>;
}

/// Provider that probes the PATH for `python3`, then `python`
pub struct PathInterpreterProvider;

#[async_trait]
impl InterpreterProvider for PathInterpreterProvider {
    async fn active_interpreter(&self) -> Option<PathBuf> {
        for candidate in ["python3", "python"] {
            if let Ok(path) = which::which(candidate) {
                debug!(interpreter = %path.display(), "Found interpreter on PATH");
                return Some(path);
            }
        }
        None
    }
}

/// Best-effort probes against a concrete interpreter
pub struct EnvironmentProbe {
    interpreter: PathBuf,
}

impl EnvironmentProbe {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    /// Run a `python -c` snippet and return its stdout
    ///
    /// Failures carry only the detail text; each caller maps them onto the
    /// error variant matching its own severity contract.
    async fn run_snippet(&self, snippet: &str) -> std::result::Result<String, String> {
        let output = Command::new(&self.interpreter)
            .args(["-c", snippet])
            .output()
            .await
            .map_err(|e| format!("cannot execute {:?}: {}", self.interpreter, e))?;

        if !output.status.success() {
            return Err(format!(
                "interpreter probe exited with {:?}",
                output.status.code()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Interpreter version as (major, minor, micro)
    ///
    /// Any probe failure here means the interpreter is unusable, which
    /// blocks activation.
    pub async fn version(&self) -> Result<(u32, u32, u32)> {
        let stdout = self
            .run_snippet("import sys; print('%d.%d.%d' % sys.version_info[:3])")
            .await
            .map_err(LauncherError::InterpreterNotFound)?;

        parse_version(&stdout).ok_or_else(|| {
            LauncherError::InterpreterNotFound(format!(
                "cannot parse interpreter version: '{}'",
                stdout
            ))
        })
    }

    /// Enforce the minimum supported interpreter version
    pub async fn check_min_version(&self) -> Result<()> {
        let (major, minor, micro) = self.version().await?;
        if (major, minor) < MIN_PYTHON {
            return Err(LauncherError::InterpreterNotFound(format!(
                "environment provides Python {}.{}.{} but {}.{} or newer is required; \
                 please choose another environment",
                major, minor, micro, MIN_PYTHON.0, MIN_PYTHON.1
            )));
        }
        Ok(())
    }

    /// True when the interpreter runs inside a virtual environment
    pub async fn is_virtualenv(&self) -> Result<bool> {
        let stdout = self
            .run_snippet("import sys; print(sys.prefix != sys.base_prefix)")
            .await
            .map_err(LauncherError::AuxiliaryPathDiscovery)?;
        Ok(stdout.contains("True"))
    }

    /// Version of an importable module, or None when it is not installed
    pub async fn module_version(&self, module: &str) -> Option<String> {
        let snippet = format!("import {m}; print({m}.__version__)", m = module);
        match self.run_snippet(&snippet).await {
            Ok(version) if !version.is_empty() => Some(version),
            Ok(_) => None,
            Err(e) => {
                debug!(module = module, error = %e, "Module probe failed");
                None
            }
        }
    }

    /// Site-packages directories of this environment
    ///
    /// Used for the auxiliary `--site` arguments; callers treat failure as
    /// a warning, not a resolution failure.
    pub async fn site_packages(&self) -> Result<Vec<PathBuf>> {
        let stdout = self
            .run_snippet("import site, json; print(json.dumps(site.getsitepackages()))")
            .await
            .map_err(LauncherError::AuxiliaryPathDiscovery)?;

        let paths: Vec<String> = serde_json::from_str(&stdout).map_err(|e| {
            LauncherError::AuxiliaryPathDiscovery(format!(
                "cannot parse site-packages output: {}",
                e
            ))
        })?;

        Ok(paths.into_iter().map(PathBuf::from).collect())
    }

    /// The interpreter this probe targets
    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }
}

/// Remediation text for a missing tool package
pub fn installation_instructions(tool: &str) -> String {
    match tool {
        "beet" => "Install beet and the recommended packages:\n\
             - Via pip: pip install beet mecha bolt\n\
             - See: https://github.com/mcbeet/beet"
            .to_string(),
        "mecha" => "Install mecha:\n\
             - Via pip: pip install mecha\n\
             - See: https://github.com/mcbeet/mecha"
            .to_string(),
        _ => format!(
            "Package '{}' was not found in the selected environment.\n\
             Please install it with pip and restart the language server.",
            tool
        ),
    }
}

/// Pre-launch environment verification
///
/// Only a missing tool package blocks activation; a missing venv is
/// advisory. Probe errors are logged and treated as unknown.
pub async fn check_environment(probe: &EnvironmentProbe, tool: &str) -> Result<()> {
    match probe.is_virtualenv().await {
        Ok(true) => {}
        Ok(false) => {
            warn!(
                interpreter = %probe.interpreter().display(),
                "Interpreter is not a virtual environment; a venv is recommended"
            );
        }
        Err(e) => debug!(error = %e, "Venv probe failed"),
    }

    if probe.module_version(tool).await.is_none() {
        return Err(LauncherError::InterpreterNotFound(format!(
            "'{}' is not installed in this environment.\n{}",
            tool,
            installation_instructions(tool)
        )));
    }

    Ok(())
}

fn parse_version(s: &str) -> Option<(u32, u32, u32)> {
    let mut parts = s.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let micro = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Some((major, minor, micro))
}
