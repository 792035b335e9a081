//! Command resolution
//!
//! Turns an activation context into a concrete [`CommandSpec`]. Resolution
//! order for the interpreter: explicit settings override, then the host's
//! interpreter provider, then failure. Auxiliary site-packages arguments are
//! best-effort; their absence degrades the command instead of failing it.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::artifact::ArtifactCache;
use crate::environment::{EnvironmentProbe, InterpreterProvider};
use crate::error::{LauncherError, Result};
use crate::profile::RunProfile;
use crate::report::{Reporter, Severity};
use crate::settings::LauncherSettings;
use crate::types::{ActivationContext, CommandSpec, ToolKind};

/// Resolves the concrete command line for a tool session
pub struct CommandResolver {
    settings: LauncherSettings,
    provider: Arc<dyn InterpreterProvider>,
    artifact: ArtifactCache,
    reporter: Arc<dyn Reporter>,
}

impl CommandResolver {
    pub fn new(
        settings: LauncherSettings,
        provider: Arc<dyn InterpreterProvider>,
        artifact: ArtifactCache,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            settings,
            provider,
            artifact,
            reporter,
        }
    }

    /// Resolve the full command for `kind`
    ///
    /// Checks `cancel` between each step so a stop request can abort a
    /// launch that is still resolving.
    pub async fn resolve(
        &self,
        context: &ActivationContext,
        kind: ToolKind,
        cancel: &CancellationToken,
    ) -> Result<CommandSpec> {
        ensure_live(cancel)?;
        let interpreter = self.resolve_interpreter().await?;

        ensure_live(cancel)?;
        match kind {
            ToolKind::Build | ToolKind::Watch => self.resolve_run_profile(context, kind, interpreter),
            ToolKind::LanguageServer => {
                self.resolve_language_server(interpreter, cancel).await
            }
        }
    }

    /// Settings override wins unconditionally; otherwise ask the host
    /// provider and gate on the minimum interpreter version
    async fn resolve_interpreter(&self) -> Result<PathBuf> {
        if let Some(path) = &self.settings.interpreter_path {
            info!(interpreter = %path.display(), "Using user-configured interpreter");
            return Ok(path.clone());
        }

        let Some(path) = self.provider.active_interpreter().await else {
            return Err(LauncherError::InterpreterNotFound(
                "No Python installation configured. Set `interpreter_path` in the launcher \
                 settings or configure an interpreter in the host."
                    .to_string(),
            ));
        };

        EnvironmentProbe::new(&path).check_min_version().await?;
        Ok(path)
    }

    fn resolve_run_profile(
        &self,
        context: &ActivationContext,
        kind: ToolKind,
        interpreter: PathBuf,
    ) -> Result<CommandSpec> {
        let Some(root) = &context.project_root else {
            return Err(LauncherError::Config(
                "run profiles require an open project".to_string(),
            ));
        };

        let profile = match kind {
            ToolKind::Watch => RunProfile::Watch,
            _ => RunProfile::Build,
        };

        let mut spec = CommandSpec::new(interpreter, root);
        spec.args = profile.args();
        debug!(profile = profile.display_name(), "Resolved run profile command");
        Ok(spec)
    }

    async fn resolve_language_server(
        &self,
        interpreter: PathBuf,
        cancel: &CancellationToken,
    ) -> Result<CommandSpec> {
        let artifact_path = self.artifact.materialize().await?.to_path_buf();

        ensure_live(cancel)?;
        // The extracted artifact runs from a neutral temp dir, not the
        // project root, so server-side relative paths never leak into the
        // user's workspace.
        let mut spec = CommandSpec::new(&interpreter, std::env::temp_dir());

        if self.settings.debug {
            spec.args.extend([
                "-Xfrozen_modules=off".to_string(),
                "-m".to_string(),
                "debugpy".to_string(),
                "--listen".to_string(),
                format!("{}:{}", self.settings.debug_host, self.settings.debug_port),
            ]);
        }

        spec.args.push(artifact_path.display().to_string());

        ensure_live(cancel)?;
        for site in self.site_packages(&interpreter).await {
            spec.args.push("--site".to_string());
            spec.args.push(site.display().to_string());
        }

        debug!(
            program = %spec.program.display(),
            args = ?spec.args,
            "Resolved language server command"
        );
        Ok(spec)
    }

    /// Auxiliary search paths: settings override verbatim, otherwise a
    /// best-effort probe. Probe failure is reported as a warning and the
    /// command is returned without the arguments.
    async fn site_packages(&self, interpreter: &PathBuf) -> Vec<PathBuf> {
        if let Some(paths) = &self.settings.site_packages {
            return paths.clone();
        }

        match EnvironmentProbe::new(interpreter).site_packages().await {
            Ok(paths) => paths,
            Err(e) => {
                self.reporter.report(
                    Severity::Warning,
                    "Site-packages missing",
                    &format!(
                        "Could not discover the site-packages directories; the language \
                         server will start without them. {}",
                        e
                    ),
                );
                vec![]
            }
        }
    }
}

fn ensure_live(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(LauncherError::Cancelled);
    }
    Ok(())
}
