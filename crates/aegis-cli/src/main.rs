//! Aegis CLI entry point
//!
//! A thin host adapter over `aegis-launcher`: it sequences eligibility,
//! resolution, and launch the way an IDE plugin would, with notifications
//! going to the tracing subscriber.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use aegis_launcher::{
    check_environment, ActivationContext, ArtifactCache, ArtifactSource, CommandResolver,
    EligibilityChecker, EnvironmentProbe, LauncherSettings, PathInterpreterProvider, Reporter,
    SessionEvent, SessionKey, SessionSupervisor, SettingsLoader, ToolKind, TracingReporter,
    ARTIFACT_NAME,
};

#[derive(Parser)]
#[command(name = "aegis", version, about = "Launcher for the Aegis language tooling")]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether tool support would activate for a document
    Check {
        /// Extension of the opened document
        #[arg(long)]
        extension: String,
    },
    /// Resolve and print the language-server command without launching it
    Resolve,
    /// Launch the language server and supervise it until interrupted
    Serve,
    /// Run the build tool once, or in watch mode
    Run {
        /// Run `beet watch` instead of `beet build`
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };

    let settings = SettingsLoader::load_layered(Some(&root), None)?;
    let reporter: Arc<dyn Reporter> = Arc::new(TracingReporter);

    match cli.command {
        Command::Check { extension } => check(&root, &extension, &settings),
        Command::Resolve => resolve(&root, settings, reporter).await,
        Command::Serve => serve(&root, settings, reporter).await,
        Command::Run { watch } => run(&root, settings, reporter, watch).await,
    }
}

fn check(root: &PathBuf, extension: &str, settings: &LauncherSettings) -> Result<()> {
    let checker = EligibilityChecker::from_settings(settings);
    if checker.is_eligible(Some(root.as_path()), Some(extension)) {
        println!("eligible");
        Ok(())
    } else {
        println!("not eligible");
        std::process::exit(1);
    }
}

fn build_resolver(settings: LauncherSettings, reporter: Arc<dyn Reporter>) -> CommandResolver {
    let artifact = ArtifactCache::new(artifact_source(&settings));
    CommandResolver::new(settings, Arc::new(PathInterpreterProvider), artifact, reporter)
}

/// The payload ships next to the installed binary unless settings point
/// elsewhere
fn artifact_source(settings: &LauncherSettings) -> ArtifactSource {
    if let Some(path) = &settings.artifact_path {
        return ArtifactSource::File(path.clone());
    }
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(ARTIFACT_NAME)))
        .unwrap_or_else(|| PathBuf::from(ARTIFACT_NAME));
    ArtifactSource::File(beside_exe)
}

async fn resolve(
    root: &PathBuf,
    settings: LauncherSettings,
    reporter: Arc<dyn Reporter>,
) -> Result<()> {
    let resolver = build_resolver(settings, reporter);
    let context = ActivationContext::new(Some(root.clone()), None::<String>);
    let cancel = aegis_launcher::CancellationToken::new();

    let spec = resolver
        .resolve(&context, ToolKind::LanguageServer, &cancel)
        .await?;

    println!("{} {}", spec.program.display(), spec.args.join(" "));
    Ok(())
}

async fn serve(
    root: &PathBuf,
    settings: LauncherSettings,
    reporter: Arc<dyn Reporter>,
) -> Result<()> {
    let resolver = build_resolver(settings.clone(), Arc::clone(&reporter));
    let context = ActivationContext::new(Some(root.clone()), None::<String>);

    // Pre-launch environment verification, as the IDE adapters do before
    // starting the server.
    if let Some(interpreter) = &settings.interpreter_path {
        let probe = EnvironmentProbe::new(interpreter);
        check_environment(&probe, "beet").await?;
    }

    let (supervisor, mut events) = SessionSupervisor::new(reporter);
    let key = SessionKey::new(root.clone(), ToolKind::LanguageServer);

    let io = supervisor
        .launch(key.clone(), |cancel| async move {
            resolver
                .resolve(&context, ToolKind::LanguageServer, &cancel)
                .await
        })
        .await?;

    // Bridge the server transport onto this process's own stdio so a host
    // client can speak to it through us.
    if let Some(io) = io {
        let mut server_stdin = io.stdin;
        let mut server_stdout = io.stdout;
        tokio::spawn(async move {
            let _ = tokio::io::copy(&mut tokio::io::stdin(), &mut server_stdin).await;
        });
        tokio::spawn(async move {
            let _ = tokio::io::copy(&mut server_stdout, &mut tokio::io::stdout()).await;
        });
        if let Some(mut server_stderr) = io.stderr {
            tokio::spawn(async move {
                let _ = tokio::io::copy(&mut server_stderr, &mut tokio::io::stderr()).await;
            });
        }
    }

    info!("Language server running; press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                supervisor.stop_all().await?;
                return Ok(());
            }
            event = events.recv() => match event {
                Some(SessionEvent::Crashed { code, .. }) => {
                    anyhow::bail!("language server crashed (exit code {:?})", code);
                }
                Some(SessionEvent::Stopped { .. }) | None => return Ok(()),
                Some(SessionEvent::Started { pid, .. }) => {
                    info!(pid = pid, "Server started");
                }
            },
        }
    }
}

async fn run(
    root: &PathBuf,
    settings: LauncherSettings,
    reporter: Arc<dyn Reporter>,
    watch: bool,
) -> Result<()> {
    let kind = if watch { ToolKind::Watch } else { ToolKind::Build };
    let resolver = build_resolver(settings, Arc::clone(&reporter));
    let context = ActivationContext::new(Some(root.clone()), None::<String>);

    let (supervisor, mut events) = SessionSupervisor::new(reporter);
    let key = SessionKey::new(root.clone(), kind);

    supervisor
        .launch(key.clone(), |cancel| async move {
            resolver.resolve(&context, kind, &cancel).await
        })
        .await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                supervisor.stop_all().await?;
                return Ok(());
            }
            event = events.recv() => match event {
                Some(SessionEvent::Crashed { code, .. }) => {
                    std::process::exit(code.unwrap_or(1));
                }
                Some(SessionEvent::Stopped { .. }) | None => return Ok(()),
                Some(SessionEvent::Started { .. }) => {}
            },
        }
    }
}
