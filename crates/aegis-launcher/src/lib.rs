//! External tool activation and lifecycle management for Aegis
//!
//! Decides when to activate language-tool support for an opened document,
//! resolves the concrete command line (interpreter, bundled server payload,
//! auxiliary arguments), supervises the resulting process, and reports
//! failures through a pluggable sink instead of crashing the host.
//!
//! Flow: document opened → eligibility check → command resolution → process
//! launch → lifecycle supervision → teardown. A host adapter (IDE plugin,
//! editor extension, or the `aegis` CLI) calls the plain interfaces exposed
//! here; nothing in this crate depends on a particular host framework.
//!
//! # Module Organization
//!
//! - `eligibility`: marker-file and extension gating
//! - `settings`: layered YAML launcher settings
//! - `environment`: interpreter discovery and environment probes
//! - `artifact`: bundled server payload extraction
//! - `resolver`: command resolution
//! - `supervisor`: session registry and process supervision
//! - `profile`: build/watch run-profile surface
//! - `report`: notification sink
//! - `error`: error taxonomy with severity mapping
//! - `types`: core data structures

pub mod artifact;
pub mod eligibility;
pub mod environment;
pub mod error;
pub mod profile;
pub mod report;
pub mod resolver;
pub mod settings;
pub mod supervisor;
pub mod types;

pub use tokio_util::sync::CancellationToken;

pub use artifact::{ArtifactCache, ArtifactSource, ARTIFACT_NAME};
pub use eligibility::{EligibilityChecker, DEFAULT_EXTENSIONS, DEFAULT_MARKER_FILES};
pub use environment::{
    check_environment, installation_instructions, EnvironmentProbe, InterpreterProvider,
    PathInterpreterProvider, MIN_PYTHON,
};
pub use error::{LauncherError, Result};
pub use profile::{RunProfile, RunProfileOptions};
pub use report::{MemoryReporter, Report, Reporter, Severity, TracingReporter};
pub use resolver::CommandResolver;
pub use settings::{LauncherSettings, SettingsLoader, SettingsPatch, SETTINGS_FILE_NAME};
pub use supervisor::{SessionIo, SessionSupervisor};
pub use types::{
    ActivationContext, CommandSpec, SessionEvent, SessionKey, SessionState, ToolKind,
};
