//! Core data structures for tool activation and supervision

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The kind of external tool a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Long-lived language server, stdio handed to the host client
    LanguageServer,
    /// One-shot `beet build` run profile
    Build,
    /// Long-running `beet watch` run profile
    Watch,
}

impl ToolKind {
    /// Human-readable label used in reports and logs
    pub fn label(&self) -> &'static str {
        match self {
            ToolKind::LanguageServer => "language server",
            ToolKind::Build => "beet build",
            ToolKind::Watch => "beet watch",
        }
    }
}

/// Registry key for a logical tool session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Project root the session belongs to
    pub project_root: PathBuf,
    /// Tool kind the session runs
    pub kind: ToolKind,
}

impl SessionKey {
    /// Create a key for a (project, tool-kind) pair
    pub fn new(project_root: impl Into<PathBuf>, kind: ToolKind) -> Self {
        Self {
            project_root: project_root.into(),
            kind,
        }
    }
}

/// Lifecycle state of a registered tool session
///
/// Eligibility is checked before a session is registered; an ineligible
/// document never creates an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session for this key
    Idle,
    /// Command resolution in progress
    Resolving,
    /// Resolution finished, process starting (coalesces relaunch requests)
    Launching,
    /// Process alive
    Running,
    /// Process exited cleanly or was stopped
    Stopped,
    /// Process exited abnormally; no automatic relaunch
    Crashed,
}

/// Immutable facts about the workspace a launch request came from
#[derive(Debug, Clone)]
pub struct ActivationContext {
    /// Project root path, if a workspace is open
    pub project_root: Option<PathBuf>,
    /// Extension of the document that triggered activation
    pub extension: Option<String>,
}

impl ActivationContext {
    /// Context for an opened document
    pub fn new(project_root: Option<PathBuf>, extension: Option<impl Into<String>>) -> Self {
        Self {
            project_root,
            extension: extension.map(Into::into),
        }
    }
}

/// Fully resolved tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Interpreter or executable to run
    pub program: PathBuf,
    /// Full argument list
    pub args: Vec<String>,
    /// Working directory for the child
    pub working_dir: PathBuf,
    /// Extra environment variables
    pub env: HashMap<String, String>,
}

impl CommandSpec {
    /// Create a spec with empty args and env
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
            working_dir: working_dir.into(),
            env: HashMap::new(),
        }
    }
}

/// Asynchronous notifications published by the supervisor
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Process started
    Started { key: SessionKey, pid: u32 },
    /// Process stopped cleanly (explicit stop or zero exit)
    Stopped { key: SessionKey },
    /// Process exited abnormally
    Crashed { key: SessionKey, code: Option<i32> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_equality() {
        let a = SessionKey::new("/tmp/pack", ToolKind::LanguageServer);
        let b = SessionKey::new("/tmp/pack", ToolKind::LanguageServer);
        let c = SessionKey::new("/tmp/pack", ToolKind::Watch);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_tool_kind_labels() {
        assert_eq!(ToolKind::LanguageServer.label(), "language server");
        assert_eq!(ToolKind::Build.label(), "beet build");
    }
}
