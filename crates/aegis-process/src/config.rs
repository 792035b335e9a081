//! Process spawn configuration

use std::collections::HashMap;
use std::path::PathBuf;

/// How the child's stdio streams are wired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdioMode {
    /// Pipe stdin/stdout/stderr (language-server transport handoff)
    #[default]
    Piped,
    /// Inherit the parent's streams (run-profile children)
    Inherit,
    /// Discard all output
    Null,
}

/// Configuration for spawning a tool process
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Executable path or command name
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
    /// Working directory (None = inherit current dir)
    pub working_dir: Option<PathBuf>,
    /// Environment variables (added to parent env)
    pub env: HashMap<String, String>,
    /// Stdio wiring
    pub stdio: StdioMode,
}

impl ProcessConfig {
    /// Create a new configuration for the given program
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
            working_dir: None,
            env: HashMap::new(),
            stdio: StdioMode::default(),
        }
    }

    /// Set command arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set working directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set stdio wiring
    pub fn stdio(mut self, mode: StdioMode) -> Self {
        self.stdio = mode;
        self
    }
}
