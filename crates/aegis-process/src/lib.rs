//! # aegis-process
//!
//! Async process lifecycle management for the Aegis tool launcher.
//!
//! Provides process spawning with configurable stdio wiring, PID tracking,
//! graceful shutdown with a bounded wait, and process-group kill on unix.
//!
//! ```rust,no_run
//! use aegis_process::{ProcessManager, ProcessConfig, StdioMode};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ProcessManager::new();
//!
//! let config = ProcessConfig::new("python3")
//!     .args(["-m", "beet", "build"])
//!     .stdio(StdioMode::Inherit);
//!
//! let mut child = manager.spawn(config)?;
//! child.wait().await?;
//! # Ok(())
//! # }
//! ```

pub mod child;
pub mod config;
pub mod error;
pub mod manager;

pub use child::ManagedChild;
pub use config::{ProcessConfig, StdioMode};
pub use error::{ProcessError, Result};
pub use manager::ProcessManager;
