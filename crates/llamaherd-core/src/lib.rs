//! Llamaherd Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/SSH
//! - Process spawning
//! - Runtime specifics
//!
//! All types here represent the core domain of a single distributed run:
//! the run configuration, per-worker lifecycle state, the driver argument
//! vector, and the error taxonomy.

pub mod config;
pub mod driver;
pub mod error;
pub mod handle;
pub mod pid;

// Re-export commonly used types
pub use config::{ExecutionMode, HostEntry, NetworkConfig, RunConfiguration};
pub use driver::driver_command;
pub use error::RunError;
pub use handle::{WorkerHandle, WorkerState};
pub use pid::parse_remote_pid;
