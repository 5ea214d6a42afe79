//! Error taxonomy for a distributed run.
//!
//! Every failure mode of a run maps to exactly one variant here. Teardown
//! failures are deliberately absent: a failed remote kill is logged as a
//! warning by the cluster layer and never escalated.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can end a distributed run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Model artifact missing before any remote action was taken.
    #[error("model file not found: {0}")]
    ModelNotFound(PathBuf),

    /// No host in the configuration is enabled.
    #[error("no enabled hosts in configuration")]
    NoActiveHosts,

    /// An environment tunable holds an unparseable value.
    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    /// The remote start command failed on a host, or returned output the
    /// pid parser rejected. The current host never reached Started.
    #[error("remote launch failed on {host}: {detail}")]
    RemoteLaunch { host: String, detail: String },

    /// The worker started but its RPC port never accepted a connection
    /// within the probe window.
    #[error("worker on {host} did not become reachable on port {port}")]
    ReadinessTimeout { host: String, port: u16 },

    /// The local driver process could not be spawned or waited on.
    #[error("driver process error: {0}")]
    DriverProcess(#[from] std::io::Error),

    /// The local driver process exited with a non-zero status after a
    /// fully successful cluster bring-up.
    #[error("driver exited with status {0}")]
    DriverFailed(i32),

    /// External interrupt. Triggers full teardown of all started workers.
    #[error("run interrupted")]
    Interrupted,
}

impl RunError {
    /// Returns true if the error was raised before any remote side effect,
    /// i.e. no teardown is needed for it.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::ModelNotFound(_) | Self::NoActiveHosts | Self::InvalidEnv { .. }
        )
    }
}
