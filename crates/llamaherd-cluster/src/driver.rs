//! Local driver process supervision.
//!
//! The driver is the foreground compute process; its stdout/stderr are
//! inherited so output streams live to the terminal, and its exit status
//! is the run's result once the cluster is up. The wait races the
//! cancellation token so an interrupt is observable during what is
//! otherwise the longest suspension of the whole run.

use std::process::Stdio;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use llamaherd_core::RunError;

/// Spawn the driver from a full argument vector (program first) and
/// block until it exits or the run is cancelled.
///
/// On cancellation the child is killed before `Interrupted` is returned;
/// teardown of the remote workers is the caller's responsibility.
pub async fn run_driver(argv: &[String], cancel: &CancellationToken) -> Result<i32, RunError> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| RunError::DriverProcess(std::io::Error::other("empty driver command")))?;

    info!(command = %argv.join(" "), "Starting local driver");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()?;

    tokio::select! {
        status = child.wait() => {
            let code = status?.code().unwrap_or(-1);
            info!(exit_code = code, "Driver exited");
            Ok(code)
        }
        _ = cancel.cancelled() => {
            warn!("Interrupt received, killing driver");
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to kill driver process");
            }
            Err(RunError::Interrupted)
        }
    }
}
