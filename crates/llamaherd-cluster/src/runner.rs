//! Top-level run orchestration.
//!
//! One run: preflight, sequential cluster bring-up, driver execution,
//! teardown. Teardown runs exactly once on every exit path: the launcher
//! tears down internally when bring-up fails, and this module tears down
//! after the driver finishes, fails, or is interrupted. The interrupt
//! handler only cancels the token; it never touches worker state itself.

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use llamaherd_core::{driver_command, NetworkConfig, RunConfiguration, RunError};

use crate::driver::run_driver;
use crate::launcher::ClusterLauncher;
use crate::probe::ReadinessProbe;
use crate::transport::RemoteTransport;

/// Install a Ctrl-C handler that cancels `token`.
///
/// The orchestration loop and the driver wait observe the token at their
/// check points and converge on the single teardown routine.
pub fn install_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for interrupt signal");
            return;
        }
        info!("Interrupt received, cancelling run");
        token.cancel();
    });
}

/// Execute one full distributed run.
///
/// Returns the driver's exit code on a clean run. Any launch-stage
/// failure, driver failure or interrupt is returned as the matching
/// [`RunError`] after all started workers have been torn down.
pub async fn run<T, P>(
    config: &RunConfiguration,
    network: &NetworkConfig,
    transport: T,
    probe: P,
    cancel: &CancellationToken,
) -> Result<i32, RunError>
where
    T: RemoteTransport,
    P: ReadinessProbe,
{
    config.preflight()?;

    info!(
        model = %config.model_path.display(),
        mode = %config.mode,
        toolbox = %config.toolbox_image,
        context = ?config.context_size,
        workers = config.enabled_hosts().count(),
        "Starting distributed run"
    );

    let launcher = ClusterLauncher::new(transport, probe, network.rpc_port);

    // On Err the launcher has already torn down every started worker.
    let (mut cluster, backend_addr) = launcher.launch(config, cancel).await?;

    let argv = driver_command(config, &backend_addr);
    let driver_result = run_driver(&argv, cancel).await;

    launcher.teardown(&mut cluster).await;

    match driver_result {
        Ok(0) => Ok(0),
        Ok(code) => Err(RunError::DriverFailed(code)),
        Err(e) => Err(e),
    }
}
