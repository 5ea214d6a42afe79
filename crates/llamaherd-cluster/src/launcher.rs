//! Sequential cluster bring-up and best-effort teardown.
//!
//! Workers are started strictly in configuration order; each host's
//! launch command and readiness wait complete before the next host
//! begins. That trades startup latency for deterministic failure
//! attribution, which is the right trade at single-digit cluster sizes.
//!
//! Cancellation is observed between per-host stages and during the
//! readiness wait; an SSH start command already in flight runs to
//! completion before the token is seen. Teardown still covers whatever
//! that command started, because the handle records the pid before the
//! next check point.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use llamaherd_core::{parse_remote_pid, RunConfiguration, RunError, WorkerHandle};

use crate::command::{kill_worker_script, start_worker_script};
use crate::probe::{ProbeOutcome, ReadinessProbe};
use crate::transport::RemoteTransport;

/// The WorkerHandle set for one invocation.
///
/// Owns every handle exclusively for the run's duration; nothing else
/// mutates worker state. Never reused across runs.
#[derive(Debug)]
pub struct ClusterRun {
    handles: Vec<WorkerHandle>,
    rpc_port: u16,
}

impl ClusterRun {
    fn new(config: &RunConfiguration, rpc_port: u16) -> Self {
        Self {
            handles: config.enabled_hosts().map(WorkerHandle::new).collect(),
            rpc_port,
        }
    }

    /// Worker handles in configuration order.
    pub fn handles(&self) -> &[WorkerHandle] {
        &self.handles
    }

    /// RPC port every worker in this run binds.
    pub fn rpc_port(&self) -> u16 {
        self.rpc_port
    }
}

/// Orchestrates worker startup and owns the rollback path.
pub struct ClusterLauncher<T, P> {
    transport: T,
    probe: P,
    rpc_port: u16,
}

impl<T: RemoteTransport, P: ReadinessProbe> ClusterLauncher<T, P> {
    pub fn new(transport: T, probe: P, rpc_port: u16) -> Self {
        Self {
            transport,
            probe,
            rpc_port,
        }
    }

    /// Bring up every enabled worker and return the run together with
    /// the backend connection string (comma-joined `host:port`, in
    /// configuration order).
    ///
    /// On any failure the already-started workers are torn down before
    /// the error is returned, so the caller never has to roll back a
    /// partial launch.
    pub async fn launch(
        &self,
        config: &RunConfiguration,
        cancel: &CancellationToken,
    ) -> Result<(ClusterRun, String), RunError> {
        let mut run = ClusterRun::new(config, self.rpc_port);
        match self.launch_all(config, &mut run, cancel).await {
            Ok(backend_addr) => Ok((run, backend_addr)),
            Err(e) => {
                self.teardown(&mut run).await;
                Err(e)
            }
        }
    }

    async fn launch_all(
        &self,
        config: &RunConfiguration,
        run: &mut ClusterRun,
        cancel: &CancellationToken,
    ) -> Result<String, RunError> {
        let mut backend_parts = Vec::with_capacity(run.handles.len());

        for i in 0..run.handles.len() {
            if cancel.is_cancelled() {
                return Err(RunError::Interrupted);
            }

            let host = run.handles[i].address.clone();
            info!(host = %host, "Starting RPC worker");

            let script = start_worker_script(&host, &config.toolbox_image, self.rpc_port);
            let output = match self.transport.execute(&host, &script).await {
                Ok(output) => output,
                Err(e) => {
                    run.handles[i].mark_failed(e.to_string());
                    return Err(RunError::RemoteLaunch {
                        host,
                        detail: e.to_string(),
                    });
                }
            };

            if !output.success() {
                let detail = format!(
                    "launch command exited with status {}: {}",
                    output.exit_code,
                    output.stderr.trim()
                );
                run.handles[i].mark_failed(detail.clone());
                return Err(RunError::RemoteLaunch { host, detail });
            }

            let pid = match parse_remote_pid(&output.stdout) {
                Ok(pid) => pid,
                Err(e) => {
                    run.handles[i].mark_failed(e.to_string());
                    return Err(RunError::RemoteLaunch {
                        host,
                        detail: e.to_string(),
                    });
                }
            };

            run.handles[i].mark_started(pid);
            info!(host = %host, pid = pid, port = self.rpc_port, "Worker started, waiting for RPC port");

            let outcome = tokio::select! {
                outcome = self.probe.wait_ready(&host, self.rpc_port) => outcome,
                _ = cancel.cancelled() => {
                    // The handle is already Started with a recorded pid,
                    // so the teardown pass covers this host.
                    return Err(RunError::Interrupted);
                }
            };

            match outcome {
                ProbeOutcome::Ready => {
                    run.handles[i].mark_ready();
                    info!(host = %host, "Worker ready");
                }
                ProbeOutcome::TimedOut => {
                    run.handles[i].mark_failed("readiness probe timed out");
                    return Err(RunError::ReadinessTimeout {
                        host,
                        port: self.rpc_port,
                    });
                }
            }

            backend_parts.push(format!("{host}:{}", self.rpc_port));
        }

        let backend_addr = backend_parts.join(",");
        info!(backend = %backend_addr, workers = run.handles.len(), "All workers ready");
        Ok(backend_addr)
    }

    /// Best-effort kill of every worker that reached at least Started.
    ///
    /// Idempotent: each handle surrenders its pid on the first pass, so
    /// invoking this again (e.g. a failure path racing an interrupt)
    /// issues no further kill commands. Remote failures are recorded as
    /// warnings and swallowed; this is frequently the last action before
    /// process exit and must never itself fail the run.
    pub async fn teardown(&self, run: &mut ClusterRun) {
        for handle in &mut run.handles {
            let Some(pid) = handle.take_pid_for_teardown() else {
                continue;
            };
            info!(host = %handle.address, pid = pid, "Killing remote worker");

            let script = kill_worker_script(pid);
            match self.transport.execute(&handle.address, &script).await {
                Ok(output) if !output.success() => {
                    warn!(
                        host = %handle.address,
                        exit_code = output.exit_code,
                        stderr = %output.stderr.trim(),
                        "Teardown kill command failed"
                    );
                }
                Err(e) => {
                    warn!(host = %handle.address, error = %e, "Teardown transport error");
                }
                Ok(_) => {}
            }
        }
    }
}
