//! Remote shell script builders.
//!
//! These scripts are sent verbatim over SSH to `bash -s`. The start
//! script is idempotent against a previous worker on the same host: it
//! force-kills any existing `rpc-server` before launching the new one,
//! then echoes the new process's pid as its last line of output.

/// Build the script that launches one worker on a remote host.
///
/// The worker runs inside the toolbox container, binds all interfaces on
/// `rpc_port`, logs to a host-local file named after the host address,
/// and is detached from the SSH session so it survives the connection.
pub fn start_worker_script(host: &str, image: &str, rpc_port: u16) -> String {
    format!(
        "set -euo pipefail\n\
         pkill -9 -f rpc-server || true\n\
         nohup toolbox run -c {image} -- rpc-server -H 0.0.0.0 -p {rpc_port} -c \
         > /tmp/rpc-server-{host}.log 2>&1 < /dev/null &\n\
         echo $!\n"
    )
}

/// Build the best-effort kill script for one worker.
///
/// Kills the tracked pid, then falls back to force-killing anything
/// matching the worker process name. The broad fallback matches the
/// existing remote-host convention where these boxes run nothing but the
/// worker.
pub fn kill_worker_script(pid: u32) -> String {
    format!("kill -9 {pid} 2>/dev/null || true; pkill -9 -f rpc-server || true\n")
}
