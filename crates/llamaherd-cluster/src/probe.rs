//! TCP readiness probing.
//!
//! A worker is ready when its RPC port accepts a bare connection; nothing
//! beyond socket acceptance is verified. The dominant cost is the remote
//! process's own startup latency, so a plain sleep/retry loop is enough.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::{debug, trace};

/// Result of a bounded readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The port accepted a connection.
    Ready,
    /// All attempts were exhausted without a successful connect.
    TimedOut,
}

/// Waits for a host:port pair to accept TCP connections.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn wait_ready(&self, host: &str, port: u16) -> ProbeOutcome;
}

/// Production probe: bounded connect attempts with a fixed interval.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    max_attempts: u32,
    attempt_timeout: Duration,
    interval: Duration,
}

impl TcpProbe {
    pub fn new(max_attempts: u32, attempt_timeout: Duration, interval: Duration) -> Self {
        Self {
            max_attempts,
            attempt_timeout,
            interval,
        }
    }
}

impl Default for TcpProbe {
    /// Launcher policy: 30 attempts, 1 s connect timeout, 1 s interval,
    /// so roughly 30 s worst case per worker.
    fn default() -> Self {
        Self::new(30, Duration::from_secs(1), Duration::from_secs(1))
    }
}

#[async_trait]
impl ReadinessProbe for TcpProbe {
    async fn wait_ready(&self, host: &str, port: u16) -> ProbeOutcome {
        for attempt in 1..=self.max_attempts {
            let connect = TcpStream::connect((host, port));
            match tokio::time::timeout(self.attempt_timeout, connect).await {
                Ok(Ok(stream)) => {
                    // Close immediately; acceptance is the signal.
                    drop(stream);
                    debug!(host = %host, port = port, attempt = attempt, "Worker port accepted connection");
                    return ProbeOutcome::Ready;
                }
                Ok(Err(e)) => {
                    trace!(host = %host, port = port, attempt = attempt, error = %e, "Connect failed");
                }
                Err(_) => {
                    trace!(host = %host, port = port, attempt = attempt, "Connect timed out");
                }
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }
        debug!(host = %host, port = port, attempts = self.max_attempts, "Readiness wait exhausted");
        ProbeOutcome::TimedOut
    }
}
