//! Remote command execution over SSH.
//!
//! One session per call; the command text is an opaque shell script piped
//! to `bash -s` on the remote side. Remote failures (connection refused,
//! auth failure, non-zero script exit) all surface as a non-zero exit
//! code with stderr populated; the transport itself only errors when the
//! local `ssh` process cannot be spawned or driven.

use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Local failures constructing or driving the remote session.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The local ssh client process could not be spawned or waited on.
    #[error("failed to run ssh: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Captured output of one remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl RemoteOutput {
    /// Returns true if the remote command exited zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes an opaque shell script on a named remote host.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Run `command` on `host` and return its captured output. The
    /// command text is never interpreted locally.
    async fn execute(&self, host: &str, command: &str) -> Result<RemoteOutput, TransportError>;
}

/// Production transport: `ssh -p <port> <host> bash -s` with the script
/// written to stdin.
#[derive(Debug, Clone)]
pub struct SshTransport {
    remote_port: u16,
}

impl SshTransport {
    pub fn new(remote_port: u16) -> Self {
        Self { remote_port }
    }
}

#[async_trait]
impl RemoteTransport for SshTransport {
    async fn execute(&self, host: &str, command: &str) -> Result<RemoteOutput, TransportError> {
        debug!(host = %host, port = self.remote_port, command_len = command.len(), "Executing remote command");

        let mut child = Command::new("ssh")
            .arg("-p")
            .arg(self.remote_port.to_string())
            .arg(host)
            .arg("bash -s")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // stdin is piped above, so take() cannot return None.
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(command.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        let result = RemoteOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        };

        debug!(
            host = %host,
            exit_code = result.exit_code,
            stdout_len = result.stdout.len(),
            stderr_len = result.stderr.len(),
            "Remote command finished"
        );

        Ok(result)
    }
}
