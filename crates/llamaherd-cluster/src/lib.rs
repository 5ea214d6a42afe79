//! Llamaherd Cluster Orchestration
//!
//! Brings up llama.cpp `rpc-server` workers on remote hosts over SSH,
//! waits for each to accept TCP connections, runs the local driver
//! against them, and tears every started worker down on any exit path.
//!
//! The transport and probe are traits so the launcher's sequencing,
//! failure attribution and teardown behavior are testable without a
//! network. Production impls are [`SshTransport`] and [`TcpProbe`].

pub mod command;
pub mod driver;
pub mod launcher;
pub mod probe;
pub mod runner;
pub mod transport;

pub use driver::run_driver;
pub use launcher::{ClusterLauncher, ClusterRun};
pub use probe::{ProbeOutcome, ReadinessProbe, TcpProbe};
pub use runner::{install_interrupt_handler, run};
pub use transport::{RemoteOutput, RemoteTransport, SshTransport, TransportError};
