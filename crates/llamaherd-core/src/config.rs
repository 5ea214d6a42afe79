//! Run configuration and network tunables.
//!
//! A `RunConfiguration` is supplied fully validated by the caller (the CLI
//! layer); the core only re-checks the two preconditions it depends on
//! before issuing remote side effects: the model artifact exists and at
//! least one host is enabled.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RunError;

/// Known toolbox keys and the container images they select.
pub const TOOLBOX_IMAGES: &[(&str, &str)] = &[
    ("rocm6_4_4", "llama-rocm-6.4.4"),
    ("rocm7-nightlies", "llama-rocm7-nightlies"),
    ("vulkan_amdvlk", "llama-vulkan-amdvlk"),
    ("vulkan_radv", "llama-vulkan-radv"),
];

/// Default toolbox key.
pub const DEFAULT_TOOLBOX: &str = "rocm7-nightlies";

/// Default worker host set, all enabled.
pub const DEFAULT_HOSTS: &[&str] = &["192.168.100.11", "192.168.100.12", "192.168.100.13"];

/// Resolve a toolbox key to its container image name.
pub fn toolbox_image(key: &str) -> Option<&'static str> {
    TOOLBOX_IMAGES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, image)| *image)
}

/// How the local driver process runs the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// `llama-server`: HTTP server exposing the model.
    #[default]
    Server,
    /// `llama-cli`: interactive conversation in the terminal.
    Cli,
    /// `llama-bench`: benchmark run.
    Bench,
}

impl ExecutionMode {
    /// The llama.cpp binary this mode launches inside the toolbox.
    pub fn binary(&self) -> &'static str {
        match self {
            Self::Server => "llama-server",
            Self::Cli => "llama-cli",
            Self::Bench => "llama-bench",
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary())
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server" | "llama-server" => Ok(Self::Server),
            "cli" | "llama-cli" => Ok(Self::Cli),
            "bench" | "llama-bench" => Ok(Self::Bench),
            other => Err(format!("unknown execution mode: '{other}'")),
        }
    }
}

/// One remote host slot in the configuration.
///
/// Disabled entries are kept in the list (the caller may re-enable them
/// between runs) but the cluster layer never contacts them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEntry {
    /// Host address (IP or resolvable name).
    pub address: String,

    /// Whether this host participates in the run.
    pub enabled: bool,
}

impl HostEntry {
    /// Create an enabled host entry.
    pub fn enabled(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            enabled: true,
        }
    }

    /// Create a disabled host entry.
    pub fn disabled(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            enabled: false,
        }
    }
}

/// Immutable configuration for one distributed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfiguration {
    /// Absolute path to the GGUF model artifact.
    pub model_path: PathBuf,

    /// Driver execution mode.
    pub mode: ExecutionMode,

    /// Context size to pass to the driver; `None` means backend default.
    pub context_size: Option<u32>,

    /// Container image used for the driver and every remote worker.
    pub toolbox_image: String,

    /// Ordered host list. Duplicates are legal and produce duplicate
    /// startup attempts.
    pub hosts: Vec<HostEntry>,

    /// Port `llama-server` binds for its own clients (server mode only).
    pub local_http_port: u16,
}

impl RunConfiguration {
    /// Create a configuration with default toolbox, hosts and server port.
    pub fn new(model_path: impl Into<PathBuf>, mode: ExecutionMode) -> Self {
        Self {
            model_path: model_path.into(),
            mode,
            context_size: None,
            toolbox_image: toolbox_image(DEFAULT_TOOLBOX)
                .unwrap_or(DEFAULT_TOOLBOX)
                .to_string(),
            hosts: DEFAULT_HOSTS.iter().copied().map(HostEntry::enabled).collect(),
            local_http_port: 8080,
        }
    }

    /// Addresses of enabled hosts, in configuration order.
    pub fn enabled_hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts
            .iter()
            .filter(|h| h.enabled)
            .map(|h| h.address.as_str())
    }

    /// Validate the preconditions the cluster layer depends on.
    ///
    /// Called before any remote side effect; a failure here needs no
    /// teardown.
    pub fn preflight(&self) -> Result<(), RunError> {
        if !self.model_path.is_file() {
            return Err(RunError::ModelNotFound(self.model_path.clone()));
        }
        if self.enabled_hosts().next().is_none() {
            return Err(RunError::NoActiveHosts);
        }
        Ok(())
    }
}

/// Ports the cluster layer talks over, overridable from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// SSH port on the remote hosts. Env: `REMOTE_PORT`.
    pub remote_port: u16,

    /// RPC port the workers bind and the driver connects to. Env: `RPC_PORT`.
    pub rpc_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            remote_port: 22,
            rpc_port: 50052,
        }
    }
}

impl NetworkConfig {
    /// Build from the process environment, falling back to defaults for
    /// unset variables. An unparseable value is a preflight error.
    pub fn from_env() -> Result<Self, RunError> {
        let mut cfg = Self::default();
        if let Some(port) = read_port_env("REMOTE_PORT")? {
            cfg.remote_port = port;
        }
        if let Some(port) = read_port_env("RPC_PORT")? {
            cfg.rpc_port = port;
        }
        Ok(cfg)
    }
}

fn read_port_env(var: &'static str) -> Result<Option<u16>, RunError> {
    match std::env::var(var) {
        Ok(value) => parse_port(var, &value).map(Some),
        Err(_) => Ok(None),
    }
}

/// Parse a port tunable. Separate from the env lookup so validation is
/// testable without touching process-global state.
fn parse_port(var: &'static str, value: &str) -> Result<u16, RunError> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|_| RunError::InvalidEnv {
            var,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_with_hosts(hosts: Vec<HostEntry>) -> RunConfiguration {
        let mut cfg = RunConfiguration::new("/nonexistent/model.gguf", ExecutionMode::Server);
        cfg.hosts = hosts;
        cfg
    }

    #[test]
    fn test_toolbox_registry() {
        assert_eq!(toolbox_image("rocm6_4_4"), Some("llama-rocm-6.4.4"));
        assert_eq!(toolbox_image(DEFAULT_TOOLBOX), Some("llama-rocm7-nightlies"));
        assert_eq!(toolbox_image("no-such-key"), None);
    }

    #[test]
    fn test_mode_binary_names() {
        assert_eq!(ExecutionMode::Server.binary(), "llama-server");
        assert_eq!(ExecutionMode::Cli.binary(), "llama-cli");
        assert_eq!(ExecutionMode::Bench.binary(), "llama-bench");
    }

    #[test]
    fn test_mode_from_str_accepts_short_and_binary_names() {
        assert_eq!("server".parse::<ExecutionMode>(), Ok(ExecutionMode::Server));
        assert_eq!(
            "llama-bench".parse::<ExecutionMode>(),
            Ok(ExecutionMode::Bench)
        );
        assert!("batch".parse::<ExecutionMode>().is_err());
    }

    #[test]
    fn test_enabled_hosts_preserve_order_and_skip_disabled() {
        let cfg = config_with_hosts(vec![
            HostEntry::enabled("10.0.0.1"),
            HostEntry::disabled("10.0.0.2"),
            HostEntry::enabled("10.0.0.3"),
        ]);
        let hosts: Vec<&str> = cfg.enabled_hosts().collect();
        assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.3"]);
    }

    #[test]
    fn test_preflight_rejects_missing_model() {
        let cfg = config_with_hosts(vec![HostEntry::enabled("10.0.0.1")]);
        assert!(matches!(cfg.preflight(), Err(RunError::ModelNotFound(_))));
    }

    #[test]
    fn test_preflight_rejects_zero_enabled_hosts() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"GGUF").unwrap();

        let mut cfg = config_with_hosts(vec![
            HostEntry::disabled("10.0.0.1"),
            HostEntry::disabled("10.0.0.2"),
        ]);
        cfg.model_path = file.path().to_path_buf();
        assert!(matches!(cfg.preflight(), Err(RunError::NoActiveHosts)));
    }

    #[test]
    fn test_preflight_accepts_valid_configuration() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"GGUF").unwrap();

        let mut cfg = config_with_hosts(vec![HostEntry::enabled("10.0.0.1")]);
        cfg.model_path = file.path().to_path_buf();
        assert!(cfg.preflight().is_ok());
    }

    #[test]
    fn test_network_config_defaults() {
        let cfg = NetworkConfig::default();
        assert_eq!(cfg.remote_port, 22);
        assert_eq!(cfg.rpc_port, 50052);
    }

    #[test]
    fn test_parse_port_accepts_valid_override() {
        assert_eq!(parse_port("REMOTE_PORT", "2222").unwrap(), 2222);
        assert_eq!(parse_port("RPC_PORT", " 50053 ").unwrap(), 50053);
    }

    #[test]
    fn test_parse_port_rejects_non_numeric_value() {
        let err = parse_port("RPC_PORT", "fifty").unwrap_err();
        assert!(matches!(
            err,
            RunError::InvalidEnv { var: "RPC_PORT", ref value } if value == "fifty"
        ));
        assert!(err.is_preflight());
    }

    #[test]
    fn test_parse_port_rejects_out_of_range_value() {
        assert!(matches!(
            parse_port("REMOTE_PORT", "70000"),
            Err(RunError::InvalidEnv {
                var: "REMOTE_PORT",
                ..
            })
        ));
    }
}
