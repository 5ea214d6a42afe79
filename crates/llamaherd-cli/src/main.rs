//! Llamaherd CLI - launch a distributed llama.cpp run from flags.
//!
//! Builds the validated run configuration the orchestration core
//! consumes. Deliberately non-interactive: no menus, no file browser,
//! just flags and environment tunables.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing_subscriber::EnvFilter;

use llamaherd_cluster::{install_interrupt_handler, run, SshTransport, TcpProbe};
use llamaherd_core::config::{toolbox_image, DEFAULT_TOOLBOX};
use llamaherd_core::{ExecutionMode, HostEntry, NetworkConfig, RunConfiguration, RunError};

/// Distributed llama.cpp RPC cluster launcher
#[derive(Parser)]
#[command(name = "llamaherd")]
#[command(about = "Start remote rpc-server workers and run a local llama.cpp driver against them", long_about = None)]
struct Cli {
    /// Path to the GGUF model file
    #[arg(short, long)]
    model: PathBuf,

    /// Execution mode: server, cli, or bench
    #[arg(long, default_value = "server")]
    mode: String,

    /// Toolbox key (e.g. rocm7-nightlies) or a raw container image name
    #[arg(long, default_value = DEFAULT_TOOLBOX)]
    toolbox: String,

    /// Context size; omit to use the model default
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    ctx: Option<u32>,

    /// Worker host, repeatable; order defines backend order.
    /// Omit to use the built-in default host set.
    #[arg(long = "host")]
    hosts: Vec<String>,

    /// Port llama-server binds for its own clients (server mode)
    #[arg(long, default_value_t = 8080)]
    http_port: u16,
}

impl Cli {
    fn into_config(self) -> Result<RunConfiguration, String> {
        let mode: ExecutionMode = self.mode.parse()?;

        // A known key selects its image; anything else is taken as a
        // literal image name.
        let image = toolbox_image(&self.toolbox)
            .map(str::to_string)
            .unwrap_or(self.toolbox);

        let mut config = RunConfiguration::new(self.model, mode);
        config.context_size = self.ctx;
        config.toolbox_image = image;
        config.local_http_port = self.http_port;
        if !self.hosts.is_empty() {
            config.hosts = self.hosts.into_iter().map(HostEntry::enabled).collect();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid arguments");
            return ExitCode::from(2);
        }
    };

    let network = match NetworkConfig::from_env() {
        Ok(network) => network,
        Err(e) => {
            error!(error = %e, "Invalid environment configuration");
            return ExitCode::from(2);
        }
    };

    let cancel = CancellationToken::new();
    install_interrupt_handler(cancel.clone());

    let transport = SshTransport::new(network.remote_port);
    let probe = TcpProbe::default();

    match run(&config, &network, transport, probe, &cancel).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(RunError::DriverFailed(code)) => {
            error!(exit_code = code, "Driver failed");
            ExitCode::from(code.clamp(1, 255) as u8)
        }
        Err(RunError::Interrupted) => {
            error!("Run interrupted");
            ExitCode::from(130)
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            ExitCode::from(1)
        }
    }
}
