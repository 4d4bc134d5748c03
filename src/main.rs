//! Authorizing API key gateway.
//!
//! ```text
//!     Client ──▶ X-Api-Key check ──▶ allowlist ──▶ key swap ──▶ Upstream API
//!            ◀── 401 / 403 / 500      or          verbatim response ◀──┘
//! ```

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use authz_proxy::config::{load_credentials, resolve_config, GatewayConfig, ProxyCredentials, SystemEnv};
use authz_proxy::lifecycle::signals::spawn_signal_listener;
use authz_proxy::observability::{logging, metrics};
use authz_proxy::{GatewayServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "authz-proxy")]
#[command(about = "Forward allowlisted requests to the upstream API with the real API key", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let credentials = match load_credentials(&SystemEnv) {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut config = match resolve_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    match run(config, credentials).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: GatewayConfig, credentials: ProxyCredentials) -> Result<(), Box<dyn Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.host,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let bind_address = config.listener.bind_address.clone();
    let server = GatewayServer::new(config, credentials)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    server.run(listener, server_shutdown).await?;
    Ok(())
}
