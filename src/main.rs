//! netrelay service binary.
//!
//! ```text
//!     Browser ──POST /cors-proxy──▶ ┌──────────────────────────────┐ ──HTTP(S)──▶ Origin
//!             ──POST /port-scan───▶ │  http (router, CORS, limits) │ ──TCP connect──▶ Host:ports
//!             ──GET /status───────▶ │  relay  │  scan  │  status   │
//!                                   └──────────────────────────────┘
//!                                     config · observability · lifecycle
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use netrelay::config::{check, read_config, AppConfig, ConfigError};
use netrelay::http::HttpServer;
use netrelay::lifecycle::{wait_for_signal, Shutdown};
use netrelay::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "netrelay")]
#[command(about = "HTTP relay for curl commands plus a TCP port scanner", long_about = None)]
struct Args {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener port override.
    #[arg(short, long)]
    port: Option<u16>,

    /// Full bind address override, e.g. 127.0.0.1:8080.
    #[arg(short, long)]
    bind: Option<String>,
}

fn resolve_config(args: &Args) -> Result<AppConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => AppConfig::default(),
    };
    config.listener.apply_overrides(args.bind.as_deref(), args.port);
    check(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "netrelay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        config_file = ?args.config,
        relay_timeout_secs = config.relay.default_timeout_secs,
        scan_timeout_ms = config.scan.default_timeout_ms,
        scan_batch_size = config.scan.default_batch_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        _ = wait_for_signal() => {
            shutdown.trigger();
            server_task.await??;
        }
        result = &mut server_task => result??,
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
