//! oauthproxy - OAuth2 credential-substituting reverse proxy
//!
//! Main entry point for the proxy binary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use oauthproxy_config::{DEFAULT_CONFIG_FILE, LoadedConfig, load_config};
use oauthproxy_server::{Server, ServerConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, prelude::*};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// OAuth2 proxy that swaps a shared client credential for the real one
#[derive(Parser, Debug)]
#[command(name = "oauthproxy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (.json or .toml)
    #[arg(long, env = "OAUTHPROXY_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Listen address, overriding the config file (e.g. ":53681" or "127.0.0.1:8080")
    #[arg(long)]
    pub bind: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit console logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Also write JSON logs to a daily-rotated file in this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Validate the config and exit
    #[arg(long)]
    pub check: bool,
}

const VERBOSE_FILTER: &str = "oauthproxy=debug,oauthproxy_server=debug,oauthproxy_config=debug,tower_http=debug,info";
const DEFAULT_FILTER: &str = "oauthproxy=info,oauthproxy_server=info,oauthproxy_config=info,warn";
const FILE_FILTER: &str = "oauthproxy=trace,oauthproxy_server=trace,oauthproxy_config=trace,info";

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(&cli);

    if let Err(e) = run(cli).await {
        tracing::error!(error = %format!("{e:#}"), "Fatal");
        return Err(e);
    }
    Ok(())
}

/// Install the console layer and, with `--log-dir`, a rotating JSON file layer.
///
/// `RUST_LOG` takes precedence over the verbosity flag for the console.
fn init_tracing(cli: &Cli) -> Option<WorkerGuard> {
    let default = if cli.verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    };
    let console_filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let (json_console, plain_console) = if cli.json_logs {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter());
        (Some(layer), None)
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(console_filter());
        (None, Some(layer))
    };

    let (file_layer, guard) = match &cli.log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "oauthproxy.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new(FILE_FILTER));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(json_console)
        .with(plain_console)
        .with(file_layer)
        .init();

    guard
}

async fn run(cli: Cli) -> Result<()> {
    let mut loaded = load_config(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    if let Some(bind) = cli.bind {
        loaded.config.bind_address = bind;
    }
    let addr = loaded
        .config
        .socket_addr()
        .context("resolving bind address")?;

    if cli.check {
        print_summary(&loaded, addr);
        return Ok(());
    }

    tracing::info!(
        config = %loaded.path.display(),
        auth_server = %loaded.config.auth_server,
        token_server = %loaded.config.token_server,
        "Loaded config"
    );

    let server = Server::new(loaded.config, ServerConfig::new(addr))
        .context("building proxy server")?;

    server
        .run_until(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
            }
        })
        .await
        .with_context(|| format!("serving on {}", addr))?;

    Ok(())
}

fn print_summary(loaded: &LoadedConfig, addr: std::net::SocketAddr) {
    println!("Configuration OK: {}", loaded.path.display());
    println!("  name:         {}", loaded.config.name);
    println!("  listen:       {}", addr);
    println!("  auth server:  {}", loaded.config.auth_server);
    println!("  token server: {}", loaded.config.token_server);
    for secret in &loaded.secrets {
        println!("  {}: {}", secret.field, secret.source);
    }
}
