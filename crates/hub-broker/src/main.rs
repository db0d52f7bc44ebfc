//! Cookie hub broker: entry point.
//!
//! Hosts the cross-origin message broker behind a WebSocket endpoint.  Each
//! connection stands in for one embedding parent window; the `Origin` header
//! of its upgrade request is checked against the configured dependent
//! domains before any request is routed.
//!
//! # Usage
//!
//! ```text
//! hub-broker [OPTIONS]
//!
//! Options:
//!   --config <PATH>    TOML configuration file [default: hub.toml]
//!   --bind   <IP>      Address to listen on (overrides [server].bind_address)
//!   --port   <PORT>    Port to listen on (overrides [server].port)
//!   --allow  <DOMAIN>  Extra dependent domain; repeatable
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable     | Description                                  |
//! |--------------|----------------------------------------------|
//! | `HUB_CONFIG` | Configuration file path                      |
//! | `HUB_BIND`   | Listen address                               |
//! | `HUB_PORT`   | Listen port                                  |
//! | `HUB_ALLOW`  | Comma-separated dependent domains            |
//! | `RUST_LOG`   | `tracing` filter; wins over `[hub].log_level`|
//!
//! CLI arguments take precedence over the configuration file.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hub_broker::application::Broker;
use hub_broker::infrastructure::config_file::{load_config, HubConfig};
use hub_broker::infrastructure::cookie_jar::{cookie_routes, CookieJar};
use hub_broker::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Cross-origin cookie hub broker.
#[derive(Debug, Parser)]
#[command(
    name = "hub-broker",
    about = "Cross-origin message broker for shared cookie storage",
    version
)]
struct Cli {
    /// Path to the TOML configuration file.  A missing file means defaults.
    #[arg(long, default_value = "hub.toml", env = "HUB_CONFIG")]
    config: PathBuf,

    /// IP address to listen on.
    #[arg(long, env = "HUB_BIND")]
    bind: Option<String>,

    /// TCP port to listen on.
    #[arg(long, env = "HUB_PORT")]
    port: Option<u16>,

    /// Dependent domain allowed to talk to the hub (full origin or `host[:port]`).
    ///
    /// Added to the domains listed in the configuration file.
    #[arg(long = "allow", value_delimiter = ',', env = "HUB_ALLOW")]
    allow: Vec<String>,
}

impl Cli {
    /// Layers the CLI overrides on top of a loaded configuration.
    fn apply_to(self, mut cfg: HubConfig) -> HubConfig {
        if let Some(bind) = self.bind {
            cfg.server.bind_address = bind;
        }
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        cfg.hub.dependent_domains.extend(self.allow);
        cfg
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// 1. CLI arguments are parsed and the configuration file is loaded.
/// 2. `tracing_subscriber` is initialised from `RUST_LOG`, falling back to
///    `[hub].log_level`.
/// 3. The allow-list and the cookie routes are built into a [`Broker`].
/// 4. A Ctrl+C handler clears the shared `running` flag.
/// 5. [`run_server`] accepts connections until the flag is cleared.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone();
    let file_cfg = load_config(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let cfg = cli.apply_to(file_cfg);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cfg.hub.log_level.as_str())),
        )
        .init();

    let allow_list = cfg.allow_list()?;
    let bind_addr = cfg.bind_addr()?;
    if allow_list.is_empty() {
        tracing::warn!("no dependent domains configured; every sender will be denied");
    }

    let broker = Broker::new(allow_list, cookie_routes(Arc::new(CookieJar::new()), Vec::new()));

    info!(
        "cookie hub starting: bind={bind_addr}, dependent_domains={}",
        cfg.hub.dependent_domains.len()
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    run_server(bind_addr, broker, running).await?;

    info!("cookie hub stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
