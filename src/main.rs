//! SquidView - Squid proxy log and ACL dashboard.

mod acl;
mod backend;
mod chart;
mod config;
mod dashboard;
mod dialog;
mod format;
mod logs;
mod reports;
mod session;
mod theme;
mod toast;
mod web;

use backend::Backend;
use config::ServerConfig;
use web::Server;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("squidview=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting SquidView on port {}...", cfg.http_port);
    tracing::info!(
        "Sessions expire after {}s idle, checked every {}s",
        cfg.session_idle_secs,
        cfg.session_sweep_secs
    );

    let backend = Backend::new(&cfg.backend_url, cfg.fetch_timeout())?;

    // Start web server
    let server = Server::new(cfg, backend);
    server.start().await?;

    Ok(())
}
