use anyhow::{Context, Result};
use clap::Parser;
use neurobiz_server::{AppState, Config, Secrets, Server};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "neurobiz-server", version, about = "NeuroBiz website backend")]
struct Args {
    /// Config file (without extension)
    #[arg(long, default_value = "config/neurobiz")]
    config: String,

    /// Overrides service.http.port and PORT
    #[arg(long)]
    port: Option<u16>,

    /// Overrides service.static_dir
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }
    if let Some(dir) = args.static_dir {
        cfg.service.static_dir = dir;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let secrets = Secrets::from_env();
    secrets
        .require_startup_keys()
        .context("Refusing to start without vendor credentials")?;

    let state = AppState::from_config(&cfg, &secrets).await?;

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let static_dir = cfg.service.static_dir.is_dir().then_some(cfg.service.static_dir.as_path());
    if static_dir.is_none() {
        info!(
            "Static dir {} not found; frontend will not be served",
            cfg.service.static_dir.display()
        );
    }

    let server = Server::bind(&addr, state, static_dir).await?;

    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    server.run().await
}
