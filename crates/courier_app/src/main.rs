use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use courier_app::{cors_layer, router, AppConfig, AppState};
use courier_logging::{courier_info, courier_warn, parse_level, LogDestination};
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "kindle-courier", version, about = "Send blog posts to a Kindle as PDFs")]
struct Args {
    /// RON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Listen address, overrides the configuration.
    #[arg(long)]
    bind: Option<String>,
    /// Also write the log to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_env(|name| std::env::var(name).ok())?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    let destination = match args.log_file {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Terminal,
    };
    courier_logging::initialize(destination, parse_level(&config.log_level));

    if let Err(err) = config.relay.validate() {
        courier_warn!("Delivery is disabled until the relay is configured: {}", err);
    }

    let state = AppState::from_config(&config)?;
    let app = router(state).layer(cors_layer(config.cors_origin.as_deref())?);
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    courier_info!("Listening on http://{}", config.bind);

    axum::serve(listener, app).await.context("server stopped")?;
    Ok(())
}
