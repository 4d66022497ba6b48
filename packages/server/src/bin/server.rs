//! Team quiz server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin teamquiz-server -- --config-dir config
//! ```

use std::path::PathBuf;

use clap::Parser;
use teamquiz_server::config::Config;
use teamquiz_shared::logger::{LogFormat, setup_logger};

#[derive(Debug, Parser)]
#[command(version, about = "Team quiz session coordinator")]
struct Args {
    /// Directory holding default.toml and local.toml
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    /// Overrides server.port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = Config::load(&args.config_dir)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    setup_logger(
        env!("CARGO_BIN_NAME"),
        &config.logging.level,
        LogFormat::from_name(&config.logging.format),
    );
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting teamquiz server");

    if let Err(e) = teamquiz_server::run(config).await {
        tracing::error!("Server error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
