//! modelgate - OpenAI-compatible LLM gateway
//!
//! CLI entry point for the gateway server.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use modelgate::{config, server};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// OpenAI-compatible gateway that routes chat requests across providers
#[derive(Debug, Parser)]
#[command(name = "modelgate", version, about)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "modelgate.toml")]
    config: PathBuf,

    /// Override the listen address (host:port)
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modelgate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = config::AppConfig::load(&cli.config)?;

    if let Some(listen) = &cli.listen {
        let (host, port) = listen
            .rsplit_once(':')
            .ok_or_else(|| anyhow::anyhow!("--listen must look like host:port"))?;
        config.server.host = host.to_string();
        config.server.port = port.parse()?;
    }

    info!("starting modelgate v{}", env!("CARGO_PKG_VERSION"));
    server::serve(config).await
}
