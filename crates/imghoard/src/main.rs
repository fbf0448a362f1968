//! imghoard - content addressed image store
//!
//! Subcommands:
//! - `imghoard serve` - Run the HTTP server
//! - `imghoard config` - Print the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hoardconf::{HoardConfig, StoreBackend};

use imghoard::{serve, telemetry};

#[derive(Parser)]
#[command(name = "imghoard")]
#[command(about = "Content addressed image store")]
#[command(version)]
struct Cli {
    /// Config file to use instead of ./imghoard.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Object store directory
        #[arg(long)]
        store_dir: Option<PathBuf>,

        /// Keep images in memory instead of on disk
        #[arg(long)]
        memory: bool,

        /// Serve existing images but refuse uploads
        #[arg(long)]
        read_only: bool,

        /// Largest accepted upload in bytes
        #[arg(long)]
        max_image_size: Option<u64>,

        /// OTLP gRPC endpoint for OpenTelemetry (e.g., "127.0.0.1:4317")
        #[arg(long)]
        otlp_endpoint: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = HoardConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Config => {
            for file in &sources.files {
                println!("# loaded: {}", file.display());
            }
            for var in &sources.env_overrides {
                println!("# env: {}", var);
            }
            print!("{}", config.to_toml());
            Ok(())
        }
        Commands::Serve {
            port,
            host,
            store_dir,
            memory,
            read_only,
            max_image_size,
            otlp_endpoint,
        } => {
            if let Some(port) = port {
                config.bind.http_port = port;
            }
            if let Some(host) = host {
                config.bind.host = host;
            }
            if let Some(dir) = store_dir {
                config.paths.store_dir = dir;
            }
            if memory {
                config.store.backend = StoreBackend::Memory;
            }
            if read_only {
                config.store.read_only = true;
            }
            if let Some(size) = max_image_size {
                config.images.max_image_size = size;
            }
            if otlp_endpoint.is_some() {
                config.telemetry.otlp_endpoint = otlp_endpoint;
            }

            let _telemetry = telemetry::init(
                &config.telemetry.log_level,
                config.telemetry.otlp_endpoint.as_deref(),
            )
            .context("Failed to initialize telemetry")?;

            for file in &sources.files {
                tracing::info!("Loaded config from {}", file.display());
            }

            serve::run(config).await
        }
    }
}
