use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod batch;
mod codec;
mod config;
mod error;
mod preprocessing;
mod server;

#[derive(Parser, Debug)]
#[command(name = "scanprep-server")]
#[command(about = "Document image preprocessing server for text recognition")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "PREP_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PREP_PORT", default_value = "9292")]
    pub port: u16,

    /// Maximum file size in bytes (default: 50MB)
    #[arg(long, env = "PREP_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Default neighborhood side length for adaptive thresholding (must be odd)
    #[arg(long, env = "PREP_BLOCK_SIZE", default_value = "25")]
    pub block_size: u32,

    /// Default Sauvola sensitivity constant
    #[arg(long, env = "PREP_K", default_value = "0.3")]
    pub k: f32,

    /// Default expected dynamic range of the local standard deviation
    #[arg(long, env = "PREP_R", default_value = "128")]
    pub r: f32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from(args);
    config.defaults.validate()?;

    tracing::info!("Starting scanprep-server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Binding to {}:{}", config.host, config.port);

    server::run(config).await
}
