//! Recipe autofill proxy.
//!
//! Fetches a caller-supplied page server-side and relays it with permissive
//! CORS headers, so browser clients can read recipe HTML from any site.

use std::path::PathBuf;

use clap::Parser;

use recipe_autofill_proxy::config::{load_config, ProxyConfig};
use recipe_autofill_proxy::lifecycle;
use recipe_autofill_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "recipe-autofill-proxy")]
#[command(version, about = "CORS relay for recipe autofill", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!("recipe-autofill-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    lifecycle::start(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
