//! Estate dashboard server
//!
//! ## Usage
//!
//! ```bash
//! estate-web                                  # http://127.0.0.1:5173
//! estate-web --port 8080                      # Custom port
//! estate-web --api-base http://model:8000/api # Custom prediction backend
//! estate-web --config ./estate.yaml           # Explicit config file
//! estate-web --routes                         # List routes and exit
//! ```

use anyhow::Result;
use clap::Parser;
use estate_config::Config;
use estate_web::{serve, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "estate-web")]
#[command(about = "Real-estate analytics dashboard: market charts and price prediction")]
#[command(version)]
struct Cli {
    /// Config file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Prediction backend base URL
    #[arg(long)]
    api_base: Option<String>,

    /// Print the route table and exit
    #[arg(long)]
    routes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "estate_web=info,estate_dashboard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if cli.routes {
        estate_web::routes::print_routes();
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(api_base) = cli.api_base {
        config.api.base_url = api_base;
    }

    let addr = config.server.bind_addr();
    tracing::info!("Prediction backend: {}", config.api.base_url);
    tracing::info!("Charts: {} -> {}", config.assets.charts_url, config.assets.charts_dir.display());

    let state = Arc::new(AppState::from_config(config)?);

    println!();
    println!("  Real Estate Analytics v{}", env!("CARGO_PKG_VERSION"));
    println!("  Server ready at http://{}", addr);
    println!();

    serve(state, &addr).await?;
    Ok(())
}
