//! SayCheese server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use saycheese_core::config::AppConfig;
use saycheese_server::bootstrap::ensure_documents;
use saycheese_server::{AppState, create_router};
use std::net::SocketAddr;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ENV_PREFIX: &str = "SAYCHEESE_";

/// SayCheese - event photo wall backend
#[derive(Parser, Debug)]
#[command(name = "saycheesed")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "SAYCHEESE_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

/// Load configuration from the optional TOML file, `SAYCHEESE_` variables
/// and `PORT`, then validate it.
fn load_config(config_path: &str, port: Option<&str>) -> Result<AppConfig> {
    let mut figment = Figment::new();

    if Path::new(config_path).exists() {
        tracing::info!(config_path = %config_path, "Loading configuration from file");
        figment = figment.merge(Toml::file(config_path));
    } else {
        tracing::debug!("No config file found at {}", config_path);
    }

    let mut config: AppConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context(
            "failed to load configuration (admin credentials are required: \
             set [admin] in the config file or SAYCHEESE_ADMIN__USERNAME and \
             SAYCHEESE_ADMIN__PASSWORD)",
        )?;

    config
        .apply_port_override(port)
        .map_err(anyhow::Error::msg)?;
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Startup banner
    tracing::info!("SayCheese v{}", env!("CARGO_PKG_VERSION"));

    let port = std::env::var("PORT").ok();
    let config = load_config(&args.config, port.as_deref())?;

    // Register Prometheus metrics
    if config.server.metrics_enabled {
        saycheese_server::metrics::register_metrics();
        tracing::info!("Prometheus metrics registered");
    }

    // Initialize storage backend
    let storage = saycheese_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;
    tracing::info!(backend = storage.backend_name(), "Storage backend initialized");

    // Verify storage connectivity before accepting requests.
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!("Storage backend connectivity verified");

    // Initialize documents
    let document_store = saycheese_documents::from_config(&config.documents, storage.clone())
        .await
        .context("failed to initialize document store")?;

    let state = AppState::new(config.clone(), storage, document_store)
        .context("failed to initialize application state")?;
    ensure_documents(&state.documents).await?;

    // Create router
    let app = create_router(state);

    // Parse bind address
    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
