// ABOUTME: Entry point for pricetag-server: loads config, builds the Client and serves the API.
// ABOUTME: Shuts down gracefully on Ctrl-C or SIGTERM.

mod api;
mod config;

use std::sync::Arc;

use anyhow::Context;
use pricetag_scout::{load_catalog_file, Client};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut builder = Client::builder()
        .timeout(config.fetch_timeout)
        .user_agent(config.user_agent.clone());
    if let Some(path) = &config.catalog_path {
        let catalog = load_catalog_file(path)
            .with_context(|| format!("loading catalog {}", path.display()))?;
        builder = builder.catalog(catalog);
    }
    let client = builder.build()?;
    tracing::info!(
        catalog_version = client.catalog().version(),
        "selector catalog ready"
    );

    let app = build_app(AppState {
        client: Arc::new(client),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
