use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::info;

use super::{
    services::{get_content, handle_webhook, health},
    state::AppState,
};
use crate::cms::{EntryUpdater, HttpDeliveryClient, HttpManagementClient};
use crate::config::Config;
use crate::content::ContentFetcher;
use crate::dam::{AssetRepository, HttpDamClient};
use crate::observability::Metrics;
use crate::pipeline::{Pipeline, PipelineSettings};
use crate::render::HttpRenderer;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Builds the router; shared between `run` and the integration tests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook/pdf", post(handle_webhook))
        .route("/content/{slug}", get(get_content))
        .route("/health", get(health))
        .with_state(state)
        // Automatically decompress gzip request bodies
        .layer(RequestDecompressionLayer::new())
}

pub async fn run(address: SocketAddr) -> Result<(), AnyError> {
    // Load config
    info!("Loading configuration");
    let config = Config::load().map_err(|e| format!("Failed to load config: {}", e))?;

    // Construct the external collaborators. Clients are dependency-injected
    // into the pipeline rather than held as process-wide singletons.
    let renderer = Arc::new(
        HttpRenderer::new(&config.render)
            .map_err(|e| format!("Failed to build renderer: {}", e))?,
    );

    let dam_client = Arc::new(
        HttpDamClient::new(&config.dam)
            .map_err(|e| format!("Failed to build DAM client: {}", e))?,
    );
    let assets = AssetRepository::new(dam_client, config.dam.organization.clone());

    let cms_client = Arc::new(
        HttpManagementClient::new(&config.cms)
            .map_err(|e| format!("Failed to build CMS client: {}", e))?,
    );
    let updater = EntryUpdater::new(
        cms_client,
        config.cms.content_type.clone(),
        config.cms.target_field.clone(),
        config.webhook.locale.clone(),
    );

    let delivery_client = Arc::new(
        HttpDeliveryClient::new(&config.cms)
            .map_err(|e| format!("Failed to build CMS delivery client: {}", e))?,
    );
    let content = ContentFetcher::new(
        delivery_client,
        config.cms.space.clone(),
        config.cms.environment.clone(),
        config.cms.content_type.clone(),
    );

    let metrics = Arc::new(Metrics::new());
    let pipeline = Pipeline::new(
        renderer,
        assets,
        updater,
        metrics.clone(),
        PipelineSettings::from(&config),
    );

    let state = AppState::new(config, pipeline, content, metrics);
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "pdfrelay API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
