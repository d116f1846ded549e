//! revlens HTTP service — axum router, shared state, and server bootstrap.
//!
//! The boundary validates and normalizes input, then drives the core
//! pipeline: aggregate → upsert → render chart (best-effort) → respond.

pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tracing::info;

use revlens_core::analyze::SentimentAnalyzer;
use revlens_core::classifier::LazyClassifier;
use revlens_core::config::RevlensConfig;
use revlens_core::render::ChartExporter;
use revlens_core::store::ProductStore;

/// Shared per-request state: the aggregator plus the two durable-side
/// components. All handlers go through these; nothing touches the
/// collection or the artifact directory directly.
#[derive(Debug, Clone)]
pub struct AppState {
    pub analyzer: SentimentAnalyzer,
    pub store: Arc<ProductStore>,
    pub charts: Arc<ChartExporter>,
}

impl AppState {
    /// Wire the state from configuration: open (or create) the store,
    /// ensure the artifact directory, and set up the lazily-constructed
    /// classification backend.
    pub fn from_config(config: &RevlensConfig) -> revlens_core::error::Result<Self> {
        let store = Arc::new(ProductStore::open(&config.storage.data_file())?);
        let charts = Arc::new(ChartExporter::new(&config.storage.graphs_dir)?);
        let classifier = Arc::new(LazyClassifier::from_config(&config.classifier));
        let analyzer = SentimentAnalyzer::new(
            classifier,
            Duration::from_secs(config.classifier.timeout_secs),
        );
        Ok(Self {
            analyzer,
            store,
            charts,
        })
    }

    pub fn new(
        analyzer: SentimentAnalyzer,
        store: Arc<ProductStore>,
        charts: Arc<ChartExporter>,
    ) -> Self {
        Self {
            analyzer,
            store,
            charts,
        }
    }
}

/// Build the service router. CORS is permissive: the service fronts a
/// browser dashboard served from elsewhere.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", post(routes::analyze))
        .route("/get-products", get(routes::get_products))
        .route("/get-graph/:id", get(routes::get_graph))
        .route("/delete/:id", delete(routes::delete_product))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &RevlensConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "revlens listening");

    axum::serve(listener, app).await?;
    Ok(())
}
