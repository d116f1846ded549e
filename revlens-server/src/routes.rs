//! Request handlers for the four service endpoints.
//!
//! The boundary owns input sanitation: review lists are normalized and
//! validated here, before anything reaches the aggregator, so validation
//! failures abort with no side effects performed.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use revlens_core::types::{Product, SentimentCounts, SentimentLabel};

use crate::AppState;
use crate::error::ApiError;

// ── Request / response shapes ──────────────────────────────────────

/// Product ids arrive as JSON strings or bare numbers; both stringify.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProductIdInput {
    Text(String),
    Number(i64),
}

impl ProductIdInput {
    fn into_id(self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => n.to_string(),
        }
    }
}

/// Reviews arrive as a list of strings or one newline-delimited string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReviewsInput {
    List(Vec<String>),
    Lines(String),
}

/// Trim every entry and drop the empties. An empty result invalidates the
/// request.
fn normalize_reviews(input: &ReviewsInput) -> Vec<String> {
    let entries: Vec<&str> = match input {
        ReviewsInput::List(items) => items.iter().map(String::as_str).collect(),
        ReviewsInput::Lines(text) => text.lines().collect(),
    };
    entries
        .into_iter()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Every field optional at the serde level so shape problems surface as
/// one uniform validation error, not a deserializer rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<ProductIdInput>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub reviews: Option<ReviewsInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub overall: SentimentLabel,
    pub counts: SentimentCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
}

// ── Handlers ───────────────────────────────────────────────────────

/// POST /analyze — classify a product's reviews, persist the summary,
/// refresh its chart artifact.
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let id = request.id.map(ProductIdInput::into_id).unwrap_or_default();
    let image = request
        .image
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let reviews = request
        .reviews
        .as_ref()
        .map(normalize_reviews)
        .unwrap_or_default();

    if name.is_empty() || id.is_empty() || reviews.is_empty() {
        return Err(ApiError::Validation(
            "Missing required fields: name, id, reviews".to_string(),
        ));
    }

    let report = state
        .analyzer
        .analyze(&reviews)
        .await
        .map_err(|e| ApiError::Internal(format!("Sentiment analysis failed: {e}")))?;

    let product = Product {
        id: id.clone(),
        name: name.clone(),
        image,
        sentiment: report.overall,
        counts: report.counts,
    };
    state
        .store
        .upsert(product)
        .map_err(|e| ApiError::Internal(format!("Failed to save data: {e}")))?;

    info!(product = %id, reviews = reviews.len(), overall = %report.overall, "Analyzed product");

    // Chart export is best-effort: run it to completion off the async
    // workers and discard the outcome either way.
    let charts = state.charts.clone();
    let counts = report.counts;
    let chart_id = id.clone();
    let render = tokio::task::spawn_blocking(move || charts.render(&chart_id, &name, &counts));
    if let Ok(Err(e)) = render.await {
        warn!(product = %id, error = %e, "Chart render failed");
    }

    Ok(Json(AnalyzeResponse {
        overall: report.overall,
        counts: report.counts,
    }))
}

/// GET /get-products — snapshot of every stored product summary.
pub async fn get_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.store.list_all())
}

/// GET /get-graph/{id} — the rendered chart artifact, if one exists.
pub async fn get_graph(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let not_found = || ApiError::NotFound("Graph not found".to_string());

    let path = state.charts.artifact_path(&id).ok_or_else(not_found)?;
    let bytes = tokio::fs::read(&path).await.map_err(|_| not_found())?;

    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}

/// DELETE /delete/{id} — drop the product summary and its artifact.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state
        .store
        .remove_by_id(&id)
        .map_err(|e| ApiError::Internal(format!("Failed to save data after deletion: {e}")))?;

    // Artifact removal is best-effort, like rendering.
    if let Err(e) = state.charts.remove(&id) {
        warn!(product = %id, error = %e, "Chart delete failed");
    }

    info!(product = %id, "Deleted product");

    Ok(Json(DeleteResponse { message: "Deleted" }))
}

// ── Tests ───────────────────────────────────────────────────────────
