//! Test fixtures for revlens: deterministic classifier backends and a
//! disk-backed service harness over temp directories.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use revlens_core::analyze::SentimentAnalyzer;
use revlens_core::classifier::{Prediction, SentimentClassifier};
use revlens_core::error::ClassifierError;
use revlens_core::render::ChartExporter;
use revlens_core::store::ProductStore;
use revlens_core::types::SentimentLabel;
use revlens_server::AppState;

// ── Classifier stubs ───────────────────────────────────────────────

/// Deterministic keyword backend: "love"/"great" read positive,
/// "terrible"/"bad" negative, everything else neutral.
#[derive(Debug, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    fn label_for(text: &str) -> SentimentLabel {
        let lower = text.to_lowercase();
        if lower.contains("love") || lower.contains("great") {
            SentimentLabel::Positive
        } else if lower.contains("terrible") || lower.contains("bad") {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

#[async_trait::async_trait]
impl SentimentClassifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword-stub"
    }

    fn model_id(&self) -> &str {
        "keyword-stub"
    }

    async fn classify(&self, texts: &[String]) -> revlens_core::error::Result<Vec<Prediction>> {
        Ok(texts
            .iter()
            .map(|text| Prediction {
                label: Self::label_for(text),
                score: 0.9,
            })
            .collect())
    }
}

/// Backend that always errors, for the 500 path.
#[derive(Debug, Default)]
pub struct FailingClassifier;

#[async_trait::async_trait]
impl SentimentClassifier for FailingClassifier {
    fn name(&self) -> &str {
        "failing-stub"
    }

    fn model_id(&self) -> &str {
        "failing-stub"
    }

    async fn classify(&self, _texts: &[String]) -> revlens_core::error::Result<Vec<Prediction>> {
        Err(ClassifierError::Inference("stub backend down".into()).into())
    }
}

// ── Service harness ────────────────────────────────────────────────

/// A full service over temp directories, with an injected classifier.
/// Dropping it removes the store file and artifacts.
#[derive(Debug)]
pub struct TestService {
    pub state: AppState,
    dir: TempDir,
}

impl TestService {
    pub fn new() -> Self {
        Self::with_classifier(Arc::new(KeywordClassifier))
    }

    pub fn with_classifier(classifier: Arc<dyn SentimentClassifier>) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let state = Self::state_in(dir.path(), classifier);
        Self { state, dir }
    }

    /// Build an `AppState` rooted at `root` (store under `data/`, charts
    /// under `graphs/`).
    pub fn state_in(root: &Path, classifier: Arc<dyn SentimentClassifier>) -> AppState {
        let store = Arc::new(
            ProductStore::open(&root.join("data/analyzed.json")).expect("open product store"),
        );
        let charts =
            Arc::new(ChartExporter::new(&root.join("graphs")).expect("create chart exporter"));
        let analyzer = SentimentAnalyzer::new(classifier, Duration::from_secs(5));
        AppState::new(analyzer, store, charts)
    }

    pub fn app(&self) -> Router {
        revlens_server::router(self.state.clone())
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Rebuild the state over the same directories, as a process restart
    /// would: a fresh store loads the durable file from scratch.
    pub fn restart(&self) -> AppState {
        Self::state_in(self.root(), Arc::new(KeywordClassifier))
    }
}

impl Default for TestService {
    fn default() -> Self {
        Self::new()
    }
}

// ── Request helpers ────────────────────────────────────────────────

/// Drive one request through the router and decode the response as JSON
/// (`null` for non-JSON bodies such as image bytes).
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let request = builder.body(body).expect("build request");

    let response = app.oneshot(request).await.expect("dispatch request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();

    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}
