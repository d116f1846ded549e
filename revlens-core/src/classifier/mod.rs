pub mod modernbert;
pub mod remote;

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::config::{ClassifierBackend, ClassifierSection};
use crate::error::{ClassifierError, RevlensError};
use crate::types::SentimentLabel;

/// One classified review: the bucketed label plus the model's confidence
/// in its top class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: SentimentLabel,
    pub score: f32,
}

/// Common interface for sentiment classification backends.
///
/// `classify` is order-preserving and all-or-nothing: one prediction per
/// input text, or an error for the whole batch — never partial results.
/// Inputs are assumed non-empty; sanitation is the caller's job.
#[async_trait::async_trait]
pub trait SentimentClassifier: Send + Sync + std::fmt::Debug {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// The model ID being used.
    fn model_id(&self) -> &str;

    /// Classify a batch of texts in a single call.
    async fn classify(&self, texts: &[String]) -> crate::error::Result<Vec<Prediction>>;
}

/// Construct a classification backend from configuration.
///
/// This is where the expensive work happens for the local backend (hub
/// download, weight mmap) — call it from a blocking context, or go through
/// [`LazyClassifier`] which defers it to first use.
pub fn create_classifier(
    config: &ClassifierSection,
) -> crate::error::Result<Arc<dyn SentimentClassifier>> {
    match config.backend {
        ClassifierBackend::Modernbert => {
            let device = modernbert::parse_device(&config.device)?;
            let backend = modernbert::ModernBertClassifier::load(config.size, &device)?;
            Ok(Arc::new(backend))
        }
        ClassifierBackend::Remote => {
            let api_key = std::env::var(&config.api_key_env).map_err(|_| {
                ClassifierError::Config(format!(
                    "remote backend requires {} to be set",
                    config.api_key_env
                ))
            })?;
            let backend = remote::RemoteClassifier::new(config.remote_model_id.clone(), api_key);
            Ok(Arc::new(backend))
        }
    }
}

type BackendFactory =
    Arc<dyn Fn() -> crate::error::Result<Arc<dyn SentimentClassifier>> + Send + Sync>;

/// Deferred-construction decorator around a classification backend.
///
/// Process start stays cheap: the underlying backend is built on the first
/// `classify` call, on the blocking pool, and exactly once even under
/// concurrent first use (single-flight via [`OnceCell`]). A failed
/// construction is not cached — a later call retries.
pub struct LazyClassifier {
    name: String,
    model_id: String,
    factory: BackendFactory,
    cell: OnceCell<Arc<dyn SentimentClassifier>>,
}

impl LazyClassifier {
    /// Defer construction of the configured backend.
    pub fn from_config(config: &ClassifierSection) -> Self {
        let (name, model_id) = match config.backend {
            ClassifierBackend::Modernbert => (
                "modernbert".to_string(),
                modernbert::model_id_for(config.size).to_string(),
            ),
            ClassifierBackend::Remote => ("remote".to_string(), config.remote_model_id.clone()),
        };
        let config = config.clone();
        Self {
            name,
            model_id,
            factory: Arc::new(move || create_classifier(&config)),
            cell: OnceCell::new(),
        }
    }

    /// Defer construction to an arbitrary factory (used by tests to count
    /// constructions and by callers embedding custom backends).
    pub fn with_factory(
        name: impl Into<String>,
        model_id: impl Into<String>,
        factory: BackendFactory,
    ) -> Self {
        Self {
            name: name.into(),
            model_id: model_id.into(),
            factory,
            cell: OnceCell::new(),
        }
    }

    /// Whether the underlying backend has been constructed yet.
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    async fn backend(&self) -> crate::error::Result<&Arc<dyn SentimentClassifier>> {
        self.cell
            .get_or_try_init(|| {
                let factory = Arc::clone(&self.factory);
                async move {
                    tokio::task::spawn_blocking(move || factory())
                        .await
                        .map_err(|e| {
                            RevlensError::Classifier(ClassifierError::ModelLoad(format!(
                                "backend construction task failed: {e}"
                            )))
                        })?
                }
            })
            .await
    }
}

impl std::fmt::Debug for LazyClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyClassifier")
            .field("name", &self.name)
            .field("model_id", &self.model_id)
            .field("initialized", &self.cell.initialized())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl SentimentClassifier for LazyClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn classify(&self, texts: &[String]) -> crate::error::Result<Vec<Prediction>> {
        let backend = self.backend().await?;
        backend.classify(texts).await
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug)]
    struct FixedClassifier;

    #[async_trait::async_trait]
    impl SentimentClassifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        fn model_id(&self) -> &str {
            "fixed-model"
        }

        async fn classify(&self, texts: &[String]) -> crate::error::Result<Vec<Prediction>> {
            Ok(texts
                .iter()
                .map(|_| Prediction {
                    label: SentimentLabel::Neutral,
                    score: 1.0,
                })
                .collect())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lazy_constructs_backend_exactly_once() {
        static CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

        let lazy = Arc::new(LazyClassifier::with_factory(
            "fixed",
            "fixed-model",
            Arc::new(|| {
                CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(FixedClassifier) as Arc<dyn SentimentClassifier>)
            }),
        ));
        assert!(!lazy.is_initialized());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let lazy = Arc::clone(&lazy);
            handles.push(tokio::spawn(async move {
                lazy.classify(&["ok".to_string()]).await
            }));
        }
        for handle in handles {
            let predictions = handle.await.unwrap().unwrap();
            assert_eq!(predictions.len(), 1);
        }

        assert!(lazy.is_initialized());
        assert_eq!(CONSTRUCTIONS.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lazy_failed_construction_retries() {
        static ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

        let lazy = LazyClassifier::with_factory(
            "flaky",
            "flaky-model",
            Arc::new(|| {
                if ATTEMPTS.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ClassifierError::ModelLoad("first attempt fails".into()).into())
                } else {
                    Ok(Arc::new(FixedClassifier) as Arc<dyn SentimentClassifier>)
                }
            }),
        );

        let texts = vec!["ok".to_string()];
        assert!(lazy.classify(&texts).await.is_err());
        assert!(!lazy.is_initialized());
        assert!(lazy.classify(&texts).await.is_ok());
        assert_eq!(ATTEMPTS.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn factory_reports_missing_api_key() {
        let config = ClassifierSection {
            backend: ClassifierBackend::Remote,
            api_key_env: "REVLENS_TEST_NO_SUCH_TOKEN".to_string(),
            ..ClassifierSection::default()
        };
        let err = create_classifier(&config).unwrap_err();
        assert!(matches!(
            err,
            RevlensError::Classifier(ClassifierError::Config(_))
        ));
    }
}
