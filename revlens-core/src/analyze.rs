//! Sentiment aggregation: one classifier batch call reduced to per-label
//! counts and an overall label.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::classifier::SentimentClassifier;
use crate::error::ClassifierError;
use crate::types::{SentimentCounts, SentimentLabel};

/// The outcome of analyzing one batch of reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentimentReport {
    pub counts: SentimentCounts,
    pub overall: SentimentLabel,
}

/// Aggregates review batches through an injected classification backend.
///
/// The backend is passed in explicitly (an [`Arc<dyn SentimentClassifier>`],
/// typically a `LazyClassifier`) rather than reached through any global.
#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    classifier: Arc<dyn SentimentClassifier>,
    timeout: Duration,
}

impl SentimentAnalyzer {
    pub fn new(classifier: Arc<dyn SentimentClassifier>, timeout: Duration) -> Self {
        Self {
            classifier,
            timeout,
        }
    }

    /// Classify `reviews` as one batch and reduce to counts + overall label.
    ///
    /// Inputs must already be sanitized: non-empty, trimmed. Classification
    /// is bounded by the configured timeout; on timeout or backend failure
    /// the whole analysis fails — no partial counts.
    pub async fn analyze(&self, reviews: &[String]) -> crate::error::Result<SentimentReport> {
        let predictions =
            tokio::time::timeout(self.timeout, self.classifier.classify(reviews))
                .await
                .map_err(|_| ClassifierError::Timeout(self.timeout.as_secs()))??;

        if predictions.len() != reviews.len() {
            return Err(ClassifierError::Inference(format!(
                "backend returned {} predictions for {} reviews",
                predictions.len(),
                reviews.len()
            ))
            .into());
        }

        let mut counts = SentimentCounts::default();
        for prediction in &predictions {
            counts.record(prediction.label);
        }
        let overall = counts.overall();

        debug!(
            backend = self.classifier.name(),
            reviews = reviews.len(),
            %overall,
            "Aggregated sentiment batch"
        );

        Ok(SentimentReport { counts, overall })
    }
}

// ── Tests ───────────────────────────────────────────────────────────
