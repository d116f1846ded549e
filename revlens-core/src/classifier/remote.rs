//! Remote sentiment backend: Hugging Face Inference API over HTTPS.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClassifierError;
use crate::types::SentimentLabel;

use super::{Prediction, SentimentClassifier};

/// Hosted text-classification backend.
///
/// Useful where pulling model weights onto the serving host is not an
/// option; the trade is a network dependency on the inference endpoint.
#[derive(Debug)]
pub struct RemoteClassifier {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl RemoteClassifier {
    pub fn new(model: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            model,
            api_key,
            base_url: "https://api-inference.huggingface.co".to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a [String],
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

/// One ranked class from the API; each input text gets a list of these.
#[derive(Deserialize)]
struct RankedLabel {
    label: String,
    score: f32,
}

#[async_trait::async_trait]
impl SentimentClassifier for RemoteClassifier {
    fn name(&self) -> &str {
        "remote"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn classify(&self, texts: &[String]) -> crate::error::Result<Vec<Prediction>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/models/{}", self.base_url, self.model);
        let body = InferenceRequest {
            inputs: texts,
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        debug!(model = %self.model, batch = texts.len(), "Calling inference API");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClassifierError::Api { status, body }.into());
        }

        let ranked: Vec<Vec<RankedLabel>> = resp
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(e.to_string()))?;

        if ranked.len() != texts.len() {
            return Err(ClassifierError::Parse(format!(
                "expected {} results, got {}",
                texts.len(),
                ranked.len()
            ))
            .into());
        }

        let mut predictions = Vec::with_capacity(ranked.len());
        for classes in ranked {
            let top = classes
                .into_iter()
                .max_by(|a, b| a.score.total_cmp(&b.score))
                .ok_or_else(|| {
                    ClassifierError::Parse("empty class list for input".to_string())
                })?;
            predictions.push(Prediction {
                label: SentimentLabel::from_model_label(&top.label),
                score: top.score,
            });
        }

        Ok(predictions)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranked_response_shape_parses() {
        let raw = r#"[[{"label":"Very Positive","score":0.91},{"label":"Neutral","score":0.06}]]"#;
        let ranked: Vec<Vec<RankedLabel>> = serde_json::from_str(raw).unwrap();
        let top = ranked[0]
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .unwrap();
        assert_eq!(SentimentLabel::from_model_label(&top.label), SentimentLabel::Positive);
    }

    #[test]
    fn base_url_override() {
        let classifier = RemoteClassifier::new("m".into(), "k".into())
            .with_base_url("http://localhost:9999".into());
        assert_eq!(classifier.base_url, "http://localhost:9999");
        assert_eq!(classifier.model_id(), "m");
    }
}
