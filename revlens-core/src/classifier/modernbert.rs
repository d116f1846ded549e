//! Local sentiment backend: multilingual ModernBERT sequence classification
//! via candle, with weights pulled from the Hugging Face hub on first load.

use std::collections::HashMap;
use std::sync::Arc;

use candle_core::{D, DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_nn::ops::softmax;
use candle_transformers::models::modernbert::{Config, ModernBertForSequenceClassification};
use hf_hub::{Repo, RepoType, api::sync::Api};
use serde::Deserialize;
use tokenizers::Tokenizer;

use crate::config::ModelSize;
use crate::error::ClassifierError;
use crate::types::SentimentLabel;

use super::{Prediction, SentimentClassifier};

/// Hub repository for a given checkpoint size.
pub fn model_id_for(size: ModelSize) -> &'static str {
    match size {
        ModelSize::Base => "clapAI/modernBERT-base-multilingual-sentiment",
        ModelSize::Large => "clapAI/modernBERT-large-multilingual-sentiment",
    }
}

/// Parse a device spec: `cpu` or `cuda:N`.
pub fn parse_device(spec: &str) -> Result<Device, ClassifierError> {
    match spec.trim() {
        "cpu" => Ok(Device::Cpu),
        other => {
            if let Some(ordinal) = other.strip_prefix("cuda:") {
                let ordinal: usize = ordinal.parse().map_err(|_| {
                    ClassifierError::Config(format!("invalid cuda ordinal in device '{other}'"))
                })?;
                Device::new_cuda(ordinal)
                    .map_err(|e| ClassifierError::Config(format!("cuda device unavailable: {e}")))
            } else {
                Err(ClassifierError::Config(format!(
                    "unknown device '{other}', expected 'cpu' or 'cuda:N'"
                )))
            }
        }
    }
}

struct Inner {
    model: ModernBertForSequenceClassification,
    tokenizer: Tokenizer,
    id2label: HashMap<String, String>,
    device: Device,
}

/// Candle-backed ModernBERT sentiment classifier.
///
/// The whole batch goes through one padded forward pass; inference runs on
/// the blocking pool since candle compute would otherwise stall the async
/// workers.
#[derive(Clone)]
pub struct ModernBertClassifier {
    inner: Arc<Inner>,
    model_id: &'static str,
}

/// The classifier head's label table from the hub `config.json`.
#[derive(Deserialize)]
struct ClassifierConfigJson {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

impl ModernBertClassifier {
    /// Download (or reuse the hub cache for) config, weights, and tokenizer,
    /// then assemble the model on `device`.
    pub fn load(size: ModelSize, device: &Device) -> Result<Self, ClassifierError> {
        let model_id = model_id_for(size);
        let api = Api::new().map_err(|e| ClassifierError::ModelLoad(e.to_string()))?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .map_err(|e| ClassifierError::ModelLoad(format!("{model_id}/config.json: {e}")))?;
        let weights_path = repo
            .get("model.safetensors")
            .or_else(|_| repo.get("pytorch_model.bin"))
            .map_err(|e| ClassifierError::ModelLoad(format!("{model_id} weights: {e}")))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| ClassifierError::ModelLoad(format!("{model_id}/tokenizer.json: {e}")))?;

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| ClassifierError::ModelLoad(e.to_string()))?;
        let config: Config = serde_json::from_str(&config_str)
            .map_err(|e| ClassifierError::ModelLoad(format!("config parse: {e}")))?;
        let class_cfg: ClassifierConfigJson = serde_json::from_str(&config_str)
            .map_err(|e| ClassifierError::ModelLoad(format!("config parse: {e}")))?;

        let vb = load_var_builder(&weights_path, device)?;
        let model = ModernBertForSequenceClassification::load(vb, &config)
            .map_err(|e| ClassifierError::ModelLoad(e.to_string()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ClassifierError::ModelLoad(format!("tokenizer: {e}")))?;

        Ok(Self {
            inner: Arc::new(Inner {
                model,
                tokenizer,
                id2label: class_cfg.id2label,
                device: device.clone(),
            }),
            model_id,
        })
    }
}

#[allow(unsafe_code)] // mmap of the safetensors file, as upstream candle requires
fn load_var_builder(
    weights_path: &std::path::Path,
    device: &Device,
) -> Result<VarBuilder<'static>, ClassifierError> {
    let vb = if weights_path.extension().is_some_and(|e| e == "safetensors") {
        unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path.to_path_buf()], DType::F32, device)
        }
    } else {
        VarBuilder::from_pth(weights_path, DType::F32, device)
    };
    vb.map_err(|e| ClassifierError::ModelLoad(e.to_string()))
}

impl Inner {
    /// Tokenize, pad to the longest sequence, and classify the whole batch
    /// in one forward pass.
    fn classify_batch(&self, texts: &[String]) -> Result<Vec<Prediction>, ClassifierError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut encodings = Vec::with_capacity(texts.len());
        for text in texts {
            let encoding = self
                .tokenizer
                .encode(text.as_str(), true)
                .map_err(|e| ClassifierError::Tokenization(e.to_string()))?;
            encodings.push(encoding);
        }

        let max_len = encodings.iter().map(tokenizers::Encoding::len).max().unwrap_or(0);
        let pad_token_id = self
            .tokenizer
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| self.tokenizer.token_to_id("[PAD]"))
            .unwrap_or(0);

        let mut all_token_ids: Vec<u32> = Vec::with_capacity(texts.len() * max_len);
        let mut all_attention_masks: Vec<u32> = Vec::with_capacity(texts.len() * max_len);
        for encoding in &encodings {
            let mut token_ids = encoding.get_ids().to_vec();
            let mut attention_mask = encoding.get_attention_mask().to_vec();
            token_ids.resize(max_len, pad_token_id);
            attention_mask.resize(max_len, 0);
            all_token_ids.extend(token_ids);
            all_attention_masks.extend(attention_mask);
        }

        let input_ids = Tensor::from_vec(all_token_ids, (texts.len(), max_len), &self.device)
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        let attention_mask =
            Tensor::from_vec(all_attention_masks, (texts.len(), max_len), &self.device)
                .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let logits = self
            .model
            .forward(&input_ids, &attention_mask)
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        let probs = softmax(&logits, D::Minus1)
            .and_then(|p| p.to_vec2::<f32>())
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let mut predictions = Vec::with_capacity(texts.len());
        for row in probs {
            let (pred_id, score) = row
                .iter()
                .copied()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .ok_or_else(|| ClassifierError::Inference("empty logits row".to_string()))?;

            let raw_label = self
                .id2label
                .get(&pred_id.to_string())
                .ok_or_else(|| {
                    ClassifierError::Parse(format!("predicted id '{pred_id}' not in id2label"))
                })?;

            predictions.push(Prediction {
                label: SentimentLabel::from_model_label(raw_label),
                score,
            });
        }

        Ok(predictions)
    }
}

impl std::fmt::Debug for ModernBertClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModernBertClassifier")
            .field("model_id", &self.model_id)
            .field("device", &self.inner.device)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl SentimentClassifier for ModernBertClassifier {
    fn name(&self) -> &str {
        "modernbert"
    }

    fn model_id(&self) -> &str {
        self.model_id
    }

    async fn classify(&self, texts: &[String]) -> crate::error::Result<Vec<Prediction>> {
        let inner = Arc::clone(&self.inner);
        let texts = texts.to_vec();
        let predictions = tokio::task::spawn_blocking(move || inner.classify_batch(&texts))
            .await
            .map_err(|e| ClassifierError::Inference(format!("inference task failed: {e}")))??;
        Ok(predictions)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
