/// Top-level revlens error type.
///
/// All fallible operations in `revlens-core` return [`Result<T, RevlensError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum RevlensError {
    /// Error from the sentiment classification backend.
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    /// Error from the product store (load, serialize, persist).
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error rendering or deleting a chart artifact.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the sentiment classification backends.
///
/// Any variant means the whole batch failed; the adapters never return
/// partial results.
#[derive(thiserror::Error, Debug)]
pub enum ClassifierError {
    /// Model weights, config, or tokenizer could not be fetched or loaded.
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    /// Input text could not be tokenized.
    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    /// The forward pass itself failed.
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Network-level failure reaching a remote inference endpoint.
    #[error("Network error: {0}")]
    Network(String),

    /// Remote inference API returned a non-success HTTP status.
    #[error("API error (HTTP {status}): {body}")]
    Api {
        /// HTTP status code from the endpoint.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Response could not be parsed into predictions.
    #[error("Response parse error: {0}")]
    Parse(String),

    /// Classification did not complete within the configured deadline.
    #[error("Classification timed out after {0}s")]
    Timeout(u64),

    /// Classifier configuration is missing or invalid (backend, API key, device).
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors from the JSON-backed product store.
///
/// Startup load failures never surface here — a corrupt durable file resets
/// the collection to empty. These variants cover the write path.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Filesystem I/O error reading or writing the durable file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization of the collection failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The temp-write or atomic rename onto the target path failed.
    #[error("Persist failed: {0}")]
    Persist(String),
}

/// Errors rendering or removing chart artifacts.
///
/// These are always swallowed (logged at most) by callers; chart export is
/// best-effort and never affects the triggering operation.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// Chart drawing failed.
    #[error("Chart error: {0}")]
    Chart(String),

    /// Filesystem I/O error writing or deleting the artifact.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors in revlens configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Convenience alias for `Result<T, RevlensError>`.
pub type Result<T> = std::result::Result<T, RevlensError>;
