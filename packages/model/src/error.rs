use std::path::PathBuf;

/// Failures while reading, decoding or validating the model artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported model: {0}")]
    Unsupported(String),

    #[error("malformed model: {0}")]
    Malformed(String),

    #[error("model feature '{0}' has no matching input column")]
    MissingColumn(String),

    #[error("model expects {expected} features but {actual} columns were supplied")]
    FeatureCount { expected: usize, actual: usize },

    #[error("label encoder has {encoder} classes but the model predicts {model}")]
    ClassCount { encoder: usize, model: usize },

    #[error("invalid label encoder: {0}")]
    Encoder(String),

    #[error("model loader task failed: {0}")]
    Loader(String),
}

/// Failures surfaced by a single prediction call.
///
/// The `Display` text of every variant is safe to return to clients; internal
/// detail lives in dedicated fields and is only logged.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PredictionError {
    #[error("Models not available. Please ensure models are deployed.")]
    Unavailable { reason: String },

    #[error("Missing feature: {0}")]
    MissingFeature(String),

    #[error("Invalid value for feature '{name}': expected a number or boolean")]
    InvalidFeature { name: String },

    #[error("Request body must be a JSON object")]
    InvalidRequest,

    #[error("Prediction failed for the supplied input")]
    Inference { detail: String },
}

impl PredictionError {
    pub fn inference(detail: impl Into<String>) -> Self {
        Self::Inference {
            detail: detail.into(),
        }
    }

    /// True for failures caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PredictionError::Unavailable { .. })
    }
}

impl From<ModelError> for PredictionError {
    fn from(err: ModelError) -> Self {
        PredictionError::inference(err.to_string())
    }
}
