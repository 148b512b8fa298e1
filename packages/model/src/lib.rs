//! Disease prediction core.
//!
//! Holds the fixed feature schema, a pure-Rust evaluator for XGBoost JSON
//! tree ensembles, the label encoder, the lazily loaded [`store::ModelStore`]
//! and the [`service::PredictionService`] that ties them together.

pub mod booster;
pub mod encoder;
pub mod error;
pub mod schema;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{ModelError, PredictionError};
pub use schema::{FEATURE_COUNT, FEATURE_NAMES, FeatureFrame};
pub use service::{MODEL_FAMILY, PredictionResponse, PredictionService};
pub use store::{DEFAULT_MODEL_DIR, LoadedModels, ModelStore, StoreStatus};
