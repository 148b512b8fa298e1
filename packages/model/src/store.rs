//! Process-wide cache of the model artifacts.
//!
//! The store moves `Unloaded -> Loading -> Ready` on success and
//! `Unloaded -> Loading -> Unavailable` on any failure. Both end states are
//! final: a failed load is never retried, the process has to be restarted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::booster::{Booster, ColumnBinding};
use crate::encoder::LabelEncoder;
use crate::error::{ModelError, PredictionError};
use crate::schema::FEATURE_NAMES;

pub const DEFAULT_MODEL_DIR: &str = "models";
pub const CLASSIFIER_FILE: &str = "xgb_model.json";
pub const ENCODER_FILE: &str = "label_encoder.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Unloaded,
    Loading,
    Ready,
    Unavailable,
}

enum StoreState {
    Unloaded,
    Loading,
    Ready(Arc<LoadedModels>),
    Unavailable(String),
}

/// Classifier, encoder and the column binding computed against the schema.
#[derive(Debug)]
pub struct LoadedModels {
    pub booster: Booster,
    pub encoder: LabelEncoder,
    pub binding: ColumnBinding,
}

impl LoadedModels {
    pub fn new(booster: Booster, encoder: LabelEncoder) -> Result<Self, ModelError> {
        if encoder.len() != booster.num_classes() {
            return Err(ModelError::ClassCount {
                encoder: encoder.len(),
                model: booster.num_classes(),
            });
        }
        let binding = booster.bind(&FEATURE_NAMES)?;
        Ok(Self {
            booster,
            encoder,
            binding,
        })
    }

    pub fn from_dir(dir: &Path) -> Result<Self, ModelError> {
        let booster = Booster::from_path(&dir.join(CLASSIFIER_FILE))?;
        let encoder = LabelEncoder::from_path(&dir.join(ENCODER_FILE))?;
        Self::new(booster, encoder)
    }
}

pub struct ModelStore {
    dir: PathBuf,
    state: RwLock<StoreState>,
    load_gate: tokio::sync::Mutex<()>,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            state: RwLock::new(StoreState::Unloaded),
            load_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// A store that already holds its models, for callers that build them in memory.
    pub fn with_models(models: LoadedModels) -> Self {
        Self {
            dir: PathBuf::new(),
            state: RwLock::new(StoreState::Ready(Arc::new(models))),
            load_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current state, without triggering a load.
    pub fn status(&self) -> StoreStatus {
        match &*self.state.read() {
            StoreState::Unloaded => StoreStatus::Unloaded,
            StoreState::Loading => StoreStatus::Loading,
            StoreState::Ready(_) => StoreStatus::Ready,
            StoreState::Unavailable(_) => StoreStatus::Unavailable,
        }
    }

    /// Loads the models if that has not been attempted yet.
    pub async fn is_available(&self) -> bool {
        self.ensure_loaded().await.is_ok()
    }

    pub async fn ensure_loaded(&self) -> Result<Arc<LoadedModels>, PredictionError> {
        if let Some(settled) = self.settled() {
            return settled;
        }

        // Concurrent cold-start callers queue here and pick up the result of
        // whichever call performed the load.
        let _gate = self.load_gate.lock().await;
        if let Some(settled) = self.settled() {
            return settled;
        }

        *self.state.write() = StoreState::Loading;
        // A caller dropped mid-load puts the store back to `Unloaded`; the
        // abandoned blocking task still finishes, and the next caller loads again.
        let mut pending = PendingLoad {
            state: &self.state,
            settled: false,
        };
        tracing::info!(dir = %self.dir.display(), "Loading models");

        let dir = self.dir.clone();
        let outcome = tokio::task::spawn_blocking(move || LoadedModels::from_dir(&dir))
            .await
            .unwrap_or_else(|err| Err(ModelError::Loader(err.to_string())));
        pending.settled = true;

        match outcome {
            Ok(models) => {
                tracing::info!(
                    classes = models.encoder.len(),
                    trees = models.booster.num_trees(),
                    "Models loaded successfully"
                );
                let models = Arc::new(models);
                *self.state.write() = StoreState::Ready(models.clone());
                Ok(models)
            }
            Err(err) => {
                tracing::error!(error = %err, "Error loading models");
                let reason = err.to_string();
                *self.state.write() = StoreState::Unavailable(reason.clone());
                Err(PredictionError::Unavailable { reason })
            }
        }
    }

    fn settled(&self) -> Option<Result<Arc<LoadedModels>, PredictionError>> {
        match &*self.state.read() {
            StoreState::Ready(models) => Some(Ok(models.clone())),
            StoreState::Unavailable(reason) => Some(Err(PredictionError::Unavailable {
                reason: reason.clone(),
            })),
            StoreState::Unloaded | StoreState::Loading => None,
        }
    }
}

struct PendingLoad<'a> {
    state: &'a RwLock<StoreState>,
    settled: bool,
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        if !self.settled {
            *self.state.write() = StoreState::Unloaded;
        }
    }
}

impl std::fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelStore")
            .field("dir", &self.dir)
            .field("status", &self.status())
            .finish()
    }
}
