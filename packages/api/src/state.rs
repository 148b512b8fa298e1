use diagnosis_model::{ModelStore, PredictionService};
use std::{path::PathBuf, sync::Arc};

pub type AppState = Arc<State>;

pub struct State {
    pub store: Arc<ModelStore>,
    pub predictor: PredictionService,
}

impl State {
    pub fn new(store: Arc<ModelStore>) -> Self {
        let predictor = PredictionService::new(store.clone());
        Self { store, predictor }
    }

    /// Lazy store over `dir`; nothing is read until the first request.
    pub fn from_model_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(ModelStore::new(dir)))
    }

    /// Loads the models now instead of on the first request. Failure is
    /// logged and leaves the store unavailable; it never aborts startup.
    pub async fn preload(&self) -> bool {
        let available = self.store.is_available().await;
        if !available {
            tracing::warn!(
                dir = %self.store.dir().display(),
                "Serving without models; every prediction will fail until restart"
            );
        }
        available
    }
}
