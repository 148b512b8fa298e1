use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::booster::argmax;
use crate::error::PredictionError;
use crate::schema::FeatureFrame;
use crate::store::{LoadedModels, ModelStore};

/// Reported as `model_used`; the only classifier this service runs.
pub const MODEL_FAMILY: &str = "xgboost";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PredictionResponse {
    pub success: bool,
    /// Predicted disease name
    pub prediction: String,
    /// Probability of the predicted class in percent, rounded to 2 decimals
    pub confidence: f64,
    pub model_used: String,
    /// Every known disease name mapped to its probability in percent
    pub all_probabilities: BTreeMap<String, f64>,
}

impl LoadedModels {
    pub fn predict(&self, frame: &FeatureFrame) -> Result<PredictionResponse, PredictionError> {
        let rows = self.binding.arrange(frame.values())?;
        let probabilities = self.booster.predict_proba(rows.view())?;
        let row: Vec<f32> = probabilities.row(0).to_vec();

        if row.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(PredictionError::inference(format!(
                "classifier produced invalid probabilities {row:?}"
            )));
        }

        let index = argmax(&row)
            .ok_or_else(|| PredictionError::inference("classifier produced no classes"))?;
        let disease = self.encoder.decode(index).ok_or_else(|| {
            PredictionError::inference(format!("class index {index} is not in the label encoder"))
        })?;

        let percent = |p: f32| f64::from(p) * 100.0;
        let all_probabilities = self
            .encoder
            .classes()
            .iter()
            .zip(&row)
            .map(|(class, p)| (class.clone(), percent(*p)))
            .collect();

        Ok(PredictionResponse {
            success: true,
            prediction: disease.to_string(),
            confidence: round2(percent(row[index])),
            model_used: MODEL_FAMILY.to_string(),
            all_probabilities,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Validation, inference and response shaping over a shared [`ModelStore`].
#[derive(Debug, Clone)]
pub struct PredictionService {
    store: Arc<ModelStore>,
}

impl PredictionService {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self { store }
    }

    /// Model availability is checked before the payload, so an unavailable
    /// store wins over a malformed request.
    pub async fn predict(&self, payload: &Value) -> Result<PredictionResponse, PredictionError> {
        let models = self.store.ensure_loaded().await?;
        let frame = FeatureFrame::from_payload(payload)?;
        let response = models.predict(&frame)?;

        tracing::debug!(
            prediction = %response.prediction,
            confidence = response.confidence,
            "Prediction complete"
        );
        Ok(response)
    }
}
