//! The fixed input schema of the classifier.
//!
//! Order matters: it is the column order of every [`FeatureFrame`] and the
//! order in which missing fields are reported.

use ndarray::{Array2, ArrayView2};
use serde_json::Value;

use crate::error::PredictionError;

pub const FEATURE_COUNT: usize = 46;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "gender",
    "smoker",
    "heart_rate",
    "blood_pressure",
    "cholesterol_level",
    "fever",
    "cough",
    "fatigue",
    "shortness_of_breath",
    "headache",
    "runny_nose",
    "sore_throat",
    "chest_pain",
    "body_ache",
    "nausea",
    "vomiting",
    "diarrhea",
    "dizziness",
    "chills",
    "loss_of_smell",
    "loss_of_taste",
    "wheezing",
    "rash",
    "eye_irritation",
    "ear_pain",
    "sweating",
    "joint_pain",
    "abdominal_pain",
    "back_pain",
    "blurred_vision",
    "dry_cough",
    "wet_cough",
    "sinus_pressure",
    "sneezing",
    "rapid_heartbeat",
    "slow_heartbeat",
    "dehydration",
    "loss_of_appetite",
    "sleep_disturbance",
    "anxiety",
    "irritability",
    "muscle_spasm",
    "skin_redness",
    "itchiness",
    "breathing_difficulty",
];

/// A single-row table labelled with [`FEATURE_NAMES`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    values: Array2<f32>,
}

impl FeatureFrame {
    /// Builds the row from a request body, walking the schema in order.
    ///
    /// The first absent (or `null`) feature aborts the walk. Booleans become
    /// `1.0` / `0.0`; anything else that is not a finite number is rejected.
    /// Keys outside the schema are ignored.
    pub fn from_payload(payload: &Value) -> Result<Self, PredictionError> {
        let object = payload
            .as_object()
            .ok_or(PredictionError::InvalidRequest)?;

        let mut row = Vec::with_capacity(FEATURE_COUNT);
        for name in FEATURE_NAMES {
            let value = match object.get(name) {
                None | Some(Value::Null) => {
                    return Err(PredictionError::MissingFeature(name.to_string()));
                }
                Some(value) => value,
            };
            row.push(feature_value(name, value)?);
        }

        Self::from_row(row)
    }

    pub fn from_row(row: Vec<f32>) -> Result<Self, PredictionError> {
        if row.len() != FEATURE_COUNT {
            return Err(PredictionError::inference(format!(
                "expected {} feature values, got {}",
                FEATURE_COUNT,
                row.len()
            )));
        }
        let values = Array2::from_shape_vec((1, FEATURE_COUNT), row)
            .map_err(|e| PredictionError::inference(e.to_string()))?;
        Ok(Self { values })
    }

    pub fn values(&self) -> ArrayView2<'_, f32> {
        self.values.view()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, name: &str) -> Option<f32> {
        let column = FEATURE_NAMES.iter().position(|feature| *feature == name)?;
        Some(self.values[[0, column]])
    }
}

fn feature_value(name: &str, value: &Value) -> Result<f32, PredictionError> {
    let number = match value {
        Value::Bool(flag) => {
            if *flag {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(number) => number.as_f64().map(|n| n as f32).unwrap_or(f32::NAN),
        _ => f32::NAN,
    };

    if number.is_finite() {
        Ok(number)
    } else {
        Err(PredictionError::InvalidFeature {
            name: name.to_string(),
        })
    }
}
