use utoipa::OpenApi;

use crate::error::{ErrorBody, NotFoundBody};
use crate::routes::{features, health, predict};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Disease Prediction API",
        description = "Predicts a disease from 46 patient features with a gradient-boosted classifier"
    ),
    paths(health::health, features::features, predict::predict),
    components(schemas(
        health::HealthResponse,
        features::FeaturesResponse,
        diagnosis_model::PredictionResponse,
        ErrorBody,
        NotFoundBody
    )),
    tags(
        (name = "prediction", description = "Feature schema and disease prediction"),
        (name = "health", description = "Service and model availability")
    )
)]
pub struct ApiDoc;
