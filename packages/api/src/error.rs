use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use diagnosis_model::PredictionError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportPolicy {
    Ignore,
    Report,
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: String,
}

/// Body of the 404 returned for unknown API routes.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NotFoundBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    public_code: &'static str,
    public_message: String,
    report_policy: ReportPolicy,
    report_summary: Option<String>,
}

impl ApiError {
    fn new(
        status: StatusCode,
        public_code: &'static str,
        public_message: impl Into<String>,
        report_policy: ReportPolicy,
    ) -> Self {
        Self {
            status,
            public_code,
            public_message: public_message.into(),
            report_policy,
            report_summary: None,
        }
    }

    fn with_report(mut self, summary: impl Into<String>) -> Self {
        self.report_summary = Some(summary.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.public_code
    }

    pub fn message(&self) -> &str {
        &self.public_message
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Bad request: {}", msg);
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, ReportPolicy::Ignore)
    }

    pub fn models_unavailable(public: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "MODELS_UNAVAILABLE",
            public,
            ReportPolicy::Report,
        )
        .with_report(reason)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error_id: Option<String> = None;
        if self.report_policy == ReportPolicy::Report {
            error_id = Some(uuid::Uuid::new_v4().to_string());
        }

        let mut response = (
            self.status,
            Json(ErrorBody {
                success: false,
                error: self.public_message.clone(),
                code: self.public_code.to_string(),
            }),
        )
            .into_response();

        if let Some(id) = error_id {
            // sentry-tracing turns this into a Sentry event on the Lambda host.
            tracing::error!(
                error_id = %id,
                status = self.status.as_u16(),
                code = self.public_code,
                summary = self.report_summary.as_deref().unwrap_or(&self.public_message),
                "Reported API error"
            );
            if let Ok(v) = HeaderValue::from_str(&id) {
                response.headers_mut().insert("x-error-id", v);
            }
        }

        response
    }
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        let public = err.to_string();
        match err {
            PredictionError::Unavailable { reason } => Self::models_unavailable(public, reason),
            PredictionError::MissingFeature(_) => {
                tracing::warn!("Bad request: {}", public);
                Self::new(StatusCode::BAD_REQUEST, "MISSING_FEATURE", public, ReportPolicy::Ignore)
            }
            PredictionError::InvalidFeature { .. } => {
                tracing::warn!("Bad request: {}", public);
                Self::new(StatusCode::BAD_REQUEST, "INVALID_FEATURE", public, ReportPolicy::Ignore)
            }
            PredictionError::InvalidRequest => Self::bad_request(public),
            PredictionError::Inference { detail } => {
                // Client input, so no report; the detail stays in the logs.
                tracing::warn!(detail = %detail, "Prediction failed");
                Self::new(
                    StatusCode::BAD_REQUEST,
                    "PREDICTION_FAILED",
                    public,
                    ReportPolicy::Ignore,
                )
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.public_code)
    }
}
