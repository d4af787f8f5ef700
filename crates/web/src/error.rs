use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lead_importer::ImporterError;
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Import(ImporterError),
    Validation(ValidationErrors),
    Body(JsonRejection),
    Unauthorized,
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import(e) => write!(f, "Import error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::Body(e) => write!(f, "Invalid body: {}", e),
            Self::Unauthorized => write!(f, "Unauthorized"),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            Self::Import(ImporterError::Unauthorized) => StatusCode::FORBIDDEN,
            Self::Import(ImporterError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Import(ImporterError::ParseError(_)) => StatusCode::BAD_REQUEST,
            Self::Import(ImporterError::DetectionFailed(_)) => StatusCode::BAD_GATEWAY,
            Self::Import(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Body(rejection) => rejection.status(),
        };

        let body = match &self {
            Self::Import(ImporterError::Unauthorized) => {
                json!({
                    "error": "Admin access required"
                })
            }
            Self::Import(e @ (ImporterError::InvalidInput(_) | ImporterError::ParseError(_))) => {
                json!({
                    "error": e.to_string()
                })
            }
            Self::Import(ImporterError::DetectionFailed(e)) => {
                tracing::error!("Conflict detection failed: {:?}", e);
                json!({
                    "error": "Could not check existing leads; nothing was imported"
                })
            }
            Self::Import(e) => {
                tracing::error!("Import error: {:?}", e);
                json!({
                    "error": "An internal error occurred"
                })
            }
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                json!({
                    "error": "Validation failed",
                    "details": field_errors
                })
            }
            Self::Body(rejection) => {
                json!({
                    "error": rejection.body_text()
                })
            }
            Self::Unauthorized => {
                json!({
                    "error": "Unauthorized"
                })
            }
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<ImporterError> for WebError {
    fn from(error: ImporterError) -> Self {
        Self::Import(error)
    }
}

impl From<JsonRejection> for WebError {
    fn from(error: JsonRejection) -> Self {
        Self::Body(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

pub type WebResult<T> = Result<T, WebError>;
