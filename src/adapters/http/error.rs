use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use tracing::{error, warn};

use crate::application::dto::ErrorResponse;
use crate::domain::errors::DomainError;

/// Cómo se devuelve el cuerpo del error: `/predict` responde JSON, `/predict-img` texto plano.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorBody {
    Json,
    Text,
}

#[derive(Debug)]
pub struct ApiError {
    pub error: DomainError,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn json(error: DomainError) -> Self {
        Self { error, body: ErrorBody::Json }
    }

    pub fn text(error: DomainError) -> Self {
        Self { error, body: ErrorBody::Text }
    }

    pub fn status(&self) -> StatusCode {
        match &self.error {
            DomainError::MissingImage
            | DomainError::Decode(_)
            | DomainError::MalformedUpload(_)
            | DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DomainError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DomainError::InferenceTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Mensaje visible para el cliente; los fallos internos no exponen detalles.
    pub fn message(&self) -> String {
        match &self.error {
            DomainError::Inference(_) => "Inference failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{} -> {}", self.error, status);
        } else {
            warn!("{} -> {}", self.error, status);
        }

        let message = self.message();
        match self.body {
            ErrorBody::Json => (status, Json(ErrorResponse::new(message))).into_response(),
            ErrorBody::Text => (status, message).into_response(),
        }
    }
}
