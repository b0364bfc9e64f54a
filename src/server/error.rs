use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::{ErrorPayload, RenderError};

/// Diagnostic attached to error responses for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub category: &'static str,
    pub detail: String,
}

/// A [`RenderError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(RenderError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        self.0.to_payload()
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let payload = self.payload();
        let report = ErrorReport {
            category: category_label(&payload),
            detail: payload.message.clone(),
        };

        let mut response = (status, Json(payload)).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

fn category_label(payload: &ErrorPayload) -> &'static str {
    use crate::ErrorCategory::*;
    match payload.category {
        Validation => "validation",
        Navigation => "navigation",
        Scroll => "scroll",
        Probe => "probe",
        Export => "export",
        Browser => "browser",
        Config => "config",
        Network => "network",
    }
}
