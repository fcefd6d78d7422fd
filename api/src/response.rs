use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use groupware_core::{SuccessEnvelope, build_success_envelope, build_success_envelope_with};
use serde::Serialize;

/// Successful handler result, serialized as a [`SuccessEnvelope`].
#[derive(Debug)]
pub struct Reply<T> {
    status: StatusCode,
    envelope: SuccessEnvelope<T>,
}

impl<T> Reply<T> {
    /// 200 with code `Success`.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        let (status, envelope) = build_success_envelope(data, message);
        Self::from_parts(status, envelope)
    }

    /// 201 with code `Created`.
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::with(data, message, "Created", StatusCode::CREATED)
    }

    pub fn with(data: T, message: impl Into<String>, code: &str, status: StatusCode) -> Self {
        let (status, envelope) = build_success_envelope_with(data, message, code, status.as_u16());
        Self::from_parts(status, envelope)
    }

    fn from_parts(status: u16, envelope: SuccessEnvelope<T>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::OK),
            envelope,
        }
    }
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}
