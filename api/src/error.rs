use std::error::Error;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use groupware_core::AppError;

/// Error returned by handlers and extractors.
///
/// Any error converts into it with `?`. Domain failures should be an
/// [`AppError`]; everything else is reported as an internal error. The response
/// produced here only carries the error along: `ErrorReporterLayer` replaces it
/// with the localized envelope.
#[derive(Debug)]
pub struct HandlerError(Arc<dyn Error + Send + Sync>);

impl HandlerError {
    pub fn app_error(&self) -> Option<&AppError> {
        self.0.downcast_ref::<AppError>()
    }
}

impl<E> From<E> for HandlerError
where
    E: Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        HandlerError(Arc::new(err))
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self
            .app_error()
            .and_then(|err| StatusCode::from_u16(err.status()).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        ReportedError(Some(self.0)).into_response_with_status(status)
    }
}

/// Response extension marking a failed request for the error reporter.
///
/// `None` means the request failed without an error value (a panic).
#[derive(Debug, Clone)]
pub struct ReportedError(Option<Arc<dyn Error + Send + Sync>>);

impl ReportedError {
    pub fn new<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        ReportedError(Some(Arc::new(err)))
    }

    pub fn absent() -> Self {
        ReportedError(None)
    }

    pub fn error(&self) -> Option<&(dyn Error + 'static)> {
        self.0.as_deref().map(|err| err as &(dyn Error + 'static))
    }

    /// Empty placeholder response carrying this marker.
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        let mut response = status.into_response();
        response.extensions_mut().insert(self);
        response
    }
}
