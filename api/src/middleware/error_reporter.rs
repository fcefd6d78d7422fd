use std::any::Any;
use std::convert::Infallible;
use std::error::Error;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::Json;
use axum::extract::Request;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use groupware_core::{Translations, build_error_envelope};
use tower::{Layer, Service, ServiceExt};
use tower_http::request_id::RequestId;

use crate::error::ReportedError;
use crate::language;

/// Tower Layer that turns failed requests into error envelopes.
///
/// Handlers, extractors and inner middleware fail by returning a response
/// carrying a [`ReportedError`]. This layer negotiates the request language,
/// renders the envelope and logs the original error. It never fails itself.
#[derive(Clone)]
pub struct ErrorReporterLayer {
    translations: Arc<Translations>,
}

impl ErrorReporterLayer {
    pub fn new(translations: Arc<Translations>) -> Self {
        Self { translations }
    }
}

impl<S> Layer<S> for ErrorReporterLayer {
    type Service = ErrorReporterService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorReporterService {
            inner,
            translations: self.translations.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ErrorReporterService<S> {
    inner: S,
    translations: Arc<Translations>,
}

impl<S> Service<Request> for ErrorReporterService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let not_ready = self.inner.clone();
        let ready = std::mem::replace(&mut self.inner, not_ready);
        let translations = self.translations.clone();

        // Headers are read up front; the request is moved into the inner service
        let language = language::negotiate(req.headers(), req.uri(), &translations)
            .map(str::to_owned);
        let context = RequestContext {
            request_id: req
                .extensions()
                .get::<RequestId>()
                .and_then(|id| id.header_value().to_str().ok())
                .map(str::to_owned),
            method: req.method().clone(),
            path: req.uri().path().to_owned(),
        };

        Box::pin(async move {
            let response = ready.oneshot(req).await.into_response();
            let Some(reported) = response.extensions().get::<ReportedError>().cloned() else {
                return Ok(response);
            };

            let (placeholder, _) = response.into_parts();
            let mut rendered = render_error(reported.error(), &translations, language.as_deref());
            log_failure(reported.error(), rendered.status(), &context);

            // Keep headers set along the failure path (e.g. retry-after)
            for (name, value) in placeholder.headers.iter() {
                if name != CONTENT_TYPE && name != CONTENT_LENGTH {
                    rendered.headers_mut().append(name.clone(), value.clone());
                }
            }
            Ok(rendered)
        })
    }
}

struct RequestContext {
    request_id: Option<String>,
    method: Method,
    path: String,
}

/// Status and JSON error envelope for `error` in `language`.
pub fn render_error(
    error: Option<&(dyn Error + 'static)>,
    translations: &Translations,
    language: Option<&str>,
) -> Response {
    let (status, envelope) = build_error_envelope(error, translations, language);
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope)).into_response()
}

fn log_failure(error: Option<&(dyn Error + 'static)>, status: StatusCode, context: &RequestContext) {
    let request_id = context.request_id.as_deref().unwrap_or("-");
    match error {
        Some(err) if status.is_server_error() => tracing::error!(
            request_id,
            method = %context.method,
            path = %context.path,
            status = status.as_u16(),
            error = %err,
            "Request failed"
        ),
        Some(err) => tracing::warn!(
            request_id,
            method = %context.method,
            path = %context.path,
            status = status.as_u16(),
            error = %err,
            "Request rejected"
        ),
        None => tracing::error!(
            request_id,
            method = %context.method,
            path = %context.path,
            status = status.as_u16(),
            "Request failed without an error value"
        ),
    }
}

/// Panic handler for `CatchPanicLayer::custom`: log the payload and hand the
/// request to the error reporter as a failure with no error value.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = detail, "Handler panicked");
    ReportedError::absent().into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{HeaderValue, header};
    use axum::routing::get;
    use axum::Router;
    use groupware_core::AppError;
    use serde_json::json;
    use tower_http::catch_panic::CatchPanicLayer;

    use super::*;
    use crate::error::HandlerError;

    async fn missing() -> Result<&'static str, HandlerError> {
        Err(AppError::not_found().into())
    }

    async fn invalid_email() -> Result<&'static str, HandlerError> {
        Err(AppError::validation()
            .with_detail("email", "errors.invalid_email")
            .into())
    }

    async fn broken_disk() -> Result<&'static str, HandlerError> {
        std::fs::read_to_string("/definitely/not/here/secret.txt")?;
        Ok("unreachable")
    }

    async fn throttled() -> Response {
        let mut response = HandlerError::from(AppError::rate_limit()).into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static("30"));
        response
    }

    async fn explode() -> &'static str {
        panic!("boom at /srv/app/src/handler.rs")
    }

    async fn fine() -> &'static str {
        "fine"
    }

    fn app() -> Router {
        let mut translations = Translations::embedded("en").unwrap();
        translations
            .add_json("fr", r#"{"errors": {"not_found": "Ressource introuvable"}}"#)
            .unwrap();
        Router::new()
            .route("/missing", get(missing))
            .route("/invalid-email", get(invalid_email))
            .route("/broken-disk", get(broken_disk))
            .route("/throttled", get(throttled))
            .route("/explode", get(explode))
            .route("/fine", get(fine))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(ErrorReporterLayer::new(Arc::new(translations)))
    }

    async fn call(uri: &str, accept_language: Option<&str>) -> Response {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(language) = accept_language {
            builder = builder.header(header::ACCEPT_LANGUAGE, language);
        }
        app()
            .oneshot(builder.body(Body::empty()).expect("request should build"))
            .await
            .expect("request should succeed")
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable")
            .to_vec()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_slice(&body_bytes(response).await).expect("body should be JSON")
    }

    #[tokio::test]
    async fn not_found_is_localized() {
        let response = call("/missing", Some("id-ID,id;q=0.9")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            body_json(response).await,
            json!({
                "success": false,
                "code": "NotFound",
                "message": "Sumber daya yang diminta tidak ditemukan"
            })
        );
    }

    #[tokio::test]
    async fn language_query_parameter_is_honoured() {
        let response = call("/missing?lng=fr", Some("id")).await;
        assert_eq!(body_json(response).await["message"], "Ressource introuvable");
    }

    #[tokio::test]
    async fn validation_detail_falls_back_to_default_language() {
        let indonesian = body_json(call("/invalid-email", Some("id")).await).await;
        assert_eq!(indonesian["errors"]["email"], "Alamat email tidak valid");

        let response = call("/invalid-email", Some("fr")).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let french = body_json(response).await;
        assert_eq!(french["code"], "ValidationError");
        assert_eq!(french["errors"]["email"], "Email address is not valid");
    }

    #[tokio::test]
    async fn unclassified_error_is_masked() {
        let response = call("/broken-disk", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(
            body,
            json!({
                "success": false,
                "code": "InternalServerError",
                "message": "An internal server error occurred"
            })
        );
    }

    #[tokio::test]
    async fn panic_is_reported_as_internal_error() {
        let response = call("/explode", Some("id")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = body_bytes(response).await;
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "InternalServerError");
        assert_eq!(body["message"], "Terjadi kesalahan internal pada server");
        assert!(!String::from_utf8_lossy(&bytes).contains("boom"));
    }

    #[tokio::test]
    async fn rate_limit_keeps_headers_and_omits_errors() {
        let response = call("/throttled", None).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "30");
        let body = body_json(response).await;
        assert_eq!(body["code"], "TooManyRequests");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn successful_responses_are_untouched() {
        let response = call("/fine", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"fine");
    }

    #[tokio::test]
    async fn same_error_renders_identical_bodies() {
        let first = body_bytes(call("/invalid-email", Some("id")).await).await;
        let second = body_bytes(call("/invalid-email", Some("id")).await).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn render_error_without_error_is_internal() {
        let translations = Translations::embedded("en").unwrap();
        let response = render_error(None, &translations, None);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["code"], "InternalServerError");
    }
}
