use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tower_http::request_id::RequestId;

/// Logs each incoming request under its request id.
///
/// Bodies are never logged.
pub async fn log_request(req: Request, next: Next) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("-")
        .to_owned();

    tracing::info!(
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
        query = req.uri().query().unwrap_or(""),
        "Incoming request"
    );

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tower::{ServiceBuilder, ServiceExt};
    use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};

    use super::*;

    #[tokio::test]
    async fn passes_request_through() {
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(axum::middleware::from_fn(log_request))
            .layer(ServiceBuilder::new().layer(SetRequestIdLayer::x_request_id(MakeRequestUuid)));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/ping?verbose=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"pong");
    }
}
