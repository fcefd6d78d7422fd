use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ConfigError;
use crate::middleware;
use crate::openapi;
use crate::routes;
use crate::state::AppState;

/// Assemble the router with its middleware stack.
///
/// From the outside in: request id, tracing, CORS, request logging, error
/// reporting, panic recovery, rate limiting, then the routes.
pub fn build_app(state: AppState) -> Result<Router, ConfigError> {
    let config = state.config.clone();

    let mut router = Router::new().merge(routes::health::router());
    if config.environment.is_development() {
        router = router.merge(
            SwaggerUi::new("/api-docs").url("/swagger.json", openapi::document(&config.version)),
        );
    }

    let app = router
        .fallback(routes::not_found)
        .method_not_allowed_fallback(routes::not_found)
        .layer(middleware::rate_limit::layer(&config.rate_limit)?)
        .layer(CatchPanicLayer::custom(middleware::error_reporter::panic_response))
        .layer(middleware::error_reporter::ErrorReporterLayer::new(
            state.translations.clone(),
        ))
        .layer(axum::middleware::from_fn(
            middleware::request_logger::log_request,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(middleware::cors::build_cors_layer(&config.cors_origins)),
        )
        .with_state(state);

    Ok(app)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use groupware_core::Translations;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;

    fn app_with(vars: &[(&str, &str)]) -> Router {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = Config::from_lookup(|name| vars.get(name).cloned()).unwrap();
        let translations = Translations::embedded(&config.default_locale).unwrap();
        build_app(AppState::new(config, translations)).unwrap()
    }

    fn get(uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .uri(uri)
            .header("x-forwarded-for", "192.0.2.10")
    }

    async fn send(app: Router, request: axum::http::request::Builder) -> Response {
        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_a_localized_success_envelope() {
        let app = app_with(&[("APP_VERSION", "9.9.9")]);
        let response = send(app, get("/health").header(header::ACCEPT_LANGUAGE, "id")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(
            body_json(response).await,
            json!({
                "success": true,
                "code": "Success",
                "message": "Layanan berjalan normal",
                "data": {"status": "ok", "version": "9.9.9"}
            })
        );
    }

    #[tokio::test]
    async fn unknown_route_is_a_not_found_envelope() {
        let response = send(app_with(&[]), get("/nope?lng=id")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
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
    async fn wrong_method_is_a_not_found_envelope() {
        let response = send(
            app_with(&[]),
            get("/health")
                .method("POST")
                .header(header::ACCEPT_LANGUAGE, "id"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
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
    async fn default_locale_applies_without_preference() {
        let app = app_with(&[("DEFAULT_LOCALE", "id")]);
        let response = send(app, get("/nope")).await;
        assert_eq!(
            body_json(response).await["message"],
            "Sumber daya yang diminta tidak ditemukan"
        );
    }

    #[tokio::test]
    async fn rate_limit_applies_across_routes() {
        let app = app_with(&[("COMMON_RATE_LIMIT_MAX_REQUESTS", "2")]);
        for _ in 0..2 {
            let response = send(app.clone(), get("/health")).await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = send(app.clone(), get("/health")).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        let body = body_json(response).await;
        assert_eq!(body["code"], "TooManyRequests");
        assert_eq!(body["message"], "Too many requests, please try again later");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn swagger_is_served_in_development() {
        let app = app_with(&[("APP_ENV", "development"), ("APP_VERSION", "2.0.0")]);
        let response = send(app, get("/swagger.json")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let doc = body_json(response).await;
        assert_eq!(doc["info"]["version"], "2.0.0");
        assert!(doc["paths"]["/health"]["get"]["responses"]["422"].is_object());
    }

    #[tokio::test]
    async fn swagger_is_hidden_outside_development() {
        let response = send(app_with(&[("APP_ENV", "production")]), get("/swagger.json")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "NotFound");
    }
}
