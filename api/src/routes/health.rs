use axum::extract::State;
use axum::{Router, routing::get};
use groupware_core::SuccessEnvelope;
use serde::Serialize;

use crate::language::Lang;
use crate::response::Reply;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness check, answered in the negotiated language
#[utoipa::path(
    get,
    path = "/health",
    params(
        ("lng" = Option<String>, Query, description = "Response language, e.g. `en` or `id`")
    ),
    responses(
        (status = 200, description = "Service is running", body = SuccessEnvelope<HealthResponse>)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>, Lang(lang): Lang) -> Reply<HealthResponse> {
    let message = state.translations.resolve(Some(lang.as_str()), "success.health");
    Reply::ok(
        HealthResponse {
            status: "ok".to_string(),
            version: state.config.version.clone(),
        },
        message,
    )
}
