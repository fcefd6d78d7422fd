use axum::body::Body;
use axum::http::{HeaderValue, Response, StatusCode, header};
use groupware_core::AppError;
use tower_governor::{
    GovernorError, GovernorLayer, governor::GovernorConfigBuilder,
    key_extractor::SmartIpKeyExtractor,
};

use crate::config::{ConfigError, RateLimitConfig};
use crate::error::ReportedError;

pub type RateLimitLayer =
    GovernorLayer<SmartIpKeyExtractor, governor::middleware::StateInformationMiddleware, Body>;

/// Per-IP limiter allowing `max_requests` per window.
///
/// The bucket holds `max_requests` cells and refills one cell every
/// `window / max_requests`, so a client that drained its budget recovers it
/// over one window. Every response reports the budget through
/// `x-ratelimit-limit` and `x-ratelimit-remaining`; rejections add
/// `x-ratelimit-after` and `retry-after`.
pub fn layer(config: &RateLimitConfig) -> Result<RateLimitLayer, ConfigError> {
    let window_ms = u64::try_from(config.window.as_millis()).unwrap_or(u64::MAX);
    let replenish_ms = (window_ms / u64::from(config.max_requests.max(1))).max(1);

    let governor = GovernorConfigBuilder::default()
        .per_millisecond(replenish_ms)
        .burst_size(config.max_requests)
        .key_extractor(SmartIpKeyExtractor)
        .use_headers()
        .finish()
        .ok_or_else(|| ConfigError::Invalid {
            name: "COMMON_RATE_LIMIT_MAX_REQUESTS",
            expected: "a positive integer",
            value: config.max_requests.to_string(),
        })?;

    Ok(GovernorLayer::new(governor).error_handler(rate_limit_error_handler))
}

/// Hands limiter failures to the error reporter, keeping `retry-after`.
fn rate_limit_error_handler(err: GovernorError) -> Response<Body> {
    match err {
        GovernorError::TooManyRequests { wait_time, headers } => {
            let mut response = ReportedError::new(AppError::rate_limit())
                .into_response_with_status(StatusCode::TOO_MANY_REQUESTS);
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(wait_time));
            response
        }
        GovernorError::UnableToExtractKey => {
            tracing::warn!("Unable to determine client address for rate limiting");
            ReportedError::new(AppError::internal())
                .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
        GovernorError::Other { code, msg, .. } => {
            tracing::warn!(status = code.as_u16(), msg = ?msg, "Rate limiter rejected request");
            ReportedError::new(AppError::internal())
                .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
