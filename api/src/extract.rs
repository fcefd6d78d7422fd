//! Custom extractors that convert axum rejections to `AppError`s.
//!
//! Use `AppJson<T>` as a drop-in replacement for `axum::Json<T>` in handler signatures.
//! Unlike the standard extractor, body failures are reported through the error
//! envelope instead of axum's default plain-text responses.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use groupware_core::AppError;

use crate::error::HandlerError;

pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = HandlerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(map_json_rejection(rejection).into()),
        }
    }
}

/// Convert a `JsonRejection` to the matching `AppError`.
pub fn map_json_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => AppError::unsupported_media(),
        JsonRejection::JsonSyntaxError(_) => {
            AppError::bad_request().with_detail("body", "validation.malformed_json")
        }
        JsonRejection::JsonDataError(err) => {
            let (field, key) = describe_data_error(&err.body_text());
            AppError::validation().with_detail(field, key)
        }
        other => {
            tracing::debug!(rejection = %other.body_text(), "Unreadable request body");
            AppError::bad_request()
        }
    }
}

/// Field name and translation key for a serde data error.
///
/// axum reports the field path before the serde message:
/// "Failed to deserialize the JSON body into the target type: age: invalid type ..."
fn describe_data_error(msg: &str) -> (String, &'static str) {
    let detail = msg
        .split_once("target type: ")
        .map(|(_, rest)| rest)
        .unwrap_or(msg);
    let path = detail
        .split_once(": ")
        .map(|(head, _)| head)
        .filter(|head| !head.is_empty() && !head.contains(' ') && *head != ".");

    let named = extract_backticked(detail, "missing field `")
        .map(|field| (field, "validation.required"))
        .or_else(|| {
            extract_backticked(detail, "unknown field `").map(|field| (field, "validation.unknown_field"))
        });

    match (named, path) {
        (Some((field, key)), Some(path)) => (format!("{path}.{field}"), key),
        (Some((field, key)), None) => (field, key),
        (None, Some(path)) => (path.to_string(), "validation.invalid"),
        (None, None) => ("body".to_string(), "validation.invalid"),
    }
}

fn extract_backticked(msg: &str, prefix: &str) -> Option<String> {
    let start = msg.find(prefix)?;
    let after = &msg[start + prefix.len()..];
    let end = after.find('`')?;
    Some(after[..end].to_string())
}
