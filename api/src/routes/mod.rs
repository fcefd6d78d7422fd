use groupware_core::AppError;

use crate::error::HandlerError;

pub mod health;

/// Fallback for unmatched routes.
pub async fn not_found() -> HandlerError {
    AppError::not_found().into()
}
