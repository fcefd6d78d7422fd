use std::collections::BTreeMap;
use std::error::Error;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, codes, keys};
use crate::i18n::Translations;

/// Body of every successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SuccessEnvelope<T> {
    /// Always `true`
    pub success: bool,
    /// Machine-readable result code (usually "Success")
    pub code: String,
    /// Human-readable message
    pub message: String,
    pub data: T,
}

/// Body of every failed response.
///
/// Clients branch on `success` before reading `errors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorEnvelope {
    /// Always `false`
    pub success: bool,
    /// Stable machine-readable error code (e.g. "NotFound", "ValidationError")
    pub code: String,
    /// Localized description of the failure
    pub message: String,
    /// Localized field-level messages, present only for errors with detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

/// Wrap `data` in a 200 `Success` envelope.
pub fn build_success_envelope<T>(data: T, message: impl Into<String>) -> (u16, SuccessEnvelope<T>) {
    build_success_envelope_with(data, message, codes::SUCCESS, 200)
}

/// Wrap `data` with an explicit code and status (e.g. 201 for creation).
pub fn build_success_envelope_with<T>(
    data: T,
    message: impl Into<String>,
    code: &str,
    status: u16,
) -> (u16, SuccessEnvelope<T>) {
    (
        status,
        SuccessEnvelope {
            success: true,
            code: code.to_string(),
            message: message.into(),
            data,
        },
    )
}

/// Convert any failure into the error envelope.
///
/// An [`AppError`] keeps its status and code and has its message and detail
/// localized. Anything else, including no error at all, becomes a generic
/// 500 whose body says nothing about the original error.
pub fn build_error_envelope(
    error: Option<&(dyn Error + 'static)>,
    translations: &Translations,
    language: Option<&str>,
) -> (u16, ErrorEnvelope) {
    match error.and_then(|err| err.downcast_ref::<AppError>()) {
        Some(app_error) => app_error.to_envelope(translations, language),
        None => internal_error_envelope(translations, language),
    }
}

impl AppError {
    pub fn to_envelope(&self, translations: &Translations, language: Option<&str>) -> (u16, ErrorEnvelope) {
        let errors = self.detail().map(|detail| {
            detail
                .iter()
                .map(|(field, key)| (field.clone(), translations.resolve(language, key)))
                .collect()
        });

        (
            self.status(),
            ErrorEnvelope {
                success: false,
                code: self.code().to_string(),
                message: translations.resolve(language, self.message_key()),
                errors,
            },
        )
    }
}

fn internal_error_envelope(translations: &Translations, language: Option<&str>) -> (u16, ErrorEnvelope) {
    (
        500,
        ErrorEnvelope {
            success: false,
            code: codes::INTERNAL_ERROR.to_string(),
            message: translations.resolve(language, keys::INTERNAL_SERVER),
            errors: None,
        },
    )
}
