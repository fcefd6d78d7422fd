pub mod envelope;
pub mod error;
pub mod i18n;

pub use envelope::{
    ErrorEnvelope, SuccessEnvelope, build_error_envelope, build_success_envelope,
    build_success_envelope_with,
};
pub use error::{AppError, ErrorKind};
pub use i18n::Translations;
