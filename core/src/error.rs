use std::borrow::Cow;
use std::collections::BTreeMap;

/// Error codes used across the API.
///
/// Codes are stable identifiers for programmatic branching. They never carry
/// runtime data; anything request specific belongs in the message or detail.
pub mod codes {
    pub const SUCCESS: &str = "Success";
    pub const BAD_REQUEST: &str = "BadRequest";
    pub const VALIDATION_FAILED: &str = "ValidationError";
    pub const UNAUTHORIZED: &str = "UnauthorizedError";
    pub const FORBIDDEN: &str = "Forbidden";
    pub const NOT_FOUND: &str = "NotFound";
    pub const CONFLICT: &str = "Conflict";
    pub const UNSUPPORTED_MEDIA_TYPE: &str = "UnsupportedMediaType";
    pub const RATE_LIMITED: &str = "TooManyRequests";
    pub const STORAGE: &str = "StorageError";
    pub const CACHE: &str = "CacheError";
    pub const CACHE_CONNECTION: &str = "RedisConnectionError";
    pub const INTERNAL_SERVER: &str = "InternalServer";
    pub const INTERNAL_ERROR: &str = "InternalServerError";
}

/// Translation keys for the default error messages.
pub mod keys {
    pub const BAD_REQUEST: &str = "errors.bad_request";
    pub const VALIDATION: &str = "errors.validation";
    pub const UNAUTHORIZED: &str = "errors.unauthorized";
    pub const INVALID_CREDENTIALS: &str = "errors.invalid_credentials";
    pub const FORBIDDEN: &str = "errors.forbidden";
    pub const NOT_FOUND: &str = "errors.not_found";
    pub const CONFLICT: &str = "errors.conflict";
    pub const UNSUPPORTED_MEDIA: &str = "errors.unsupported_media";
    pub const RATE_LIMIT: &str = "errors.rate_limit";
    pub const CACHE: &str = "errors.cache";
    pub const REDIS_CONNECTION: &str = "errors.redis_connection";
    pub const DATABASE: &str = "errors.database";
    pub const UPLOAD: &str = "errors.upload";
    pub const INTERNAL_SERVER: &str = "errors.internal_server";
}

/// Every failure the API knows how to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Validation,
    Unauthorized,
    /// Same wire code as `Unauthorized`; kept apart so logs can tell them apart.
    InvalidCredentials,
    Forbidden,
    NotFound,
    Conflict,
    UnsupportedMedia,
    RateLimit,
    Storage,
    Cache,
    /// Backing cache store unreachable, as opposed to a cache logic failure.
    CacheConnection,
    Database,
    Upload,
    Internal,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 15] = [
        ErrorKind::BadRequest,
        ErrorKind::Validation,
        ErrorKind::Unauthorized,
        ErrorKind::InvalidCredentials,
        ErrorKind::Forbidden,
        ErrorKind::NotFound,
        ErrorKind::Conflict,
        ErrorKind::UnsupportedMedia,
        ErrorKind::RateLimit,
        ErrorKind::Storage,
        ErrorKind::Cache,
        ErrorKind::CacheConnection,
        ErrorKind::Database,
        ErrorKind::Upload,
        ErrorKind::Internal,
    ];

    /// Default machine code for this kind.
    pub const fn code(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => codes::BAD_REQUEST,
            ErrorKind::Validation => codes::VALIDATION_FAILED,
            ErrorKind::Unauthorized | ErrorKind::InvalidCredentials => codes::UNAUTHORIZED,
            ErrorKind::Forbidden => codes::FORBIDDEN,
            ErrorKind::NotFound => codes::NOT_FOUND,
            ErrorKind::Conflict => codes::CONFLICT,
            ErrorKind::UnsupportedMedia => codes::UNSUPPORTED_MEDIA_TYPE,
            ErrorKind::RateLimit => codes::RATE_LIMITED,
            ErrorKind::Storage => codes::STORAGE,
            ErrorKind::Cache => codes::CACHE,
            ErrorKind::CacheConnection => codes::CACHE_CONNECTION,
            ErrorKind::Database | ErrorKind::Upload => codes::INTERNAL_SERVER,
            ErrorKind::Internal => codes::INTERNAL_ERROR,
        }
    }

    /// Default HTTP status for this kind.
    pub const fn status(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized | ErrorKind::InvalidCredentials => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::UnsupportedMedia => 415,
            ErrorKind::Validation => 422,
            ErrorKind::RateLimit => 429,
            ErrorKind::Storage
            | ErrorKind::Cache
            | ErrorKind::CacheConnection
            | ErrorKind::Database
            | ErrorKind::Upload
            | ErrorKind::Internal => 500,
        }
    }

    /// Translation key used when no message override is given.
    pub const fn message_key(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => keys::BAD_REQUEST,
            ErrorKind::Validation => keys::VALIDATION,
            ErrorKind::Unauthorized => keys::UNAUTHORIZED,
            ErrorKind::InvalidCredentials => keys::INVALID_CREDENTIALS,
            ErrorKind::Forbidden => keys::FORBIDDEN,
            ErrorKind::NotFound => keys::NOT_FOUND,
            ErrorKind::Conflict => keys::CONFLICT,
            ErrorKind::UnsupportedMedia => keys::UNSUPPORTED_MEDIA,
            ErrorKind::RateLimit => keys::RATE_LIMIT,
            ErrorKind::Cache => keys::CACHE,
            ErrorKind::CacheConnection => keys::REDIS_CONNECTION,
            ErrorKind::Database => keys::DATABASE,
            ErrorKind::Upload => keys::UPLOAD,
            ErrorKind::Storage | ErrorKind::Internal => keys::INTERNAL_SERVER,
        }
    }

    /// Rate limit responses never carry field detail.
    pub const fn accepts_detail(self) -> bool {
        !matches!(self, ErrorKind::RateLimit)
    }
}

/// A reportable application failure.
///
/// Construction never fails. `detail` values are stored as raw translation
/// keys (or literal strings) and only resolved when the response is built.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code} ({status}): {message_key}")]
pub struct AppError {
    kind: ErrorKind,
    code: Cow<'static, str>,
    status: u16,
    message_key: Cow<'static, str>,
    detail: Option<BTreeMap<String, String>>,
}

impl AppError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            code: Cow::Borrowed(kind.code()),
            status: kind.status(),
            message_key: Cow::Borrowed(kind.message_key()),
            detail: None,
        }
    }

    pub fn bad_request() -> Self {
        Self::new(ErrorKind::BadRequest)
    }

    pub fn validation() -> Self {
        Self::new(ErrorKind::Validation)
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized)
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials)
    }

    pub fn forbidden() -> Self {
        Self::new(ErrorKind::Forbidden)
    }

    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    pub fn conflict() -> Self {
        Self::new(ErrorKind::Conflict)
    }

    pub fn unsupported_media() -> Self {
        Self::new(ErrorKind::UnsupportedMedia)
    }

    pub fn rate_limit() -> Self {
        Self::new(ErrorKind::RateLimit)
    }

    pub fn storage() -> Self {
        Self::new(ErrorKind::Storage)
    }

    /// Storage failure with a subsystem-specific code and status.
    ///
    /// `code` must be a constant identifier. A status outside 400..=599 is
    /// replaced by 500.
    pub fn storage_failure(code: impl Into<Cow<'static, str>>, status: u16) -> Self {
        Self {
            code: code.into(),
            status: sanitize_status(status),
            ..Self::new(ErrorKind::Storage)
        }
    }

    pub fn cache() -> Self {
        Self::new(ErrorKind::Cache)
    }

    pub fn cache_connection() -> Self {
        Self::new(ErrorKind::CacheConnection)
    }

    pub fn database() -> Self {
        Self::new(ErrorKind::Database)
    }

    pub fn upload() -> Self {
        Self::new(ErrorKind::Upload)
    }

    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal)
    }

    /// Replace the default message key.
    pub fn with_message(mut self, key: impl Into<Cow<'static, str>>) -> Self {
        self.message_key = key.into();
        self
    }

    /// Attach one field-level detail entry. Ignored for kinds that carry no detail.
    pub fn with_detail(mut self, field: impl Into<String>, key: impl Into<String>) -> Self {
        if self.kind.accepts_detail() {
            self.detail
                .get_or_insert_with(BTreeMap::new)
                .insert(field.into(), key.into());
        }
        self
    }

    pub fn with_details<I, F, K>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (F, K)>,
        F: Into<String>,
        K: Into<String>,
    {
        entries
            .into_iter()
            .fold(self, |err, (field, key)| err.with_detail(field, key))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn message_key(&self) -> &str {
        &self.message_key
    }

    pub fn detail(&self) -> Option<&BTreeMap<String, String>> {
        self.detail.as_ref()
    }
}

impl From<ErrorKind> for AppError {
    fn from(kind: ErrorKind) -> Self {
        AppError::new(kind)
    }
}

fn sanitize_status(status: u16) -> u16 {
    if (400..=599).contains(&status) {
        status
    } else {
        500
    }
}
