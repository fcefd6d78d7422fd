pub mod cors;
pub mod error_reporter;
pub mod rate_limit;
pub mod request_logger;
