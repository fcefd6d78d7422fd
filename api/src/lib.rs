//! HTTP surface of the groupware service: configuration, language
//! negotiation, response envelopes and the middleware stack.

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod language;
pub mod middleware;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod shutdown;
pub mod state;
