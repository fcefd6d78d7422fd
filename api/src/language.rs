//! Per-request language negotiation.
//!
//! Lookup order: `?lng=` query parameter, `i18next` cookie, then the
//! `Accept-Language` header by descending quality. The first candidate that
//! has a loaded translation table wins.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Query};
use axum::http::header::ACCEPT_LANGUAGE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Uri};
use axum_extra::extract::CookieJar;
use groupware_core::Translations;
use serde::Deserialize;

use crate::state::AppState;

pub const QUERY_PARAM: &str = "lng";
pub const COOKIE_NAME: &str = "i18next";

/// Negotiated language for the current request, falling back to the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lang(pub String);

impl FromRequestParts<AppState> for Lang {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let translations = &state.translations;
        let language = negotiate(&parts.headers, &parts.uri, translations)
            .unwrap_or(translations.default_language());
        Ok(Lang(language.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct LangQuery {
    lng: Option<String>,
}

/// Loaded language matching the request, if any.
pub fn negotiate<'a>(
    headers: &HeaderMap,
    uri: &Uri,
    translations: &'a Translations,
) -> Option<&'a str> {
    from_query(uri)
        .into_iter()
        .chain(from_cookie(headers))
        .chain(from_accept_language(headers))
        .find_map(|tag| translations.supported(&tag))
}

/// Percent-decoded `lng` parameter. A query that fails to parse counts as absent.
fn from_query(uri: &Uri) -> Option<String> {
    let Query(query) = Query::<LangQuery>::try_from_uri(uri).ok()?;
    query
        .lng
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn from_cookie(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(COOKIE_NAME)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Tags from `Accept-Language`, highest quality first. `*` and `q=0` are dropped.
fn from_accept_language(headers: &HeaderMap) -> Vec<String> {
    let mut weighted: Vec<(String, f32)> = headers
        .get_all(ACCEPT_LANGUAGE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(','))
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let quality = parts
                .filter_map(|param| param.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (quality > 0.0).then(|| (tag.to_string(), quality))
        })
        .collect();

    // stable sort keeps header order for equal weights
    weighted.sort_by(|a, b| b.1.total_cmp(&a.1));
    weighted.into_iter().map(|(tag, _)| tag).collect()
}
