//! Locating a credential on an inbound request.
//!
//! Sources are tried in order: JSON body field `token`, query parameter
//! `token`, then the `Authorization` header. The first non-empty value wins.

use axum::extract::Query;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Uri};
use serde::Deserialize;

/// Where a credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Body,
    Query,
    Header,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Body => write!(f, "body"),
            CredentialSource::Query => write!(f, "query"),
            CredentialSource::Header => write!(f, "header"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CredentialQuery {
    token: Option<String>,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// `token` string field of a JSON object body. Anything else yields `None`.
pub fn from_body(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("token")
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .and_then(non_empty)
}

/// `token` query parameter. An unparseable query string yields `None`.
pub fn from_query(uri: &Uri) -> Option<String> {
    uri.query()?;
    let Query(query) = Query::<CredentialQuery>::try_from_uri(uri).ok()?;
    query.token.and_then(non_empty)
}

/// Credential from the `Authorization` header, scheme stripped.
pub fn from_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    strip_scheme(value)
}

/// Drop the scheme prefix from an `Authorization` value: split on
/// whitespace and keep the last piece. `"Bearer abc"` gives `"abc"`, a bare
/// `"abc"` is returned as is.
pub fn strip_scheme(value: &str) -> Option<String> {
    value
        .split_whitespace()
        .last()
        .map(|t| t.trim().to_string())
        .and_then(non_empty)
}

/// Find the request's credential following the body, query, header order.
pub fn extract_credential(
    body: &[u8],
    uri: &Uri,
    headers: &HeaderMap,
) -> Option<(CredentialSource, String)> {
    if let Some(token) = from_body(body) {
        return Some((CredentialSource::Body, token));
    }
    if let Some(token) = from_query(uri) {
        return Some((CredentialSource::Query, token));
    }
    from_header(headers).map(|token| (CredentialSource::Header, token))
}
