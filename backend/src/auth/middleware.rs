use std::sync::Arc;

use axum::body::{self, Body};
use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;

use super::extract::extract_credential;
use super::identity::Identity;
use super::token::{TokenService, Verification};
use crate::error::AppError;
use crate::AppState;

/// Largest request body buffered while looking for a `token` field.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Resolve the request's identity once, before routing.
///
/// Never rejects on authentication grounds: a missing, malformed, forged or
/// expired credential all leave the request anonymous. The body is buffered
/// and handed on unchanged.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let bytes = match body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => return buffer_error(e).into_response(),
    };

    let identity = resolve_identity(&state.tokens, &parts, &bytes);
    parts.extensions.insert(identity);

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Only the length limit is a 413; anything else means the client's body
/// stream broke.
fn buffer_error(err: axum::Error) -> AppError {
    let cause = err.into_inner();
    if cause.downcast_ref::<LengthLimitError>().is_some() {
        tracing::warn!(limit = MAX_BODY_BYTES, "Request body over limit");
        AppError::PayloadTooLarge
    } else {
        tracing::warn!(error = %cause, "Failed to read request body");
        AppError::BadUserInput("Failed to read request body".to_string())
    }
}

/// Map a request head and its buffered body to an [`Identity`].
pub fn resolve_identity(tokens: &TokenService, parts: &Parts, body: &[u8]) -> Identity {
    let (source, token) = extract_credential(body, &parts.uri, &parts.headers).unzip();
    let source = source.map(|s| s.to_string()).unwrap_or_default();

    match tokens.resolve(token.as_deref()) {
        Verification::Valid(claim) => {
            tracing::debug!(source = %source, username = %claim.username, "Authenticated request");
            Identity::Authenticated(claim)
        }
        Verification::Expired => {
            tracing::info!(source = %source, outcome = "expired", "Expired token");
            Identity::Anonymous
        }
        Verification::Invalid(reason) => {
            tracing::warn!(source = %source, outcome = "invalid", reason = %reason, "Invalid token");
            Identity::Anonymous
        }
        Verification::Absent => Identity::Anonymous,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;
    use chrono::Utc;
    use deep_thoughts_common::IdentityClaim;

    fn tokens() -> TokenService {
        TokenService::new(b"test-secret", 7200)
    }

    fn alice() -> IdentityClaim {
        IdentityClaim::new("alice", "a@x.com", "1")
    }

    fn parts(uri: &str, authorization: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_no_credential_is_anonymous() {
        let identity = resolve_identity(&tokens(), &parts("/api/thoughts", None), b"");
        assert_eq!(identity, Identity::Anonymous);
    }

    #[test]
    fn test_bearer_header_authenticates() {
        let tokens = tokens();
        let token = tokens.issue(&alice()).unwrap();
        let header = format!("Bearer {}", token);
        let identity = resolve_identity(&tokens, &parts("/api/me", Some(&header)), b"");
        assert_eq!(identity, Identity::Authenticated(alice()));
    }

    #[test]
    fn test_expired_credential_is_anonymous() {
        let tokens = tokens();
        let token = tokens
            .issue_at(&alice(), Utc::now().timestamp() - 3 * 60 * 60)
            .unwrap();
        let header = format!("Bearer {}", token);
        let identity = resolve_identity(&tokens, &parts("/api/me", Some(&header)), b"");
        assert_eq!(identity, Identity::Anonymous);
    }

    #[test]
    fn test_garbage_credential_is_anonymous() {
        let identity = resolve_identity(
            &tokens(),
            &parts("/api/me", Some("Bearer definitely.not.valid")),
            b"",
        );
        assert_eq!(identity, Identity::Anonymous);
    }

    #[test]
    fn test_body_credential_is_used_before_header() {
        let tokens = tokens();
        let bob = IdentityClaim::new("bob", "b@x.com", "2");
        let body_token = tokens.issue(&bob).unwrap();
        let header_token = tokens.issue(&alice()).unwrap();
        let body = format!(r#"{{"token":"{}"}}"#, body_token);
        let header = format!("Bearer {}", header_token);

        let identity = resolve_identity(&tokens, &parts("/api/me", Some(&header)), body.as_bytes());
        assert_eq!(identity, Identity::Authenticated(bob));
    }

    #[tokio::test]
    async fn test_over_limit_body_is_payload_too_large() {
        let body = Body::from(vec![b'x'; MAX_BODY_BYTES + 1]);
        let err = body::to_bytes(body, MAX_BODY_BYTES).await.unwrap_err();
        assert!(matches!(buffer_error(err), AppError::PayloadTooLarge));
    }

    #[tokio::test]
    async fn test_broken_body_stream_is_bad_input() {
        let chunks: Vec<Result<&'static str, std::io::Error>> = vec![
            Ok(r#"{"tok"#),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let body = Body::from_stream(futures_util::stream::iter(chunks));
        let err = body::to_bytes(body, MAX_BODY_BYTES).await.unwrap_err();
        assert!(matches!(buffer_error(err), AppError::BadUserInput(_)));
    }

    #[test]
    fn test_invalid_body_credential_does_not_fall_back_to_header() {
        let tokens = tokens();
        let header = format!("Bearer {}", tokens.issue(&alice()).unwrap());
        let identity = resolve_identity(
            &tokens,
            &parts("/api/me", Some(&header)),
            br#"{"token":"garbage"}"#,
        );
        assert_eq!(identity, Identity::Anonymous);
    }
}
