use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use deep_thoughts_common::IdentityClaim;

use crate::error::AppError;

/// Per-request outcome of authentication.
///
/// Inserted into request extensions by the authenticator before any handler
/// runs. Handlers take it as an extractor and decide for themselves whether
/// an authenticated user is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(IdentityClaim),
}

impl Identity {
    pub fn claim(&self) -> Option<&IdentityClaim> {
        match self {
            Identity::Authenticated(claim) => Some(claim),
            Identity::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated(_))
    }

    /// The claim, or [`AppError::Unauthenticated`] for anonymous requests.
    pub fn require(&self) -> Result<&IdentityClaim, AppError> {
        self.claim().ok_or(AppError::Unauthenticated)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Identity>().cloned().unwrap_or_default())
    }
}
