//! Credential issuance and verification.
//!
//! Credentials are HS256 JWTs whose payload nests the identity claim under
//! `data` next to the standard `iat`/`exp` timestamps. Nothing is stored
//! server side; a credential is valid exactly when its signature checks out
//! and it is younger than the configured lifetime.

use chrono::Utc;
use deep_thoughts_common::IdentityClaim;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Failed to sign token: {0}")]
    Signing(String),
    #[error("Failed to hash password: {0}")]
    Hashing(String),
}

/// JWT payload.
#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    data: IdentityClaim,
    iat: i64,
    exp: i64,
}

/// Outcome of checking a credential.
///
/// Every variant except `Valid` is treated as anonymous by callers; the
/// distinction only feeds logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid(IdentityClaim),
    Expired,
    Invalid(String),
    Absent,
}

impl Verification {
    pub fn into_claim(self) -> Option<IdentityClaim> {
        match self {
            Verification::Valid(claim) => Some(claim),
            _ => None,
        }
    }

    /// Short tag for log fields.
    pub fn outcome(&self) -> &'static str {
        match self {
            Verification::Valid(_) => "valid",
            Verification::Expired => "expired",
            Verification::Invalid(_) => "invalid",
            Verification::Absent => "absent",
        }
    }
}

/// Issues and verifies credentials with a single server-held secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime_secs: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], lifetime_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller's clock in `verify_at`.
        validation.validate_exp = false;
        validation.validate_aud = false;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            lifetime_secs: i64::try_from(lifetime_secs).unwrap_or(i64::MAX),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.secret.as_bytes(), config.token_lifetime_secs)
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Issue a credential valid from now for the configured lifetime.
    pub fn issue(&self, claim: &IdentityClaim) -> Result<String, AuthError> {
        self.issue_at(claim, Utc::now().timestamp())
    }

    /// Issue a credential as if the current time were `now` (unix seconds).
    pub fn issue_at(&self, claim: &IdentityClaim, now: i64) -> Result<String, AuthError> {
        let payload = TokenPayload {
            data: claim.clone(),
            iat: now,
            exp: now.saturating_add(self.lifetime_secs),
        };

        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Verification {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a credential against the clock reading `now` (unix seconds).
    ///
    /// A token is expired once `now` reaches either its `exp` or
    /// `iat + lifetime`, whichever comes first. No leeway is applied.
    pub fn verify_at(&self, token: &str, now: i64) -> Verification {
        let payload = match decode::<TokenPayload>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => return Verification::Invalid(e.to_string()),
        };

        let max_age_deadline = payload.iat.saturating_add(self.lifetime_secs);
        if now >= payload.exp || now >= max_age_deadline {
            return Verification::Expired;
        }

        Verification::Valid(payload.data)
    }

    /// Verify an optional credential; `None` yields [`Verification::Absent`].
    pub fn resolve(&self, token: Option<&str>) -> Verification {
        match token {
            Some(token) => self.verify(token),
            None => Verification::Absent,
        }
    }
}
