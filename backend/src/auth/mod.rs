//! Credential issuance, request authentication and password hashing.

pub mod extract;
pub mod identity;
pub mod middleware;
pub mod password;
pub mod token;

pub use extract::{extract_credential, strip_scheme, CredentialSource};
pub use identity::Identity;
pub use middleware::{authenticate, resolve_identity, MAX_BODY_BYTES};
pub use password::{hash_password, verify_password};
pub use token::{AuthError, TokenService, Verification};
