//! Identity claim embedded in issued credentials.

use serde::{Deserialize, Serialize};

/// Identity data carried inside a credential.
///
/// Fixed at issuance time: the server never refreshes these fields from the
/// store while the credential is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    pub username: String,
    pub email: String,
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
}

impl IdentityClaim {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_serializes_id_as_underscore_id() {
        let claim = IdentityClaim::new("alice", "a@x.com", "1");
        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["_id"], "1");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_claim_accepts_plain_id_alias() {
        let claim: IdentityClaim =
            serde_json::from_str(r#"{"username":"bob","email":"b@x.com","id":"42"}"#).unwrap();
        assert_eq!(claim.id, "42");
    }

    #[test]
    fn test_claim_rejects_missing_fields() {
        let result = serde_json::from_str::<IdentityClaim>(r#"{"username":"bob","_id":"42"}"#);
        assert!(result.is_err());
    }
}
