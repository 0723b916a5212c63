//! Public records and request bodies exchanged over the HTTP API.
//!
//! Field names follow the camelCase shape clients already consume
//! (`thoughtText`, `friendCount`, `_id`, ...).

use serde::{Deserialize, Serialize};

use crate::IdentityClaim;

/// A reaction attached to a thought.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    #[serde(rename = "_id")]
    pub id: String,
    pub reaction_body: String,
    pub created_at: String,
    pub username: String,
}

/// A short text post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    #[serde(rename = "_id")]
    pub id: String,
    pub thought_text: String,
    pub created_at: String,
    pub username: String,
    pub reaction_count: usize,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

/// Friend entry embedded in a [`User`]. Does not recurse into the friend's
/// own friends or thoughts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub friend_count: usize,
    #[serde(default)]
    pub thoughts: Vec<Thought>,
    #[serde(default)]
    pub friends: Vec<FriendSummary>,
}

impl User {
    /// Identity claim to embed in a credential for this user.
    pub fn claim(&self) -> IdentityClaim {
        IdentityClaim::new(&self.username, &self.email, &self.id)
    }
}

/// Returned by signup and login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewThought {
    pub thought_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReaction {
    pub reaction_body: String,
}
