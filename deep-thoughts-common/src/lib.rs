//! Deep Thoughts Common Types
//!
//! Shared types used by the API server and its clients.

pub mod claim;
pub mod records;

pub use claim::IdentityClaim;
pub use records::{
    AuthPayload, FriendSummary, LoginRequest, NewReaction, NewThought, Reaction, SignupRequest,
    Thought, User,
};
