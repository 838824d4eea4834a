//! Optimistic Mutations
//!
//! Show the expected result of a like, follow or comment change right away,
//! then settle it against the server:
//!
//! ```text
//!   snapshot ──► apply guess ──► request ──┬─► success: server values win
//!                                          └─► failure: restore snapshot
//! ```
//!
//! - **collection**: shared ordered list with a single update entry point
//! - **controller**: the snapshot / apply / reconcile-or-restore sequence
//!
//! Overlapping mutations of the same item are not serialized. Each one
//! restores its own snapshot on failure, so the last write to settle wins.

mod collection;
mod controller;

pub use collection::Collection;
pub use controller::MutationController;

use crate::api::{ApiError, Comment, Post, PublicProfile, ToggleState};
use crate::session::SessionError;
use std::fmt::{Debug, Display};
use thiserror::Error;

/// Anything stored in a [`Collection`] that can be found by id
pub trait Identified: Clone + Send + Sync {
    type Id: Copy + PartialEq + Display + Debug + Send + Sync;

    fn id(&self) -> Self::Id;
}

/// An item carrying a flag and a counter that move together
pub trait Toggle: Identified {
    fn toggle_state(&self) -> ToggleState;

    fn set_toggle_state(&mut self, state: ToggleState);
}

impl Identified for Post {
    type Id = crate::api::PostId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Toggle for Post {
    fn toggle_state(&self) -> ToggleState {
        ToggleState::new(self.liked, self.likes_count)
    }

    fn set_toggle_state(&mut self, state: ToggleState) {
        self.liked = state.active;
        self.likes_count = state.count;
    }
}

impl Identified for Comment {
    type Id = crate::api::CommentId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Toggle for Comment {
    fn toggle_state(&self) -> ToggleState {
        ToggleState::new(self.liked, self.likes_count)
    }

    fn set_toggle_state(&mut self, state: ToggleState) {
        self.liked = state.active;
        self.likes_count = state.count;
    }
}

impl Identified for PublicProfile {
    type Id = crate::api::UserId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Toggle for PublicProfile {
    fn toggle_state(&self) -> ToggleState {
        ToggleState::new(self.is_following, self.followers_count)
    }

    fn set_toggle_state(&mut self, state: ToggleState) {
        self.is_following = state.active;
        self.followers_count = state.count;
    }
}

/// Errors surfaced by optimistic mutations.
///
/// By the time one of these is returned the collection already shows the
/// pre-mutation state again.
#[derive(Error, Debug)]
pub enum MutationError {
    /// Only logged-in users can like, follow or comment
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The item is not in the collection being mutated
    #[error("Item {0} not found")]
    NotFound(String),

    /// Rejected locally before any request was made
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// The server or network failed the request
    #[error(transparent)]
    Session(SessionError),
}

impl From<SessionError> for MutationError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::AuthenticationRequired => MutationError::AuthenticationRequired,
            other => MutationError::Session(other),
        }
    }
}

impl From<ApiError> for MutationError {
    fn from(err: ApiError) -> Self {
        MutationError::Session(SessionError::Api(err))
    }
}

impl MutationError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            MutationError::AuthenticationRequired => "You need to log in to do that".to_string(),
            MutationError::NotFound(_) => "That item is no longer available".to_string(),
            MutationError::Invalid(reason) => reason.clone(),
            MutationError::Session(e) => e.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_post_toggle_state() {
        let mut post = fixtures::post(1, false, 3);
        assert_eq!(post.toggle_state(), ToggleState::new(false, 3));

        post.set_toggle_state(ToggleState::new(true, 4));
        assert!(post.liked);
        assert_eq!(post.likes_count, 4);
    }

    #[test]
    fn test_profile_toggle_maps_follow_fields() {
        let mut profile = fixtures::profile(2, false, 10);
        profile.set_toggle_state(profile.toggle_state().flipped());
        assert!(profile.is_following);
        assert_eq!(profile.followers_count, 11);
    }

    #[test]
    fn test_error_conversion() {
        let err: MutationError = SessionError::AuthenticationRequired.into();
        assert!(matches!(err, MutationError::AuthenticationRequired));
        assert_eq!(err.user_message(), "You need to log in to do that");

        let err: MutationError = ApiError::Timeout.into();
        assert_eq!(err.user_message(), "Could not reach the server, check your connection");
    }
}
