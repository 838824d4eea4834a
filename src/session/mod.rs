//! Session Management
//!
//! Who is logged in, and what happens when that changes.
//!
//! - **state**: the [`Session`] value and its reducer
//! - **store**: [`SessionStore`], the single owner of session state, with
//!   persistence and the login/logout/profile operations
//!
//! Any authenticated request that comes back 401 goes through
//! [`SessionStore::authorized`], which turns the rejection into a logout.

mod state;
mod store;

pub use state::{Session, SessionAction, TOKEN_KEY, USER_KEY};
pub use store::SessionStore;

use crate::api::ApiError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors produced by session operations
#[derive(Error, Debug)]
pub enum SessionError {
    /// Operation needs a logged-in user
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Backend or network failure
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Session could not be persisted or cleared on disk
    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Whether the server rejected the token
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SessionError::Api(e) if e.is_unauthorized())
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            SessionError::AuthenticationRequired => "You need to log in first".to_string(),
            SessionError::Api(e) => e.user_message(),
            SessionError::Storage(_) => "Could not save your session on this device".to_string(),
        }
    }
}
