//! Session value and reducer

use crate::api::User;
use crate::storage::{KeyValueStore, StorageResult};

/// Persistence key holding the bearer token
pub const TOKEN_KEY: &str = "token";
/// Persistence key holding the JSON-encoded user
pub const USER_KEY: &str = "user";

/// Authenticated identity held by the client
///
/// The user is only meaningful while a token is present; the reducer never
/// produces a session with a user and no token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
}

/// The only ways a session can change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Credentials accepted: token and user replace whatever was there
    Login { token: String, user: User },
    /// Fresh profile data for the logged-in user
    Profile(User),
    /// Token gone (explicit logout, account deletion, rejected token)
    Logout,
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.token.as_ref().and(self.user.as_ref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Compute the session that results from `action`
    pub fn reduce(&self, action: SessionAction) -> Session {
        match action {
            SessionAction::Login { token, user } => Session {
                token: Some(token),
                user: Some(user),
            },
            // A profile arriving after the token is gone is stale
            SessionAction::Profile(user) if self.is_authenticated() => Session {
                token: self.token.clone(),
                user: Some(user),
            },
            SessionAction::Profile(_) => self.clone(),
            SessionAction::Logout => Session::default(),
        }
    }

    /// Read the persisted session.
    ///
    /// A user without a token is discarded, and an unreadable user record
    /// leaves the token in place with no profile (a refresh repopulates it).
    pub fn load(store: &dyn KeyValueStore) -> StorageResult<Session> {
        let token = match store.get(TOKEN_KEY)? {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(Session::default()),
        };

        let user = match store.get(USER_KEY)? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring unreadable persisted user");
                    None
                }
            },
            None => None,
        };

        Ok(Session {
            token: Some(token),
            user,
        })
    }

    /// Write this session to the store, or clear both keys when logged out
    pub fn save(&self, store: &dyn KeyValueStore) -> StorageResult<()> {
        match &self.token {
            Some(token) => {
                let mut entries = vec![(TOKEN_KEY, token.clone())];
                if let Some(user) = &self.user {
                    entries.push((USER_KEY, serde_json::to_string(user)?));
                }
                store.set_many(&entries)
            }
            None => store.remove_many(&[TOKEN_KEY, USER_KEY]),
        }
    }
}
