//! Session Store
//!
//! Owns the current [`Session`] and keeps memory, persistence and
//! subscribers in step. Every change goes through [`SessionStore::dispatch`].

use super::state::{Session, SessionAction};
use super::SessionError;
use crate::api::{ApiError, ApiResult, Credentials, ProfileChanges, RegisterForm, SocialApi, User};
use crate::storage::{KeyValueStore, StorageError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// Single source of truth for who is logged in
pub struct SessionStore {
    api: Arc<dyn SocialApi>,
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<Session>,
    changes: watch::Sender<Session>,
}

impl SessionStore {
    /// Create a store initialised from persisted state
    pub fn hydrate(api: Arc<dyn SocialApi>, storage: Arc<dyn KeyValueStore>) -> Self {
        let session = Session::load(storage.as_ref()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read persisted session, starting logged out");
            Session::default()
        });

        tracing::debug!(authenticated = session.is_authenticated(), "Session hydrated");

        let (changes, _) = watch::channel(session.clone());
        Self {
            api,
            storage,
            state: RwLock::new(session),
            changes,
        }
    }

    /// Snapshot of the current session
    pub async fn current(&self) -> Session {
        self.state.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token().map(str::to_string)
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user().cloned()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    /// Receive every session change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.changes.subscribe()
    }

    /// Apply an action to the session, persisting the result
    pub async fn dispatch(&self, action: SessionAction) -> Result<(), SessionError> {
        self.dispatch_for(None, action).await
    }

    /// Apply `action` only while `expected_token` is still the current token.
    ///
    /// Responses can arrive after the user logged out and back in; they must
    /// not touch the newer session.
    async fn dispatch_for(
        &self,
        expected_token: Option<&str>,
        action: SessionAction,
    ) -> Result<(), SessionError> {
        let mut state = self.state.write().await;

        if let Some(expected) = expected_token {
            if state.token() != Some(expected) {
                tracing::debug!("Ignoring session update for a token that is no longer current");
                return Ok(());
            }
        }

        let next = state.reduce(action);

        let persisted = if next.is_authenticated() {
            // Persist first: on failure neither memory nor disk changes.
            self.persist(&next).await?;
            Ok(())
        } else {
            // Clearing always takes effect in memory, even if the disk
            // write fails; the failure is still reported.
            self.persist(&next).await
        };

        if let Err(e) = &persisted {
            tracing::error!(error = %e, "Failed to clear persisted session");
        }

        if *state != next {
            tracing::info!(
                authenticated = next.is_authenticated(),
                user_id = next.user().map(|u| u.id),
                "Session changed"
            );
            *state = next.clone();
            drop(state);
            self.changes.send_replace(next);
        }

        persisted
    }

    /// Write `session` on the blocking pool.
    ///
    /// Called with the state lock held, so no other dispatch can interleave
    /// between the write and the in-memory commit.
    async fn persist(&self, session: &Session) -> Result<(), SessionError> {
        let storage = Arc::clone(&self.storage);
        let session = session.clone();
        tokio::task::spawn_blocking(move || session.save(storage.as_ref()))
            .await
            .map_err(|e| StorageError::Unavailable(format!("persist task failed: {}", e)))??;
        Ok(())
    }

    /// Run an authenticated request with the current token.
    ///
    /// Fails with [`SessionError::AuthenticationRequired`] without calling
    /// `request` when logged out. A 401 response clears the session before
    /// the error is returned.
    pub async fn authorized<T, F, Fut>(&self, request: F) -> Result<T, SessionError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let token = self
            .token()
            .await
            .ok_or(SessionError::AuthenticationRequired)?;
        self.call_with(token, request).await
    }

    async fn call_with<T, F, Fut>(&self, token: String, request: F) -> Result<T, SessionError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        match request(token.clone()).await {
            Ok(value) => Ok(value),
            Err(e) if e.is_unauthorized() => {
                tracing::warn!("Token rejected by server, logging out");
                if let Err(clear) = self.dispatch_for(Some(&token), SessionAction::Logout).await {
                    tracing::error!(error = %clear, "Session cleared in memory only");
                }
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Exchange credentials for a session.
    ///
    /// On failure the previous session (if any) is left untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, SessionError> {
        tracing::info!(email = %credentials.email, "Logging in");

        let response = self.api.login(credentials).await.map_err(|e| {
            tracing::warn!(error = %e, "Login failed");
            e
        })?;

        let user = response.user.clone();
        self.dispatch(SessionAction::Login {
            token: response.token,
            user: response.user,
        })
        .await?;

        Ok(user)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, form: &RegisterForm) -> Result<(), SessionError> {
        if form.password != form.password_confirmation {
            return Err(ApiError::validation("Passwords do not match").into());
        }

        tracing::info!(email = %form.email, "Registering account");
        self.api.register(form).await?;
        Ok(())
    }

    /// Revoke the token (best effort) and clear the session.
    ///
    /// A failed revoke is logged and otherwise ignored; the local session is
    /// cleared regardless.
    pub async fn logout(&self) -> Result<(), SessionError> {
        if let Some(token) = self.token().await {
            if let Err(e) = self.api.logout(&token).await {
                tracing::warn!(error = %e, "Token revoke failed, clearing local session anyway");
            }
        }
        self.dispatch(SessionAction::Logout).await
    }

    /// Re-fetch the logged-in user. A 401 logs out and is returned.
    pub async fn refresh_profile(&self) -> Result<User, SessionError> {
        let token = self
            .token()
            .await
            .ok_or(SessionError::AuthenticationRequired)?;

        let api = Arc::clone(&self.api);
        let user = self
            .call_with(token.clone(), |t| async move { api.profile(&t).await })
            .await?;

        self.dispatch_for(Some(&token), SessionAction::Profile(user.clone()))
            .await?;
        Ok(user)
    }

    /// Update name, email or image of the logged-in user
    pub async fn update_profile(&self, changes: &ProfileChanges) -> Result<User, SessionError> {
        if changes.is_empty() {
            return Err(ApiError::validation("Nothing to update").into());
        }

        let token = self
            .token()
            .await
            .ok_or(SessionError::AuthenticationRequired)?;

        let api = Arc::clone(&self.api);
        let changes = changes.clone();
        let user = self
            .call_with(token.clone(), |t| async move {
                api.update_profile(&t, &changes).await
            })
            .await?;

        self.dispatch_for(Some(&token), SessionAction::Profile(user.clone()))
            .await?;
        Ok(user)
    }

    /// Delete the account. The session is cleared whether or not the
    /// request succeeds; any error is returned afterwards.
    pub async fn delete_account(&self) -> Result<(), SessionError> {
        let token = self
            .token()
            .await
            .ok_or(SessionError::AuthenticationRequired)?;

        tracing::info!("Deleting account");
        let deleted = self.api.delete_profile(&token).await;
        if let Err(e) = &deleted {
            tracing::warn!(error = %e, "Account deletion request failed");
        }

        let cleared = self
            .dispatch_for(Some(&token), SessionAction::Logout)
            .await;

        deleted?;
        cleared
    }
}
