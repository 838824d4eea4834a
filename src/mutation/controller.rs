//! Optimistic mutation controller

use super::{Collection, Identified, MutationError, Toggle};
use crate::api::{ApiResult, ToggleState};
use crate::session::SessionStore;
use std::future::Future;
use std::sync::Arc;

/// Runs optimistic mutations against collections on behalf of the
/// logged-in user
#[derive(Clone)]
pub struct MutationController {
    session: Arc<SessionStore>,
}

impl MutationController {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    async fn require_login(&self) -> Result<(), MutationError> {
        if self.session.is_authenticated().await {
            Ok(())
        } else {
            Err(MutationError::AuthenticationRequired)
        }
    }

    /// Flip the flag of item `id` and move its counter, then settle with
    /// the server.
    ///
    /// The guess is visible in `items` before `request` resolves. On
    /// success the server's flag and counter replace the guess; on failure
    /// the whole collection is restored to what it was before the guess.
    pub async fn toggle<T, F, Fut>(
        &self,
        items: &Collection<T>,
        id: T::Id,
        request: F,
    ) -> Result<ToggleState, MutationError>
    where
        T: Toggle,
        F: FnOnce(String, T::Id) -> Fut,
        Fut: Future<Output = ApiResult<ToggleState>>,
    {
        self.require_login().await?;

        let applied = items
            .update(|list| {
                let index = list.iter().position(|item| item.id() == id)?;
                let snapshot = list.clone();
                let guess = list[index].toggle_state().flipped();
                list[index].set_toggle_state(guess);
                Some((snapshot, guess))
            })
            .await;
        let (snapshot, guess) = applied.ok_or_else(|| MutationError::NotFound(id.to_string()))?;

        tracing::debug!(item = %id, active = guess.active, count = guess.count, "Applied optimistic toggle");

        match self.session.authorized(|token| request(token, id)).await {
            Ok(confirmed) => {
                items
                    .update(|list| {
                        if let Some(item) = list.iter_mut().find(|item| item.id() == id) {
                            item.set_toggle_state(confirmed);
                        }
                    })
                    .await;
                if confirmed != guess {
                    tracing::debug!(
                        item = %id,
                        active = confirmed.active,
                        count = confirmed.count,
                        "Server corrected optimistic toggle"
                    );
                }
                Ok(confirmed)
            }
            Err(e) => {
                items.replace(snapshot).await;
                tracing::warn!(item = %id, error = %e, "Toggle failed, rolled back");
                Err(e.into())
            }
        }
    }

    /// Append `provisional` right away and swap in the server's item once
    /// `request` succeeds; restore the previous list if it fails.
    pub async fn insert<T, F, Fut>(
        &self,
        items: &Collection<T>,
        provisional: T,
        request: F,
    ) -> Result<T, MutationError>
    where
        T: Identified,
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        self.require_login().await?;

        let provisional_id = provisional.id();
        let snapshot = items
            .update(|list| {
                let snapshot = list.clone();
                list.push(provisional);
                snapshot
            })
            .await;

        tracing::debug!(item = %provisional_id, "Applied optimistic insert");

        match self.session.authorized(request).await {
            Ok(created) => {
                items
                    .update(|list| {
                        match list.iter_mut().find(|item| item.id() == provisional_id) {
                            Some(slot) => *slot = created.clone(),
                            // Another mutation restored an older snapshot meanwhile
                            None => list.push(created.clone()),
                        }
                    })
                    .await;
                let created_id = created.id();
                tracing::debug!(provisional = %provisional_id, item = %created_id, "Insert confirmed");
                Ok(created)
            }
            Err(e) => {
                items.replace(snapshot).await;
                tracing::warn!(item = %provisional_id, error = %e, "Insert failed, rolled back");
                Err(e.into())
            }
        }
    }

    /// Remove item `id` right away; put the previous list back if
    /// `request` fails.
    pub async fn remove<T, F, Fut>(
        &self,
        items: &Collection<T>,
        id: T::Id,
        request: F,
    ) -> Result<(), MutationError>
    where
        T: Identified,
        F: FnOnce(String, T::Id) -> Fut,
        Fut: Future<Output = ApiResult<()>>,
    {
        self.require_login().await?;

        let snapshot = items
            .update(|list| {
                let index = list.iter().position(|item| item.id() == id)?;
                let snapshot = list.clone();
                list.remove(index);
                Some(snapshot)
            })
            .await
            .ok_or_else(|| MutationError::NotFound(id.to_string()))?;

        tracing::debug!(item = %id, "Applied optimistic removal");

        match self.session.authorized(|token| request(token, id)).await {
            Ok(()) => Ok(()),
            Err(e) => {
                items.replace(snapshot).await;
                tracing::warn!(item = %id, error = %e, "Removal failed, rolled back");
                Err(e.into())
            }
        }
    }
}
