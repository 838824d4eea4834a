//! User search and public profiles

use super::Feedback;
use crate::api::{Post, PublicProfile, SocialApi, ToggleState, User, UserId};
use crate::mutation::{Collection, MutationController, MutationError};
use crate::session::{SessionError, SessionStore};
use std::sync::Arc;

/// Shortest query, after trimming, that is sent to the server
pub const MIN_SEARCH_LEN: usize = 2;

/// Result of opening a user's page
#[derive(Debug, Clone)]
pub enum UserPageView {
    /// The id belongs to the logged-in user; show their own profile instead
    Own(User),
    Other {
        user_id: UserId,
        profile: Collection<PublicProfile>,
        posts: Collection<Post>,
    },
}

impl UserPageView {
    /// Current profile of another user
    pub async fn profile(&self) -> Option<PublicProfile> {
        match self {
            UserPageView::Own(_) => None,
            UserPageView::Other { user_id, profile, .. } => profile.get(*user_id).await,
        }
    }
}

pub struct Directory {
    api: Arc<dyn SocialApi>,
    mutations: MutationController,
    results: Collection<User>,
    feedback: Feedback,
}

impl Directory {
    pub fn new(api: Arc<dyn SocialApi>, session: Arc<SessionStore>) -> Self {
        Self {
            api,
            mutations: MutationController::new(session),
            results: Collection::default(),
            feedback: Feedback::new(),
        }
    }

    fn session(&self) -> &Arc<SessionStore> {
        self.mutations.session()
    }

    pub fn results(&self) -> &Collection<User> {
        &self.results
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    /// Search users by name or email.
    ///
    /// Queries shorter than [`MIN_SEARCH_LEN`] characters clear the results
    /// without asking the server.
    pub async fn search(&self, query: &str) -> Result<Vec<User>, SessionError> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            self.results.replace(Vec::new()).await;
            return Ok(Vec::new());
        }

        match self.api.search_users(query).await {
            Ok(users) => {
                tracing::debug!(query, count = users.len(), "User search finished");
                self.results.replace(users.clone()).await;
                Ok(users)
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "User search failed");
                self.feedback.show_error(e.user_message()).await;
                Err(e.into())
            }
        }
    }

    /// Open the page of user `user_id`.
    ///
    /// The token is sent when logged in so `is_following` reflects the
    /// viewer; anonymous viewers still get the page.
    pub async fn load_user(&self, user_id: UserId) -> Result<UserPageView, SessionError> {
        if let Some(me) = self.session().user().await {
            if me.id == user_id {
                return Ok(UserPageView::Own(me));
            }
        }

        let api = Arc::clone(&self.api);
        let page = if self.session().is_authenticated().await {
            self.session()
                .authorized(|token| async move { api.user_page(Some(&token), user_id).await })
                .await
        } else {
            api.user_page(None, user_id).await.map_err(SessionError::from)
        };

        match page {
            Ok(page) => Ok(UserPageView::Other {
                user_id,
                profile: Collection::new(vec![page.user]),
                posts: Collection::new(page.posts),
            }),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "User page load failed");
                self.feedback.show_error(e.user_message()).await;
                Err(e)
            }
        }
    }

    /// Follow or unfollow the user shown on `page`
    pub async fn toggle_follow(&self, page: &UserPageView) -> Result<ToggleState, MutationError> {
        let result = match page {
            UserPageView::Own(_) => Err(MutationError::Invalid("You cannot follow yourself".into())),
            UserPageView::Other { user_id, profile, .. } => {
                let api = Arc::clone(&self.api);
                self.mutations
                    .toggle(profile, *user_id, move |token, id| async move {
                        api.toggle_follow(&token, id).await
                    })
                    .await
            }
        };

        match &result {
            Ok(state) if state.active => self.feedback.show_success("Following").await,
            Ok(_) => self.feedback.show_success("Unfollowed").await,
            Err(e) => self.feedback.show_error(e.user_message()).await,
        }
        result
    }
}
