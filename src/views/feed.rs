//! Post feed and composer

use super::Feedback;
use crate::api::{NewPost, Post, PostId, SocialApi, ToggleState};
use crate::mutation::{Collection, MutationController, MutationError};
use crate::session::{SessionError, SessionStore};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Which list of posts the view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    /// `GET /posts`, everyone's posts
    Public,
    /// `GET /posts/feed`, posts from followed users
    Personal,
    /// `GET /getPosts`, the logged-in user's own posts
    Mine,
}

/// Post list bound to the session
pub struct FeedView {
    api: Arc<dyn SocialApi>,
    mutations: MutationController,
    posts: Collection<Post>,
    kind: RwLock<FeedKind>,
    feedback: Feedback,
}

impl FeedView {
    pub fn new(api: Arc<dyn SocialApi>, session: Arc<SessionStore>) -> Self {
        Self {
            api,
            mutations: MutationController::new(session),
            posts: Collection::default(),
            kind: RwLock::new(FeedKind::Public),
            feedback: Feedback::new(),
        }
    }

    fn session(&self) -> &Arc<SessionStore> {
        self.mutations.session()
    }

    pub fn posts(&self) -> &Collection<Post> {
        &self.posts
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    /// Kind of the most recent load
    pub async fn kind(&self) -> FeedKind {
        *self.kind.read().await
    }

    /// Load the personalized feed when logged in, the public one otherwise
    pub async fn load(&self) -> Result<FeedKind, SessionError> {
        let result = if self.session().is_authenticated().await {
            let api = Arc::clone(&self.api);
            self.session()
                .authorized(|token| async move { api.personal_feed(&token).await })
                .await
                .map(|posts| (FeedKind::Personal, posts))
        } else {
            self.api
                .public_feed()
                .await
                .map(|posts| (FeedKind::Public, posts))
                .map_err(SessionError::from)
        };

        self.settle(result).await
    }

    /// Load the logged-in user's own posts
    pub async fn load_mine(&self) -> Result<FeedKind, SessionError> {
        let api = Arc::clone(&self.api);
        let result = self
            .session()
            .authorized(|token| async move { api.my_posts(&token).await })
            .await
            .map(|posts| (FeedKind::Mine, posts));

        self.settle(result).await
    }

    async fn settle(
        &self,
        result: Result<(FeedKind, Vec<Post>), SessionError>,
    ) -> Result<FeedKind, SessionError> {
        match result {
            Ok((kind, posts)) => {
                tracing::debug!(?kind, count = posts.len(), "Feed loaded");
                self.posts.replace(posts).await;
                *self.kind.write().await = kind;
                Ok(kind)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Feed load failed");
                self.feedback.show_error(e.user_message()).await;
                Err(e)
            }
        }
    }

    /// Reload whenever the session token changes.
    ///
    /// An own-posts view is emptied on logout instead of falling back to
    /// the public feed. The task holds the view weakly and ends at the first
    /// session change after the last `Arc<FeedView>` is dropped.
    pub fn watch_session(self: Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.session().subscribe();
        let mut last_token = changes.borrow().token().map(str::to_string);
        let weak = Arc::downgrade(&self);
        drop(self);

        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let Some(view) = weak.upgrade() else {
                    break;
                };

                let token = changes.borrow_and_update().token().map(str::to_string);
                if token == last_token {
                    continue;
                }
                last_token = token;

                let reloaded = match (view.kind().await, &last_token) {
                    (FeedKind::Mine, None) => {
                        view.posts.replace(Vec::new()).await;
                        Ok(FeedKind::Mine)
                    }
                    (FeedKind::Mine, Some(_)) => view.load_mine().await,
                    _ => view.load().await,
                };
                if let Err(e) = reloaded {
                    tracing::debug!(error = %e, "Reload after session change failed");
                }
            }
            tracing::debug!("Feed view gone, session watch stopped");
        })
    }

    /// Like or unlike a post
    pub async fn toggle_like(&self, post_id: PostId) -> Result<ToggleState, MutationError> {
        let api = Arc::clone(&self.api);
        let result = self
            .mutations
            .toggle(&self.posts, post_id, move |token, id| async move {
                api.toggle_post_like(&token, id).await
            })
            .await;

        if let Err(e) = &result {
            self.feedback.show_error(e.user_message()).await;
        }
        result
    }

    /// Publish a post and put it at the top of the list
    pub async fn create_post(
        &self,
        content: &str,
        image: Option<String>,
    ) -> Result<Post, MutationError> {
        let content = content.trim();
        if content.is_empty() {
            let err = MutationError::Invalid("Post content cannot be empty".into());
            self.feedback.show_error(err.user_message()).await;
            return Err(err);
        }

        let api = Arc::clone(&self.api);
        let post = NewPost {
            content: content.to_string(),
            image,
        };
        let result = self
            .session()
            .authorized(|token| async move { api.create_post(&token, &post).await })
            .await
            .map_err(MutationError::from);

        match result {
            Ok(created) => {
                tracing::info!(post_id = created.id, "Post published");
                self.posts.update(|list| list.insert(0, created.clone())).await;
                self.feedback.show_success("Post published").await;
                Ok(created)
            }
            Err(e) => {
                self.feedback.show_error(e.user_message()).await;
                Err(e)
            }
        }
    }
}
