//! Comment thread of a single post

use super::Feedback;
use crate::api::{Comment, CommentId, PostId, SocialApi, ToggleState};
use crate::mutation::{Collection, MutationController, MutationError};
use crate::session::{SessionError, SessionStore};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub struct CommentThread {
    post_id: PostId,
    api: Arc<dyn SocialApi>,
    mutations: MutationController,
    comments: Collection<Comment>,
    /// Provisional ids count down from -1 so they never collide with the
    /// server's
    next_provisional: AtomicI64,
    feedback: Feedback,
}

impl CommentThread {
    pub fn new(api: Arc<dyn SocialApi>, session: Arc<SessionStore>, post_id: PostId) -> Self {
        Self {
            post_id,
            api,
            mutations: MutationController::new(session),
            comments: Collection::default(),
            next_provisional: AtomicI64::new(-1),
            feedback: Feedback::new(),
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn comments(&self) -> &Collection<Comment> {
        &self.comments
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    pub async fn load(&self) -> Result<usize, SessionError> {
        match self.api.comments(self.post_id).await {
            Ok(comments) => {
                let count = comments.len();
                tracing::debug!(post_id = self.post_id, count, "Comments loaded");
                self.comments.replace(comments).await;
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(post_id = self.post_id, error = %e, "Comment load failed");
                self.feedback.show_error(e.user_message()).await;
                Err(e.into())
            }
        }
    }

    /// Append a comment by the logged-in user.
    ///
    /// The comment shows up immediately under a provisional id and is
    /// replaced by the server's copy once saved.
    pub async fn add(&self, text: &str) -> Result<Comment, MutationError> {
        let result = self.try_add(text.trim()).await;
        self.report(&result).await;
        result
    }

    async fn try_add(&self, text: &str) -> Result<Comment, MutationError> {
        if text.is_empty() {
            return Err(MutationError::Invalid("Comment cannot be empty".into()));
        }
        let author = self
            .mutations
            .session()
            .user()
            .await
            .ok_or(MutationError::AuthenticationRequired)?;

        let provisional_id = self.next_provisional.fetch_sub(1, Ordering::Relaxed);
        let provisional = Comment::provisional(provisional_id, self.post_id, &author, text);

        let api = Arc::clone(&self.api);
        let post_id = self.post_id;
        let text = text.to_string();
        self.mutations
            .insert(&self.comments, provisional, move |token| async move {
                api.create_comment(&token, post_id, &text).await
            })
            .await
    }

    pub async fn delete(&self, comment_id: CommentId) -> Result<(), MutationError> {
        let result = match Self::saved(comment_id) {
            Ok(id) => {
                let api = Arc::clone(&self.api);
                self.mutations
                    .remove(&self.comments, id, move |token, id| async move {
                        api.delete_comment(&token, id).await
                    })
                    .await
            }
            Err(e) => Err(e),
        };
        self.report(&result).await;
        result
    }

    pub async fn toggle_like(&self, comment_id: CommentId) -> Result<ToggleState, MutationError> {
        let result = match Self::saved(comment_id) {
            Ok(id) => {
                let api = Arc::clone(&self.api);
                self.mutations
                    .toggle(&self.comments, id, move |token, id| async move {
                        api.toggle_comment_like(&token, id).await
                    })
                    .await
            }
            Err(e) => Err(e),
        };
        self.report(&result).await;
        result
    }

    /// Provisional comments have no server id to act on yet
    fn saved(comment_id: CommentId) -> Result<CommentId, MutationError> {
        if comment_id < 0 {
            Err(MutationError::Invalid("Comment is still being saved".into()))
        } else {
            Ok(comment_id)
        }
    }

    async fn report<T>(&self, result: &Result<T, MutationError>) {
        if let Err(e) = result {
            self.feedback.show_error(e.user_message()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::storage::MemoryStore;
    use crate::testing::{fixtures, logged_in, push, ScriptedApi};

    async fn thread(api: &Arc<ScriptedApi>) -> CommentThread {
        let (store, _storage) = logged_in(api.clone()).await;
        let thread = CommentThread::new(api.clone(), Arc::new(store), 1);
        push(
            &api.comment_lists,
            Ok(vec![fixtures::comment(5, 1), fixtures::comment(6, 1)]),
        );
        thread.load().await.unwrap();
        thread
    }

    async fn ids(thread: &CommentThread) -> Vec<CommentId> {
        thread.comments().snapshot().await.iter().map(|c| c.id).collect()
    }

    #[tokio::test]
    async fn test_load_is_public() {
        let api = Arc::new(ScriptedApi::default());
        push(&api.comment_lists, Ok(vec![fixtures::comment(5, 1)]));
        let session = Arc::new(SessionStore::hydrate(api.clone(), Arc::new(MemoryStore::new())));
        let thread = CommentThread::new(api.clone(), session, 1);

        assert_eq!(thread.load().await.unwrap(), 1);
        assert_eq!(api.calls(), vec!["GET /posts/1/comments"]);
    }

    #[tokio::test]
    async fn test_add_shows_provisional_then_server_comment() {
        let api = Arc::new(ScriptedApi::default());
        let thread = Arc::new(thread(&api).await);
        push(&api.created_comments, Ok(fixtures::comment(7, 1)));
        let gate = api.hold_requests();

        let task = {
            let thread = thread.clone();
            tokio::spawn(async move { thread.add("  nice post ").await })
        };
        while api.calls().len() < 2 {
            tokio::task::yield_now().await;
        }

        let pending = thread.comments().get(-1).await.unwrap();
        assert!(pending.is_provisional());
        assert_eq!(pending.comment, "nice post");
        assert_eq!(pending.user_id, 1);

        gate.notify_one();
        task.await.unwrap().unwrap();
        assert_eq!(ids(&thread).await, vec![5, 6, 7]);
    }

    #[tokio::test]
    async fn test_provisional_ids_are_distinct() {
        let api = Arc::new(ScriptedApi::default());
        let thread = thread(&api).await;
        push(&api.created_comments, Err(ApiError::Timeout));
        push(&api.created_comments, Err(ApiError::Timeout));

        assert!(thread.add("one").await.is_err());
        assert!(thread.add("two").await.is_err());

        assert_eq!(thread.next_provisional.load(Ordering::Relaxed), -3);
        assert_eq!(ids(&thread).await, vec![5, 6]);
    }

    #[tokio::test]
    async fn test_empty_comment_rejected() {
        let api = Arc::new(ScriptedApi::default());
        let thread = thread(&api).await;

        let err = thread.add(" \n ").await.unwrap_err();

        assert!(matches!(err, MutationError::Invalid(_)));
        assert_eq!(api.calls().len(), 1);
        assert_eq!(
            thread.feedback().current().await.unwrap().message(),
            "Comment cannot be empty"
        );
    }

    #[tokio::test]
    async fn test_add_requires_login() {
        let api = Arc::new(ScriptedApi::default());
        let session = Arc::new(SessionStore::hydrate(api.clone(), Arc::new(MemoryStore::new())));
        let thread = CommentThread::new(api.clone(), session, 1);

        let err = thread.add("hi").await.unwrap_err();

        assert!(matches!(err, MutationError::AuthenticationRequired));
        assert!(thread.comments().is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_failure_restores_comment() {
        let api = Arc::new(ScriptedApi::default());
        let thread = thread(&api).await;
        push(
            &api.comment_deletions,
            Err(ApiError::Server {
                status: 500,
                message: "oops".into(),
            }),
        );

        assert!(thread.delete(5).await.is_err());
        assert_eq!(ids(&thread).await, vec![5, 6]);
    }

    #[tokio::test]
    async fn test_provisional_comment_cannot_be_liked() {
        let api = Arc::new(ScriptedApi::default());
        let thread = thread(&api).await;

        let err = thread.toggle_like(-1).await.unwrap_err();

        assert!(matches!(err, MutationError::Invalid(_)));
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_like() {
        let api = Arc::new(ScriptedApi::default());
        let thread = thread(&api).await;
        push(&api.toggles, Ok(ToggleState::new(true, 1)));

        thread.toggle_like(6).await.unwrap();

        let comment = thread.comments().get(6).await.unwrap();
        assert!(comment.liked);
        assert_eq!(comment.likes_count, 1);
        assert!(api.calls().contains(&"POST /comments/6/like tok".to_string()));
    }
}
