//! Test doubles shared by the unit tests

use crate::api::*;
use crate::session::{Session, SessionAction, SessionStore};
use crate::storage::MemoryStore;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

type Script<T> = Mutex<VecDeque<ApiResult<T>>>;

/// Queue a scripted response
pub(crate) fn push<T>(queue: &Script<T>, result: ApiResult<T>) {
    queue.lock().unwrap().push_back(result);
}

fn next<T>(queue: &Script<T>, what: &str) -> ApiResult<T> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(ApiError::Network(format!("no scripted response for {}", what))))
}

/// [`SocialApi`] that replays queued responses and records every call
#[derive(Default)]
pub(crate) struct ScriptedApi {
    pub logins: Script<LoginResponse>,
    pub registrations: Script<()>,
    pub logouts: Script<()>,
    pub profiles: Script<User>,
    pub profile_updates: Script<User>,
    pub account_deletions: Script<()>,
    pub feeds: Script<Vec<Post>>,
    pub created_posts: Script<Post>,
    pub toggles: Script<ToggleState>,
    pub comment_lists: Script<Vec<Comment>>,
    pub created_comments: Script<Comment>,
    pub comment_deletions: Script<()>,
    pub searches: Script<Vec<User>>,
    pub user_pages: Script<UserPage>,
    calls: Mutex<Vec<String>>,
    /// When set, mutating requests wait for a permit before answering
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Hold mutating requests until the returned handle is notified
    pub fn hold_requests(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    fn record(&self, method: &str, path: String, token: Option<&str>) {
        let call = match token {
            Some(token) => format!("{} {} {}", method, path, token),
            None => format!("{} {}", method, path),
        };
        self.calls.lock().unwrap().push(call);
    }

    async fn wait_gate(&self) {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl SocialApi for ScriptedApi {
    async fn login(&self, credentials: &Credentials) -> ApiResult<LoginResponse> {
        self.record("POST", format!("/login {}", credentials.email), None);
        next(&self.logins, "login")
    }

    async fn register(&self, form: &RegisterForm) -> ApiResult<()> {
        self.record("POST", format!("/register {}", form.email), None);
        next(&self.registrations, "register")
    }

    async fn logout(&self, token: &str) -> ApiResult<()> {
        self.record("DELETE", "/logout".into(), Some(token));
        next(&self.logouts, "logout")
    }

    async fn profile(&self, token: &str) -> ApiResult<User> {
        self.record("GET", "/profile".into(), Some(token));
        next(&self.profiles, "profile")
    }

    async fn update_profile(&self, token: &str, _changes: &ProfileChanges) -> ApiResult<User> {
        self.record("PUT", "/profile".into(), Some(token));
        next(&self.profile_updates, "update_profile")
    }

    async fn delete_profile(&self, token: &str) -> ApiResult<()> {
        self.record("DELETE", "/profile".into(), Some(token));
        next(&self.account_deletions, "delete_profile")
    }

    async fn public_feed(&self) -> ApiResult<Vec<Post>> {
        self.record("GET", "/posts".into(), None);
        next(&self.feeds, "public_feed")
    }

    async fn personal_feed(&self, token: &str) -> ApiResult<Vec<Post>> {
        self.record("GET", "/posts/feed".into(), Some(token));
        next(&self.feeds, "personal_feed")
    }

    async fn my_posts(&self, token: &str) -> ApiResult<Vec<Post>> {
        self.record("GET", "/getPosts".into(), Some(token));
        next(&self.feeds, "my_posts")
    }

    async fn create_post(&self, token: &str, _post: &NewPost) -> ApiResult<Post> {
        self.record("POST", "/posts".into(), Some(token));
        next(&self.created_posts, "create_post")
    }

    async fn toggle_post_like(&self, token: &str, post_id: PostId) -> ApiResult<ToggleState> {
        self.record("POST", format!("/posts/{}/like", post_id), Some(token));
        self.wait_gate().await;
        next(&self.toggles, "toggle_post_like")
    }

    async fn comments(&self, post_id: PostId) -> ApiResult<Vec<Comment>> {
        self.record("GET", format!("/posts/{}/comments", post_id), None);
        next(&self.comment_lists, "comments")
    }

    async fn create_comment(
        &self,
        token: &str,
        post_id: PostId,
        _text: &str,
    ) -> ApiResult<Comment> {
        self.record("POST", format!("/posts/{}/comments", post_id), Some(token));
        self.wait_gate().await;
        next(&self.created_comments, "create_comment")
    }

    async fn delete_comment(&self, token: &str, comment_id: CommentId) -> ApiResult<()> {
        self.record("DELETE", format!("/comments/{}", comment_id), Some(token));
        self.wait_gate().await;
        next(&self.comment_deletions, "delete_comment")
    }

    async fn toggle_comment_like(
        &self,
        token: &str,
        comment_id: CommentId,
    ) -> ApiResult<ToggleState> {
        self.record("POST", format!("/comments/{}/like", comment_id), Some(token));
        self.wait_gate().await;
        next(&self.toggles, "toggle_comment_like")
    }

    async fn search_users(&self, query: &str) -> ApiResult<Vec<User>> {
        self.record("GET", format!("/users/search?q={}", query), None);
        next(&self.searches, "search_users")
    }

    async fn user_page(&self, token: Option<&str>, user_id: UserId) -> ApiResult<UserPage> {
        self.record("GET", format!("/users/{}", user_id), token);
        next(&self.user_pages, "user_page")
    }

    async fn toggle_follow(&self, token: &str, user_id: UserId) -> ApiResult<ToggleState> {
        self.record("POST", format!("/users/{}/follow", user_id), Some(token));
        self.wait_gate().await;
        next(&self.toggles, "toggle_follow")
    }
}

/// Session store already logged in as user 1 with token `tok`
pub(crate) async fn logged_in(api: Arc<ScriptedApi>) -> (SessionStore, Arc<MemoryStore>) {
    let storage = Arc::new(MemoryStore::new());
    Session::default()
        .reduce(SessionAction::Login {
            token: "tok".into(),
            user: fixtures::user(1),
        })
        .save(storage.as_ref())
        .unwrap();

    let store = SessionStore::hydrate(api, storage.clone());
    (store, storage)
}

pub(crate) mod fixtures {
    use super::*;

    pub fn user(id: UserId) -> User {
        User {
            id,
            name: format!("user{}", id),
            email: format!("user{}@example.com", id),
            image_url: None,
        }
    }

    pub fn login_response(token: &str, id: UserId) -> LoginResponse {
        LoginResponse {
            token: token.to_string(),
            user: user(id),
        }
    }

    pub fn post(id: PostId, liked: bool, likes_count: u64) -> Post {
        Post {
            id,
            content: format!("post {}", id),
            user: Some(Author {
                id: 2,
                name: "user2".into(),
                image_url: None,
            }),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            likes_count,
            liked,
            comments_count: 0,
            image: None,
        }
    }

    pub fn comment(id: CommentId, post_id: PostId) -> Comment {
        Comment {
            id,
            post_id,
            user_id: 2,
            comment: format!("comment {}", id),
            likes_count: 0,
            liked: false,
            created_at: None,
            user: None,
        }
    }

    pub fn profile(id: UserId, is_following: bool, followers_count: u64) -> PublicProfile {
        PublicProfile {
            id,
            name: format!("user{}", id),
            email: format!("user{}@example.com", id),
            image_url: None,
            is_following,
            followers_count,
            following_count: 0,
        }
    }
}
