//! ReSo REST API
//!
//! Client side of the ReSo backend's HTTP/JSON contract. Authenticated
//! endpoints take the bearer token explicitly; the session store decides
//! which token to send and reacts when it is rejected.
//!
//! # Endpoints
//!
//! ## Auth & profile
//! - `POST /login` - Exchange credentials for a token
//! - `POST /register` - Create an account
//! - `DELETE /logout` - Revoke the token
//! - `GET /profile` / `PUT /profile` / `DELETE /profile` - Own profile
//!
//! ## Posts
//! - `GET /posts` - Public feed
//! - `GET /posts/feed` - Personalized feed
//! - `POST /posts` - Create a post
//! - `GET /getPosts` - Own posts
//! - `POST /posts/:id/like` - Toggle like
//!
//! ## Comments
//! - `GET /posts/:id/comments` / `POST /posts/:id/comments`
//! - `DELETE /comments/:id`
//! - `POST /comments/:id/like`
//!
//! ## Users
//! - `GET /users/search?q=` - Search by name or email
//! - `GET /users/:id` - Public profile and posts
//! - `POST /users/:id/follow` - Toggle follow

mod client;
pub mod dto;
pub mod error;

pub use client::ApiClient;
pub use dto::*;
pub use error::{ApiError, ApiResult};

use async_trait::async_trait;

/// Operations the client needs from the backend
#[async_trait]
pub trait SocialApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> ApiResult<LoginResponse>;

    async fn register(&self, form: &RegisterForm) -> ApiResult<()>;

    async fn logout(&self, token: &str) -> ApiResult<()>;

    async fn profile(&self, token: &str) -> ApiResult<User>;

    async fn update_profile(&self, token: &str, changes: &ProfileChanges) -> ApiResult<User>;

    async fn delete_profile(&self, token: &str) -> ApiResult<()>;

    async fn public_feed(&self) -> ApiResult<Vec<Post>>;

    async fn personal_feed(&self, token: &str) -> ApiResult<Vec<Post>>;

    async fn my_posts(&self, token: &str) -> ApiResult<Vec<Post>>;

    async fn create_post(&self, token: &str, post: &NewPost) -> ApiResult<Post>;

    async fn toggle_post_like(&self, token: &str, post_id: PostId) -> ApiResult<ToggleState>;

    async fn comments(&self, post_id: PostId) -> ApiResult<Vec<Comment>>;

    async fn create_comment(&self, token: &str, post_id: PostId, text: &str)
        -> ApiResult<Comment>;

    async fn delete_comment(&self, token: &str, comment_id: CommentId) -> ApiResult<()>;

    async fn toggle_comment_like(&self, token: &str, comment_id: CommentId)
        -> ApiResult<ToggleState>;

    async fn search_users(&self, query: &str) -> ApiResult<Vec<User>>;

    /// Credentials are optional; when present `is_following` reflects the viewer
    async fn user_page(&self, token: Option<&str>, user_id: UserId) -> ApiResult<UserPage>;

    async fn toggle_follow(&self, token: &str, user_id: UserId) -> ApiResult<ToggleState>;
}
