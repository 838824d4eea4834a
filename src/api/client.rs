//! ReSo REST API Client
//!
//! HTTP client for communicating with the ReSo backend.

use super::dto::*;
use super::error::{ApiError, ApiResult};
use super::SocialApi;
use crate::config::ApiConfig;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// reqwest-backed implementation of [`SocialApi`]
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client from the API configuration
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ApiError::from_reqwest)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        tracing::debug!(method = %method, path = %path, authenticated = token.is_some(), "API request");

        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Accept", "application/json");
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and turn non-success statuses into classified errors
    async fn execute(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "API request failed to complete");
            ApiError::from_reqwest(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "API request rejected");
        Err(ApiError::from_status(status.as_u16(), &body))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.execute(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SocialApi for ApiClient {
    async fn login(&self, credentials: &Credentials) -> ApiResult<LoginResponse> {
        let request = self.request(Method::POST, "/login", None).json(credentials);
        match self.fetch(request).await {
            // On the login endpoint a 401 means the credentials were wrong,
            // not that a token expired.
            Err(ApiError::Unauthorized(_)) => Err(ApiError::InvalidCredentials),
            other => other,
        }
    }

    async fn register(&self, form: &RegisterForm) -> ApiResult<()> {
        let request = self.request(Method::POST, "/register", None).json(form);
        self.execute(request).await.map(|_| ())
    }

    async fn logout(&self, token: &str) -> ApiResult<()> {
        let request = self.request(Method::DELETE, "/logout", Some(token));
        self.execute(request).await.map(|_| ())
    }

    async fn profile(&self, token: &str) -> ApiResult<User> {
        let request = self.request(Method::GET, "/profile", Some(token));
        let envelope: UserEnvelope = self.fetch(request).await?;
        Ok(envelope.user)
    }

    async fn update_profile(&self, token: &str, changes: &ProfileChanges) -> ApiResult<User> {
        let request = self
            .request(Method::PUT, "/profile", Some(token))
            .json(changes);
        let envelope: UserEnvelope = self.fetch(request).await?;
        Ok(envelope.user)
    }

    async fn delete_profile(&self, token: &str) -> ApiResult<()> {
        let request = self.request(Method::DELETE, "/profile", Some(token));
        self.execute(request).await.map(|_| ())
    }

    async fn public_feed(&self) -> ApiResult<Vec<Post>> {
        let envelope: PostsEnvelope = self.fetch(self.request(Method::GET, "/posts", None)).await?;
        Ok(envelope.posts)
    }

    async fn personal_feed(&self, token: &str) -> ApiResult<Vec<Post>> {
        let request = self.request(Method::GET, "/posts/feed", Some(token));
        let envelope: PostsEnvelope = self.fetch(request).await?;
        Ok(envelope.posts)
    }

    async fn my_posts(&self, token: &str) -> ApiResult<Vec<Post>> {
        let request = self.request(Method::GET, "/getPosts", Some(token));
        let envelope: MyPostsEnvelope = self.fetch(request).await?;
        Ok(envelope.posts)
    }

    async fn create_post(&self, token: &str, post: &NewPost) -> ApiResult<Post> {
        let request = self.request(Method::POST, "/posts", Some(token)).json(post);
        let envelope: PostEnvelope = self.fetch(request).await?;
        Ok(envelope.post)
    }

    async fn toggle_post_like(&self, token: &str, post_id: PostId) -> ApiResult<ToggleState> {
        let path = format!("/posts/{}/like", post_id);
        let response: LikeResponse = self.fetch(self.request(Method::POST, &path, Some(token))).await?;
        Ok(response.into())
    }

    async fn comments(&self, post_id: PostId) -> ApiResult<Vec<Comment>> {
        let path = format!("/posts/{}/comments", post_id);
        let envelope: CommentsEnvelope = self.fetch(self.request(Method::GET, &path, None)).await?;
        Ok(envelope.comments)
    }

    async fn create_comment(
        &self,
        token: &str,
        post_id: PostId,
        text: &str,
    ) -> ApiResult<Comment> {
        let path = format!("/posts/{}/comments", post_id);
        let request = self
            .request(Method::POST, &path, Some(token))
            .json(&NewComment {
                comment: text.to_string(),
            });
        let envelope: CommentEnvelope = self.fetch(request).await?;
        Ok(envelope.comment)
    }

    async fn delete_comment(&self, token: &str, comment_id: CommentId) -> ApiResult<()> {
        let path = format!("/comments/{}", comment_id);
        self.execute(self.request(Method::DELETE, &path, Some(token)))
            .await
            .map(|_| ())
    }

    async fn toggle_comment_like(
        &self,
        token: &str,
        comment_id: CommentId,
    ) -> ApiResult<ToggleState> {
        let path = format!("/comments/{}/like", comment_id);
        let response: LikeResponse = self.fetch(self.request(Method::POST, &path, Some(token))).await?;
        Ok(response.into())
    }

    async fn search_users(&self, query: &str) -> ApiResult<Vec<User>> {
        let path = format!("/users/search?q={}", urlencoding::encode(query));
        let envelope: UsersEnvelope = self.fetch(self.request(Method::GET, &path, None)).await?;
        Ok(envelope.users)
    }

    async fn user_page(&self, token: Option<&str>, user_id: UserId) -> ApiResult<UserPage> {
        let path = format!("/users/{}", user_id);
        self.fetch(self.request(Method::GET, &path, token)).await
    }

    async fn toggle_follow(&self, token: &str, user_id: UserId) -> ApiResult<ToggleState> {
        let path = format!("/users/{}/follow", user_id);
        let request = self
            .request(Method::POST, &path, Some(token))
            .json(&serde_json::json!({}));
        let response: FollowResponse = self.fetch(request).await?;
        Ok(response.into())
    }
}
