//! Data Transfer Objects
//!
//! Request and response types for the ReSo backend.
//! Field names follow the backend's snake_case JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = u64;
pub type PostId = u64;
/// Comment ids are signed: comments created locally carry a negative
/// provisional id until the server assigns the real one.
pub type CommentId = i64;

// ============================================
// USERS
// ============================================

/// The logged-in user (or any user returned by search)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Author information embedded in posts and comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Another user's profile as seen by the current viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_following: bool,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
}

// ============================================
// POSTS & COMMENTS
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub content: String,
    #[serde(default, alias = "author")]
    pub user: Option<Author>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default, alias = "is_liked", alias = "liked_by_user")]
    pub liked: bool,
    #[serde(default)]
    pub comments_count: u64,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    /// Comment text (the backend calls the field `comment`)
    pub comment: String,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default, alias = "is_liked")]
    pub liked: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<Author>,
}

impl Comment {
    /// A locally-created comment shown while the create request is in flight
    pub fn provisional(id: CommentId, post_id: PostId, author: &User, text: &str) -> Self {
        Self {
            id,
            post_id,
            user_id: author.id,
            comment: text.to_string(),
            likes_count: 0,
            liked: false,
            created_at: Some(Utc::now()),
            user: Some(Author {
                id: author.id,
                name: author.name.clone(),
                image_url: author.image_url.clone(),
            }),
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.id < 0
    }
}

/// Boolean flag plus counter, the shape shared by likes and follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToggleState {
    pub active: bool,
    pub count: u64,
}

impl ToggleState {
    pub fn new(active: bool, count: u64) -> Self {
        Self { active, count }
    }

    /// The state expected after one toggle: flag flipped, counter moved by
    /// one in the matching direction and never below zero.
    pub fn flipped(self) -> Self {
        let active = !self.active;
        let count = if active {
            self.count.saturating_add(1)
        } else {
            self.count.saturating_sub(1)
        };
        Self { active, count }
    }
}

// ============================================
// REQUESTS
// ============================================

/// Login credentials
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account registration form
#[derive(Clone, Serialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Partial profile update, unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.image_url.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub comment: String,
}

// ============================================
// RESPONSES
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct PostsEnvelope {
    #[serde(default)]
    pub posts: Vec<Post>,
}

/// `GET /getPosts` returns the current user's posts under the `user` key
#[derive(Debug, Deserialize)]
pub struct MyPostsEnvelope {
    #[serde(default, alias = "user")]
    pub posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
pub struct PostEnvelope {
    pub post: Post,
}

#[derive(Debug, Deserialize)]
pub struct CommentsEnvelope {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Deserialize)]
pub struct CommentEnvelope {
    pub comment: Comment,
}

#[derive(Debug, Deserialize)]
pub struct UsersEnvelope {
    #[serde(default)]
    pub users: Vec<User>,
}

/// `GET /users/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPage {
    pub user: PublicProfile,
    #[serde(default)]
    pub posts: Vec<Post>,
}

/// Response of the like endpoints
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub likes_count: u64,
}

impl From<LikeResponse> for ToggleState {
    fn from(r: LikeResponse) -> Self {
        ToggleState::new(r.liked, r.likes_count)
    }
}

/// Response of the follow endpoint
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FollowResponse {
    pub is_following: bool,
    pub followers_count: u64,
}

impl From<FollowResponse> for ToggleState {
    fn from(r: FollowResponse) -> Self {
        ToggleState::new(r.is_following, r.followers_count)
    }
}
