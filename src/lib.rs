//! # ReSo
//!
//! Client core for the ReSo social network: who is logged in, and what the
//! user sees while their likes, follows and comments are on the way to the
//! server.
//!
//! ## Features
//!
//! - **Session store**: token and user kept in memory and on disk together,
//!   with a single dispatch entry point and change notifications
//! - **401 handling**: any rejected token ends the session, wherever the
//!   request came from
//! - **Optimistic mutations**: likes, follows and comments show up at once
//!   and roll back exactly if the server disagrees
//! - **View models**: feed, comment thread and user directory built on top
//!
//! ## Modules
//!
//! - [`api`]: REST contract, DTOs and the reqwest client
//! - [`storage`]: Durable key-value persistence
//! - [`session`]: Session state and store
//! - [`mutation`]: Optimistic mutation controller
//! - [`views`]: Screen-level state
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reso::{ApiClient, Config, Credentials, FeedView, FileStore, SessionStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let api = Arc::new(ApiClient::new(&config.api)?);
//!     let storage = Arc::new(FileStore::new(config.session.file()));
//!     let session = Arc::new(SessionStore::hydrate(api.clone(), storage));
//!
//!     session
//!         .login(&Credentials::new("ana@example.com", "secret"))
//!         .await?;
//!
//!     let feed = Arc::new(FeedView::new(api, session));
//!     feed.load().await?;
//!     let _watcher = feed.clone().watch_session();
//!
//!     for post in feed.posts().snapshot().await {
//!         println!("{} ({} likes)", post.content, post.likes_count);
//!     }
//!     feed.toggle_like(1).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod mutation;
pub mod session;
pub mod storage;
pub mod views;

#[cfg(test)]
mod testing;

// Re-export top-level types for convenience
pub use api::{
    ApiClient, ApiError, ApiResult, Comment, Credentials, NewPost, Post, ProfileChanges,
    PublicProfile, RegisterForm, SocialApi, ToggleState, User,
};

pub use config::{ApiConfig, Config, ConfigError, LoggingConfig, SessionConfig};

pub use mutation::{Collection, Identified, MutationController, MutationError, Toggle};

pub use session::{Session, SessionAction, SessionError, SessionStore};

pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageResult};

pub use views::{CommentThread, Directory, FeedKind, FeedView, Feedback, Notice, UserPageView};
