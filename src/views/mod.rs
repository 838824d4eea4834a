//! View Models
//!
//! Screen-level state built on the session store and the mutation
//! controller. Views own their collections and a [`Feedback`] slot; they
//! hold no mutation logic of their own.
//!
//! - **feed**: public or personalized post feed, own posts, composer
//! - **comments**: comment thread of one post
//! - **directory**: user search, public profiles, follow toggling
//! - **feedback**: last error / success message for a view

mod comments;
mod directory;
mod feed;
mod feedback;

pub use comments::CommentThread;
pub use directory::{Directory, UserPageView, MIN_SEARCH_LEN};
pub use feed::{FeedKind, FeedView};
pub use feedback::{Feedback, Notice};
