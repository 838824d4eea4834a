//! Local Persistence
//!
//! Durable key-value storage for client state that must survive a restart
//! (the session token and the serialized user).
//!
//! - **file**: JSON document on disk, replaced atomically on every write
//! - **memory**: in-process map, used by tests and ephemeral sessions
//! - **error**: Error types
//!
//! Multi-key writes and removals are all-or-nothing so that related keys
//! (token and user) are never observed half-updated.

pub mod error;
pub mod file;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Key-value persistence backend
pub trait KeyValueStore: Send + Sync {
    /// Read a single key
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write several keys in one step
    fn set_many(&self, entries: &[(&str, String)]) -> StorageResult<()>;

    /// Remove several keys in one step; missing keys are ignored
    fn remove_many(&self, keys: &[&str]) -> StorageResult<()>;
}
