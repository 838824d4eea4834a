//! Shared item collection

use super::Identified;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Ordered list of items shared between a view and its mutations.
///
/// Cloning a `Collection` yields another handle to the same list. The only
/// way to change the items is [`Collection::update`].
#[derive(Debug)]
pub struct Collection<T> {
    items: Arc<RwLock<Vec<T>>>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<T: Clone> Collection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: Arc::new(RwLock::new(items)),
        }
    }

    /// Copy of the current items
    pub async fn snapshot(&self) -> Vec<T> {
        self.items.read().await.clone()
    }

    /// Mutate the items under the write lock
    pub async fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let mut items = self.items.write().await;
        f(&mut items)
    }

    /// Replace every item
    pub async fn replace(&self, items: Vec<T>) {
        self.update(|current| *current = items).await;
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

impl<T: Identified> Collection<T> {
    /// Copy of the item with the given id
    pub async fn get(&self, id: T::Id) -> Option<T> {
        self.items.read().await.iter().find(|item| item.id() == id).cloned()
    }
}
