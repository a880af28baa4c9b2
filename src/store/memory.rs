//! In-process book store.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

use super::{Book, BookPatch, BookStore, NewBook};
use crate::error::StoreError;

/// Book store held entirely in memory. Ids are assigned sequentially from 1
/// and are never reused.
#[derive(Debug, Default)]
pub struct InMemoryBookStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    books: BTreeMap<i32, Book>,
    last_id: i32,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored books.
    pub fn len(&self) -> usize {
        self.inner.read().books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.inner.read().books.values().cloned().collect())
    }

    async fn get(&self, id: i32) -> Result<Option<Book>, StoreError> {
        Ok(self.inner.read().books.get(&id).cloned())
    }

    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        let mut inner = self.inner.write();
        let id = inner
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Invalid("book id space exhausted".to_string()))?;
        inner.last_id = id;

        let book = book.into_book(id);
        inner.books.insert(id, book.clone());
        debug!(id = id, "Book created");
        Ok(book)
    }

    async fn update(&self, id: i32, patch: BookPatch) -> Result<Book, StoreError> {
        let mut inner = self.inner.write();
        let book = inner.books.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        patch.apply(book);
        debug!(id = id, "Book updated");
        Ok(book.clone())
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        inner.books.remove(&id).ok_or(StoreError::NotFound(id))?;
        debug!(id = id, "Book deleted");
        Ok(())
    }
}
