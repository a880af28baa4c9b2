//! Book persistence.

mod book;
mod memory;

use async_trait::async_trait;

use crate::error::StoreError;

pub use book::{Book, BookPatch, NewBook};
pub use memory::InMemoryBookStore;

/// Trait for book store implementations.
///
/// HTTP handlers only see this trait, so the in-memory store can be swapped
/// for a database-backed one without touching the routing layer.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books ordered by id.
    async fn list(&self) -> Result<Vec<Book>, StoreError>;

    /// The book with `id`, if any.
    async fn get(&self, id: i32) -> Result<Option<Book>, StoreError>;

    /// Insert a book and return it with its assigned id.
    async fn create(&self, book: NewBook) -> Result<Book, StoreError>;

    /// Apply `patch` to the book with `id`.
    async fn update(&self, id: i32, patch: BookPatch) -> Result<Book, StoreError>;

    /// Remove the book with `id`.
    async fn delete(&self, id: i32) -> Result<(), StoreError>;
}
