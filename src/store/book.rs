//! Book records and the inputs used to create and change them.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A stored book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub description: String,
}

/// A validated book awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    title: String,
    description: String,
}

impl NewBook {
    /// Both fields are required and must not be blank.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Result<Self, StoreError> {
        let title = title.into();
        let description = description.into();

        if title.trim().is_empty() {
            return Err(StoreError::Invalid("title is required".to_string()));
        }
        if description.trim().is_empty() {
            return Err(StoreError::Invalid("description is required".to_string()));
        }

        Ok(Self { title, description })
    }

    pub(crate) fn into_book(self, id: i32) -> Book {
        Book {
            id,
            title: self.title,
            description: self.description,
        }
    }
}

/// A partial update. Empty fields leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub title: String,
    pub description: String,
}

impl BookPatch {
    pub fn apply(&self, book: &mut Book) {
        if !self.title.is_empty() {
            book.title = self.title.clone();
        }
        if !self.description.is_empty() {
            book.description = self.description.clone();
        }
    }
}
