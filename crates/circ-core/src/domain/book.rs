//! Catalog entries and copy accounting.

use serde::{Deserialize, Serialize};

use super::ids::BookId;
use crate::error::{CircError, CircResult};

fn default_total_copies() -> u32 {
    1
}

/// Input for adding a title to the catalog.
///
/// `available_copies` defaults to `total_copies` and is clamped to it, so a
/// fresh title never starts with more copies on the shelf than it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSpec {
    pub title: String,
    pub author: String,
    pub isbn: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_total_copies")]
    pub total_copies: u32,

    #[serde(default)]
    pub available_copies: Option<u32>,
}

impl BookSpec {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            description: None,
            total_copies: 1,
            available_copies: None,
        }
    }

    pub fn with_copies(mut self, total: u32) -> Self {
        self.total_copies = total;
        self
    }

    fn validate(&self) -> CircResult<()> {
        if self.title.is_empty() {
            return Err(CircError::Validation("title must not be empty".to_string()));
        }
        if self.author.is_empty() {
            return Err(CircError::Validation(
                "author must not be empty".to_string(),
            ));
        }
        if !(10..=20).contains(&self.isbn.len()) {
            return Err(CircError::Validation(
                "isbn must be between 10 and 20 characters".to_string(),
            ));
        }
        if !(1..=1000).contains(&self.total_copies) {
            return Err(CircError::Validation(
                "total_copies must be between 1 and 1000".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub total_copies: Option<u32>,
    pub available_copies: Option<u32>,
}

/// Pagination window for listing reads. Limit defaults to 100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageOptions {
    pub offset: usize,
    pub limit: usize,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
        }
    }
}

/// A title in the catalog.
///
/// Design:
/// - `available_copies` is the single source of truth for availability;
///   `is_available` is derived and refreshed on every mutation.
/// - Copy counts change only through `hold_copy`/`release_copy`, inside the
///   same atomic unit as the loan transition that caused the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub description: Option<String>,
    pub total_copies: u32,
    pub available_copies: u32,
    pub is_available: bool,
}

impl Book {
    pub fn new(id: BookId, spec: BookSpec) -> CircResult<Self> {
        spec.validate()?;
        let available = spec
            .available_copies
            .unwrap_or(spec.total_copies)
            .min(spec.total_copies);
        let mut book = Self {
            id,
            title: spec.title,
            author: spec.author,
            isbn: spec.isbn,
            description: spec.description,
            total_copies: spec.total_copies,
            available_copies: available,
            is_available: false,
        };
        book.refresh_availability();
        Ok(book)
    }

    /// Take one copy off the shelf for a reservation or direct loan.
    pub fn hold_copy(&mut self) -> CircResult<()> {
        if self.available_copies == 0 {
            return Err(CircError::Unavailable);
        }
        self.available_copies -= 1;
        self.refresh_availability();
        Ok(())
    }

    /// Put a copy back (return, cancellation, expired pickup).
    ///
    /// Clamped to `total_copies`: after an update shrank the total below
    /// the number of copies out on loan, late returns must not push the
    /// count past the new total.
    pub fn release_copy(&mut self) {
        self.available_copies = (self.available_copies + 1).min(self.total_copies);
        self.refresh_availability();
    }

    /// Apply a partial update, keeping `available <= total`.
    pub fn apply_patch(&mut self, patch: BookPatch) -> CircResult<()> {
        if let Some(title) = patch.title {
            if title.is_empty() {
                return Err(CircError::Validation("title must not be empty".to_string()));
            }
            self.title = title;
        }
        if let Some(author) = patch.author {
            if author.is_empty() {
                return Err(CircError::Validation(
                    "author must not be empty".to_string(),
                ));
            }
            self.author = author;
        }
        if let Some(isbn) = patch.isbn {
            if !(10..=20).contains(&isbn.len()) {
                return Err(CircError::Validation(
                    "isbn must be between 10 and 20 characters".to_string(),
                ));
            }
            self.isbn = isbn;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(total) = patch.total_copies {
            if !(1..=1000).contains(&total) {
                return Err(CircError::Validation(
                    "total_copies must be between 1 and 1000".to_string(),
                ));
            }
            self.total_copies = total;
        }
        if let Some(available) = patch.available_copies {
            self.available_copies = available;
        }
        if self.available_copies > self.total_copies {
            self.available_copies = self.total_copies;
        }
        self.refresh_availability();
        Ok(())
    }

    /// Case-insensitive substring match on title or author.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term) || self.author.to_lowercase().contains(&term)
    }

    fn refresh_availability(&mut self) {
        self.is_available = self.available_copies > 0;
    }
}
