//! Domain identifiers (strongly-typed IDs).
//!
//! ULID-backed so identifiers sort by creation time, wrapped in a generic
//! `Id<T>` with a phantom marker so `UserId`, `BookId` and `LoanId` cannot
//! be mixed up at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait for ID families; supplies the Display prefix.
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn generate() -> Self {
        Self::from_ulid(Ulid::new())
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UserTag {}

impl IdMarker for UserTag {
    fn prefix() -> &'static str {
        "user-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BookTag {}

impl IdMarker for BookTag {
    fn prefix() -> &'static str {
        "book-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LoanTag {}

impl IdMarker for LoanTag {
    fn prefix() -> &'static str {
        "loan-"
    }
}

/// Identifier of a library user (member, librarian or admin).
pub type UserId = Id<UserTag>;

/// Identifier of a catalog title.
pub type BookId = Id<BookTag>;

/// Identifier of one reservation/loan lifecycle.
pub type LoanId = Id<LoanTag>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let ulid1 = Ulid::new();
        let ulid2 = Ulid::new();

        let user = UserId::from_ulid(ulid1);
        let book = BookId::from_ulid(ulid2);

        assert_eq!(user.as_ulid(), ulid1);
        assert_eq!(book.as_ulid(), ulid2);

        assert!(user.to_string().starts_with("user-"));
        assert!(book.to_string().starts_with("book-"));

        // The whole point: you can't accidentally mix these types.
        // (Compile-time property, kept as a comment.)
        // let _: UserId = book; // <- does not compile
    }

    #[test]
    fn generated_ids_sort_by_creation_time() {
        let id1 = LoanId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = LoanId::generate();

        assert!(id1 < id2);
    }

    #[test]
    fn ids_round_trip_through_json() {
        let book_id = BookId::generate();

        let serialized = serde_json::to_string(&book_id).unwrap();
        let deserialized: BookId = serde_json::from_str(&serialized).unwrap();

        assert_eq!(book_id, deserialized);
    }
}
