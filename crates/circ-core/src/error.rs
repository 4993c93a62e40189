use thiserror::Error;

use crate::domain::LoanStatus;

/// Operational classification of a failure.
///
/// The boundary layer (HTTP, CLI, ...) maps these to transport statuses;
/// the variants below carry the human-readable detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    Unavailable,
    Forbidden,
    Conflict,
    Validation,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CircError {
    #[error("user not found")]
    UserNotFound,

    #[error("book not found")]
    BookNotFound,

    #[error("loan not found")]
    LoanNotFound,

    /// The operation is not legal from the loan's current status.
    #[error("operation not allowed while loan is {0}")]
    InvalidState(LoanStatus),

    /// Pickup was attempted after the deadline. The reservation has already
    /// been expired and the held copy released by the time this is returned.
    #[error("reservation has expired")]
    ReservationExpired,

    /// A cancellation for the same (user, book) pair happened less than
    /// 24 hours ago.
    #[error("you must wait 24 hours before reserving this book again")]
    RecentCancellation,

    #[error("book is not available")]
    Unavailable,

    #[error("{0}")]
    Forbidden(String),

    #[error("book with ISBN {0} already exists")]
    DuplicateIsbn(String),

    #[error("{0}")]
    Validation(String),
}

impl CircError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CircError::UserNotFound | CircError::BookNotFound | CircError::LoanNotFound => {
                ErrorKind::NotFound
            }
            CircError::InvalidState(_)
            | CircError::ReservationExpired
            | CircError::RecentCancellation => ErrorKind::InvalidState,
            CircError::Unavailable => ErrorKind::Unavailable,
            CircError::Forbidden(_) => ErrorKind::Forbidden,
            CircError::DuplicateIsbn(_) => ErrorKind::Conflict,
            CircError::Validation(_) => ErrorKind::Validation,
        }
    }
}

pub type CircResult<T> = Result<T, CircError>;
