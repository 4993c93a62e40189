//! circ-core
//!
//! Core building blocks for the library circulation backend.
//!
//! # Module layout
//! - **domain**: entities and pure rules (ids, users, books, loans, policy)
//! - **library**: the `Catalog`/`Circulation` ports and the in-memory
//!   implementation that runs the loan lifecycle state machine
//! - **clock**: time injection so deadlines and fines are testable
//! - **error**: tagged failures for the boundary layer to translate
//! - **observability**: loan counts by status

pub mod clock;
pub mod domain;
pub mod error;
pub mod library;
pub mod observability;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CircError, CircResult, ErrorKind};
pub use library::{Catalog, Circulation, InMemoryLibrary};
