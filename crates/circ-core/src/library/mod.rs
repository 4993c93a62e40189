//! Library ports: catalog management and the loan lifecycle engine.

mod memory;
mod sweep;

pub use memory::InMemoryLibrary;

use async_trait::async_trait;

use crate::domain::{
    Book, BookId, BookPatch, BookSpec, LendingPolicy, Loan, LoanId, PageOptions, UserId,
};
use crate::error::CircResult;
use crate::observability::LoanCounts;

/// Catalog port: copy-count bookkeeping per title.
///
/// v1 is in-memory, but this trait is the seam for swapping in a SQL-backed
/// store later. Implementations must mutate copy counts only inside the
/// same atomic unit as the loan transition that caused the change.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Add a title. Rejects a duplicate ISBN.
    async fn create_book(&self, spec: BookSpec) -> CircResult<Book>;

    async fn get_book(&self, book_id: BookId) -> CircResult<Book>;

    /// Paginated listing, optionally filtered by a case-insensitive
    /// title/author substring.
    async fn list_books(&self, search: Option<&str>, page: PageOptions) -> CircResult<Vec<Book>>;

    async fn update_book(&self, book_id: BookId, patch: BookPatch) -> CircResult<Book>;

    /// Delete a title. Cascades to its loans.
    async fn delete_book(&self, book_id: BookId) -> CircResult<()>;
}

/// Circulation port: the loan lifecycle engine.
///
/// Each method is one synchronous state-machine step; the `(Loan, Book)`
/// pair is read and written as one atomic unit. Staff-gated operations take
/// the caller's id and check the role through the capability table.
#[async_trait]
pub trait Circulation: Send + Sync {
    /// Member reserves a book for pickup. Holds one copy.
    async fn reserve_book(&self, user_id: UserId, book_id: BookId) -> CircResult<Loan>;

    /// Staff hands a copy directly to a member; the loan starts active.
    async fn assign_loan(
        &self,
        staff_id: UserId,
        user_id: UserId,
        book_id: BookId,
    ) -> CircResult<Loan>;

    /// Staff confirms a pickup. Past the deadline this expires the
    /// reservation, releases the hold, and still reports a failure.
    async fn confirm_pickup(&self, staff_id: UserId, loan_id: LoanId) -> CircResult<Loan>;

    /// Staff takes a copy back, computing the fine when late.
    async fn return_book(&self, staff_id: UserId, loan_id: LoanId) -> CircResult<Loan>;

    /// Owner withdraws a reservation. Releases the hold.
    async fn cancel_reservation(&self, user_id: UserId, loan_id: LoanId) -> CircResult<Loan>;

    /// All loans of one user, swept for overdues first.
    async fn list_user_loans(&self, user_id: UserId) -> CircResult<Vec<Loan>>;

    /// All loans system-wide (staff), swept for overdues first.
    async fn list_all_loans(&self, staff_id: UserId, page: PageOptions) -> CircResult<Vec<Loan>>;

    /// Returned loans of one user (staff view); no sweep.
    async fn loan_history(&self, staff_id: UserId, user_id: UserId) -> CircResult<Vec<Loan>>;

    /// Current lending policy, created with defaults on first read.
    async fn get_policy(&self) -> CircResult<LendingPolicy>;

    /// Replace the lending policy (staff). Bounds-checked, then every
    /// outstanding overdue loan is repriced with the new daily rate.
    async fn update_policy(&self, staff_id: UserId, policy: LendingPolicy)
        -> CircResult<LendingPolicy>;

    /// Observability hook: loan totals by status.
    async fn counts_by_status(&self) -> CircResult<LoanCounts>;
}
