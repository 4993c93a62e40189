//! In-memory library implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use super::sweep::sweep_overdue;
use super::{Catalog, Circulation};
use crate::clock::{Clock, SystemClock};
use crate::domain::{
    fine_for, Book, BookId, BookPatch, BookSpec, Capability, LendingPolicy, Loan, LoanId,
    LoanStatus, PageOptions, User, UserId, UserRole, UserSpec,
};
use crate::error::{CircError, CircResult};
use crate::observability::LoanCounts;

/// In-memory library state.
///
/// Single source of truth for users, books, loans and the lending policy.
/// Every engine operation takes the outer lock once, so the (Loan, Book)
/// pair always mutates as one atomic unit and two reservations can never
/// both take the last copy.
struct LibraryState {
    users: HashMap<UserId, User>,
    books: HashMap<BookId, Book>,
    loans: HashMap<LoanId, Loan>,

    /// Lazily created with defaults on first read.
    policy: Option<LendingPolicy>,
}

impl LibraryState {
    fn new() -> Self {
        Self {
            users: HashMap::new(),
            books: HashMap::new(),
            loans: HashMap::new(),
            policy: None,
        }
    }

    fn policy_or_default(&mut self) -> LendingPolicy {
        self.policy.get_or_insert_with(LendingPolicy::default).clone()
    }

    /// The one place role guards are enforced.
    fn require(&self, caller_id: UserId, capability: Capability) -> CircResult<&User> {
        let caller = self.users.get(&caller_id).ok_or(CircError::UserNotFound)?;
        if !caller.role.allows(capability) {
            let required = match capability {
                Capability::Reserve => "member",
                Capability::ManageLoans | Capability::ManageCatalog | Capability::ManagePolicy => {
                    "librarian"
                }
            };
            return Err(CircError::Forbidden(format!(
                "not enough permissions: {required} access required"
            )));
        }
        Ok(caller)
    }

    fn has_recent_cancellation(
        &self,
        user_id: UserId,
        book_id: BookId,
        now: DateTime<Utc>,
    ) -> bool {
        self.loans.values().any(|loan| {
            loan.user_id == user_id
                && loan.book_id == book_id
                && loan.cancelled_within(now, Duration::days(1))
        })
    }

    /// Read-time overdue sweep over every loan.
    fn sweep(&mut self, now: DateTime<Utc>) {
        let policy = self.policy_or_default();
        sweep_overdue(self.loans.values_mut(), now, &policy);
    }

    fn counts_by_status(&self) -> LoanCounts {
        let mut counts = LoanCounts::default();
        for loan in self.loans.values() {
            match loan.status {
                LoanStatus::Reserved => counts.reserved += 1,
                LoanStatus::Active => counts.active += 1,
                LoanStatus::Returned => counts.returned += 1,
                LoanStatus::Expired => counts.expired += 1,
                LoanStatus::Overdue => counts.overdue += 1,
                LoanStatus::Cancelled => counts.cancelled += 1,
            }
        }
        counts
    }
}

/// In-memory catalog + circulation engine.
pub struct InMemoryLibrary {
    state: Arc<Mutex<LibraryState>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Inject a clock; tests drive deadlines with `ManualClock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(LibraryState::new())),
            clock,
        }
    }

    /// Register a user in the directory the engine consumes. Credential
    /// handling lives outside this crate.
    pub async fn register_user(&self, spec: UserSpec) -> User {
        let mut state = self.state.lock().await;
        let user = User::new(UserId::generate(), spec);
        state.users.insert(user.id, user.clone());
        user
    }

    pub async fn get_user(&self, user_id: UserId) -> CircResult<User> {
        let state = self.state.lock().await;
        state.users.get(&user_id).cloned().ok_or(CircError::UserNotFound)
    }

    /// Ban or unban a user. Admins cannot be banned.
    pub async fn set_banned(&self, user_id: UserId, banned: bool) -> CircResult<User> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or(CircError::UserNotFound)?;
        if banned && user.role == UserRole::Admin {
            return Err(CircError::Forbidden("cannot ban admin user".to_string()));
        }
        user.is_banned = banned;
        Ok(user.clone())
    }
}

impl Default for InMemoryLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Catalog for InMemoryLibrary {
    async fn create_book(&self, spec: BookSpec) -> CircResult<Book> {
        let mut state = self.state.lock().await;

        let book = Book::new(BookId::generate(), spec)?;
        if state.books.values().any(|b| b.isbn == book.isbn) {
            return Err(CircError::DuplicateIsbn(book.isbn));
        }

        state.books.insert(book.id, book.clone());
        tracing::info!(book_id = %book.id, isbn = %book.isbn, "book created");
        Ok(book)
    }

    async fn get_book(&self, book_id: BookId) -> CircResult<Book> {
        let state = self.state.lock().await;
        state.books.get(&book_id).cloned().ok_or(CircError::BookNotFound)
    }

    async fn list_books(&self, search: Option<&str>, page: PageOptions) -> CircResult<Vec<Book>> {
        let state = self.state.lock().await;
        let mut books: Vec<Book> = state
            .books
            .values()
            .filter(|book| search.is_none_or(|term| book.matches_search(term)))
            .cloned()
            .collect();
        books.sort_by_key(|book| book.id);
        Ok(books.into_iter().skip(page.offset).take(page.limit).collect())
    }

    async fn update_book(&self, book_id: BookId, patch: BookPatch) -> CircResult<Book> {
        let mut state = self.state.lock().await;

        if !state.books.contains_key(&book_id) {
            return Err(CircError::BookNotFound);
        }
        if let Some(new_isbn) = &patch.isbn {
            if state
                .books
                .values()
                .any(|b| b.id != book_id && &b.isbn == new_isbn)
            {
                return Err(CircError::DuplicateIsbn(new_isbn.clone()));
            }
        }

        let book = state
            .books
            .get_mut(&book_id)
            .expect("book existence checked above");
        book.apply_patch(patch)?;
        Ok(book.clone())
    }

    async fn delete_book(&self, book_id: BookId) -> CircResult<()> {
        let mut state = self.state.lock().await;
        if state.books.remove(&book_id).is_none() {
            return Err(CircError::BookNotFound);
        }
        // Cascades: the title's loans go with it, history included.
        state.loans.retain(|_, loan| loan.book_id != book_id);
        tracing::info!(book_id = %book_id, "book deleted");
        Ok(())
    }
}

#[async_trait]
impl Circulation for InMemoryLibrary {
    async fn reserve_book(&self, user_id: UserId, book_id: BookId) -> CircResult<Loan> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let borrower = state.require(user_id, Capability::Reserve)?.clone();

        let book = state.books.get(&book_id).ok_or(CircError::BookNotFound)?;
        if book.available_copies == 0 {
            return Err(CircError::Unavailable);
        }
        if borrower.is_banned {
            return Err(CircError::Forbidden(
                "you are banned from reserving books".to_string(),
            ));
        }
        if state.has_recent_cancellation(user_id, book_id, now) {
            return Err(CircError::RecentCancellation);
        }

        let policy = state.policy_or_default();
        let loan = Loan::reserved(
            LoanId::generate(),
            user_id,
            book_id,
            now,
            policy.pickup_deadline(now),
        );

        state
            .books
            .get_mut(&book_id)
            .expect("book existence checked above")
            .hold_copy()?;
        state.loans.insert(loan.id, loan.clone());

        tracing::info!(loan_id = %loan.id, user_id = %user_id, book_id = %book_id, "book reserved");
        Ok(loan)
    }

    async fn assign_loan(
        &self,
        staff_id: UserId,
        user_id: UserId,
        book_id: BookId,
    ) -> CircResult<Loan> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        state.require(staff_id, Capability::ManageLoans)?;

        let target = state.users.get(&user_id).ok_or(CircError::UserNotFound)?;
        if target.role != UserRole::Member {
            return Err(CircError::Forbidden(
                "loans can only be assigned to members".to_string(),
            ));
        }
        if target.is_banned {
            return Err(CircError::Forbidden(
                "user is banned from borrowing books".to_string(),
            ));
        }

        let policy = state.policy_or_default();
        let book = state.books.get_mut(&book_id).ok_or(CircError::BookNotFound)?;
        book.hold_copy()?;

        let loan = Loan::assigned(LoanId::generate(), user_id, book_id, now, policy.due_date(now));
        state.loans.insert(loan.id, loan.clone());

        tracing::info!(loan_id = %loan.id, user_id = %user_id, book_id = %book_id, "loan assigned");
        Ok(loan)
    }

    async fn confirm_pickup(&self, staff_id: UserId, loan_id: LoanId) -> CircResult<Loan> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        state.require(staff_id, Capability::ManageLoans)?;

        let (status, pickup_deadline, book_id) = {
            let loan = state.loans.get(&loan_id).ok_or(CircError::LoanNotFound)?;
            (loan.status, loan.pickup_deadline, loan.book_id)
        };
        if status != LoanStatus::Reserved {
            return Err(CircError::InvalidState(status));
        }

        if pickup_deadline.is_some_and(|deadline| now > deadline) {
            // Deadline missed: the expiry and the copy release commit even
            // though the caller gets a failure.
            let loan = state
                .loans
                .get_mut(&loan_id)
                .expect("loan existence checked above");
            loan.expire();
            if let Some(book) = state.books.get_mut(&book_id) {
                book.release_copy();
            }
            tracing::warn!(loan_id = %loan_id, "pickup after deadline, reservation expired");
            return Err(CircError::ReservationExpired);
        }

        let policy = state.policy_or_default();
        let due_date = policy.due_date(now);
        let loan = state
            .loans
            .get_mut(&loan_id)
            .expect("loan existence checked above");
        loan.begin(now, due_date);

        tracing::info!(loan_id = %loan_id, due_date = %due_date, "pickup confirmed");
        Ok(loan.clone())
    }

    async fn return_book(&self, staff_id: UserId, loan_id: LoanId) -> CircResult<Loan> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        state.require(staff_id, Capability::ManageLoans)?;

        let (status, due_date, book_id) = {
            let loan = state.loans.get(&loan_id).ok_or(CircError::LoanNotFound)?;
            (loan.status, loan.due_date, loan.book_id)
        };
        if !status.is_out() {
            return Err(CircError::InvalidState(status));
        }

        let policy = state.policy_or_default();
        let fine = due_date
            .map(|due| fine_for(now, due, policy.daily_fine_amount))
            .unwrap_or(0.0);

        let loan = state
            .loans
            .get_mut(&loan_id)
            .expect("loan existence checked above");
        loan.finish(now, fine);
        let snapshot = loan.clone();

        if let Some(book) = state.books.get_mut(&book_id) {
            book.release_copy();
        }

        tracing::info!(loan_id = %loan_id, fine, "book returned");
        Ok(snapshot)
    }

    async fn cancel_reservation(&self, user_id: UserId, loan_id: LoanId) -> CircResult<Loan> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let (owner, status, book_id) = {
            let loan = state.loans.get(&loan_id).ok_or(CircError::LoanNotFound)?;
            (loan.user_id, loan.status, loan.book_id)
        };
        if owner != user_id {
            return Err(CircError::Forbidden(
                "you can only cancel your own reservations".to_string(),
            ));
        }
        if status != LoanStatus::Reserved {
            return Err(CircError::InvalidState(status));
        }

        let loan = state
            .loans
            .get_mut(&loan_id)
            .expect("loan existence checked above");
        loan.cancel(now);
        let snapshot = loan.clone();

        if let Some(book) = state.books.get_mut(&book_id) {
            book.release_copy();
        }

        tracing::info!(loan_id = %loan_id, "reservation cancelled");
        Ok(snapshot)
    }

    async fn list_user_loans(&self, user_id: UserId) -> CircResult<Vec<Loan>> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        state.sweep(now);
        let mut loans: Vec<Loan> = state
            .loans
            .values()
            .filter(|loan| loan.user_id == user_id)
            .cloned()
            .collect();
        loans.sort_by_key(|loan| loan.id);
        Ok(loans)
    }

    async fn list_all_loans(&self, staff_id: UserId, page: PageOptions) -> CircResult<Vec<Loan>> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        state.require(staff_id, Capability::ManageLoans)?;
        state.sweep(now);

        let mut loans: Vec<Loan> = state.loans.values().cloned().collect();
        loans.sort_by_key(|loan| loan.id);
        Ok(loans.into_iter().skip(page.offset).take(page.limit).collect())
    }

    async fn loan_history(&self, staff_id: UserId, user_id: UserId) -> CircResult<Vec<Loan>> {
        let state = self.state.lock().await;

        state.require(staff_id, Capability::ManageLoans)?;

        let mut loans: Vec<Loan> = state
            .loans
            .values()
            .filter(|loan| loan.user_id == user_id && loan.status == LoanStatus::Returned)
            .cloned()
            .collect();
        loans.sort_by_key(|loan| loan.id);
        Ok(loans)
    }

    async fn get_policy(&self) -> CircResult<LendingPolicy> {
        let mut state = self.state.lock().await;
        Ok(state.policy_or_default())
    }

    async fn update_policy(
        &self,
        staff_id: UserId,
        policy: LendingPolicy,
    ) -> CircResult<LendingPolicy> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        state.require(staff_id, Capability::ManagePolicy)?;
        policy.validate()?;

        state.policy = Some(policy.clone());
        // Retroactive repricing: outstanding overdue fines move to the new
        // daily rate immediately, not on the next return.
        state.sweep(now);

        tracing::info!(
            pickup_window_days = policy.pickup_window_days,
            standard_loan_days = policy.standard_loan_days,
            daily_fine_amount = policy.daily_fine_amount,
            "lending policy updated"
        );
        Ok(policy)
    }

    async fn counts_by_status(&self) -> CircResult<LoanCounts> {
        let state = self.state.lock().await;
        Ok(state.counts_by_status())
    }
}
