//! Loan lifecycle: status, record, transitions and fine computation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BookId, LoanId, UserId};

/// Loan lifecycle status.
///
/// State transitions:
/// - Reserved -> Active (pickup before the deadline)
/// - Reserved -> Expired (pickup after the deadline; hold released)
/// - Reserved -> Cancelled (owner cancels; hold released)
/// - Active -> Overdue (sweep past the due date; copy stays out)
/// - Active/Overdue -> Returned (copy released, fine settled)
///
/// Design note: the enum keeps matching exhaustive; the engine rejects any
/// transition not listed above with the loan's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// Copy held, waiting for pickup.
    Reserved,

    /// Copy out with the borrower.
    Active,

    /// Copy back on the shelf.
    Returned,

    /// Pickup deadline missed; hold released.
    Expired,

    /// Past the due date, copy still out.
    Overdue,

    /// Reservation withdrawn by the owner.
    Cancelled,
}

impl LoanStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LoanStatus::Returned | LoanStatus::Expired | LoanStatus::Cancelled
        )
    }

    /// Does a loan in this state hold one of the book's copies?
    pub fn holds_copy(self) -> bool {
        matches!(
            self,
            LoanStatus::Reserved | LoanStatus::Active | LoanStatus::Overdue
        )
    }

    /// Active or overdue: out with a borrower and subject to the sweep.
    pub fn is_out(self) -> bool {
        matches!(self, LoanStatus::Active | LoanStatus::Overdue)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoanStatus::Reserved => "reserved",
            LoanStatus::Active => "active",
            LoanStatus::Returned => "returned",
            LoanStatus::Expired => "expired",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Cancelled => "cancelled",
        };
        s.fmt(f)
    }
}

/// Whole late days between due date and now, counting any lateness at all
/// as at least one full day. Same-day lateness is deliberately one day, not
/// zero.
///
/// Callers only invoke this when `now > due_date`.
pub fn days_late(now: DateTime<Utc>, due_date: DateTime<Utc>) -> i64 {
    let days = now
        .date_naive()
        .signed_duration_since(due_date.date_naive())
        .num_days();
    days.max(1)
}

/// Fine owed at `now` for a loan due at `due_date`, or 0.0 if not yet late.
pub fn fine_for(now: DateTime<Utc>, due_date: DateTime<Utc>, daily_fine_amount: f64) -> f64 {
    if now <= due_date {
        return 0.0;
    }
    days_late(now, due_date) as f64 * daily_fine_amount
}

/// One reservation/loan lifecycle for a (user, book) pair.
///
/// Design:
/// - This record is the single source of truth for the loan's state.
/// - Transitions are dumb setters; guard checks live in the engine, which
///   mutates the record and the book's copy count in one atomic unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub status: LoanStatus,

    pub reservation_date: DateTime<Utc>,
    pub pickup_deadline: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,

    pub fine_amount: f64,
}

impl Loan {
    /// A member reservation: copy held, pickup pending.
    pub fn reserved(
        id: LoanId,
        user_id: UserId,
        book_id: BookId,
        now: DateTime<Utc>,
        pickup_deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            book_id,
            status: LoanStatus::Reserved,
            reservation_date: now,
            pickup_deadline: Some(pickup_deadline),
            start_date: None,
            due_date: None,
            returned_at: None,
            canceled_at: None,
            fine_amount: 0.0,
        }
    }

    /// A direct staff assignment: starts out active, no pickup step.
    pub fn assigned(
        id: LoanId,
        user_id: UserId,
        book_id: BookId,
        now: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            book_id,
            status: LoanStatus::Active,
            reservation_date: now,
            pickup_deadline: None,
            start_date: Some(now),
            due_date: Some(due_date),
            returned_at: None,
            canceled_at: None,
            fine_amount: 0.0,
        }
    }

    /// Reserved -> Active on pickup confirmation.
    pub fn begin(&mut self, now: DateTime<Utc>, due_date: DateTime<Utc>) {
        self.status = LoanStatus::Active;
        self.start_date = Some(now);
        self.due_date = Some(due_date);
    }

    /// Reserved -> Expired when the pickup deadline was missed.
    pub fn expire(&mut self) {
        self.status = LoanStatus::Expired;
    }

    /// Reserved -> Cancelled by the owner.
    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = LoanStatus::Cancelled;
        self.canceled_at = Some(now);
    }

    /// Active/Overdue -> Returned, settling the fine computed by the engine.
    pub fn finish(&mut self, now: DateTime<Utc>, fine: f64) {
        self.status = LoanStatus::Returned;
        self.returned_at = Some(now);
        if fine > 0.0 {
            self.fine_amount = fine;
        }
    }

    /// Active/Overdue -> Overdue with a freshly computed fine. Idempotent
    /// when already overdue; the copy stays with the borrower.
    pub fn mark_overdue(&mut self, fine: f64) {
        self.status = LoanStatus::Overdue;
        self.fine_amount = fine;
    }

    /// Was this loan cancelled within the given window before `now`?
    pub fn cancelled_within(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.status == LoanStatus::Cancelled
            && self
                .canceled_at
                .is_some_and(|at| at > now - window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[rstest]
    #[case::reserved(LoanStatus::Reserved, false, true)]
    #[case::active(LoanStatus::Active, false, true)]
    #[case::overdue(LoanStatus::Overdue, false, true)]
    #[case::returned(LoanStatus::Returned, true, false)]
    #[case::expired(LoanStatus::Expired, true, false)]
    #[case::cancelled(LoanStatus::Cancelled, true, false)]
    fn status_classification(
        #[case] status: LoanStatus,
        #[case] terminal: bool,
        #[case] holds: bool,
    ) {
        assert_eq!(status.is_terminal(), terminal);
        assert_eq!(status.holds_copy(), holds);
    }

    #[test]
    fn ten_days_late_at_0_75_is_7_5() {
        let due = at("2024-03-01T08:00:00Z");
        let now = due + Duration::days(10);
        assert_eq!(days_late(now, due), 10);
        assert_eq!(fine_for(now, due, 0.75), 7.5);
    }

    #[test]
    fn same_day_lateness_counts_as_one_full_day() {
        let due = at("2024-03-01T08:00:00Z");
        let now = at("2024-03-01T10:00:00Z");
        assert!(now > due);
        assert_eq!(days_late(now, due), 1);
        assert_eq!(fine_for(now, due, 0.5), 0.5);
    }

    #[test]
    fn no_fine_before_the_due_date() {
        let due = at("2024-03-01T08:00:00Z");
        assert_eq!(fine_for(due - Duration::hours(1), due, 0.5), 0.0);
        assert_eq!(fine_for(due, due, 0.5), 0.0);
    }

    #[test]
    fn reservation_then_pickup_sets_loan_dates() {
        let now = at("2024-03-01T08:00:00Z");
        let mut loan = Loan::reserved(
            LoanId::generate(),
            UserId::generate(),
            BookId::generate(),
            now,
            now + Duration::days(2),
        );
        assert_eq!(loan.status, LoanStatus::Reserved);
        assert!(loan.start_date.is_none());

        let picked_up = now + Duration::days(1);
        loan.begin(picked_up, picked_up + Duration::days(30));
        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(loan.start_date, Some(picked_up));
        assert_eq!(loan.due_date, Some(picked_up + Duration::days(30)));
    }

    #[test]
    fn finish_keeps_zero_fine_when_on_time() {
        let now = at("2024-03-01T08:00:00Z");
        let mut loan = Loan::assigned(
            LoanId::generate(),
            UserId::generate(),
            BookId::generate(),
            now,
            now + Duration::days(30),
        );
        loan.finish(now + Duration::days(5), 0.0);
        assert_eq!(loan.status, LoanStatus::Returned);
        assert_eq!(loan.fine_amount, 0.0);
        assert_eq!(loan.returned_at, Some(now + Duration::days(5)));
    }

    #[test]
    fn cancelled_within_window() {
        let now = at("2024-03-01T08:00:00Z");
        let mut loan = Loan::reserved(
            LoanId::generate(),
            UserId::generate(),
            BookId::generate(),
            now,
            now + Duration::days(2),
        );
        loan.cancel(now);

        assert!(loan.cancelled_within(now + Duration::hours(23), Duration::days(1)));
        assert!(!loan.cancelled_within(now + Duration::hours(25), Duration::days(1)));
    }
}
