//! Overdue sweep: read-time reclassification of late loans.

use chrono::{DateTime, Utc};

use crate::domain::{fine_for, LendingPolicy, Loan};

/// Reclassify every active/overdue loan past its due date as overdue and
/// recompute its fine at the given daily rate. Returns how many loans were
/// touched.
///
/// Runs on listing reads and after a policy update; there is no background
/// scheduler. Idempotent for loans already overdue, and never moves a copy:
/// an overdue borrower still holds the book.
pub(crate) fn sweep_overdue<'a>(
    loans: impl Iterator<Item = &'a mut Loan>,
    now: DateTime<Utc>,
    policy: &LendingPolicy,
) -> usize {
    let mut swept = 0;
    for loan in loans {
        if !loan.status.is_out() {
            continue;
        }
        let Some(due_date) = loan.due_date else {
            continue;
        };
        if now > due_date {
            loan.mark_overdue(fine_for(now, due_date, policy.daily_fine_amount));
            swept += 1;
        }
    }
    if swept > 0 {
        tracing::debug!(swept, "overdue sweep reclassified loans");
    }
    swept
}
