//! Lending policy: the three tunable values the lifecycle engine reads.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CircError, CircResult};

/// Process-wide lending policy.
///
/// Stored as a single record and lazily created with defaults on first
/// read. Updating it retroactively reprices every outstanding overdue loan
/// with the new daily rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LendingPolicy {
    /// Days between reservation and required pickup.
    pub pickup_window_days: u32,

    /// Days from pickup confirmation to due date.
    pub standard_loan_days: u32,

    /// Fine accrued per late day.
    pub daily_fine_amount: f64,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            pickup_window_days: 2,
            standard_loan_days: 30,
            daily_fine_amount: 0.1,
        }
    }
}

impl LendingPolicy {
    /// Bounds check for updates: pickup window 1..=14 days, loan length
    /// 1..=120 days, fine rate 0.0..=100.0 per day.
    pub fn validate(&self) -> CircResult<()> {
        if !(1..=14).contains(&self.pickup_window_days) {
            return Err(CircError::Validation(
                "pickup_window_days must be between 1 and 14".to_string(),
            ));
        }
        if !(1..=120).contains(&self.standard_loan_days) {
            return Err(CircError::Validation(
                "standard_loan_days must be between 1 and 120".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.daily_fine_amount) {
            return Err(CircError::Validation(
                "daily_fine_amount must be between 0.0 and 100.0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn pickup_deadline(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(i64::from(self.pickup_window_days))
    }

    pub fn due_date(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(i64::from(self.standard_loan_days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_match_the_documented_policy() {
        let policy = LendingPolicy::default();
        assert_eq!(policy.pickup_window_days, 2);
        assert_eq!(policy.standard_loan_days, 30);
        assert_eq!(policy.daily_fine_amount, 0.1);
        assert!(policy.validate().is_ok());
    }

    #[rstest]
    #[case::pickup_zero(0, 30, 0.1)]
    #[case::pickup_too_long(15, 30, 0.1)]
    #[case::loan_zero(2, 0, 0.1)]
    #[case::loan_too_long(2, 121, 0.1)]
    #[case::negative_fine(2, 30, -0.5)]
    #[case::fine_too_high(2, 30, 100.5)]
    fn out_of_bounds_updates_are_rejected(
        #[case] pickup_window_days: u32,
        #[case] standard_loan_days: u32,
        #[case] daily_fine_amount: f64,
    ) {
        let policy = LendingPolicy {
            pickup_window_days,
            standard_loan_days,
            daily_fine_amount,
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn deadlines_derive_from_now() {
        let policy = LendingPolicy::default();
        let now: DateTime<Utc> = "2024-03-01T08:00:00Z".parse().unwrap();

        assert_eq!(policy.pickup_deadline(now), now + Duration::days(2));
        assert_eq!(policy.due_date(now), now + Duration::days(30));
    }
}
