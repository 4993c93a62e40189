use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanCounts {
    pub reserved: usize,
    pub active: usize,
    pub returned: usize,
    pub expired: usize,
    pub overdue: usize,
    pub cancelled: usize,
}
