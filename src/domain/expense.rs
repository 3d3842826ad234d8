use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Tsh;

pub type ExpenseId = Uuid;

/// An operating expense. Entries are append-only; only a full store reset
/// removes them, and even a reset leaves the expense ledger alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub amount: Tsh,
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

impl Expense {
    pub fn new(description: impl Into<String>, amount: Tsh, category: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            category: category.into(),
            timestamp: Utc::now(),
        }
    }
}
