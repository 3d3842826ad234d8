use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::MovementTotals;

/// Stock movement report over the trailing seven-day window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyMovementReport {
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    #[serde(flatten)]
    pub totals: MovementTotals,
}

/// All-time movement summary across the whole audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementSummary {
    pub entries: usize,
    #[serde(flatten)]
    pub totals: MovementTotals,
}
