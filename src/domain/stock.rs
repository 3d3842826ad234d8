use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ProductId;

pub type MovementId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementDirection {
    /// Units arriving on the shelf (restock, cancellation return).
    In,
    /// Units leaving via a settled sale.
    Out,
}

impl MovementDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementDirection::In => "IN",
            MovementDirection::Out => "OUT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "IN" => Some(MovementDirection::In),
            "OUT" => Some(MovementDirection::Out),
            _ => None,
        }
    }
}

impl std::fmt::Display for MovementDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only audit entry for a stock change. Entries are never
/// mutated or deleted outside a full store reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    /// Product name snapshot; reports stay readable if the catalog entry
    /// is later renamed.
    pub product_name: String,
    pub quantity: u32,
    pub direction: MovementDirection,
    pub timestamp: DateTime<Utc>,
}

impl StockMovement {
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        direction: MovementDirection,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            direction,
            timestamp: Utc::now(),
        }
    }
}

/// Per-product movement total for one direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMovement {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
}

/// Totals for a set of movement entries, grouped by product within each
/// direction. Grouping preserves first-seen order so reports are stable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementTotals {
    pub stock_in: Vec<ProductMovement>,
    pub stock_out: Vec<ProductMovement>,
    pub total_in: u32,
    pub total_out: u32,
}

/// Aggregate movement entries into typed per-product totals in a single
/// pass over the log.
pub fn aggregate_movements<'a, I>(movements: I) -> MovementTotals
where
    I: IntoIterator<Item = &'a StockMovement>,
{
    let mut totals = MovementTotals::default();

    for movement in movements {
        let (group, grand_total) = match movement.direction {
            MovementDirection::In => (&mut totals.stock_in, &mut totals.total_in),
            MovementDirection::Out => (&mut totals.stock_out, &mut totals.total_out),
        };

        match group.iter_mut().find(|p| p.product_id == movement.product_id) {
            Some(entry) => entry.quantity += movement.quantity,
            None => group.push(ProductMovement {
                product_id: movement.product_id.clone(),
                product_name: movement.product_name.clone(),
                quantity: movement.quantity,
            }),
        }
        *grand_total += movement.quantity;
    }

    totals
}

/// Filter the log to entries within the trailing window ending at `now`.
pub fn movements_since<'a>(
    movements: &'a [StockMovement],
    cutoff: DateTime<Utc>,
) -> impl Iterator<Item = &'a StockMovement> {
    movements.iter().filter(move |m| m.timestamp >= cutoff)
}
