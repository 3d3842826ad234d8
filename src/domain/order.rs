use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CartItem, Tsh};

pub type OrderId = Uuid;
pub type UserId = Uuid;

/// Order lifecycle. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(OrderStatus::Pending),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Transition rules: Pending may settle or cancel; terminal states
    /// accept nothing, including a repeat of themselves.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Completed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer or walk-in order. The item list is a frozen copy captured at
/// checkout; `total` is computed once from it and never recomputed, so
/// later catalog edits cannot retroactively change what was charged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<CartItem>,
    pub total: Tsh,
    pub status: OrderStatus,
    pub payment_method: String,
    /// Decorative receipt note, attached after the order is persisted.
    pub note: Option<String>,
    pub feedback: Option<String>,
}

impl Order {
    pub fn new(items: Vec<CartItem>, user_id: Option<UserId>, payment_method: impl Into<String>) -> Self {
        let total = items.iter().map(CartItem::line_total).sum();
        Self {
            id: Uuid::new_v4(),
            user_id,
            created_at: Utc::now(),
            items,
            total,
            status: OrderStatus::Pending,
            payment_method: payment_method.into(),
            note: None,
            feedback: None,
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    /// Total purchase cost of the frozen items, for profit calculations.
    pub fn cost_of_goods(&self) -> Tsh {
        self.items.iter().map(CartItem::line_cost).sum()
    }

    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Product;

    fn sample_items() -> Vec<CartItem> {
        let a = Product::new("a", "Product A", "Spirit", 2000, 1000).with_stock(10);
        let b = Product::new("b", "Product B", "Beer", 500, 300).with_stock(10);
        vec![CartItem::from_product(&a, 3), CartItem::from_product(&b, 1)]
    }

    #[test]
    fn test_order_total_is_frozen_sum() {
        let order = Order::new(sample_items(), None, "cash");
        assert_eq!(order.total, 3 * 2000 + 500);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_cost_of_goods() {
        let order = Order::new(sample_items(), None, "cash");
        assert_eq!(order.cost_of_goods(), 3 * 1000 + 300);
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_pending_is_the_only_open_state() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));

        for terminal in [OrderStatus::Completed, OrderStatus::Cancelled] {
            assert!(terminal.is_terminal());
            for next in [
                OrderStatus::Pending,
                OrderStatus::Completed,
                OrderStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }
}
