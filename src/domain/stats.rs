use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Expense, Order, OrderStatus, Product, Tsh};

/// Derived financial position of the shop. Computed fresh from ledger
/// snapshots on every call; there is no cached state to invalidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessStats {
    pub total_products: usize,
    pub total_orders: usize,
    /// Sum of frozen order totals over non-cancelled orders.
    pub total_revenue: Tsh,
    /// Sum of frozen item costs over the same order set.
    pub total_cost_of_goods_sold: Tsh,
    pub gross_profit: Tsh,
    pub total_expenses: Tsh,
    pub net_profit: Tsh,
    /// Whole days since the earliest order, rounded up, minimum 1.
    pub business_days: i64,
}

/// Compute the shop's financial stats from current ledger state.
///
/// Revenue counts Pending and Completed orders alike: a cancelled order is
/// the only thing that removes money from the books.
pub fn business_stats(
    products: &[Product],
    orders: &[Order],
    expenses: &[Expense],
    now: DateTime<Utc>,
) -> BusinessStats {
    let active: Vec<&Order> = orders
        .iter()
        .filter(|o| o.status != OrderStatus::Cancelled)
        .collect();

    let total_revenue: Tsh = active.iter().map(|o| o.total).sum();
    let total_cost_of_goods_sold: Tsh = active.iter().map(|o| o.cost_of_goods()).sum();
    let total_expenses: Tsh = expenses.iter().map(|e| e.amount).sum();
    let gross_profit = total_revenue - total_cost_of_goods_sold;

    BusinessStats {
        total_products: products.len(),
        total_orders: orders.len(),
        total_revenue,
        total_cost_of_goods_sold,
        gross_profit,
        total_expenses,
        net_profit: gross_profit - total_expenses,
        business_days: business_days(orders, now),
    }
}

/// Age of the business in whole days, measured from the earliest order.
/// Rounds up and never reports less than one day, including when no order
/// has been placed yet.
pub fn business_days(orders: &[Order], now: DateTime<Utc>) -> i64 {
    let earliest = match orders.iter().map(|o| o.created_at).min() {
        Some(ts) => ts,
        None => return 1,
    };

    let elapsed = (now - earliest).num_seconds().max(0);
    let days = (elapsed + 86_400 - 1) / 86_400;
    days.max(1)
}

/// Per-category shelf position, derived from the product ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub product_count: usize,
    /// Products with at least one unit on hand.
    pub in_stock_count: usize,
    pub total_stock: u32,
    /// Cumulative demand counter across the category, all-time.
    pub total_demand: u32,
}

/// Group products by category, preserving first-seen category order.
pub fn category_summaries(products: &[Product]) -> Vec<CategorySummary> {
    let mut summaries: Vec<CategorySummary> = Vec::new();

    for product in products {
        let index = match summaries.iter().position(|s| s.category == product.category) {
            Some(index) => index,
            None => {
                summaries.push(CategorySummary {
                    category: product.category.clone(),
                    product_count: 0,
                    in_stock_count: 0,
                    total_stock: 0,
                    total_demand: 0,
                });
                summaries.len() - 1
            }
        };
        let summary = &mut summaries[index];

        summary.product_count += 1;
        if product.in_stock() {
            summary.in_stock_count += 1;
        }
        summary.total_stock += product.stock;
        summary.total_demand += product.demand;
    }

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CartItem;
    use chrono::Duration;

    fn product(id: &str, category: &str, stock: u32, demand: u32) -> Product {
        Product::new(id, id.to_uppercase(), category, 2000, 1000)
            .with_stock(stock)
            .with_demand(demand)
    }

    fn order_with(price: Tsh, cost: Tsh, quantity: u32, status: OrderStatus) -> Order {
        let p = Product::new("p", "P", "Spirit", price, cost).with_stock(100);
        Order::new(vec![CartItem::from_product(&p, quantity)], None, "cash").with_status(status)
    }

    #[test]
    fn test_revenue_excludes_cancelled() {
        let orders = vec![order_with(50_000, 35_000, 1, OrderStatus::Cancelled)];
        let stats = business_stats(&[], &orders, &[], Utc::now());

        assert_eq!(stats.total_revenue, 0);
        assert_eq!(stats.total_cost_of_goods_sold, 0);
        assert_eq!(stats.total_orders, 1);
    }

    #[test]
    fn test_pending_orders_count_toward_revenue() {
        let orders = vec![
            order_with(2000, 1000, 3, OrderStatus::Pending),
            order_with(500, 300, 2, OrderStatus::Completed),
        ];
        let stats = business_stats(&[], &orders, &[], Utc::now());

        assert_eq!(stats.total_revenue, 6000 + 1000);
        assert_eq!(stats.total_cost_of_goods_sold, 3000 + 600);
        assert_eq!(stats.gross_profit, 3400);
    }

    #[test]
    fn test_net_profit_subtracts_expenses() {
        let orders = vec![order_with(2000, 1000, 3, OrderStatus::Completed)];
        let expenses = vec![Expense::new("Rent", 1500, "Operational")];
        let stats = business_stats(&[], &orders, &expenses, Utc::now());

        assert_eq!(stats.gross_profit, 3000);
        assert_eq!(stats.net_profit, 1500);
    }

    #[test]
    fn test_business_days_empty_ledger() {
        assert_eq!(business_days(&[], Utc::now()), 1);
    }

    #[test]
    fn test_business_days_rounds_up() {
        let now = Utc::now();
        let mut order = order_with(2000, 1000, 1, OrderStatus::Completed);
        order.created_at = now - Duration::hours(30);

        assert_eq!(business_days(&[order], now), 2);
    }

    #[test]
    fn test_business_days_minimum_one() {
        let now = Utc::now();
        let mut order = order_with(2000, 1000, 1, OrderStatus::Completed);
        order.created_at = now - Duration::minutes(5);

        assert_eq!(business_days(&[order], now), 1);
    }

    #[test]
    fn test_category_summaries() {
        let products = vec![
            product("a", "Spirit", 10, 100),
            product("b", "Spirit", 0, 40),
            product("c", "Beer", 120, 450),
        ];

        let summaries = category_summaries(&products);
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].category, "Spirit");
        assert_eq!(summaries[0].product_count, 2);
        assert_eq!(summaries[0].in_stock_count, 1);
        assert_eq!(summaries[0].total_stock, 10);
        assert_eq!(summaries[0].total_demand, 140);

        assert_eq!(summaries[1].category, "Beer");
        assert_eq!(summaries[1].total_stock, 120);
    }
}
