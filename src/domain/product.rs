use serde::{Deserialize, Serialize};

use super::Tsh;

/// Products are identified by stable catalog slugs assigned at seeding time.
pub type ProductId = String;

/// A catalog product and its current stock position.
///
/// `stock` is unsigned so the "never negative" invariant cannot be
/// represented away; all decrements go through [`Product::adjust_stock`].
/// `demand` is a cumulative counter of customer interest - it only grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    /// Sale price per unit.
    pub price: Tsh,
    /// Purchase cost per unit, used for profit calculations.
    pub cost_price: Tsh,
    pub description: String,
    /// Reference to a product image, opaque to the core.
    pub image: String,
    pub stock: u32,
    pub demand: u32,
}

impl Product {
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: Tsh,
        cost_price: Tsh,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            price,
            cost_price,
            description: String::new(),
            image: String::new(),
            stock: 0,
            demand: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_demand(mut self, demand: u32) -> Self {
        self.demand = demand;
        self
    }

    /// Apply a signed stock delta. Fails without mutating when a decrement
    /// exceeds the units on hand; returns the new level otherwise.
    pub fn adjust_stock(&mut self, delta: i64) -> Result<u32, StockError> {
        let new_level = self.stock as i64 + delta;
        if new_level < 0 {
            return Err(StockError::InsufficientStock {
                available: self.stock,
                requested: delta.unsigned_abs() as u32,
            });
        }
        self.stock = new_level as u32;
        Ok(self.stock)
    }

    /// Record customer interest. Demand never decreases.
    pub fn add_demand(&mut self, delta: u32) {
        self.demand = self.demand.saturating_add(delta);
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockError {
    InsufficientStock { available: u32, requested: u32 },
}

impl std::fmt::Display for StockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockError::InsufficientStock {
                available,
                requested,
            } => {
                write!(
                    f,
                    "insufficient stock: {} units requested, {} available",
                    requested, available
                )
            }
        }
    }
}

impl std::error::Error for StockError {}

/// A cart line holding a frozen snapshot of the product at add time.
/// Later catalog edits never change a line's price or cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Tsh,
    pub cost_price: Tsh,
    pub quantity: u32,
}

impl CartItem {
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            cost_price: product.cost_price,
            quantity,
        }
    }

    pub fn line_total(&self) -> Tsh {
        self.price * self.quantity as Tsh
    }

    pub fn line_cost(&self) -> Tsh {
        self.cost_price * self.quantity as Tsh
    }
}

/// A transient working cart. Lives only in the caller's hands; it is never
/// persisted as a ledger entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add units of a product, merging with an existing line for the same
    /// product id.
    pub fn add(&mut self, product: &Product, quantity: u32) {
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            item.quantity += quantity;
        } else {
            self.items.push(CartItem::from_product(product, quantity));
        }
    }

    /// Apply a signed quantity delta to a line. The line is removed when its
    /// quantity would drop to zero or below. Returns the applied delta,
    /// which may be smaller in magnitude than requested when removing more
    /// units than the line holds.
    pub fn change_quantity(&mut self, product_id: &str, delta: i64) -> Option<i64> {
        let pos = self.items.iter().position(|i| i.product_id == product_id)?;
        let current = self.items[pos].quantity as i64;
        let new_qty = (current + delta).max(0);

        if new_qty == 0 {
            self.items.remove(pos);
        } else {
            self.items[pos].quantity = new_qty as u32;
        }
        Some(new_qty - current)
    }

    pub fn total(&self) -> Tsh {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        Product::new("safari-lager", "Safari Lager", "Beer", 3500, 2450).with_stock(10)
    }

    #[test]
    fn test_adjust_stock_decrement() {
        let mut product = sample_product();
        assert_eq!(product.adjust_stock(-3), Ok(7));
        assert_eq!(product.stock, 7);
    }

    #[test]
    fn test_adjust_stock_rejects_overdraw() {
        let mut product = sample_product();
        let result = product.adjust_stock(-11);
        assert_eq!(
            result,
            Err(StockError::InsufficientStock {
                available: 10,
                requested: 11
            })
        );
        // Rejected calls leave the ledger untouched
        assert_eq!(product.stock, 10);
    }

    #[test]
    fn test_adjust_stock_to_exactly_zero() {
        let mut product = sample_product();
        assert_eq!(product.adjust_stock(-10), Ok(0));
        assert!(!product.in_stock());
    }

    #[test]
    fn test_demand_only_grows() {
        let mut product = sample_product();
        product.add_demand(3);
        product.add_demand(0);
        assert_eq!(product.demand, 3);
    }

    #[test]
    fn test_cart_merges_lines_by_product() {
        let product = sample_product();
        let mut cart = Cart::new();
        cart.add(&product, 2);
        cart.add(&product, 1);

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.total(), 10500);
    }

    #[test]
    fn test_cart_snapshot_is_frozen() {
        let mut product = sample_product();
        let mut cart = Cart::new();
        cart.add(&product, 2);

        product.price = 9999;
        assert_eq!(cart.items[0].price, 3500);
        assert_eq!(cart.total(), 7000);
    }

    #[test]
    fn test_change_quantity_removes_empty_lines() {
        let product = sample_product();
        let mut cart = Cart::new();
        cart.add(&product, 2);

        assert_eq!(cart.change_quantity("safari-lager", -2), Some(-2));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_change_quantity_clamps_removal() {
        let product = sample_product();
        let mut cart = Cart::new();
        cart.add(&product, 2);

        // Asking to remove 5 units only releases the 2 actually held
        assert_eq!(cart.change_quantity("safari-lager", -5), Some(-2));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_change_quantity_unknown_product() {
        let mut cart = Cart::new();
        assert_eq!(cart.change_quantity("nope", 1), None);
    }
}
