use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::{
    BusinessStats, Cart, CategorySummary, Expense, MovementDirection, Order, OrderId, OrderStatus,
    Product, StockError, StockMovement, Tsh, User, UserId, aggregate_movements, business_stats,
    category_summaries, hash_secret, movements_since, verify_secret,
};
use crate::storage::{Repository, StoreHealth};

use super::AppError;
use super::receipt::{NoteGenerator, generate_note};
use super::reporting::{MovementSummary, WeeklyMovementReport};

/// Administrative product override. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub id: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Tsh>,
    pub cost_price: Option<Tsh>,
    pub stock: Option<u32>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Application service owning every ledger operation. This is the primary
/// interface for any host (CLI, API, test harness); it is handed a
/// repository and keeps no state of its own beyond the write lock.
///
/// Every mutating operation holds `write_lock` for its whole
/// read-modify-write span, so concurrent check-then-act sequences on stock
/// and order status serialize instead of racing.
pub struct ShopService {
    repo: Repository,
    write_lock: Mutex<()>,
}

impl ShopService {
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            write_lock: Mutex::new(()),
        }
    }

    /// Initialize a store at the given path, seeding defaults on first run.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing store.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Product ledger
    // ========================

    /// Current catalog snapshot in stable insertion order.
    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.repo.load_products().await?)
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Product, AppError> {
        self.repo
            .load_products()
            .await?
            .into_iter()
            .find(|p| p.id == product_id)
            .ok_or_else(|| AppError::ProductNotFound(product_id.to_string()))
    }

    /// Administrative override of catalog fields. A stock increase through
    /// this path is a restock and gets one IN movement sized to the
    /// difference; a decrease is a silent correction.
    pub async fn update_product(&self, update: ProductUpdate) -> Result<Product, AppError> {
        if update.price.is_some_and(|p| p < 0) || update.cost_price.is_some_and(|c| c < 0) {
            return Err(AppError::InvalidArgument(
                "prices cannot be negative".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;

        let mut products = self.repo.load_products().await?;
        let product = products
            .iter_mut()
            .find(|p| p.id == update.id)
            .ok_or_else(|| AppError::ProductNotFound(update.id.clone()))?;

        let old_stock = product.stock;

        if let Some(name) = update.name {
            product.name = name;
        }
        if let Some(category) = update.category {
            product.category = category;
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(cost_price) = update.cost_price {
            product.cost_price = cost_price;
        }
        if let Some(description) = update.description {
            product.description = description;
        }
        if let Some(image) = update.image {
            product.image = image;
        }
        if let Some(stock) = update.stock {
            product.stock = stock;
        }

        let updated = product.clone();
        self.repo.save_products(&products).await?;

        if updated.stock > old_stock {
            let restocked = updated.stock - old_stock;
            self.repo
                .append_movements(&[StockMovement::new(
                    updated.id.clone(),
                    updated.name.clone(),
                    restocked,
                    MovementDirection::In,
                )])
                .await?;
            info!(product = %updated.id, units = restocked, "restock recorded");
        }

        Ok(updated)
    }

    // ========================
    // Cart operations
    // ========================

    /// Add units of a product to a working cart. Stock is reserved (and
    /// demand counted) the moment the units enter the cart, not at
    /// checkout; a rejected call leaves both cart and ledger untouched.
    pub async fn add_to_cart(
        &self,
        cart: &mut Cart,
        product_id: &str,
        quantity: u32,
    ) -> Result<(), AppError> {
        if quantity == 0 {
            return Err(AppError::InvalidArgument(
                "quantity must be at least 1".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;

        let mut products = self.repo.load_products().await?;
        let product = products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or_else(|| AppError::ProductNotFound(product_id.to_string()))?;

        product
            .adjust_stock(-(quantity as i64))
            .map_err(|e| stock_error(&product.name, e))?;
        product.add_demand(quantity);

        cart.add(product, quantity);
        self.repo.save_products(&products).await?;
        Ok(())
    }

    /// Change a cart line by a signed delta. Extra units reserve more
    /// stock (and demand); removed units release their reservation. The
    /// line disappears when its quantity reaches zero. Removals are
    /// clamped to the units actually held, and demand is never decremented.
    pub async fn update_cart_item(
        &self,
        cart: &mut Cart,
        product_id: &str,
        delta: i64,
    ) -> Result<(), AppError> {
        let line_quantity = cart
            .items
            .iter()
            .find(|i| i.product_id == product_id)
            .map(|i| i.quantity as i64)
            .ok_or_else(|| AppError::InvalidArgument(format!("{} is not in the cart", product_id)))?;

        let applied = delta.max(-line_quantity);
        if applied == 0 {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;

        let mut products = self.repo.load_products().await?;
        let product = products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or_else(|| AppError::ProductNotFound(product_id.to_string()))?;

        product
            .adjust_stock(-applied)
            .map_err(|e| stock_error(&product.name, e))?;
        if applied > 0 {
            product.add_demand(applied as u32);
        }

        cart.change_quantity(product_id, applied);
        self.repo.save_products(&products).await?;
        Ok(())
    }

    // ========================
    // Order ledger
    // ========================

    /// Turn a working cart into a Pending order. Stock was already
    /// reserved line by line, so checkout only freezes the snapshot and
    /// computes the total. The order is persisted before any receipt note
    /// is generated.
    pub async fn checkout(
        &self,
        cart: Cart,
        user_id: Option<UserId>,
        payment_method: &str,
    ) -> Result<Order, AppError> {
        if cart.is_empty() {
            return Err(AppError::InvalidArgument("cart is empty".to_string()));
        }

        let _guard = self.write_lock.lock().await;

        let order = Order::new(cart.items, user_id, payment_method);
        self.repo.add_order(&order).await?;

        info!(order = %order.id, total = order.total, "order placed");
        Ok(order)
    }

    /// Generate and attach the decorative receipt note. Failures inside
    /// the generator never surface here; the fallback note is used. The
    /// generator runs outside the write lock so a slow collaborator never
    /// stalls the ledgers.
    pub async fn attach_note<G: NoteGenerator>(
        &self,
        order_id: OrderId,
        generator: &G,
    ) -> Result<Order, AppError> {
        let order = self
            .repo
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::OrderNotFound(order_id.to_string()))?;

        let note = generate_note(generator, &order).await;

        let _guard = self.write_lock.lock().await;
        let mut order = self
            .repo
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::OrderNotFound(order_id.to_string()))?;
        order.note = Some(note);
        self.repo.update_order(&order).await?;
        Ok(order)
    }

    /// Advance an order through its lifecycle.
    ///
    /// Pending -> Completed settles the sale: one OUT movement per line,
    /// no further stock change (the decrement happened at cart-add).
    /// Pending -> Cancelled releases the reservation: stock restored and
    /// one IN movement per line. Terminal states accept nothing.
    pub async fn transition(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, AppError> {
        let _guard = self.write_lock.lock().await;

        let mut orders = self.repo.load_orders().await?;
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| AppError::OrderNotFound(order_id.to_string()))?;

        if !order.status.can_transition_to(new_status) {
            return Err(AppError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }

        let movements: Vec<StockMovement> = match new_status {
            OrderStatus::Completed => order
                .items
                .iter()
                .map(|item| {
                    StockMovement::new(
                        item.product_id.clone(),
                        item.name.clone(),
                        item.quantity,
                        MovementDirection::Out,
                    )
                })
                .collect(),
            OrderStatus::Cancelled => {
                let mut products = self.repo.load_products().await?;
                for item in &order.items {
                    if let Some(product) = products.iter_mut().find(|p| p.id == item.product_id) {
                        // Releasing a reservation cannot overdraw
                        let _ = product.adjust_stock(item.quantity as i64);
                    }
                }
                self.repo.save_products(&products).await?;

                order
                    .items
                    .iter()
                    .map(|item| {
                        StockMovement::new(
                            item.product_id.clone(),
                            item.name.clone(),
                            item.quantity,
                            MovementDirection::In,
                        )
                    })
                    .collect()
            }
            OrderStatus::Pending => Vec::new(),
        };

        order.status = new_status;
        let updated = order.clone();

        self.repo.save_orders(&orders).await?;
        self.repo.append_movements(&movements).await?;

        info!(order = %updated.id, status = %updated.status, "order transitioned");
        Ok(updated)
    }

    /// Attach customer feedback to an order. Overwrites any earlier text.
    pub async fn attach_feedback(&self, order_id: OrderId, text: &str) -> Result<Order, AppError> {
        let _guard = self.write_lock.lock().await;

        let mut order = self
            .repo
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::OrderNotFound(order_id.to_string()))?;

        order.feedback = Some(text.to_string());
        self.repo.update_order(&order).await?;
        Ok(order)
    }

    /// Point-of-sale path: the order is created already Completed, stock
    /// decremented and demand counted in the same call, and exactly one
    /// OUT movement written per line. Rejections (unknown product, not
    /// enough units) happen before anything is mutated.
    pub async fn direct_sale(
        &self,
        items: &[(String, u32)],
        payment_method: &str,
    ) -> Result<Order, AppError> {
        if items.is_empty() {
            return Err(AppError::InvalidArgument("no items in sale".to_string()));
        }
        if items.iter().any(|(_, quantity)| *quantity == 0) {
            return Err(AppError::InvalidArgument(
                "quantity must be at least 1".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;

        let mut products = self.repo.load_products().await?;

        // Merge duplicate lines, then validate the whole sale before
        // touching the ledger: all-or-nothing.
        let mut cart = Cart::new();
        for (product_id, quantity) in items {
            let product = products
                .iter()
                .find(|p| p.id == *product_id)
                .ok_or_else(|| AppError::ProductNotFound(product_id.clone()))?;
            cart.add(product, *quantity);
        }

        for line in &cart.items {
            let product = products
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or_else(|| AppError::ProductNotFound(line.product_id.clone()))?;
            if product.stock < line.quantity {
                return Err(AppError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock,
                    requested: line.quantity,
                });
            }
        }

        let mut movements = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let product = products
                .iter_mut()
                .find(|p| p.id == line.product_id)
                .ok_or_else(|| AppError::ProductNotFound(line.product_id.clone()))?;
            product
                .adjust_stock(-(line.quantity as i64))
                .map_err(|e| stock_error(&product.name, e))?;
            product.add_demand(line.quantity);
            movements.push(StockMovement::new(
                line.product_id.clone(),
                line.name.clone(),
                line.quantity,
                MovementDirection::Out,
            ));
        }

        let order = Order::new(cart.items, None, payment_method)
            .with_status(OrderStatus::Completed)
            .with_feedback("Walk-in counter sale");

        self.repo.save_products(&products).await?;
        self.repo.add_order(&order).await?;
        self.repo.append_movements(&movements).await?;

        info!(order = %order.id, total = order.total, "direct sale settled");
        Ok(order)
    }

    /// All orders, most recent first.
    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        Ok(self.repo.load_orders().await?)
    }

    /// Orders owned by one customer, most recent first.
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, AppError> {
        Ok(self
            .repo
            .load_orders()
            .await?
            .into_iter()
            .filter(|o| o.user_id == Some(user_id))
            .collect())
    }

    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, AppError> {
        self.repo
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::OrderNotFound(order_id.to_string()))
    }

    // ========================
    // Expense ledger
    // ========================

    pub async fn record_expense(
        &self,
        description: &str,
        amount: Tsh,
        category: &str,
    ) -> Result<Expense, AppError> {
        if description.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "expense description is required".to_string(),
            ));
        }
        if amount <= 0 {
            return Err(AppError::InvalidArgument(
                "expense amount must be positive".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;

        let expense = Expense::new(description.trim(), amount, category);
        self.repo.add_expense(&expense).await?;
        Ok(expense)
    }

    /// All expenses, most recent first.
    pub async fn list_expenses(&self) -> Result<Vec<Expense>, AppError> {
        Ok(self.repo.load_expenses().await?)
    }

    // ========================
    // Account store
    // ========================

    /// Register a customer account. The password is stored as a salted
    /// Argon2 hash, never plaintext.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        password: &str,
    ) -> Result<User, AppError> {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(AppError::InvalidArgument(
                "a valid email is required".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(AppError::InvalidArgument(
                "a password is required".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;

        let mut users = self.repo.load_users().await?;
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::DuplicateEmail(email.to_string()));
        }

        let hash = hash_secret(password)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
        let user = User::new(name, email, phone, hash);

        users.push(user.clone());
        self.repo.save_users(&users).await?;
        Ok(user)
    }

    /// Authenticate and store the active-session pointer. Unknown email
    /// and bad password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AppError> {
        let users = self.repo.load_users().await?;
        let user = users
            .iter()
            .find(|u| u.email == email)
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_secret(password, &user.password_hash) {
            return Err(AppError::InvalidCredentials);
        }

        self.repo.set_session(user).await?;
        Ok(user.clone())
    }

    pub async fn current_user(&self) -> Result<Option<User>, AppError> {
        Ok(self.repo.current_session().await?)
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        Ok(self.repo.clear_session().await?)
    }

    /// Gate for the admin surface: verify the shared PIN against its
    /// stored hash. Every admin operation calls this first.
    pub async fn verify_admin_pin(&self, pin: &str) -> Result<(), AppError> {
        let hash = self
            .repo
            .admin_pin_hash()
            .await?
            .ok_or_else(|| anyhow::anyhow!("admin PIN is not provisioned"))?;

        if verify_secret(pin, &hash) {
            Ok(())
        } else {
            Err(AppError::InvalidAdminPin)
        }
    }

    // ========================
    // Statistics
    // ========================

    /// Financial snapshot, recomputed from the ledgers on every call.
    pub async fn stats(&self) -> Result<BusinessStats, AppError> {
        let products = self.repo.load_products().await?;
        let orders = self.repo.load_orders().await?;
        let expenses = self.repo.load_expenses().await?;
        Ok(business_stats(&products, &orders, &expenses, Utc::now()))
    }

    /// Per-product movement totals over the trailing seven days.
    pub async fn weekly_report(&self) -> Result<WeeklyMovementReport, AppError> {
        let movements = self.repo.load_movements().await?;
        let to_date = Utc::now();
        let from_date = to_date - Duration::days(7);

        Ok(WeeklyMovementReport {
            from_date,
            to_date,
            totals: aggregate_movements(movements_since(&movements, from_date)),
        })
    }

    /// All-time movement totals across the whole audit trail.
    pub async fn movement_summary(&self) -> Result<MovementSummary, AppError> {
        let movements = self.repo.load_movements().await?;
        Ok(MovementSummary {
            entries: movements.len(),
            totals: aggregate_movements(&movements),
        })
    }

    /// Per-category shelf position.
    pub async fn category_report(&self) -> Result<Vec<CategorySummary>, AppError> {
        let products = self.repo.load_products().await?;
        Ok(category_summaries(&products))
    }

    /// The raw audit trail, most recent first.
    pub async fn list_movements(&self) -> Result<Vec<StockMovement>, AppError> {
        Ok(self.repo.load_movements().await?)
    }

    // ========================
    // Maintenance
    // ========================

    /// Verify every persisted record decodes. Surfaces corrupt records
    /// that loads silently degrade around.
    pub async fn check_store(&self) -> Result<StoreHealth, AppError> {
        Ok(self.repo.health().await?)
    }

    /// Destructive: wipe products, orders and movement logs back to the
    /// seeded defaults. Expenses and accounts survive. Confirmation is the
    /// caller's responsibility.
    pub async fn reset(&self) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        Ok(self.repo.reset().await?)
    }
}

fn stock_error(product_name: &str, err: StockError) -> AppError {
    match err {
        StockError::InsufficientStock {
            available,
            requested,
        } => AppError::InsufficientStock {
            product: product_name.to_string(),
            available,
            requested,
        },
    }
}
