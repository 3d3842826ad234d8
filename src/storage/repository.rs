use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

use crate::domain::{Expense, Order, OrderId, Product, StockMovement, User, hash_secret};

use super::seed::{DEFAULT_ADMIN_PIN, SCHEMA_VERSION, seed_products};

/// Record names in the persisted store. Each holds one JSON-encoded
/// collection (or pointer); together they are the whole database.
pub mod records {
    pub const INVENTORY: &str = "inventory";
    pub const ORDERS: &str = "orders";
    pub const STOCK_LOGS: &str = "stock_logs";
    pub const USERS: &str = "users";
    pub const EXPENSES: &str = "expenses";
    pub const SESSION: &str = "session";
    pub const ADMIN_PIN: &str = "admin_pin";
    pub const VERSION: &str = "version";
}

const MIGRATION_RECORDS: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    name  TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

/// Parse/count summary of every named record, for the `check` command.
#[derive(Debug, Clone)]
pub struct StoreHealth {
    pub version: Option<String>,
    pub products: usize,
    pub orders: usize,
    pub movements: usize,
    pub users: usize,
    pub expenses: usize,
    pub issues: Vec<String>,
}

impl StoreHealth {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// The persisted key-value store behind every ledger: a single SQLite
/// table of named records, each value a JSON-encoded collection.
///
/// The rest of the crate only sees load/save calls on whole collections;
/// nothing outside this module knows the storage engine.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to store")?;
        Ok(Self::new(pool))
    }

    /// Create the records table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_RECORDS)
            .execute(&self.pool)
            .await
            .context("Failed to create records table")?;
        Ok(())
    }

    /// Initialize a store: connect, migrate, and seed missing defaults.
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        repo.seed_defaults().await?;
        Ok(repo)
    }

    /// Seed any missing collection with its default and stamp the schema
    /// version. Runs on every startup; only fills gaps, never overwrites.
    pub async fn seed_defaults(&self) -> Result<()> {
        let version: Option<String> = self.read_record(records::VERSION).await?;
        let has_products = self.raw_record(records::INVENTORY).await?.is_some();

        if version.as_deref() == Some(SCHEMA_VERSION) && has_products {
            return Ok(());
        }

        info!(version = SCHEMA_VERSION, "seeding store defaults");

        if !has_products {
            self.write_record(records::INVENTORY, &seed_products())
                .await?;
        }
        self.seed_if_missing(records::ORDERS, &Vec::<Order>::new())
            .await?;
        self.seed_if_missing(records::STOCK_LOGS, &Vec::<StockMovement>::new())
            .await?;
        self.seed_if_missing(records::USERS, &Vec::<User>::new())
            .await?;
        self.seed_if_missing(records::EXPENSES, &Vec::<Expense>::new())
            .await?;

        if self.raw_record(records::ADMIN_PIN).await?.is_none() {
            let hash = hash_secret(DEFAULT_ADMIN_PIN)
                .map_err(|e| anyhow::anyhow!("Failed to hash default admin PIN: {}", e))?;
            self.write_record(records::ADMIN_PIN, &hash).await?;
        }

        self.write_record(records::VERSION, &SCHEMA_VERSION.to_string())
            .await?;
        Ok(())
    }

    async fn seed_if_missing<T: Serialize>(&self, name: &str, default: &T) -> Result<()> {
        if self.raw_record(name).await?.is_none() {
            self.write_record(name, default).await?;
        }
        Ok(())
    }

    // ========================
    // Record primitives
    // ========================

    /// Raw JSON text of a record, if present.
    async fn raw_record(&self, name: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM records WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read record '{}'", name))?;

        Ok(row.map(|r| r.get("value")))
    }

    /// Read and decode a record. A corrupt record is logged and treated as
    /// absent so callers degrade to defaults instead of crashing; the
    /// `check` command reports it.
    async fn read_record<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.raw_record(name).await? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!(record = name, error = %e, "corrupt store record, falling back to defaults");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn write_record<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)
            .with_context(|| format!("Failed to encode record '{}'", name))?;

        sqlx::query("INSERT INTO records (name, value) VALUES (?, ?) ON CONFLICT(name) DO UPDATE SET value = excluded.value")
            .bind(name)
            .bind(&json)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to write record '{}'", name))?;
        Ok(())
    }

    async fn delete_record(&self, name: &str) -> Result<()> {
        sqlx::query("DELETE FROM records WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete record '{}'", name))?;
        Ok(())
    }

    // ========================
    // Product ledger
    // ========================

    /// Current catalog snapshot in stable insertion order. Falls back to
    /// the seed catalog when the record is missing or unreadable.
    pub async fn load_products(&self) -> Result<Vec<Product>> {
        Ok(self
            .read_record(records::INVENTORY)
            .await?
            .unwrap_or_else(seed_products))
    }

    pub async fn save_products(&self, products: &[Product]) -> Result<()> {
        self.write_record(records::INVENTORY, &products).await
    }

    // ========================
    // Order ledger
    // ========================

    /// All orders, most recent first.
    pub async fn load_orders(&self) -> Result<Vec<Order>> {
        Ok(self.read_record(records::ORDERS).await?.unwrap_or_default())
    }

    pub async fn save_orders(&self, orders: &[Order]) -> Result<()> {
        self.write_record(records::ORDERS, &orders).await
    }

    /// Prepend a new order, keeping most-recent-first order.
    pub async fn add_order(&self, order: &Order) -> Result<()> {
        let mut orders = self.load_orders().await?;
        orders.insert(0, order.clone());
        self.save_orders(&orders).await
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.load_orders().await?.into_iter().find(|o| o.id == id))
    }

    /// Replace a stored order in place, matched by id.
    pub async fn update_order(&self, order: &Order) -> Result<bool> {
        let mut orders = self.load_orders().await?;
        match orders.iter_mut().find(|o| o.id == order.id) {
            Some(slot) => {
                *slot = order.clone();
                self.save_orders(&orders).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ========================
    // Stock movement log
    // ========================

    /// The audit trail, most recent first.
    pub async fn load_movements(&self) -> Result<Vec<StockMovement>> {
        Ok(self
            .read_record(records::STOCK_LOGS)
            .await?
            .unwrap_or_default())
    }

    /// Append-only: entries are only ever added at the front.
    pub async fn append_movements(&self, new_entries: &[StockMovement]) -> Result<()> {
        let mut movements = self.load_movements().await?;
        for entry in new_entries.iter().rev() {
            movements.insert(0, entry.clone());
        }
        self.write_record(records::STOCK_LOGS, &movements).await
    }

    // ========================
    // Expense ledger
    // ========================

    pub async fn load_expenses(&self) -> Result<Vec<Expense>> {
        Ok(self
            .read_record(records::EXPENSES)
            .await?
            .unwrap_or_default())
    }

    pub async fn add_expense(&self, expense: &Expense) -> Result<()> {
        let mut expenses = self.load_expenses().await?;
        expenses.insert(0, expense.clone());
        self.write_record(records::EXPENSES, &expenses).await
    }

    // ========================
    // Account store
    // ========================

    pub async fn load_users(&self) -> Result<Vec<User>> {
        Ok(self.read_record(records::USERS).await?.unwrap_or_default())
    }

    pub async fn save_users(&self, users: &[User]) -> Result<()> {
        self.write_record(records::USERS, &users).await
    }

    /// The single active-session pointer.
    pub async fn current_session(&self) -> Result<Option<User>> {
        self.read_record(records::SESSION).await
    }

    pub async fn set_session(&self, user: &User) -> Result<()> {
        self.write_record(records::SESSION, user).await
    }

    pub async fn clear_session(&self) -> Result<()> {
        self.delete_record(records::SESSION).await
    }

    pub async fn admin_pin_hash(&self) -> Result<Option<String>> {
        self.read_record(records::ADMIN_PIN).await
    }

    // ========================
    // Reset and health
    // ========================

    /// Wipe products, orders and movement logs back to seeded defaults.
    /// Expenses, users, the session pointer and the admin PIN survive.
    /// This is the one operation allowed to delete ledger data.
    pub async fn reset(&self) -> Result<()> {
        warn!("resetting store to seed defaults");
        self.delete_record(records::INVENTORY).await?;
        self.delete_record(records::ORDERS).await?;
        self.delete_record(records::STOCK_LOGS).await?;
        self.delete_record(records::VERSION).await?;
        self.seed_defaults().await
    }

    /// Verify that every named record decodes, reporting counts and a list
    /// of issues. This is the degraded-mode signal for corrupt records.
    pub async fn health(&self) -> Result<StoreHealth> {
        let mut issues = Vec::new();

        let version: Option<String> = self.read_record(records::VERSION).await?;
        if version.as_deref() != Some(SCHEMA_VERSION) {
            issues.push(format!(
                "schema version is {:?}, expected {}",
                version, SCHEMA_VERSION
            ));
        }

        let products = self
            .check_collection::<Product>(records::INVENTORY, &mut issues)
            .await?;
        let orders = self
            .check_collection::<Order>(records::ORDERS, &mut issues)
            .await?;
        let movements = self
            .check_collection::<StockMovement>(records::STOCK_LOGS, &mut issues)
            .await?;
        let users = self
            .check_collection::<User>(records::USERS, &mut issues)
            .await?;
        let expenses = self
            .check_collection::<Expense>(records::EXPENSES, &mut issues)
            .await?;

        Ok(StoreHealth {
            version,
            products,
            orders,
            movements,
            users,
            expenses,
            issues,
        })
    }

    async fn check_collection<T: DeserializeOwned>(
        &self,
        name: &str,
        issues: &mut Vec<String>,
    ) -> Result<usize> {
        match self.raw_record(name).await? {
            Some(json) => match serde_json::from_str::<Vec<T>>(&json) {
                Ok(items) => Ok(items.len()),
                Err(e) => {
                    issues.push(format!("record '{}' is corrupt: {}", name, e));
                    Ok(0)
                }
            },
            None => {
                issues.push(format!("record '{}' is missing", name));
                Ok(0)
            }
        }
    }

    /// Test/maintenance hook: overwrite a record with arbitrary text.
    #[doc(hidden)]
    pub async fn write_raw_record(&self, name: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT INTO records (name, value) VALUES (?, ?) ON CONFLICT(name) DO UPDATE SET value = excluded.value")
            .bind(name)
            .bind(value)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to write record '{}'", name))?;
        Ok(())
    }
}
