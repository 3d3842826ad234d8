use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::ShopService;
use crate::domain::{Expense, Order, Product, StockMovement};
use crate::storage::SCHEMA_VERSION;

/// Full store snapshot for JSON export. Accounts are deliberately left
/// out: credential hashes do not belong in report files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub movements: Vec<StockMovement>,
    pub expenses: Vec<Expense>,
}

/// Exporter for converting ledger data to CSV or JSON.
pub struct Exporter<'a> {
    service: &'a ShopService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a ShopService) -> Self {
        Self { service }
    }

    /// Export the product catalog to CSV.
    pub async fn export_products_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let products = self.service.list_products().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "name",
            "category",
            "price",
            "cost_price",
            "stock",
            "demand",
        ])?;

        let mut count = 0;
        for product in &products {
            csv_writer.write_record([
                product.id.clone(),
                product.name.clone(),
                product.category.clone(),
                product.price.to_string(),
                product.cost_price.to_string(),
                product.stock.to_string(),
                product.demand.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export orders to CSV, one row per order line. Frozen snapshot
    /// values are what get exported, not the live catalog.
    pub async fn export_orders_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let orders = self.service.list_orders().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "order_id",
            "created_at",
            "status",
            "payment_method",
            "user_id",
            "product_id",
            "product_name",
            "quantity",
            "unit_price",
            "line_total",
            "order_total",
        ])?;

        let mut count = 0;
        for order in &orders {
            for item in &order.items {
                csv_writer.write_record([
                    order.id.to_string(),
                    order.created_at.to_rfc3339(),
                    order.status.as_str().to_string(),
                    order.payment_method.clone(),
                    order.user_id.map(|id| id.to_string()).unwrap_or_default(),
                    item.product_id.clone(),
                    item.name.clone(),
                    item.quantity.to_string(),
                    item.price.to_string(),
                    item.line_total().to_string(),
                    order.total.to_string(),
                ])?;
                count += 1;
            }
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the stock movement audit trail to CSV.
    pub async fn export_movements_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let movements = self.service.list_movements().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "timestamp",
            "product_id",
            "product_name",
            "direction",
            "quantity",
        ])?;

        let mut count = 0;
        for movement in &movements {
            csv_writer.write_record([
                movement.id.to_string(),
                movement.timestamp.to_rfc3339(),
                movement.product_id.clone(),
                movement.product_name.clone(),
                movement.direction.as_str().to_string(),
                movement.quantity.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the expense ledger to CSV.
    pub async fn export_expenses_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let expenses = self.service.list_expenses().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "timestamp", "description", "category", "amount"])?;

        let mut count = 0;
        for expense in &expenses {
            csv_writer.write_record([
                expense.id.to_string(),
                expense.timestamp.to_rfc3339(),
                expense.description.clone(),
                expense.category.clone(),
                expense.amount.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the full store (minus accounts) as pretty-printed JSON.
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<ShopSnapshot> {
        let snapshot = ShopSnapshot {
            version: SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            products: self.service.list_products().await?,
            orders: self.service.list_orders().await?,
            movements: self.service.list_movements().await?,
            expenses: self.service.list_expenses().await?,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;

        Ok(snapshot)
    }
}
