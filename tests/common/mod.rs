// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use duka::application::{ProductUpdate, ShopService};
use tempfile::TempDir;

/// Helper to create a test service with a temporary seeded store
pub async fn test_service() -> Result<(ShopService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = ShopService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Current stock level of a product
pub async fn stock_of(service: &ShopService, product_id: &str) -> Result<u32> {
    Ok(service.get_product(product_id).await?.stock)
}

/// Current demand counter of a product
pub async fn demand_of(service: &ShopService, product_id: &str) -> Result<u32> {
    Ok(service.get_product(product_id).await?.demand)
}

/// Override price, cost and stock on a seeded product.
///
/// Note: raising stock above its current level records an IN movement,
/// exactly like any admin restock. Tests that assert on the movement log
/// should lower stock or account for the extra entry.
pub async fn configure_product(
    service: &ShopService,
    product_id: &str,
    price: i64,
    cost_price: i64,
    stock: u32,
) -> Result<()> {
    service
        .update_product(ProductUpdate {
            id: product_id.to_string(),
            price: Some(price),
            cost_price: Some(cost_price),
            stock: Some(stock),
            ..Default::default()
        })
        .await?;
    Ok(())
}
