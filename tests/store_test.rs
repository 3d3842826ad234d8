mod common;

use anyhow::Result;
use common::{stock_of, test_service};
use duka::application::ProductUpdate;
use duka::domain::{Cart, MovementDirection};

#[tokio::test]
async fn test_admin_restock_writes_one_in_entry() -> Result<()> {
    let (service, _temp) = test_service().await?;

    // konyagi-std seeds with 50 units; raise to 80
    service
        .update_product(ProductUpdate {
            id: "konyagi-std".to_string(),
            stock: Some(80),
            ..Default::default()
        })
        .await?;

    let movements = service.list_movements().await?;
    let in_entries: Vec<_> = movements
        .iter()
        .filter(|m| m.product_id == "konyagi-std" && m.direction == MovementDirection::In)
        .collect();
    assert_eq!(in_entries.len(), 1);
    assert_eq!(in_entries[0].quantity, 30);

    Ok(())
}

#[tokio::test]
async fn test_admin_stock_decrease_is_a_silent_correction() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .update_product(ProductUpdate {
            id: "konyagi-std".to_string(),
            stock: Some(40),
            ..Default::default()
        })
        .await?;

    assert_eq!(stock_of(&service, "konyagi-std").await?, 40);
    assert!(service.list_movements().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_reset_restores_seed_but_keeps_expenses_and_accounts() -> Result<()> {
    let (service, _temp) = test_service().await?;

    // Dirty every ledger
    let mut cart = Cart::new();
    service.add_to_cart(&mut cart, "konyagi-std", 5).await?;
    service.checkout(cart, None, "cash").await?;
    service
        .direct_sale(&[("safari-lager".to_string(), 2)], "cash")
        .await?;
    service.record_expense("Rent", 80_000, "Operational").await?;
    service
        .register("Amina", "amina@example.com", "0747000000", "secret")
        .await?;

    service.reset().await?;

    // Products back to seed levels, orders and movements gone
    assert_eq!(stock_of(&service, "konyagi-std").await?, 50);
    assert_eq!(stock_of(&service, "safari-lager").await?, 120);
    assert!(service.list_orders().await?.is_empty());
    assert!(service.list_movements().await?.is_empty());

    // Expenses and accounts survive
    assert_eq!(service.list_expenses().await?.len(), 1);
    assert!(service.login("amina@example.com", "secret").await.is_ok());

    Ok(())
}

#[tokio::test]
async fn test_check_reports_healthy_store() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let health = service.check_store().await?;
    assert!(health.is_healthy(), "issues: {:?}", health.issues);
    assert!(health.products > 0);

    Ok(())
}

#[tokio::test]
async fn test_corrupt_record_degrades_instead_of_crashing() -> Result<()> {
    use duka::storage::Repository;
    use tempfile::TempDir;

    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.to_str().unwrap());

    let repo = Repository::init(&db_url).await?;
    repo.write_raw_record("orders", "{not json").await?;

    // Loads fall back to an empty collection
    let orders = repo.load_orders().await?;
    assert!(orders.is_empty());

    // The corruption is surfaced by the health check
    let health = repo.health().await?;
    assert!(!health.is_healthy());
    assert!(health.issues.iter().any(|i| i.contains("orders")));

    Ok(())
}

#[tokio::test]
async fn test_corrupt_catalog_falls_back_to_seed() -> Result<()> {
    use duka::storage::Repository;
    use tempfile::TempDir;

    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.to_str().unwrap());

    let repo = Repository::init(&db_url).await?;
    repo.write_raw_record("inventory", "42").await?;

    let products = repo.load_products().await?;
    assert!(!products.is_empty());
    assert!(products.iter().any(|p| p.id == "konyagi-std"));

    Ok(())
}

#[tokio::test]
async fn test_init_is_idempotent() -> Result<()> {
    use duka::application::ShopService;
    use tempfile::TempDir;

    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let path = db_path.to_str().unwrap();

    let service = ShopService::init(path).await?;
    let mut cart = Cart::new();
    service.add_to_cart(&mut cart, "konyagi-std", 5).await?;

    // A second init must not reseed over live data
    let service = ShopService::init(path).await?;
    assert_eq!(stock_of(&service, "konyagi-std").await?, 45);

    Ok(())
}
