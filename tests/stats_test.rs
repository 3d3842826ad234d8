mod common;

use anyhow::Result;
use common::{configure_product, test_service};
use duka::application::AppError;
use duka::domain::{Cart, OrderStatus};

#[tokio::test]
async fn test_cancelled_orders_contribute_no_revenue() -> Result<()> {
    let (service, _temp) = test_service().await?;

    // One order worth 50,000 in an otherwise-empty ledger
    configure_product(&service, "captain-morgan", 50_000, 31_500, 10).await?;
    let mut cart = Cart::new();
    service.add_to_cart(&mut cart, "captain-morgan", 1).await?;
    let order = service.checkout(cart, None, "cash").await?;
    service.transition(order.id, OrderStatus::Cancelled).await?;

    let stats = service.stats().await?;
    assert_eq!(stats.total_revenue, 0);
    assert_eq!(stats.total_cost_of_goods_sold, 0);
    assert_eq!(stats.total_orders, 1);

    Ok(())
}

#[tokio::test]
async fn test_pending_orders_already_count() -> Result<()> {
    let (service, _temp) = test_service().await?;

    configure_product(&service, "dodoma-red", 2000, 1200, 10).await?;
    let mut cart = Cart::new();
    service.add_to_cart(&mut cart, "dodoma-red", 2).await?;
    service.checkout(cart, None, "mpesa").await?;

    let stats = service.stats().await?;
    assert_eq!(stats.total_revenue, 4000);
    assert_eq!(stats.total_cost_of_goods_sold, 2400);
    assert_eq!(stats.gross_profit, 1600);

    Ok(())
}

#[tokio::test]
async fn test_net_profit_subtracts_expenses() -> Result<()> {
    let (service, _temp) = test_service().await?;

    configure_product(&service, "dodoma-red", 2000, 1200, 10).await?;
    let mut cart = Cart::new();
    service.add_to_cart(&mut cart, "dodoma-red", 2).await?;
    let order = service.checkout(cart, None, "cash").await?;
    service.transition(order.id, OrderStatus::Completed).await?;

    service.record_expense("Delivery fuel", 1000, "Logistics").await?;

    let stats = service.stats().await?;
    assert_eq!(stats.gross_profit, 1600);
    assert_eq!(stats.total_expenses, 1000);
    assert_eq!(stats.net_profit, 600);

    Ok(())
}

#[tokio::test]
async fn test_business_days_with_no_orders() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let stats = service.stats().await?;
    assert_eq!(stats.business_days, 1);

    Ok(())
}

#[tokio::test]
async fn test_expense_validation() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let zero = service.record_expense("Nothing", 0, "Misc").await;
    assert!(matches!(zero, Err(AppError::InvalidArgument(_))));

    let negative = service.record_expense("Refund", -500, "Misc").await;
    assert!(matches!(negative, Err(AppError::InvalidArgument(_))));

    let blank = service.record_expense("   ", 500, "Misc").await;
    assert!(matches!(blank, Err(AppError::InvalidArgument(_))));

    assert!(service.list_expenses().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_expenses_are_listed_most_recent_first() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service.record_expense("Rent", 80_000, "Operational").await?;
    service.record_expense("Ice", 5_000, "Operational").await?;

    let expenses = service.list_expenses().await?;
    assert_eq!(expenses.len(), 2);
    assert_eq!(expenses[0].description, "Ice");
    assert_eq!(expenses[1].description, "Rent");

    Ok(())
}

#[tokio::test]
async fn test_weekly_report_covers_fresh_movements() -> Result<()> {
    let (service, _temp) = test_service().await?;

    // A settlement and a restock, both inside the window
    service
        .direct_sale(&[("safari-lager".to_string(), 4)], "cash")
        .await?;
    configure_product(&service, "safari-lager", 3500, 2450, 200).await?;

    let report = service.weekly_report().await?;
    assert_eq!(report.totals.total_out, 4);
    assert!(report.totals.total_in > 0);
    assert_eq!(report.totals.stock_out.len(), 1);
    assert_eq!(report.totals.stock_out[0].product_id, "safari-lager");

    Ok(())
}

#[tokio::test]
async fn test_movement_summary_counts_entries() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .direct_sale(&[("safari-lager".to_string(), 2)], "cash")
        .await?;
    service
        .direct_sale(&[("konyagi-std".to_string(), 1)], "cash")
        .await?;

    let summary = service.movement_summary().await?;
    assert_eq!(summary.entries, 2);
    assert_eq!(summary.totals.total_out, 3);
    assert_eq!(summary.totals.total_in, 0);

    Ok(())
}

#[tokio::test]
async fn test_category_report_reflects_the_shelf() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let summaries = service.category_report().await?;
    let beer = summaries
        .iter()
        .find(|s| s.category == "Beer")
        .expect("seed catalog has a beer");

    assert_eq!(beer.product_count, 1);
    assert_eq!(beer.in_stock_count, 1);
    assert_eq!(beer.total_stock, 120);

    Ok(())
}
