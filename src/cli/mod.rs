use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{ProductUpdate, ShopService, StaticNotes};
use crate::domain::{Cart, Order, OrderStatus, format_tsh, parse_tsh};

/// Duka - Retail Shop Ledger
#[derive(Parser)]
#[command(name = "duka")]
#[command(about = "A local-first retail shop ledger: stock, orders, expenses and profit")]
#[command(version)]
pub struct Cli {
    /// Store file path
    #[arg(short, long, default_value = "duka.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new store (seeds the catalog on first run)
    Init,

    /// Browse the product catalog
    #[command(subcommand)]
    Products(ProductCommands),

    /// Place an order: reserve stock, freeze prices, pay later on delivery
    Checkout {
        /// Item to buy as ID or ID:QTY (repeatable)
        #[arg(long = "item", value_name = "ID[:QTY]", required = true)]
        items: Vec<String>,

        /// Payment method (e.g. mpesa, cash, card)
        #[arg(long)]
        pay: String,
    },

    /// List your orders (requires login)
    Orders,

    /// Inspect or annotate a single order
    #[command(subcommand)]
    Order(OrderCommands),

    /// Customer account commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Administrative surface, gated by the shared PIN
    Admin {
        /// Admin PIN
        #[arg(long)]
        pin: String,

        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Verify that every store record is readable
    Check,

    /// Export data to CSV or JSON
    Export {
        /// What to export: products, orders, movements, expenses, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// List the catalog with stock levels
    List,

    /// Show detailed product information
    Show {
        /// Product id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum OrderCommands {
    /// Show order details and receipt
    Show {
        /// Order ID
        id: String,
    },

    /// Attach feedback to an order
    Feedback {
        /// Order ID
        id: String,

        /// Feedback text
        text: String,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Register a new customer account
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long)]
        password: String,
    },

    /// Log in and start a session
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Show the logged-in account
    Whoami,
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Record a walk-in counter sale (settles immediately)
    Sale {
        /// Item to sell as ID or ID:QTY (repeatable)
        #[arg(long = "item", value_name = "ID[:QTY]", required = true)]
        items: Vec<String>,

        /// Payment method
        #[arg(long, default_value = "cash")]
        pay: String,
    },

    /// Settle a pending order
    Complete {
        /// Order ID
        order_id: String,
    },

    /// Cancel a pending order, returning its stock
    Cancel {
        /// Order ID
        order_id: String,
    },

    /// List all orders
    Orders {
        /// Filter by status: pending, completed, cancelled
        #[arg(long)]
        status: Option<String>,
    },

    /// Override catalog fields on a product
    UpdateProduct {
        /// Product id
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Sale price (e.g. "15000" or "15,000")
        #[arg(long)]
        price: Option<String>,

        /// Purchase cost
        #[arg(long)]
        cost: Option<String>,

        /// New stock level; increases are logged as restocks
        #[arg(long)]
        stock: Option<u32>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        image: Option<String>,
    },

    /// Expense ledger commands
    #[command(subcommand)]
    Expense(ExpenseCommands),

    /// Reports and analytics
    #[command(subcommand)]
    Report(ReportCommands),

    /// Wipe products, orders and movement logs back to seed defaults
    Reset {
        /// Confirm the destructive reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an operating expense
    Add {
        #[arg(long)]
        description: String,

        /// Amount (e.g. "25000" or "25,000")
        #[arg(long)]
        amount: String,

        #[arg(long, default_value = "Operational")]
        category: String,
    },

    /// List recorded expenses
    List,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Revenue, cost of goods, profit and business age
    Stats {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Stock movements over the trailing seven days
    Weekly {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// All-time stock movement totals
    Movements {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Shelf position per category
    Categories {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                ShopService::init(&self.database).await?;
                println!("Store initialized: {}", self.database);
            }

            Commands::Products(product_cmd) => {
                let service = ShopService::connect(&self.database).await?;
                run_product_command(&service, product_cmd).await?;
            }

            Commands::Checkout { items, pay } => {
                let service = ShopService::connect(&self.database).await?;
                run_checkout_command(&service, &items, &pay).await?;
            }

            Commands::Orders => {
                let service = ShopService::connect(&self.database).await?;
                run_my_orders_command(&service).await?;
            }

            Commands::Order(order_cmd) => {
                let service = ShopService::connect(&self.database).await?;
                run_order_command(&service, order_cmd).await?;
            }

            Commands::Account(account_cmd) => {
                let service = ShopService::connect(&self.database).await?;
                run_account_command(&service, account_cmd).await?;
            }

            Commands::Admin { pin, command } => {
                let service = ShopService::connect(&self.database).await?;
                service.verify_admin_pin(&pin).await?;
                run_admin_command(&service, command).await?;
            }

            Commands::Check => {
                let service = ShopService::connect(&self.database).await?;
                run_check_command(&service).await?;
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = ShopService::connect(&self.database).await?;
                run_export_command(&service, &export_type, output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

async fn run_product_command(service: &ShopService, cmd: ProductCommands) -> Result<()> {
    match cmd {
        ProductCommands::List => {
            let products = service.list_products().await?;
            if products.is_empty() {
                println!("The catalog is empty.");
            } else {
                println!(
                    "{:<18} {:<32} {:<12} {:>10} {:>7}",
                    "ID", "NAME", "CATEGORY", "PRICE", "STOCK"
                );
                println!("{}", "-".repeat(84));
                for product in products {
                    println!(
                        "{:<18} {:<32} {:<12} {:>10} {:>7}",
                        truncate(&product.id, 18),
                        truncate(&product.name, 32),
                        truncate(&product.category, 12),
                        format_tsh(product.price),
                        product.stock
                    );
                }
            }
        }

        ProductCommands::Show { id } => {
            let product = service.get_product(&id).await?;

            println!("Product: {}", product.name);
            println!("  ID:          {}", product.id);
            println!("  Category:    {}", product.category);
            println!("  Price:       {} Tsh", format_tsh(product.price));
            println!("  Cost:        {} Tsh", format_tsh(product.cost_price));
            println!("  Stock:       {} units", product.stock);
            println!("  Demand:      {} (all-time)", product.demand);
            if !product.description.is_empty() {
                println!("  Description: {}", product.description);
            }
        }
    }
    Ok(())
}

async fn run_checkout_command(service: &ShopService, items: &[String], pay: &str) -> Result<()> {
    let parsed = parse_item_specs(items)?;

    let mut cart = Cart::new();
    let mut reserved: Vec<(String, u32)> = Vec::new();

    for (product_id, quantity) in parsed {
        match service.add_to_cart(&mut cart, &product_id, quantity).await {
            Ok(()) => reserved.push((product_id, quantity)),
            Err(e) => {
                // Release the reservations already taken before bailing
                for (released_id, released_qty) in &reserved {
                    let _ = service
                        .update_cart_item(&mut cart, released_id, -(*released_qty as i64))
                        .await;
                }
                return Err(e.into());
            }
        }
    }

    let user = service.current_user().await?;
    let order = service
        .checkout(cart, user.as_ref().map(|u| u.id), pay)
        .await?;
    let order = service.attach_note(order.id, &StaticNotes).await?;

    print_receipt(&order);
    Ok(())
}

async fn run_my_orders_command(service: &ShopService) -> Result<()> {
    let user = match service.current_user().await? {
        Some(user) => user,
        None => {
            println!("Not logged in. Use 'duka account login' first.");
            return Ok(());
        }
    };

    let orders = service.orders_for_user(user.id).await?;
    if orders.is_empty() {
        println!("No orders yet.");
    } else {
        print_orders_table(&orders);
    }
    Ok(())
}

async fn run_order_command(service: &ShopService, cmd: OrderCommands) -> Result<()> {
    match cmd {
        OrderCommands::Show { id } => {
            let order_id = parse_order_id(&id)?;
            let order = service.get_order(order_id).await?;
            print_receipt(&order);
        }

        OrderCommands::Feedback { id, text } => {
            let order_id = parse_order_id(&id)?;
            service.attach_feedback(order_id, &text).await?;
            println!("Feedback recorded for order {}", id);
        }
    }
    Ok(())
}

async fn run_account_command(service: &ShopService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Register {
            name,
            email,
            phone,
            password,
        } => {
            let user = service.register(&name, &email, &phone, &password).await?;
            println!("Registered account: {} <{}>", user.name, user.email);
        }

        AccountCommands::Login { email, password } => {
            let user = service.login(&email, &password).await?;
            println!("Logged in as {} <{}>", user.name, user.email);
        }

        AccountCommands::Logout => {
            service.logout().await?;
            println!("Logged out.");
        }

        AccountCommands::Whoami => match service.current_user().await? {
            Some(user) => {
                println!("{} <{}>", user.name, user.email);
            }
            None => {
                println!("Not logged in.");
            }
        },
    }
    Ok(())
}

async fn run_admin_command(service: &ShopService, cmd: AdminCommands) -> Result<()> {
    match cmd {
        AdminCommands::Sale { items, pay } => {
            let parsed = parse_item_specs(&items)?;
            let order = service.direct_sale(&parsed, &pay).await?;

            println!("Sale settled.");
            print_receipt(&order);
        }

        AdminCommands::Complete { order_id } => {
            let id = parse_order_id(&order_id)?;
            let order = service.transition(id, OrderStatus::Completed).await?;
            println!(
                "Order {} completed ({} Tsh, {} units)",
                order_id,
                format_tsh(order.total),
                order.unit_count()
            );
        }

        AdminCommands::Cancel { order_id } => {
            let id = parse_order_id(&order_id)?;
            let order = service.transition(id, OrderStatus::Cancelled).await?;
            println!(
                "Order {} cancelled; {} units returned to stock",
                order_id,
                order.unit_count()
            );
        }

        AdminCommands::Orders { status } => {
            let filter = status
                .as_deref()
                .map(|s| {
                    OrderStatus::from_str(s).ok_or_else(|| {
                        anyhow::anyhow!(
                            "Invalid status '{}'. Valid: pending, completed, cancelled",
                            s
                        )
                    })
                })
                .transpose()?;

            let mut orders = service.list_orders().await?;
            if let Some(wanted) = filter {
                orders.retain(|o| o.status == wanted);
            }

            if orders.is_empty() {
                println!("No orders found.");
            } else {
                print_orders_table(&orders);
            }
        }

        AdminCommands::UpdateProduct {
            id,
            name,
            category,
            price,
            cost,
            stock,
            description,
            image,
        } => {
            let price = price
                .map(|p| parse_tsh(&p))
                .transpose()
                .context("Invalid price format")?;
            let cost_price = cost
                .map(|c| parse_tsh(&c))
                .transpose()
                .context("Invalid cost format")?;

            let update = ProductUpdate {
                id: id.clone(),
                name,
                category,
                price,
                cost_price,
                stock,
                description,
                image,
            };

            let product = service.update_product(update).await?;
            println!(
                "Updated {}: price {} Tsh, cost {} Tsh, stock {} units",
                product.id,
                format_tsh(product.price),
                format_tsh(product.cost_price),
                product.stock
            );
        }

        AdminCommands::Expense(expense_cmd) => {
            run_expense_command(service, expense_cmd).await?;
        }

        AdminCommands::Report(report_cmd) => {
            run_report_command(service, report_cmd).await?;
        }

        AdminCommands::Reset { yes } => {
            if !yes {
                anyhow::bail!(
                    "Reset wipes products, orders and movement logs. Re-run with --yes to confirm."
                );
            }
            service.reset().await?;
            println!("Store reset to seed defaults. Expenses and accounts were preserved.");
        }
    }
    Ok(())
}

async fn run_expense_command(service: &ShopService, cmd: ExpenseCommands) -> Result<()> {
    match cmd {
        ExpenseCommands::Add {
            description,
            amount,
            category,
        } => {
            let amount =
                parse_tsh(&amount).context("Invalid amount format. Use '25000' or '25,000'")?;
            let expense = service.record_expense(&description, amount, &category).await?;
            println!(
                "Recorded expense: {} ({} Tsh, {})",
                expense.description,
                format_tsh(expense.amount),
                expense.category
            );
        }

        ExpenseCommands::List => {
            let expenses = service.list_expenses().await?;
            if expenses.is_empty() {
                println!("No expenses recorded yet.");
            } else {
                println!(
                    "{:<12} {:<32} {:<14} {:>12}",
                    "DATE", "DESCRIPTION", "CATEGORY", "AMOUNT"
                );
                println!("{}", "-".repeat(72));
                let mut total = 0;
                for expense in &expenses {
                    total += expense.amount;
                    println!(
                        "{:<12} {:<32} {:<14} {:>12}",
                        expense.timestamp.format("%Y-%m-%d"),
                        truncate(&expense.description, 32),
                        truncate(&expense.category, 14),
                        format_tsh(expense.amount)
                    );
                }
                println!("{}", "-".repeat(72));
                println!("{:<60} {:>11}", "TOTAL", format_tsh(total));
            }
        }
    }
    Ok(())
}

async fn run_report_command(service: &ShopService, cmd: ReportCommands) -> Result<()> {
    match cmd {
        ReportCommands::Stats { format } => {
            let stats = service.stats().await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                }
                _ => {
                    println!("Business Statistics");
                    println!();
                    println!("  Products:        {:>12}", stats.total_products);
                    println!("  Orders:          {:>12}", stats.total_orders);
                    println!("  Business days:   {:>12}", stats.business_days);
                    println!();
                    println!("  Revenue:         {:>12} Tsh", format_tsh(stats.total_revenue));
                    println!(
                        "  Cost of goods:   {:>12} Tsh",
                        format_tsh(stats.total_cost_of_goods_sold)
                    );
                    println!("  Gross profit:    {:>12} Tsh", format_tsh(stats.gross_profit));
                    println!("  Expenses:        {:>12} Tsh", format_tsh(stats.total_expenses));
                    println!("{}", "-".repeat(38));
                    println!("  Net profit:      {:>12} Tsh", format_tsh(stats.net_profit));
                }
            }
        }

        ReportCommands::Weekly { format } => {
            let report = service.weekly_report().await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                _ => {
                    println!("Weekly Stock Movement Report");
                    println!(
                        "Period: {} to {}",
                        report.from_date.format("%Y-%m-%d"),
                        report.to_date.format("%Y-%m-%d")
                    );
                    println!();

                    println!("Stock in: {} units", report.totals.total_in);
                    if report.totals.stock_in.is_empty() {
                        println!("  (no restocks this week)");
                    }
                    for entry in &report.totals.stock_in {
                        println!("  {:<36} {:>6}", truncate(&entry.product_name, 36), entry.quantity);
                    }
                    println!();

                    println!("Stock out: {} units", report.totals.total_out);
                    if report.totals.stock_out.is_empty() {
                        println!("  (no sales this week)");
                    }
                    for entry in &report.totals.stock_out {
                        println!("  {:<36} {:>6}", truncate(&entry.product_name, 36), entry.quantity);
                    }
                }
            }
        }

        ReportCommands::Movements { format } => {
            let summary = service.movement_summary().await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
                _ => {
                    println!("Stock Movement Summary (all-time)");
                    println!(
                        "Entries: {}  In: {} units  Out: {} units",
                        summary.entries, summary.totals.total_in, summary.totals.total_out
                    );
                    println!();
                    println!("{:<36} {:>8} {:>8}", "PRODUCT", "IN", "OUT");
                    println!("{}", "-".repeat(54));

                    let mut names: Vec<&str> = Vec::new();
                    for entry in summary
                        .totals
                        .stock_in
                        .iter()
                        .chain(summary.totals.stock_out.iter())
                    {
                        if !names.contains(&entry.product_name.as_str()) {
                            names.push(entry.product_name.as_str());
                        }
                    }

                    for name in names {
                        let stock_in = summary
                            .totals
                            .stock_in
                            .iter()
                            .find(|p| p.product_name == name)
                            .map(|p| p.quantity)
                            .unwrap_or(0);
                        let stock_out = summary
                            .totals
                            .stock_out
                            .iter()
                            .find(|p| p.product_name == name)
                            .map(|p| p.quantity)
                            .unwrap_or(0);
                        println!("{:<36} {:>8} {:>8}", truncate(name, 36), stock_in, stock_out);
                    }
                }
            }
        }

        ReportCommands::Categories { format } => {
            let summaries = service.category_report().await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&summaries)?);
                }
                _ => {
                    println!(
                        "{:<24} {:>9} {:>10} {:>12} {:>14}",
                        "CATEGORY", "PRODUCTS", "IN STOCK", "TOTAL UNITS", "DEMAND"
                    );
                    println!("{}", "-".repeat(74));
                    for summary in &summaries {
                        println!(
                            "{:<24} {:>9} {:>10} {:>12} {:>14}",
                            truncate(&summary.category, 24),
                            summary.product_count,
                            summary.in_stock_count,
                            summary.total_stock,
                            summary.total_demand
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

async fn run_check_command(service: &ShopService) -> Result<()> {
    println!("Checking store records...\n");

    let health = service.check_store().await?;

    println!("Version:   {}", health.version.as_deref().unwrap_or("(none)"));
    println!("Products:  {}", health.products);
    println!("Orders:    {}", health.orders);
    println!("Movements: {}", health.movements);
    println!("Users:     {}", health.users);
    println!("Expenses:  {}", health.expenses);
    println!();

    if health.is_healthy() {
        println!("Store is consistent.");
    } else {
        println!("Issues found:");
        for issue in &health.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Store check failed");
    }

    Ok(())
}

async fn run_export_command(
    service: &ShopService,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "products" => {
            let count = exporter.export_products_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} products", count);
            }
        }
        "orders" => {
            let count = exporter.export_orders_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} order lines", count);
            }
        }
        "movements" => {
            let count = exporter.export_movements_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} movement entries", count);
            }
        }
        "expenses" => {
            let count = exporter.export_expenses_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} expenses", count);
            }
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported full store: {} products, {} orders, {} movements, {} expenses",
                    snapshot.products.len(),
                    snapshot.orders.len(),
                    snapshot.movements.len(),
                    snapshot.expenses.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: products, orders, movements, expenses, full",
                export_type
            );
        }
    }

    Ok(())
}

/// Parse repeated "ID" / "ID:QTY" item specs into (product_id, quantity).
fn parse_item_specs(items: &[String]) -> Result<Vec<(String, u32)>> {
    items
        .iter()
        .map(|spec| match spec.split_once(':') {
            Some((id, qty)) => {
                let quantity: u32 = qty
                    .parse()
                    .with_context(|| format!("Invalid quantity in '{}'", spec))?;
                Ok((id.to_string(), quantity))
            }
            None => Ok((spec.clone(), 1)),
        })
        .collect()
}

fn parse_order_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).context("Invalid order ID format (expected UUID)")
}

fn print_receipt(order: &Order) {
    println!("Order: {}", order.id);
    println!(
        "  Date:    {}",
        order.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!("  Status:  {}", order.status);
    println!("  Payment: {}", order.payment_method);
    println!("  {}", "-".repeat(50));
    for item in &order.items {
        println!(
            "  {:>3} x {:<32} {:>10}",
            item.quantity,
            truncate(&item.name, 32),
            format_tsh(item.line_total())
        );
    }
    println!("  {}", "-".repeat(50));
    println!("  Total:   {} Tsh", format_tsh(order.total));
    if let Some(note) = &order.note {
        println!();
        println!("  {}", note);
    }
    if let Some(feedback) = &order.feedback {
        println!("  Feedback: {}", feedback);
    }
}

fn print_orders_table(orders: &[Order]) {
    println!(
        "{:<38} {:<12} {:<10} {:>6} {:>12}",
        "ID", "DATE", "STATUS", "ITEMS", "TOTAL"
    );
    println!("{}", "-".repeat(82));
    for order in orders {
        println!(
            "{:<38} {:<12} {:<10} {:>6} {:>12}",
            order.id,
            order.created_at.format("%Y-%m-%d"),
            order.status,
            order.unit_count(),
            format_tsh(order.total)
        );
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
