//! # Back Office Report
//!
//! Prints the sales and popularity report for the configured store.
//!
//! ## Usage
//! ```bash
//! # Report for the current year
//! cargo run -p back-office
//!
//! # Another year, as JSON
//! cargo run -p back-office -- --year 2024 --json
//! ```
//!
//! The database location and store name come from the environment; see
//! [`back_office::config`].

use chrono::Datelike;
use std::env;
use tracing::info;

use back_office::commands::staff::SalesReport;
use back_office::config::AppConfig;
use back_office::state::DbState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    back_office::init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut year = back_office::today().year();
    let mut as_json = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--year" | "-y" => {
                if i + 1 < args.len() {
                    year = args[i + 1].parse()?;
                    i += 1;
                }
            }
            "--json" => as_json = true,
            "--help" | "-h" => {
                println!("Usage: back-office [--year YEAR] [--json]");
                println!();
                println!("Options:");
                println!("  -y, --year <YEAR>  Report year (default: current year)");
                println!("      --json         Print the report as JSON");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = AppConfig::load()?;
    info!(path = %config.database_path.display(), year, "Opening database");
    let db = DbState::open(config.db_config()).await?;

    let report = SalesReport::load(&db, year).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("📊 {} sales report, {}", config.store_name, year);
    println!();
    println!(
        "Year total: {} across {} orders",
        config.format_currency(report.yearly.total),
        report.yearly.order_count
    );

    println!();
    println!("By month:");
    for period in &report.monthly {
        println!("  {:<16} {:>12}", period.label, config.format_currency(period.total));
    }

    println!();
    println!("By week of month:");
    for period in &report.weekly {
        println!("  {:<16} {:>12}", period.label, config.format_currency(period.total));
    }

    println!();
    println!("🥕 Most popular:");
    for item in &report.popular {
        println!("  {:<24} {:>4} order lines", item.name, item.line_count);
    }

    println!();
    println!("🥀 Least popular:");
    for item in &report.unpopular {
        println!("  {:<24} {:>4} order lines", item.name, item.line_count);
    }

    db.inner().close().await;
    Ok(())
}
