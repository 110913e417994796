//! Tienda CLI - Main Entry Point
//!
//! Command-line interface for the storefront API: accounts, catalog
//! management, cart, and orders.

use clap::{Parser, Subcommand};

mod client;
mod commands;
mod output;

use commands::{auth, brand, cart, category, order, product};

/// Tienda CLI - storefront management
#[derive(Parser)]
#[command(name = "tienda")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Storefront API address
    #[arg(long, default_value = "http://127.0.0.1:8080", global = true)]
    api_url: String,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account registration and login
    #[command(subcommand)]
    Auth(auth::AuthCommands),

    /// Manage products
    #[command(subcommand)]
    Product(product::ProductCommands),

    /// Manage categories
    #[command(subcommand)]
    Category(category::CategoryCommands),

    /// Manage brands
    #[command(subcommand)]
    Brand(brand::BrandCommands),

    /// Shopping cart
    #[command(subcommand)]
    Cart(cart::CartCommands),

    /// Orders
    #[command(subcommand)]
    Order(order::OrderCommands),

    /// Check API status
    Status,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let client = client::ApiClient::new(&cli.api_url);

    match cli.command {
        Commands::Auth(cmd) => auth::execute(cmd, client, cli.format).await?,
        Commands::Product(cmd) => product::execute(cmd, client, cli.format).await?,
        Commands::Category(cmd) => category::execute(cmd, client, cli.format).await?,
        Commands::Brand(cmd) => brand::execute(cmd, client, cli.format).await?,
        Commands::Cart(cmd) => cart::execute(cmd, client, cli.format).await?,
        Commands::Order(cmd) => order::execute(cmd, client, cli.format).await?,
        Commands::Status => {
            if client.health_check().await {
                println!("✅ Storefront API is running at {}", cli.api_url);
            } else {
                println!("❌ Storefront API is not responding at {}", cli.api_url);
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("Tienda CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
