//! Optica CLI - Database migrations and inspection tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! optica-cli migrate
//!
//! # Browse the seed catalog with the storefront's filters
//! optica-cli catalog list --brand Rayban --style round --sort price-asc
//!
//! # List voucher programs and whether they can be claimed today
//! optica-cli vouchers programs
//!
//! # Show the claims stored for one customer
//! optica-cli vouchers claims 1
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "optica-cli")]
#[command(author, version, about = "Optica CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Inspect the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Inspect voucher programs and claims
    Vouchers {
        #[command(subcommand)]
        action: VoucherAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products matching the given filters
    List {
        /// Category slug (`frame`, `lens`, `sunglasses`)
        #[arg(short, long)]
        category: Option<String>,

        /// Brand name as shown in the catalog
        #[arg(short, long)]
        brand: Option<String>,

        /// Frame shape slug
        #[arg(short, long)]
        style: Option<String>,

        /// Sort key (`popular`, `newest-first`, `price-asc`, `price-desc`, `rating-desc`)
        #[arg(long, default_value = "popular")]
        sort: String,

        /// Maximum number of products to print
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum VoucherAction {
    /// List every program
    Programs,
    /// List the claims stored for a customer
    Claims {
        /// Backend customer ID
        customer_id: i32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Catalog { action } => match action {
            CatalogAction::List {
                category,
                brand,
                style,
                sort,
                limit,
            } => {
                let filter = commands::catalog::ListFilter {
                    category,
                    brand,
                    style,
                    sort,
                    limit,
                };
                commands::catalog::list(&filter).await?;
            }
        },
        Commands::Vouchers { action } => match action {
            VoucherAction::Programs => commands::vouchers::programs(),
            VoucherAction::Claims { customer_id } => {
                commands::vouchers::claims(customer_id).await?;
            }
        },
    }
    Ok(())
}
