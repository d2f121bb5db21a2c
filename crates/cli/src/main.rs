//! Al-Ghazaly CLI - inspect and mutate a live cart through the storefront
//! client.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart with totals
//! ag-cli cart show
//!
//! # Add a product (price is used for the optimistic line)
//! ag-cli cart add 5f2c... --price 250 --name "Brake Pad" --quantity 2
//!
//! # Change a quantity (0 removes the line)
//! ag-cli cart set 5f2c... 3
//!
//! # Toggle a favorite
//! ag-cli favorites toggle 5f2c...
//!
//! # Staff view of a customer's orders
//! ag-cli orders list --customer 9a1b...
//! ```
//!
//! # Commands
//!
//! - `cart` - Show and mutate the cart
//! - `favorites` - List and toggle favorites
//! - `orders` - List orders
//!
//! Configuration is read from the environment; see
//! `alghazaly_storefront::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use alghazaly_storefront::config::StorefrontConfig;
use alghazaly_storefront::guard::LogNotifier;
use alghazaly_storefront::{Storefront, StorefrontError};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "ag-cli")]
#[command(author, version, about = "Al-Ghazaly storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show and mutate the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// List and toggle favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// List orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print cart lines and the checkout summary
    Show {
        /// Show another customer's cart (staff)
        #[arg(short, long)]
        customer: Option<String>,
    },
    /// Add a product as a standalone line
    Add {
        /// Product ID
        product_id: String,

        /// Unit price in EGP
        #[arg(short, long)]
        price: Decimal,

        /// Product name
        #[arg(short, long)]
        name: Option<String>,

        /// Quantity
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 or less removes it)
    Set {
        /// Product ID
        product_id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a product's line
    Remove {
        /// Product ID
        product_id: String,
    },
    /// Empty the cart
    Clear,
    /// Drop a bundle's discount, keeping its lines
    VoidBundle {
        /// Bundle group ID
        bundle_group_id: String,
    },
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// Print favorites
    List {
        /// Show another customer's favorites (staff)
        #[arg(short, long)]
        customer: Option<String>,
    },
    /// Flip whether a product is a favorite
    Toggle {
        /// Product ID
        product_id: String,

        /// Product name
        #[arg(short, long)]
        name: Option<String>,

        /// Unit price in EGP
        #[arg(short, long, default_value_t = Decimal::ZERO)]
        price: Decimal,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Print orders
    List {
        /// Show another customer's orders (staff)
        #[arg(short, long)]
        customer: Option<String>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration from environment (needed for Sentry init)
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            StorefrontError::from(e).report();
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "alghazaly_storefront=info,alghazaly_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let storefront = match Storefront::new(config, Arc::new(LogNotifier)) {
        Ok(storefront) => storefront,
        Err(e) => {
            StorefrontError::from(e).report();
            std::process::exit(2);
        }
    };

    if let Err(e) = run(cli, &storefront).await {
        match e {
            CommandError::Storefront(err) => err.report(),
            other => tracing::error!("Command failed: {other}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, storefront: &Storefront) -> Result<(), CommandError> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show { customer } => {
                commands::cart::show(storefront, customer.as_deref()).await?;
            }
            CartAction::Add {
                product_id,
                price,
                name,
                quantity,
            } => {
                let product = commands::product(product_id, name, price);
                commands::cart::add(storefront, product, quantity).await?;
            }
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set_quantity(storefront, product_id, quantity).await?,
            CartAction::Remove { product_id } => {
                commands::cart::remove(storefront, product_id).await?;
            }
            CartAction::Clear => commands::cart::clear(storefront).await?,
            CartAction::VoidBundle { bundle_group_id } => {
                commands::cart::void_bundle(storefront, bundle_group_id).await?;
            }
        },
        Commands::Favorites { action } => match action {
            FavoritesAction::List { customer } => {
                commands::favorites::list(storefront, customer.as_deref()).await?;
            }
            FavoritesAction::Toggle {
                product_id,
                name,
                price,
            } => {
                let product = commands::product(product_id, name, price);
                commands::favorites::toggle(storefront, &product).await?;
            }
        },
        Commands::Orders { action } => match action {
            OrdersAction::List { customer } => {
                commands::orders::list(storefront, customer.as_deref()).await?;
            }
        },
    }
    Ok(())
}
