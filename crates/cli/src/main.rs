//! AutoNorte CLI - drives the storefront client against a live backend.
//!
//! # Usage
//!
//! ```bash
//! # Show a product
//! an-cli product 5
//!
//! # Cart operations (guest or authenticated, depending on stored state)
//! an-cli cart add 5 --quantity 2
//! an-cli cart list
//! an-cli cart count
//!
//! # Shipping
//! an-cli shipping regions
//! an-cli shipping counties R13
//! an-cli shipping quote --region R13 --comuna 13101 --address "Av. Matta 845"
//!
//! # Checkout
//! an-cli checkout --payment card --delivery pickup
//! ```
//!
//! # Environment Variables
//!
//! - `AUTONORTE_API_BASE` - Backend base URL (required)
//! - `AUTONORTE_STATE_FILE` - Session/guest-cart state file (optional)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use autonorte_client::{StoreConfig, StorefrontSession};
use autonorte_core::ProductId;

mod commands;

#[derive(Parser)]
#[command(name = "an-cli")]
#[command(author, version, about = "AutoNorte storefront client CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a product in the public catalog
    Product {
        /// Product id
        id: i32,
    },
    /// Cart operations (hybrid: guest or authenticated)
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Carrier coverage and quotes
    Shipping {
        #[command(subcommand)]
        action: ShippingAction,
    },
    /// Validate and submit an order
    Checkout(commands::checkout::CheckoutArgs),
    /// Show the logged-in account profile
    Profile,
    /// Close the session and clear local state
    Logout,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart with totals
    List,
    /// Add a product
    Add {
        /// Product id
        id: i32,
        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product
    Remove {
        /// Product id
        id: i32,
    },
    /// Total item count
    Count,
}

#[derive(Subcommand)]
enum ShippingAction {
    /// List carrier coverage regions
    Regions,
    /// List carrier coverage counties for a region
    Counties {
        /// Carrier region id (e.g. R13)
        region: String,
    },
    /// Request quotes for the current cart
    Quote(commands::shipping::QuoteArgs),
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;
    let session = StorefrontSession::new(config)?;

    match cli.command {
        Commands::Product { id } => {
            commands::catalog::show_product(&session, ProductId::new(id)).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::List => commands::cart::list(&session).await?,
            CartAction::Add { id, quantity } => {
                commands::cart::add(&session, ProductId::new(id), quantity).await?;
            }
            CartAction::Remove { id } => {
                commands::cart::remove(&session, ProductId::new(id)).await?;
            }
            CartAction::Count => commands::cart::count(&session).await?,
        },
        Commands::Shipping { action } => match action {
            ShippingAction::Regions => commands::shipping::regions(&session).await?,
            ShippingAction::Counties { region } => {
                commands::shipping::counties(&session, &region).await?;
            }
            ShippingAction::Quote(args) => commands::shipping::quote(&session, args).await?,
        },
        Commands::Checkout(args) => commands::checkout::submit(&session, args).await?,
        Commands::Profile => commands::session::show_profile(&session).await?,
        Commands::Logout => {
            session.logout().await?;
            tracing::info!("session closed, local state cleared");
        }
    }
    Ok(())
}
