//! Shopfront CLI - Session migrations and cart tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table the storefront stores carts in
//! shopfront migrate sessions
//!
//! # Work with a file-backed cart
//! shopfront cart show --store-dir ./carts
//! shopfront cart add --product tee --size M --color black --name "Tee" --price 25.00
//! shopfront cart update --id tee-M-black --quantity 3
//! shopfront cart remove --id tee-M-black
//! shopfront cart clear
//!
//! # Check a saved snapshot for drifted totals or duplicate lines
//! shopfront cart inspect ./carts/cart-storage.json
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create database tables
//! - `cart` - Show, mutate or inspect carts stored as JSON files

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use shopfront_core::StorageKey;

mod commands;
mod error;
mod storage;

use commands::cart::{AddItem, CartTarget};
use error::CliError;

#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about = "Shopfront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Work with file-backed carts
    Cart {
        #[command(subcommand)]
        action: CartCommand,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Create the tower-sessions table used for cart storage
    Sessions,
}

/// Where a file-backed cart lives.
#[derive(Args)]
struct StoreArgs {
    /// Directory holding cart files
    #[arg(long, env = "SHOPFRONT_CART_DIR", default_value = "carts")]
    store_dir: PathBuf,

    /// Storage key (file name without `.json`)
    #[arg(long, default_value = StorageKey::DEFAULT)]
    key: StorageKey,
}

impl From<StoreArgs> for CartTarget {
    fn from(args: StoreArgs) -> Self {
        Self {
            dir: args.store_dir,
            key: args.key,
        }
    }
}

#[derive(Subcommand)]
enum CartCommand {
    /// Print the cart snapshot
    Show {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Add a product variant (merges with an existing line)
    Add {
        #[command(flatten)]
        store: StoreArgs,

        /// Product ID
        #[arg(long)]
        product: String,

        /// Size selector
        #[arg(long)]
        size: String,

        /// Color selector
        #[arg(long)]
        color: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Unit price (e.g. 19.99)
        #[arg(long)]
        price: Decimal,

        /// Display image URL
        #[arg(long, default_value = "")]
        image: String,

        /// Number of units
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },
    /// Set a line's quantity (below 1 removes it)
    Update {
        #[command(flatten)]
        store: StoreArgs,

        /// Line item ID
        #[arg(long)]
        id: String,

        /// New quantity
        #[arg(short, long, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        #[command(flatten)]
        store: StoreArgs,

        /// Line item ID
        #[arg(long)]
        id: String,
    },
    /// Remove every line
    Clear {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Hydrate a snapshot file and report what had to be repaired
    Inspect {
        /// Snapshot file to check
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopfront=info,shopfront_core=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Sessions => commands::migrate::sessions().await?,
        },
        Commands::Cart { action } => match action {
            CartCommand::Show { store } => commands::cart::show(&store.into()).await?,
            CartCommand::Add {
                store,
                product,
                size,
                color,
                name,
                price,
                image,
                quantity,
            } => {
                let item = AddItem {
                    product,
                    size,
                    color,
                    name,
                    price,
                    image,
                    quantity,
                };
                commands::cart::add(&store.into(), item).await?;
            }
            CartCommand::Update {
                store,
                id,
                quantity,
            } => commands::cart::update(&store.into(), id, quantity).await?,
            CartCommand::Remove { store, id } => {
                commands::cart::remove(&store.into(), id).await?;
            }
            CartCommand::Clear { store } => commands::cart::clear(&store.into()).await?,
            CartCommand::Inspect { file } => commands::cart::inspect(&file).await?,
        },
    }
    Ok(())
}
