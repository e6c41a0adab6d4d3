//! Atelier CLI - local cart and catalog grid tools.
//!
//! # Usage
//!
//! ```bash
//! # Add a ring in size 6 to the local cart
//! atelier cart add moon-ring --size 6 --quantity 2
//!
//! # Show the cart
//! atelier cart show
//!
//! # Mark a checkout session as paid (clears the cart once)
//! atelier cart complete cs_test_123
//!
//! # Preview the desktop catalog grid
//! atelier layout render --breakpoint desktop --seed 42
//!
//! # Validate a layout file
//! atelier layout check crates/storefront/content/layout.yaml
//! ```
//!
//! # Commands
//!
//! - `cart` - Manage the client-local cart file
//! - `layout` - Render or validate the catalog grid

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use atelier_core::cart::CartStore;
use atelier_core::layout::Breakpoint;
use atelier_storefront::catalog::CatalogStore;
use atelier_storefront::config::DEFAULT_CATALOG_PATH;
use clap::{Parser, Subcommand};

mod commands;
mod error;
mod storage;

use commands::cart::OutcomeKind;
use commands::layout::RenderOptions;
use error::CliError;
use storage::JsonFileStorage;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(author, version, about = "Atelier CLI tools")]
struct Cli {
    /// Catalog export to read products from
    #[arg(long, global = true, env = "STOREFRONT_CATALOG_PATH", default_value = DEFAULT_CATALOG_PATH)]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the local cart
    Cart {
        /// Cart file
        #[arg(long, env = "ATELIER_CART_PATH", default_value = ".atelier/cart.json")]
        cart: PathBuf,

        #[command(subcommand)]
        action: CartAction,
    },
    /// Render or validate the catalog grid
    Layout {
        #[command(subcommand)]
        action: LayoutAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add a product
    Add {
        /// Product slug
        slug: String,

        #[arg(short, long)]
        size: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (zero or less removes it)
    Update {
        /// Product slug
        slug: String,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,

        /// Only this size; without it every size of the product is updated
        #[arg(short, long)]
        size: Option<String>,
    },
    /// Remove a product's line
    Remove {
        /// Product slug or id
        product: String,

        #[arg(short, long, conflicts_with = "all_sizes")]
        size: Option<String>,

        /// Remove every size of the product
        #[arg(long)]
        all_sizes: bool,
    },
    /// Empty the cart
    Clear,
    /// Apply a checkout session outcome
    Complete {
        /// Checkout session id from the payment provider
        session_id: String,

        #[arg(long, value_enum, default_value_t = OutcomeKind::Completed)]
        outcome: OutcomeKind,
    },
}

#[derive(Subcommand)]
enum LayoutAction {
    /// Draw the catalog grid as text
    Render {
        /// Layout file (stock layout if omitted)
        #[arg(long, env = "STOREFRONT_LAYOUT_PATH")]
        layout: Option<PathBuf>,

        /// Only this breakpoint (`desktop`, `tablet`, `mobile`)
        #[arg(long)]
        breakpoint: Option<Breakpoint>,

        /// Limit to a category slug
        #[arg(long)]
        category: Option<String>,

        /// Snippet locale
        #[arg(long)]
        locale: Option<String>,

        /// Seed for the snippet shuffle
        #[arg(long)]
        seed: Option<u64>,

        /// Show unfilled slots
        #[arg(long)]
        placeholders: bool,
    },
    /// Validate a layout file
    Check {
        file: PathBuf,
    },
}

fn main() {
    let _ = dotenvy::dotenv();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "atelier_cli=warn,atelier_core=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let load_catalog = || CatalogStore::load(&cli.catalog, None);

    match cli.command {
        Commands::Cart { cart, action } => {
            let mut store = CartStore::open(JsonFileStorage::new(cart));
            tracing::debug!(
                path = %store.storage().path().display(),
                items = store.total_items(),
                "Cart opened"
            );
            match action {
                CartAction::Show { json } => {
                    if json {
                        println!("{}", commands::cart::render_json(&store)?);
                    } else {
                        let currency = load_catalog()?.currency();
                        print!("{}", commands::cart::render(&store, currency));
                    }
                }
                CartAction::Add {
                    slug,
                    size,
                    quantity,
                } => {
                    let catalog = load_catalog()?;
                    commands::cart::add(&mut store, &catalog, &slug, size.as_deref(), quantity)?;
                    print!("{}", commands::cart::render(&store, catalog.currency()));
                }
                CartAction::Update {
                    slug,
                    quantity,
                    size,
                } => {
                    let catalog = load_catalog()?;
                    commands::cart::update(&mut store, &catalog, &slug, quantity, size.as_deref())?;
                    print!("{}", commands::cart::render(&store, catalog.currency()));
                }
                CartAction::Remove {
                    product,
                    size,
                    all_sizes,
                } => {
                    let catalog = load_catalog()?;
                    commands::cart::remove(&mut store, &catalog, &product, size.as_deref(), all_sizes);
                    print!("{}", commands::cart::render(&store, catalog.currency()));
                }
                CartAction::Clear => {
                    store.clear();
                    println!("Cart cleared");
                }
                CartAction::Complete {
                    session_id,
                    outcome,
                } => {
                    if commands::cart::complete(&mut store, &session_id, outcome) {
                        println!("Checkout {session_id} completed, cart cleared");
                    } else {
                        println!("Cart kept");
                    }
                }
            }
        }
        Commands::Layout { action } => match action {
            LayoutAction::Render {
                layout,
                breakpoint,
                category,
                locale,
                seed,
                placeholders,
            } => {
                let catalog = load_catalog()?;
                let layout = commands::layout::load(layout.as_deref())?;
                let options = RenderOptions {
                    breakpoint,
                    category: category.as_deref(),
                    locale: locale.as_deref(),
                    seed,
                    placeholders,
                };
                print!("{}", commands::layout::render(&catalog, &layout, &options));
            }
            LayoutAction::Check { file } => {
                print!("{}", commands::layout::check(&file)?);
            }
        },
    }
    Ok(())
}
