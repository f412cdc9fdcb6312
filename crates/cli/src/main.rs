//! Neemon CLI - Drive the storefront and admin from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse and fill the cart
//! neemon products --category skincare
//! neemon cart add p1 --qty 2
//! neemon cart show
//!
//! # Sign in (password from NEEMON_PASSWORD) and check out
//! neemon account login -e amina@example.com
//! neemon checkout --method bodaboda --address "Kilimani" --payment delivery
//!
//! # Seller tasks
//! neemon admin orders --status NEW
//! neemon admin status ORD-1a2b3c4d-... PREPARING
//! ```
//!
//! # Commands
//!
//! - `products` - List products in stock
//! - `cart` - Show and edit the cart
//! - `wishlist` - Show and edit the wishlist
//! - `account` - Sign up, sign in, sign out
//! - `checkout` - Place an order for the cart
//! - `admin` - Order status and dashboard (service key required)
//!
//! State lives in `--data-dir` (or `STOREFRONT_DATA_DIR`), so the cart and
//! session persist between invocations.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use neemon_core::{Category, DeliveryMethod, OrderStatus, PaymentMode};
use serde::Serialize;

mod commands;

use commands::shop::CheckoutArgs;

#[derive(Parser)]
#[command(name = "neemon")]
#[command(author, version, about = "Neemon storefront CLI")]
struct Cli {
    /// Local state directory (overrides `STOREFRONT_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products in stock
    Products {
        #[arg(short, long)]
        category: Option<Category>,
    },
    /// Show and edit the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Show and edit the wishlist
    Wishlist {
        #[command(subcommand)]
        action: Option<WishlistAction>,
    },
    /// Manage the signed-in account
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Place an order for the current cart
    Checkout {
        #[arg(short, long, default_value = "bodaboda")]
        method: DeliveryMethod,
        /// Free-text delivery address
        #[arg(short, long)]
        address: Option<String>,
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        #[arg(short, long, default_value = "mpesa")]
        payment: PaymentMode,
        /// M-Pesa phone (9 digits, e.g. 712345678)
        #[arg(long)]
        phone: Option<String>,
    },
    /// Seller tasks
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add units of a product
    Add {
        product_id: String,
        #[arg(short, long, default_value_t = 1.0)]
        qty: f64,
    },
    /// Set a line's quantity (0 removes it)
    Set { product_id: String, qty: f64 },
    /// Remove a line
    Remove { product_id: String },
    /// Move a line to the wishlist
    SaveForLater { product_id: String },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show wishlisted product ids
    Show,
    /// Add or remove a product
    Toggle { product_id: String },
    /// Move a product to the cart
    MoveToCart { product_id: String },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Create an account and sign in
    Signup {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, default_value = "")]
        phone: String,
        #[arg(long, env = "NEEMON_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(long, env = "NEEMON_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Show who is signed in
    Whoami,
    /// Reset a password
    ResetPassword {
        #[arg(short, long)]
        email: String,
        #[arg(long, env = "NEEMON_PASSWORD", hide_env_values = true, default_value = "")]
        password: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List orders, newest first
    Orders {
        #[arg(short, long)]
        status: Option<OrderStatus>,
    },
    /// Set an order's status
    Status { order_id: String, status: OrderStatus },
    /// Show dashboard counters
    Dashboard,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neemon_cli=info,warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::print_stdout)]
fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Admin { action } => run_admin(action).await,
        command => run_storefront(cli.data_dir, command).await,
    }
}

async fn run_admin(action: AdminAction) -> Result<(), Box<dyn std::error::Error>> {
    use commands::admin;

    let state = commands::open_admin()?;
    match action {
        AdminAction::Orders { status } => print_json(&admin::orders(&state, status).await?),
        AdminAction::Status { order_id, status } => {
            print_json(&admin::set_status(&state, &order_id, status).await?)
        }
        AdminAction::Dashboard => print_json(&admin::dashboard(&state).await?),
    }
}

async fn run_storefront(
    data_dir: Option<PathBuf>,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    use commands::{account, shop};

    let sf = commands::open_storefront(data_dir).await?;
    match command {
        Commands::Products { category } => print_json(&shop::products(&sf, category).await)?,
        Commands::Cart { action } => match action.unwrap_or(CartAction::Show) {
            CartAction::Show => print_json(&shop::cart_show(&sf).await)?,
            CartAction::Add { product_id, qty } => {
                print_json(&shop::cart_add(&sf, &product_id, qty).await?)?;
            }
            CartAction::Set { product_id, qty } => {
                print_json(&shop::cart_set(&sf, &product_id, qty).await?)?;
            }
            CartAction::Remove { product_id } => {
                print_json(&shop::cart_remove(&sf, &product_id).await?)?;
            }
            CartAction::SaveForLater { product_id } => {
                print_json(&shop::save_for_later(&sf, &product_id).await?)?;
            }
            CartAction::Clear => print_json(&shop::cart_clear(&sf).await?)?,
        },
        Commands::Wishlist { action } => match action.unwrap_or(WishlistAction::Show) {
            WishlistAction::Show => print_json(&shop::wishlist_show(&sf))?,
            WishlistAction::Toggle { product_id } => {
                print_json(&shop::wishlist_toggle(&sf, &product_id)?)?;
            }
            WishlistAction::MoveToCart { product_id } => {
                print_json(&shop::wishlist_move_to_cart(&sf, &product_id).await?)?;
            }
        },
        Commands::Account { action } => match action {
            AccountAction::Signup {
                name,
                email,
                phone,
                password,
            } => print_json(&account::signup(&sf, &name, &email, &phone, &password).await?)?,
            AccountAction::Login { email, password } => {
                print_json(&account::login(&sf, &email, &password).await?)?;
            }
            AccountAction::Logout => print_json(&account::logout(&sf).await?)?,
            AccountAction::Whoami => print_json(&account::whoami(&sf))?,
            AccountAction::ResetPassword { email, password } => {
                print_json(&account::reset_password(&sf, &email, &password).await?)?;
            }
        },
        Commands::Checkout {
            method,
            address,
            lat,
            lng,
            payment,
            phone,
        } => {
            let args = CheckoutArgs {
                method,
                address,
                latitude: lat,
                longitude: lng,
                payment,
                phone,
            };
            print_json(&shop::checkout(&sf, args).await?)?;
        }
        Commands::Admin { action } => run_admin(action).await?,
    }
    sf.shutdown();
    Ok(())
}
