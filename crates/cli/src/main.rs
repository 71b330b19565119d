//! Tamarind CLI - storefront client for browsing, cart, and checkout.
//!
//! # Usage
//!
//! ```bash
//! # List the first page of categories
//! tamarind categories
//!
//! # Watch the retrying loader fetch page 2
//! tamarind categories --page 2 --browse
//!
//! # Sign in, fill the cart, and check out
//! tamarind auth login --token shp_123 --user-name "Ada"
//! tamarind cart add --product tee-901 --name "Pocket Tee" --price 19.50 --size M
//! tamarind checkout --payment-id pay_789
//! ```
//!
//! # Commands
//!
//! - `categories` - List the category menu (optionally via the retrying loader)
//! - `nav` - Mount the navigation shell and print its view
//! - `auth` - Sign in, sign out, or show the current session
//! - `cart` - Inspect and mutate the persisted cart
//! - `checkout` - Run an order from creation through the success page
//! - `order` - Look up a placed order

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tamarind_core::Role;
use tamarind_storefront::config::StorefrontConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "tamarind")]
#[command(author, version, about = "Tamarind storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List store categories
    Categories {
        /// Page to fetch (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Drive the retrying loader and log every state change
        #[arg(long)]
        browse: bool,

        /// Drop cached pages and fetch fresh data
        #[arg(long)]
        refresh: bool,
    },
    /// Mount the navigation shell and print its view
    Nav,
    /// Manage the signed-in session
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Inspect and mutate the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Run checkout for the current cart
    Checkout {
        /// Payment reference returned by the payment provider
        #[arg(long)]
        payment_id: String,
    },
    /// Show a placed order
    Order {
        /// Backend order ID
        order_id: String,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Store a session token and sign in
    Login {
        /// Bearer token for the backend
        #[arg(short, long)]
        token: String,

        /// Display name for the account menu
        #[arg(short, long)]
        user_name: String,

        /// Session role (`customer`, `admin`)
        #[arg(short, long, default_value = "customer")]
        role: Role,

        /// Avatar image reference
        #[arg(long)]
        profile_image: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Show the signed-in account
    Show,
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the cart lines and totals
    Show,
    /// Add a line, merging with any line for the same variant
    Add {
        /// Product reference
        #[arg(long)]
        product: String,

        /// Display name for the line
        #[arg(long)]
        name: String,

        /// Unit price
        #[arg(long)]
        price: Decimal,

        /// Units to add
        #[arg(long, default_value_t = 1)]
        quantity: u32,

        /// Selected size
        #[arg(long)]
        size: Option<String>,

        /// Selected color
        #[arg(long)]
        color: Option<String>,

        /// Product image reference
        #[arg(long)]
        image: Option<String>,
    },
    /// Set the quantity of an existing line (0 removes it)
    SetQuantity {
        /// Product reference
        #[arg(long)]
        product: String,

        /// Selected size
        #[arg(long)]
        size: Option<String>,

        /// Selected color
        #[arg(long)]
        color: Option<String>,

        /// New quantity
        #[arg(long)]
        quantity: u32,
    },
    /// Remove a line
    Remove {
        /// Product reference
        #[arg(long)]
        product: String,

        /// Selected size
        #[arg(long)]
        size: Option<String>,

        /// Selected color
        #[arg(long)]
        color: Option<String>,
    },
    /// Empty the cart
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
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
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tamarind_cli=info,tamarind_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = commands::load_state(config)?;

    match cli.command {
        Commands::Categories {
            page,
            browse,
            refresh,
        } => {
            if refresh {
                state.client().invalidate_categories().await;
            }
            if browse {
                commands::categories::browse(&state, page).await?;
            } else {
                commands::categories::list(&state, page).await?;
            }
        }
        Commands::Nav => commands::nav::show(&state).await,
        Commands::Auth { action } => match action {
            AuthAction::Login {
                token,
                user_name,
                role,
                profile_image,
            } => commands::auth::login(&state, token, user_name, role, profile_image)?,
            AuthAction::Logout => commands::auth::logout(&state)?,
            AuthAction::Show => commands::auth::show(&state),
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state),
            CartAction::Add {
                product,
                name,
                price,
                quantity,
                size,
                color,
                image,
            } => commands::cart::add(
                &state,
                commands::cart::AddLine {
                    product,
                    name,
                    price,
                    quantity,
                    size,
                    color,
                    image,
                },
            )?,
            CartAction::SetQuantity {
                product,
                size,
                color,
                quantity,
            } => commands::cart::set_quantity(&state, &product, size, color, quantity)?,
            CartAction::Remove {
                product,
                size,
                color,
            } => commands::cart::remove(&state, &product, size, color)?,
            CartAction::Clear => commands::cart::clear(&state)?,
        },
        Commands::Checkout { payment_id } => commands::checkout::run(&state, &payment_id).await?,
        Commands::Order { order_id } => commands::order::show(&state, &order_id).await?,
    }
    Ok(())
}
