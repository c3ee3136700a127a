//! Sstashed CLI - browse the catalog and manage cart, wishlist and orders
//! from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog (no account needed)
//! sstashed products list --page 0 --size 12
//! sstashed products search "block print"
//!
//! # Cart and wishlist (needs SSTASHED_TOKEN or SSTASHED_EMAIL/SSTASHED_PASSWORD)
//! sstashed cart add 9 --quantity 2
//! sstashed wishlist toggle 5
//! sstashed wishlist move-to-cart 5
//!
//! # Checkout
//! sstashed orders place --address 3 --payment upi
//! ```
//!
//! # Commands
//!
//! - `products` / `categories` - Catalog browsing
//! - `cart` - Show and change the cart
//! - `wishlist` - Show and change the wishlist
//! - `orders` - Place, list and cancel orders
//! - `profile` / `addresses` - Account details

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use sstashed_storefront::{Storefront, StorefrontConfig, TracingNotifier};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "sstashed")]
#[command(author, version, about = "Sstashed marketplace storefront")]
struct Cli {
    /// Print raw JSON instead of a summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse products
    Products {
        #[command(subcommand)]
        action: commands::catalog::ProductAction,
    },
    /// Browse categories
    Categories {
        #[command(subcommand)]
        action: commands::catalog::CategoryAction,
    },
    /// Show and change the cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Show and change the wishlist
    Wishlist {
        #[command(subcommand)]
        action: commands::wishlist::WishlistAction,
    },
    /// Place, list and cancel orders
    Orders {
        #[command(subcommand)]
        action: commands::orders::OrderAction,
    },
    /// Show or update the profile
    Profile {
        #[command(subcommand)]
        action: commands::account::ProfileAction,
    },
    /// Manage saved addresses
    Addresses {
        #[command(subcommand)]
        action: commands::account::AddressAction,
    },
}

impl Commands {
    /// Catalog browsing works signed out; everything else needs a session.
    const fn needs_session(&self) -> bool {
        !matches!(self, Self::Products { .. } | Self::Categories { .. })
    }
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
async fn main() -> ExitCode {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sstashed_storefront=info,sstashed_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => return finish(Err(e.into())),
    };
    // Dropped after `finish` so a failed command is flushed to Sentry.
    let _sentry_guard = init_sentry(&config);

    finish(run(cli, &config).await)
}

/// Log the command's outcome and map it to the process exit code.
fn finish(result: Result<(), CliError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), CliError> {
    let storefront = Storefront::new(config.gateway.clone(), Arc::new(TracingNotifier))?;

    if cli.command.needs_session() {
        let credentials = config.credentials.as_ref().ok_or(CliError::NotAuthenticated)?;
        let user = storefront.authenticate(credentials).await?;
        tracing::info!(user_id = %user.id, "Signed in as {}", user.full_name());
    }

    let json = cli.json;
    match cli.command {
        Commands::Products { action } => commands::catalog::products(&storefront, action, json).await,
        Commands::Categories { action } => {
            commands::catalog::categories(&storefront, action, json).await
        }
        Commands::Cart { action } => commands::cart::run(&storefront, action, json).await,
        Commands::Wishlist { action } => commands::wishlist::run(&storefront, action, json).await,
        Commands::Orders { action } => commands::orders::run(&storefront, action, json).await,
        Commands::Profile { action } => commands::account::profile(&storefront, action, json).await,
        Commands::Addresses { action } => {
            commands::account::addresses(&storefront, action, json).await
        }
    }
}
