//! Bazaar CLI - Database migrations and seller maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! bazaar migrate
//!
//! # Copy coordinates out of seller address JSON into the canonical columns
//! bazaar sellers normalize --dry-run
//!
//! # Geocode sellers that still have no coordinates
//! bazaar sellers geocode --limit 50
//!
//! # Estimate delivery between two points
//! bazaar estimate --from 25.7617,-80.1918 --to 26.1224,-80.1373
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `sellers normalize` - Backfill coordinates from address JSON
//! - `sellers geocode` - Backfill coordinates from a geocoding service
//! - `estimate` - Offline distance and ETA calculation

#![cfg_attr(not(test), forbid(unsafe_code))]

use bazaar_core::{Coordinate, DeliveryModel};
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Maintain seller delivery origins
    Sellers {
        #[command(subcommand)]
        action: SellerAction,
    },
    /// Estimate delivery distance and time between two points
    Estimate {
        /// Seller location as `lat,lng`
        #[arg(long, allow_hyphen_values = true)]
        from: Coordinate,

        /// Buyer location as `lat,lng`
        #[arg(long, allow_hyphen_values = true)]
        to: Coordinate,

        /// Average delivery speed in km/h
        #[arg(long, default_value_t = DeliveryModel::DEFAULT_SPEED_KMH)]
        speed: u32,

        /// Fixed preparation time in minutes
        #[arg(long, default_value_t = DeliveryModel::DEFAULT_PREP_TIME_MINUTES)]
        prep: u32,
    },
}

#[derive(Subcommand)]
enum SellerAction {
    /// Copy coordinates found in seller address JSON into the canonical columns
    Normalize {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Look up coordinates for sellers that still have none
    Geocode {
        /// Maximum number of sellers to look up
        #[arg(short, long, default_value_t = 100)]
        limit: usize,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
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
        Commands::Sellers { action } => match action {
            SellerAction::Normalize { dry_run } => {
                commands::sellers::normalize(dry_run).await?;
            }
            SellerAction::Geocode { limit, dry_run } => {
                commands::sellers::geocode(limit, dry_run).await?;
            }
        },
        Commands::Estimate {
            from,
            to,
            speed,
            prep,
        } => commands::estimate::run(from, to, speed, prep)?,
    }
    Ok(())
}
