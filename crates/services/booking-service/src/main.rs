//! Booking Service - schema management and booking inspection.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use booking_service_lib::config::BookingServiceConfig;
use booking_service_lib::service::BookingService;
use booking_service_lib::MigrateAction;
use domain::{BookingStatus, CategoryMatcher};

#[derive(Parser)]
#[command(name = "booking-service")]
#[command(about = "Booking lifecycle and provider assignment")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateCommands,
    },
    /// Check database connectivity
    Ping,
    /// Show how a provider role and a service name are categorized
    Category {
        #[arg(long)]
        role: String,
        #[arg(long)]
        service: String,
    },
    /// List bookings visible to a user or a provider
    Bookings {
        #[arg(long, conflicts_with = "provider", required_unless_present = "provider")]
        user: Option<Uuid>,
        #[arg(long)]
        provider: Option<Uuid>,
        /// Only bookings in this status
        #[arg(long)]
        status: Option<BookingStatus>,
    },
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Migrate { action } => {
            let migrate_action = match action {
                MigrateCommands::Up => MigrateAction::Up,
                MigrateCommands::Down => MigrateAction::Down,
                MigrateCommands::Status => MigrateAction::Status,
                MigrateCommands::Fresh => MigrateAction::Fresh,
            };
            booking_service_lib::run_migrations(migrate_action).await?;
        }
        Commands::Ping => {
            booking_service_lib::check_database().await?;
        }
        Commands::Category { role, service } => {
            let config = BookingServiceConfig::from_env();
            let matcher = CategoryMatcher::new(config.category_tables()?);

            let role_category = matcher.role_category(&role);
            let service_category = matcher.service_category(&service);
            println!(
                "role {:?} -> {}",
                role,
                role_category.as_deref().unwrap_or("(unknown)")
            );
            println!("service {:?} -> {}", service, service_category);
            println!(
                "{}",
                if matcher.matches(&role, &service) {
                    "allowed"
                } else {
                    "not allowed"
                }
            );
        }
        Commands::Bookings {
            user,
            provider,
            status,
        } => {
            let config = BookingServiceConfig::from_env();
            let engine = booking_service_lib::connect(&config).await?;

            let bookings = match (user, provider) {
                (Some(user_id), _) => engine.list_for_user(user_id, status).await?,
                (None, Some(provider_id)) => engine.list_for_provider(provider_id, status).await?,
                (None, None) => Vec::new(),
            };
            println!("{}", serde_json::to_string_pretty(&bookings)?);
        }
    }

    Ok(())
}
