//! Booking Service Library
//!
//! Booking lifecycle and provider assignment for the home-services
//! marketplace. Presentation layers embed the engine through
//! [`service::BookingService`]; the binary only manages the schema and
//! inspects configuration.

pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use tracing::info;

use domain::CategoryMatcher;

use crate::config::BookingServiceConfig;
use crate::infra::Database;
use crate::service::BookingManager;

/// Connect, apply pending migrations and build the lifecycle engine.
pub async fn connect(config: &BookingServiceConfig) -> Result<BookingManager, Box<dyn std::error::Error>> {
    let matcher = CategoryMatcher::new(config.category_tables()?);
    let db = Database::connect(&config.database).await?;

    Ok(BookingManager::from_connection(
        db.get_connection(),
        matcher,
        config.policy,
    ))
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = BookingServiceConfig::from_env();
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Check that the configured database answers.
pub async fn check_database() -> Result<(), Box<dyn std::error::Error>> {
    let config = BookingServiceConfig::from_env();
    let db = Database::connect_without_migrations(&config.database).await?;
    db.ping().await?;
    info!("Database reachable");
    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}
