//! Booking service configuration.

use std::env;
use std::path::{Path, PathBuf};

use common::{AppError, AppResult, DatabaseConfig};
use domain::CategoryTables;

/// Booking lifecycle policy switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingPolicy {
    /// Honour a provider id supplied at creation instead of always creating
    /// unassigned bookings for providers to claim.
    pub direct_assignment: bool,
}

/// Booking service configuration.
#[derive(Debug, Clone, Default)]
pub struct BookingServiceConfig {
    /// Database connection settings
    pub database: DatabaseConfig,
    /// Lifecycle policy
    pub policy: BookingPolicy,
    /// Optional JSON file replacing the built-in category tables
    pub category_tables_path: Option<PathBuf>,
}

impl BookingServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = DatabaseConfig::default();

        Self {
            database: DatabaseConfig {
                url: env::var("BOOKING_SERVICE_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(defaults.url),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.max_connections),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.min_connections),
            },
            policy: BookingPolicy {
                direct_assignment: env::var("BOOKING_DIRECT_ASSIGNMENT")
                    .map(|v| parse_flag(&v))
                    .unwrap_or(false),
            },
            category_tables_path: env::var("CATEGORY_TABLES_PATH").ok().map(PathBuf::from),
        }
    }

    /// Category tables from the configured file, or the built-in defaults.
    pub fn category_tables(&self) -> AppResult<CategoryTables> {
        match &self.category_tables_path {
            Some(path) => load_category_tables(path),
            None => Ok(CategoryTables::default()),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Read category tables from a JSON file.
pub fn load_category_tables(path: &Path) -> AppResult<CategoryTables> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::internal(format!(
            "Failed to read category tables {}: {}",
            path.display(),
            e
        ))
    })?;

    let tables: CategoryTables = serde_json::from_str(&raw).map_err(|e| {
        AppError::validation(format!(
            "Invalid category tables in {}: {}",
            path.display(),
            e
        ))
    })?;

    tracing::info!(
        "Loaded category tables from {} ({} roles, {} services)",
        path.display(),
        tables.roles.len(),
        tables.services.len()
    );

    Ok(tables)
}
