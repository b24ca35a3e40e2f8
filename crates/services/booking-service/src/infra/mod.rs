//! Infrastructure layer - PostgreSQL connection pool and schema migrations.

mod db;
pub mod migrations;

pub use db::Database;
pub use migrations::Migrator;
