//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod booking;
pub mod notification;
pub mod provider_profile;
pub mod service;
