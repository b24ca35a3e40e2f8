//! Service layer - business use cases.

mod booking_service;

pub use booking_service::{BookingManager, BookingService};
