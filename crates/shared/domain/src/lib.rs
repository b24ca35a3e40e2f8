//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! bookings and their status machine, provider profiles, catalog services,
//! category matching and the business error taxonomy.

pub mod booking;
pub mod category;
pub mod constants;
pub mod error;
pub mod provider;
pub mod service;

pub use booking::{
    Actor, Area, Booking, BookingChanges, BookingStatus, CreateBooking, ExpectedState,
    NewBooking, PaymentStatus,
};
pub use category::{CategoryMatcher, CategoryTables};
pub use constants::*;
pub use error::{DomainError, ErrorKind};
pub use provider::ProviderProfile;
pub use service::Service;
