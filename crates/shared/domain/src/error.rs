//! Domain-level errors.
//!
//! These errors represent business rule violations of the booking lifecycle.
//! Every variant carries a stable machine-readable code so a presentation
//! layer can map it consistently. They are independent of infrastructure
//! concerns (HTTP, database).

use thiserror::Error;

use crate::booking::BookingStatus;

/// Broad classification of a domain error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    State,
    Authorization,
    Conflict,
    Precondition,
    Validation,
}

/// Domain-specific errors for business rule violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    // Not found
    #[error("Service not found")]
    ServiceNotFound,

    #[error("Provider profile not found")]
    ProviderProfileNotFound,

    #[error("Booking not found")]
    BookingNotFound,

    // State
    #[error("Cannot change booking status from {from} to {to}")]
    InvalidStatusTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Booking is already {0} and can no longer change")]
    TerminalStatus(BookingStatus),

    #[error("Providers cannot set a booking to {0}")]
    InvalidProviderStatus(BookingStatus),

    #[error("Users can only cancel bookings, not set them to {0}")]
    InvalidUserStatus(BookingStatus),

    // Authorization
    #[error("Booking does not belong to this user")]
    BookingNotOwned,

    #[error("Booking is not assigned to this provider")]
    BookingNotAssigned,

    #[error("{}", category_message(.service, .role.as_deref()))]
    CategoryNotAllowed {
        service: String,
        role: Option<String>,
    },

    #[error("Booking has no provider assigned")]
    NoProviderAssigned,

    // Conflict
    #[error("Booking has already been accepted by another provider")]
    BookingAlreadyAssigned,

    #[error("Provider already has a booking at this date and time slot")]
    DuplicateBookingTime,

    // Precondition
    #[error("Service is not active")]
    ServiceInactive,

    #[error("Provider is not active")]
    ProviderInactive,

    /// Input could not be parsed into a domain value
    #[error("Validation error: {0}")]
    Validation(String),
}

fn category_message(service: &str, role: Option<&str>) -> String {
    match role {
        Some(role) => format!(
            "Service '{}' is outside the category of provider role '{}'",
            service, role
        ),
        None => format!(
            "Provider has no verified service role and cannot accept '{}'",
            service
        ),
    }
}

impl DomainError {
    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::ServiceNotFound => "SERVICE_NOT_FOUND",
            DomainError::ProviderProfileNotFound => "PROVIDER_PROFILE_NOT_FOUND",
            DomainError::BookingNotFound => "BOOKING_NOT_FOUND",
            DomainError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            DomainError::TerminalStatus(_) => "TERMINAL_STATUS",
            DomainError::InvalidProviderStatus(_) => "INVALID_PROVIDER_STATUS",
            DomainError::InvalidUserStatus(_) => "INVALID_USER_STATUS",
            DomainError::BookingNotOwned => "BOOKING_NOT_OWNED",
            DomainError::BookingNotAssigned => "BOOKING_NOT_ASSIGNED",
            DomainError::CategoryNotAllowed { .. } => "CATEGORY_NOT_ALLOWED",
            DomainError::NoProviderAssigned => "NO_PROVIDER_ASSIGNED",
            DomainError::BookingAlreadyAssigned => "BOOKING_ALREADY_ASSIGNED",
            DomainError::DuplicateBookingTime => "DUPLICATE_BOOKING_TIME",
            DomainError::ServiceInactive => "SERVICE_INACTIVE",
            DomainError::ProviderInactive => "PROVIDER_INACTIVE",
            DomainError::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// Error classification
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::ServiceNotFound
            | DomainError::ProviderProfileNotFound
            | DomainError::BookingNotFound => ErrorKind::NotFound,
            DomainError::InvalidStatusTransition { .. }
            | DomainError::TerminalStatus(_)
            | DomainError::InvalidProviderStatus(_)
            | DomainError::InvalidUserStatus(_) => ErrorKind::State,
            DomainError::BookingNotOwned
            | DomainError::BookingNotAssigned
            | DomainError::CategoryNotAllowed { .. }
            | DomainError::NoProviderAssigned => ErrorKind::Authorization,
            DomainError::BookingAlreadyAssigned | DomainError::DuplicateBookingTime => {
                ErrorKind::Conflict
            }
            DomainError::ServiceInactive | DomainError::ProviderInactive => {
                ErrorKind::Precondition
            }
            DomainError::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    /// Create a category rejection naming the service and the provider role
    pub fn category_not_allowed(service: impl Into<String>, role: Option<&str>) -> Self {
        DomainError::CategoryNotAllowed {
            service: service.into(),
            role: role.map(str::to_string),
        }
    }
}
