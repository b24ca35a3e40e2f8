//! Repository layer for data access.

mod booking_repository;
mod directory_repository;
pub mod entities;
pub mod memory;
mod notification_repository;

pub use booking_repository::{BookingRepository, BookingStore, UpdateOutcome};
pub use directory_repository::{DirectoryRepository, DirectoryStore};
pub use memory::{InMemoryBookingStore, InMemoryDirectory, InMemoryNotifier};
pub use notification_repository::{Notification, NotificationKind, NotificationStore, Notifier};

#[cfg(any(test, feature = "test-utils"))]
pub use booking_repository::MockBookingRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use directory_repository::MockDirectoryRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use notification_repository::MockNotifier;
