//! In-memory adapters.
//!
//! Same contracts as the SeaORM stores, including the conditional update and
//! provider slot uniqueness, for embedding without a database.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::booking_repository::{BookingRepository, UpdateOutcome};
use super::directory_repository::DirectoryRepository;
use super::notification_repository::{Notification, Notifier};
use common::{AppError, AppResult};
use domain::{
    Booking, BookingChanges, BookingStatus, DomainError, ExpectedState, NewBooking,
    ProviderProfile, Service,
};

fn newest_first(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by_key(|b| (Reverse(b.date), Reverse(b.created_at)));
    bookings
}

fn status_matches(booking: &Booking, status: Option<BookingStatus>) -> bool {
    status.is_none() || status == Some(booking.status)
}

/// Whether another booking already holds `provider_id`'s slot at (date, time).
fn slot_taken(
    bookings: &HashMap<Uuid, Booking>,
    exclude: Option<Uuid>,
    provider_id: Uuid,
    date: NaiveDate,
    time_slot: NaiveTime,
) -> bool {
    bookings.values().any(|b| {
        Some(b.id) != exclude
            && b.holds_slot_of(provider_id)
            && b.date == date
            && b.time_slot == time_slot
    })
}

/// Booking store held in a map behind a lock
#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored bookings
    pub async fn count(&self) -> usize {
        self.bookings.read().await.len()
    }

    async fn select(&self, keep: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let bookings = self.bookings.read().await;
        newest_first(bookings.values().filter(|b| keep(b)).cloned().collect())
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        Ok(self
            .select(|b| b.is_owned_by(user_id) && status_matches(b, status))
            .await)
    }

    async fn find_by_provider(
        &self,
        provider_id: Uuid,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        Ok(self
            .select(|b| b.is_assigned_to(provider_id) && status_matches(b, status))
            .await)
    }

    async fn find_visible_to_provider(
        &self,
        provider_id: Uuid,
        service_ids: Vec<Uuid>,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        let include_open = matches!(status, None | Some(BookingStatus::Pending));
        Ok(self
            .select(|b| {
                let visible = b.is_assigned_to(provider_id)
                    || (include_open && b.is_open() && service_ids.contains(&b.service_id));
                visible && status_matches(b, status)
            })
            .await)
    }

    async fn find_by_provider_date_time(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        time_slot: NaiveTime,
    ) -> AppResult<Vec<Booking>> {
        Ok(self
            .select(|b| b.is_assigned_to(provider_id) && b.date == date && b.time_slot == time_slot)
            .await)
    }

    async fn create(&self, new: NewBooking) -> AppResult<Booking> {
        let mut bookings = self.bookings.write().await;

        if let Some(provider_id) = new.provider_id {
            if slot_taken(&bookings, None, provider_id, new.date, new.time_slot) {
                return Err(AppError::from(DomainError::DuplicateBookingTime));
            }
        }

        let booking = Booking::new(Uuid::new_v4(), new);
        bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn update_atomic(
        &self,
        id: Uuid,
        expected: ExpectedState,
        changes: BookingChanges,
    ) -> AppResult<UpdateOutcome> {
        let mut bookings = self.bookings.write().await;

        let current = match bookings.get(&id) {
            Some(booking) if ExpectedState::from(booking) == expected => booking.clone(),
            _ => return Ok(UpdateOutcome::Stale),
        };

        if let Some(provider_id) = changes.provider_id {
            if changes.status.holds_slot()
                && slot_taken(&bookings, Some(id), provider_id, current.date, current.time_slot)
            {
                return Ok(UpdateOutcome::SlotTaken);
            }
        }

        let updated = Booking {
            status: changes.status,
            provider_id: changes.provider_id,
            updated_at: Utc::now(),
            ..current
        };
        bookings.insert(id, updated.clone());

        Ok(UpdateOutcome::Updated(updated))
    }
}

/// Service catalog and provider profiles held in memory
#[derive(Default)]
pub struct InMemoryDirectory {
    services: RwLock<HashMap<Uuid, Service>>,
    providers: RwLock<HashMap<Uuid, ProviderProfile>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_service(&self, service: Service) {
        self.services.write().await.insert(service.id, service);
    }

    pub async fn insert_provider(&self, profile: ProviderProfile) {
        self.providers.write().await.insert(profile.id, profile);
    }
}

#[async_trait]
impl DirectoryRepository for InMemoryDirectory {
    async fn find_service_by_id(&self, id: Uuid) -> AppResult<Option<Service>> {
        Ok(self.services.read().await.get(&id).cloned())
    }

    async fn find_provider_profile_by_id(&self, id: Uuid) -> AppResult<Option<ProviderProfile>> {
        Ok(self.providers.read().await.get(&id).cloned())
    }

    async fn find_active_providers(&self) -> AppResult<Vec<ProviderProfile>> {
        let mut active: Vec<ProviderProfile> = self
            .providers
            .read()
            .await
            .values()
            .filter(|p| p.active)
            .cloned()
            .collect();
        active.sort_by_key(|p| p.created_at);
        Ok(active)
    }

    async fn list_services(&self) -> AppResult<Vec<Service>> {
        let mut services: Vec<Service> = self.services.read().await.values().cloned().collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }
}

/// Notifier that records every notification it accepts
#[derive(Default)]
pub struct InMemoryNotifier {
    sent: RwLock<Vec<Notification>>,
    failing: AtomicBool,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `emit` fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Notifications accepted so far, oldest first
    pub async fn recorded(&self) -> Vec<Notification> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn emit(&self, notification: Notification) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::internal("notification sink unavailable"));
        }
        self.sent.write().await.push(notification);
        Ok(())
    }
}
