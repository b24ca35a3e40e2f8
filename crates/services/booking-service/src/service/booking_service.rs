//! Booking service - the booking lifecycle engine.
//!
//! Creates bookings, answers scoped listings and drives status transitions
//! for users and providers. All synchronization lives in the booking store:
//! every mutation is a single conditional write guarded on the state the
//! engine read. Notifications go out after the write and never change the
//! outcome.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use futures::future::join_all;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{
    Actor, Booking, BookingChanges, BookingStatus, CategoryMatcher, CreateBooking, DomainError,
    ExpectedState, NewBooking, ProviderProfile, Service,
};

use crate::config::BookingPolicy;
use crate::repository::{
    BookingRepository, BookingStore, DirectoryRepository, DirectoryStore, Notification,
    NotificationKind, NotificationStore, Notifier, UpdateOutcome,
};

/// Booking service trait for dependency injection.
#[async_trait]
pub trait BookingService: Send + Sync {
    /// Create a PENDING booking for `user_id` and announce it to matching providers
    async fn create_booking(&self, user_id: Uuid, input: CreateBooking) -> AppResult<Booking>;

    /// Single booking, if the actor may see it
    async fn get_booking(&self, booking_id: Uuid, actor: Actor) -> AppResult<Booking>;

    /// Bookings owned by a user
    async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>>;

    /// Bookings assigned to a provider plus open bookings they can claim
    async fn list_for_provider(
        &self,
        provider_id: Uuid,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>>;

    /// Move a booking to `status` on behalf of `actor`
    async fn transition_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
        actor: Actor,
    ) -> AppResult<Booking>;
}

/// Concrete implementation of BookingService using repositories.
pub struct BookingManager {
    bookings: Arc<dyn BookingRepository>,
    directory: Arc<dyn DirectoryRepository>,
    notifier: Arc<dyn Notifier>,
    matcher: CategoryMatcher,
    policy: BookingPolicy,
}

impl BookingManager {
    /// Create new booking service with the default policy
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        directory: Arc<dyn DirectoryRepository>,
        notifier: Arc<dyn Notifier>,
        matcher: CategoryMatcher,
    ) -> Self {
        Self {
            bookings,
            directory,
            notifier,
            matcher,
            policy: BookingPolicy::default(),
        }
    }

    /// Create booking service backed by the SeaORM stores
    pub fn from_connection(
        db: Arc<DatabaseConnection>,
        matcher: CategoryMatcher,
        policy: BookingPolicy,
    ) -> Self {
        Self::new(
            Arc::new(BookingStore::new(Arc::clone(&db))),
            Arc::new(DirectoryStore::new(Arc::clone(&db))),
            Arc::new(NotificationStore::new(db)),
            matcher,
        )
        .with_policy(policy)
    }

    pub fn with_policy(mut self, policy: BookingPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn load_booking(&self, id: Uuid) -> AppResult<Booking> {
        self.bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::BookingNotFound.into())
    }

    async fn load_service(&self, id: Uuid) -> AppResult<Service> {
        self.directory
            .find_service_by_id(id)
            .await?
            .ok_or_else(|| DomainError::ServiceNotFound.into())
    }

    async fn load_profile(&self, id: Uuid) -> AppResult<ProviderProfile> {
        self.directory
            .find_provider_profile_by_id(id)
            .await?
            .ok_or_else(|| DomainError::ProviderProfileNotFound.into())
    }

    fn serves(&self, profile: &ProviderProfile, service: &Service) -> bool {
        profile
            .role()
            .is_some_and(|role| self.matcher.matches(role, &service.name))
    }

    fn ensure_category(&self, profile: &ProviderProfile, service: &Service) -> AppResult<()> {
        if self.serves(profile, service) {
            return Ok(());
        }

        tracing::warn!(
            "Provider {} (role {:?}) may not take {} bookings",
            profile.id,
            profile.role(),
            service.name
        );
        Err(DomainError::category_not_allowed(&service.name, profile.role()).into())
    }

    /// Fails if the provider already holds another booking in the slot.
    async fn ensure_slot_free(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        time_slot: NaiveTime,
        exclude: Option<Uuid>,
    ) -> AppResult<()> {
        let clash = self
            .bookings
            .find_by_provider_date_time(provider_id, date, time_slot)
            .await?
            .into_iter()
            .any(|b| Some(b.id) != exclude && b.status.holds_slot());

        if clash {
            tracing::warn!(
                "Provider {} already booked on {} at {}",
                provider_id,
                date,
                time_slot
            );
            return Err(DomainError::DuplicateBookingTime.into());
        }
        Ok(())
    }

    /// Service ids whose category matches the provider's role.
    async fn matching_service_ids(&self, profile: &ProviderProfile) -> AppResult<Vec<Uuid>> {
        let Some(role) = profile.role() else {
            return Ok(Vec::new());
        };

        let services = self.directory.list_services().await?;
        Ok(services
            .into_iter()
            .filter(|s| self.matcher.matches(role, &s.name))
            .map(|s| s.id)
            .collect())
    }

    /// Only a provider with a service role may act on an open booking.
    async fn ensure_provider_role(&self, booking: &Booking, provider_id: Uuid) -> AppResult<()> {
        let profile = self.load_profile(provider_id).await?;
        if profile.role().is_some() {
            return Ok(());
        }

        let service = self.load_service(booking.service_id).await?;
        tracing::warn!(
            "Provider {} has no service role and may not act on booking {}",
            provider_id,
            booking.id
        );
        Err(DomainError::category_not_allowed(&service.name, None).into())
    }

    /// Validate a provider requested at creation under direct assignment.
    async fn check_direct_assignment(
        &self,
        provider_id: Uuid,
        service: &Service,
        input: &CreateBooking,
    ) -> AppResult<()> {
        let profile = self.load_profile(provider_id).await?;
        if !profile.active {
            return Err(DomainError::ProviderInactive.into());
        }
        self.ensure_category(&profile, service)?;
        self.ensure_slot_free(provider_id, input.date, input.time_slot, None)
            .await
    }

    /// Changes a provider may apply, or `None` for an idempotent re-confirm.
    async fn plan_provider_transition(
        &self,
        booking: &Booking,
        to: BookingStatus,
        provider_id: Uuid,
    ) -> AppResult<Option<BookingChanges>> {
        let assigned_elsewhere = booking.is_assigned() && !booking.is_assigned_to(provider_id);

        let changes = match to {
            BookingStatus::Confirmed => {
                if assigned_elsewhere {
                    return Err(DomainError::BookingAlreadyAssigned.into());
                }
                if booking.is_assigned_to(provider_id) && booking.status == BookingStatus::Confirmed
                {
                    return Ok(None);
                }

                let service = self.load_service(booking.service_id).await?;
                let profile = self.load_profile(provider_id).await?;
                self.ensure_category(&profile, &service)?;
                self.ensure_slot_free(provider_id, booking.date, booking.time_slot, Some(booking.id))
                    .await?;

                BookingChanges {
                    status: to,
                    provider_id: Some(provider_id),
                }
            }
            BookingStatus::Declined | BookingStatus::Cancelled => {
                if assigned_elsewhere {
                    return Err(DomainError::BookingNotAssigned.into());
                }
                if !booking.is_assigned() {
                    self.ensure_provider_role(booking, provider_id).await?;
                }
                // An unassigned booking records who declined or cancelled it
                BookingChanges {
                    status: to,
                    provider_id: Some(provider_id),
                }
            }
            BookingStatus::Completed => {
                if booking.status != BookingStatus::Confirmed {
                    return Err(DomainError::InvalidStatusTransition {
                        from: booking.status,
                        to,
                    }
                    .into());
                }
                if !booking.is_assigned() {
                    return Err(DomainError::NoProviderAssigned.into());
                }
                if assigned_elsewhere {
                    return Err(DomainError::BookingNotAssigned.into());
                }
                BookingChanges {
                    status: to,
                    provider_id: booking.provider_id,
                }
            }
            BookingStatus::Pending => return Err(DomainError::InvalidProviderStatus(to).into()),
        };

        Ok(Some(changes))
    }

    fn plan_user_transition(
        booking: &Booking,
        to: BookingStatus,
        user_id: Uuid,
    ) -> AppResult<BookingChanges> {
        if to != BookingStatus::Cancelled {
            return Err(DomainError::InvalidUserStatus(to).into());
        }
        if !booking.is_owned_by(user_id) {
            return Err(DomainError::BookingNotOwned.into());
        }
        if !matches!(
            booking.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) {
            return Err(DomainError::InvalidStatusTransition {
                from: booking.status,
                to,
            }
            .into());
        }

        Ok(BookingChanges {
            status: to,
            provider_id: booking.provider_id,
        })
    }

    /// Conditional write guarded on the state `booking` was read in.
    async fn apply(&self, booking: &Booking, changes: BookingChanges) -> AppResult<Booking> {
        let outcome = self
            .bookings
            .update_atomic(booking.id, ExpectedState::from(booking), changes)
            .await
            .map_err(|e| match e {
                AppError::Domain(err) => AppError::Domain(err),
                other => {
                    tracing::error!("Failed to update booking {}: {:?}", booking.id, other);
                    AppError::update_failed(format!("{:?}", other))
                }
            })?;

        match outcome {
            UpdateOutcome::Updated(updated) => Ok(updated),
            UpdateOutcome::SlotTaken => {
                tracing::warn!(
                    "Slot for booking {} was taken concurrently",
                    booking.id
                );
                Err(DomainError::DuplicateBookingTime.into())
            }
            UpdateOutcome::Stale => Err(self.explain_lost_race(booking, changes).await),
        }
    }

    /// Error for a conditional write that lost against a concurrent one.
    async fn explain_lost_race(&self, booking: &Booking, changes: BookingChanges) -> AppError {
        let current = match self.bookings.find_by_id(booking.id).await {
            Ok(Some(current)) => current,
            Ok(None) => return DomainError::BookingNotFound.into(),
            Err(e) => return e,
        };

        tracing::warn!(
            "Booking {} changed concurrently ({} -> {})",
            booking.id,
            booking.status,
            current.status
        );

        // A provider now holds the booking that neither this write expected
        // nor meant to assign
        let taken = match current.provider_id {
            Some(holder) => {
                booking.provider_id != Some(holder) && changes.provider_id != Some(holder)
            }
            None => false,
        };

        if current.status.is_terminal() {
            DomainError::TerminalStatus(current.status).into()
        } else if taken {
            DomainError::BookingAlreadyAssigned.into()
        } else {
            DomainError::InvalidStatusTransition {
                from: current.status,
                to: changes.status,
            }
            .into()
        }
    }

    async fn notify(&self, notification: Notification) {
        let kind = notification.kind;
        let booking_id = notification.booking_id;

        if let Err(e) = self.notifier.emit(notification).await {
            tracing::warn!(
                "Failed to send {} notification for booking {}: {}",
                kind,
                booking_id,
                e
            );
        }
    }

    async fn notify_all(&self, notifications: Vec<Notification>) {
        join_all(notifications.into_iter().map(|n| self.notify(n))).await;
    }

    /// Tell providers who can take the booking that it exists.
    async fn announce(&self, booking: &Booking, service: &Service) {
        let recipients: Vec<Uuid> = match booking.provider_id {
            Some(provider_id) => vec![provider_id],
            None => match self.directory.find_active_providers().await {
                Ok(providers) => providers
                    .iter()
                    .filter(|p| self.serves(p, service))
                    .map(|p| p.id)
                    .collect(),
                Err(e) => {
                    tracing::warn!(
                        "Could not load providers to announce booking {}: {}",
                        booking.id,
                        e
                    );
                    return;
                }
            },
        };

        tracing::debug!(
            "Announcing booking {} to {} provider(s)",
            booking.id,
            recipients.len()
        );

        let message = format!(
            "A new {} booking is available on {} at {} ({})",
            service.name,
            booking.date,
            booking.time_slot.format("%H:%M"),
            booking.area
        );
        let notifications = recipients
            .into_iter()
            .map(|provider_id| {
                Notification::new(
                    NotificationKind::BookingAvailable,
                    "New booking available",
                    message.clone(),
                    booking.id,
                )
                .to_provider(provider_id)
            })
            .collect();

        self.notify_all(notifications).await;
    }

    /// Notifications for a committed transition.
    fn transition_notifications(booking: &Booking, actor: Actor) -> Vec<Notification> {
        let when = format!("{} at {}", booking.date, booking.time_slot.format("%H:%M"));
        let to_owner = |kind, title: &str, message: String| {
            Notification::new(kind, title, message, booking.id).to_user(booking.user_id)
        };

        match (booking.status, actor) {
            (BookingStatus::Confirmed, _) => vec![to_owner(
                NotificationKind::BookingAccepted,
                "Booking accepted",
                format!("A provider accepted your booking for {}", when),
            )],
            (BookingStatus::Declined, _) => vec![to_owner(
                NotificationKind::BookingDeclined,
                "Booking declined",
                format!("Your booking for {} was declined", when),
            )],
            (BookingStatus::Completed, _) => {
                let mut notifications = vec![to_owner(
                    NotificationKind::BookingCompleted,
                    "Booking completed",
                    format!("Your booking for {} is complete", when),
                )];
                if let Some(provider_id) = booking.provider_id {
                    notifications.push(
                        Notification::new(
                            NotificationKind::BookingCompleted,
                            "Booking completed",
                            format!("You completed the booking for {}", when),
                            booking.id,
                        )
                        .to_provider(provider_id),
                    );
                }
                notifications
            }
            (BookingStatus::Cancelled, Actor::Provider(_)) => vec![to_owner(
                NotificationKind::BookingCancelled,
                "Booking cancelled",
                format!("The provider cancelled your booking for {}", when),
            )],
            (BookingStatus::Cancelled, Actor::User(_)) => booking
                .provider_id
                .map(|provider_id| {
                    Notification::new(
                        NotificationKind::BookingCancelled,
                        "Booking cancelled",
                        format!("The customer cancelled the booking for {}", when),
                        booking.id,
                    )
                    .to_provider(provider_id)
                })
                .into_iter()
                .collect(),
            (BookingStatus::Pending, _) => Vec::new(),
        }
    }
}

#[async_trait]
impl BookingService for BookingManager {
    async fn create_booking(&self, user_id: Uuid, input: CreateBooking) -> AppResult<Booking> {
        let service = self.load_service(input.service_id).await?;
        if !service.is_active {
            return Err(DomainError::ServiceInactive.into());
        }

        let provider_id = match input.provider_id {
            Some(provider_id) if self.policy.direct_assignment => {
                self.check_direct_assignment(provider_id, &service, &input)
                    .await?;
                Some(provider_id)
            }
            Some(provider_id) => {
                tracing::info!(
                    "Ignoring requested provider {} for new booking; providers claim open bookings",
                    provider_id
                );
                None
            }
            None => None,
        };

        let booking = self
            .bookings
            .create(NewBooking {
                user_id,
                service_id: service.id,
                provider_id,
                date: input.date,
                time_slot: input.time_slot,
                area: input.area,
            })
            .await?;

        tracing::info!(
            "Booking {} created by user {} for {} on {} at {}",
            booking.id,
            user_id,
            service.name,
            booking.date,
            booking.time_slot
        );

        self.announce(&booking, &service).await;
        Ok(booking)
    }

    async fn get_booking(&self, booking_id: Uuid, actor: Actor) -> AppResult<Booking> {
        let booking = self.load_booking(booking_id).await?;

        let visible = match actor {
            Actor::User(user_id) => booking.is_owned_by(user_id),
            Actor::Provider(provider_id) if booking.is_assigned_to(provider_id) => true,
            Actor::Provider(provider_id) if booking.is_open() => {
                let profile = self.directory.find_provider_profile_by_id(provider_id).await?;
                let service = self.directory.find_service_by_id(booking.service_id).await?;
                match (profile, service) {
                    (Some(profile), Some(service)) => self.serves(&profile, &service),
                    _ => false,
                }
            }
            Actor::Provider(_) => false,
        };

        if !visible {
            tracing::debug!("Booking {} hidden from {:?}", booking_id, actor);
            return Err(DomainError::BookingNotFound.into());
        }
        Ok(booking)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        self.bookings.find_by_user(user_id, status).await
    }

    async fn list_for_provider(
        &self,
        provider_id: Uuid,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        let profile = self.load_profile(provider_id).await?;
        let service_ids = self.matching_service_ids(&profile).await?;

        tracing::debug!(
            "Listing bookings for provider {} across {} matching service(s)",
            provider_id,
            service_ids.len()
        );

        self.bookings
            .find_visible_to_provider(provider_id, service_ids, status)
            .await
    }

    async fn transition_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
        actor: Actor,
    ) -> AppResult<Booking> {
        let booking = self.load_booking(booking_id).await?;

        if booking.status.is_terminal() {
            return Err(DomainError::TerminalStatus(booking.status).into());
        }

        let changes = match actor {
            Actor::Provider(provider_id) => {
                match self
                    .plan_provider_transition(&booking, status, provider_id)
                    .await?
                {
                    Some(changes) => changes,
                    None => {
                        tracing::debug!(
                            "Booking {} already confirmed by provider {}",
                            booking_id,
                            provider_id
                        );
                        return Ok(booking);
                    }
                }
            }
            Actor::User(user_id) => Self::plan_user_transition(&booking, status, user_id)?,
        };

        if !booking.status.can_transition_to(status) {
            return Err(DomainError::InvalidStatusTransition {
                from: booking.status,
                to: status,
            }
            .into());
        }

        let updated = self.apply(&booking, changes).await?;

        tracing::info!(
            "Booking {} moved {} -> {} by {:?}",
            booking_id,
            booking.status,
            updated.status,
            actor
        );

        self.notify_all(Self::transition_notifications(&updated, actor))
            .await;
        Ok(updated)
    }
}
