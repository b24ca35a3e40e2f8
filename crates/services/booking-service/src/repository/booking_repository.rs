//! Booking repository: lookups plus the conditional write the lifecycle
//! engine relies on for race safety.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Select, Set, SqlErr,
};
use uuid::Uuid;

use super::entities::booking::{self, ActiveModel, Entity as BookingEntity};
use common::{AppError, AppResult};
use domain::{Booking, BookingChanges, BookingStatus, DomainError, ExpectedState, NewBooking};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Result of a conditional booking write.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The write applied; carries the stored booking
    Updated(Booking),
    /// The booking no longer matched the expected state
    Stale,
    /// The provider already holds another booking in that slot
    SlotTaken,
}

/// Booking repository trait for dependency injection.
///
/// List queries return newest date first, then newest creation first.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Find booking by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>>;

    /// Bookings owned by a user, optionally filtered by status
    async fn find_by_user(
        &self,
        user_id: Uuid,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>>;

    /// Bookings assigned to a provider, optionally filtered by status
    async fn find_by_provider(
        &self,
        provider_id: Uuid,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>>;

    /// Bookings assigned to the provider plus open bookings for any of
    /// `service_ids`. A non-PENDING status filter drops the open half.
    async fn find_visible_to_provider(
        &self,
        provider_id: Uuid,
        service_ids: Vec<Uuid>,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>>;

    /// Bookings assigned to a provider at an exact date and time slot
    async fn find_by_provider_date_time(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        time_slot: NaiveTime,
    ) -> AppResult<Vec<Booking>>;

    /// Persist a new PENDING booking
    async fn create(&self, booking: NewBooking) -> AppResult<Booking>;

    /// Apply `changes` only if the booking is still in `expected`.
    async fn update_atomic(
        &self,
        id: Uuid,
        expected: ExpectedState,
        changes: BookingChanges,
    ) -> AppResult<UpdateOutcome>;
}

/// Concrete implementation of BookingRepository backed by SeaORM
pub struct BookingStore {
    db: Arc<DatabaseConnection>,
}

impl BookingStore {
    /// Create new repository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn fetch(&self, query: Select<BookingEntity>) -> AppResult<Vec<Booking>> {
        let models = query
            .order_by_desc(booking::Column::Date)
            .order_by_desc(booking::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(AppError::from)?;

        models.into_iter().map(Booking::try_from).collect()
    }
}

fn with_status(query: Select<BookingEntity>, status: Option<BookingStatus>) -> Select<BookingEntity> {
    match status {
        Some(status) => query.filter(booking::Column::Status.eq(status.as_str())),
        None => query,
    }
}

fn is_slot_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[async_trait]
impl BookingRepository for BookingStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        let result = BookingEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(AppError::from)?;

        result.map(Booking::try_from).transpose()
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        let query = BookingEntity::find().filter(booking::Column::UserId.eq(user_id));
        self.fetch(with_status(query, status)).await
    }

    async fn find_by_provider(
        &self,
        provider_id: Uuid,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        let query = BookingEntity::find().filter(booking::Column::ProviderId.eq(provider_id));
        self.fetch(with_status(query, status)).await
    }

    async fn find_visible_to_provider(
        &self,
        provider_id: Uuid,
        service_ids: Vec<Uuid>,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        let assigned = booking::Column::ProviderId.eq(provider_id);

        let include_open = matches!(status, None | Some(BookingStatus::Pending));
        let visible = if include_open && !service_ids.is_empty() {
            let open = Condition::all()
                .add(booking::Column::ProviderId.is_null())
                .add(booking::Column::Status.eq(BookingStatus::Pending.as_str()))
                .add(booking::Column::ServiceId.is_in(service_ids));
            Condition::any().add(assigned).add(open)
        } else {
            Condition::any().add(assigned)
        };

        let query = BookingEntity::find().filter(visible);
        self.fetch(with_status(query, status)).await
    }

    async fn find_by_provider_date_time(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        time_slot: NaiveTime,
    ) -> AppResult<Vec<Booking>> {
        let query = BookingEntity::find()
            .filter(booking::Column::ProviderId.eq(provider_id))
            .filter(booking::Column::Date.eq(date))
            .filter(booking::Column::TimeSlot.eq(time_slot));
        self.fetch(query).await
    }

    async fn create(&self, new: NewBooking) -> AppResult<Booking> {
        let booking = Booking::new(Uuid::new_v4(), new);
        let active_model = ActiveModel {
            id: Set(booking.id),
            user_id: Set(booking.user_id),
            provider_id: Set(booking.provider_id),
            service_id: Set(booking.service_id),
            date: Set(booking.date),
            time_slot: Set(booking.time_slot),
            area: Set(booking.area.as_str().to_string()),
            status: Set(booking.status.as_str().to_string()),
            payment_status: Set(booking.payment_status.as_str().to_string()),
            payment_method: Set(None),
            paid_at: Set(None),
            created_at: Set(booking.created_at),
            updated_at: Set(booking.updated_at),
        };

        let model = active_model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_slot_violation(&e) {
                AppError::from(DomainError::DuplicateBookingTime)
            } else {
                AppError::from(e)
            }
        })?;

        Booking::try_from(model)
    }

    async fn update_atomic(
        &self,
        id: Uuid,
        expected: ExpectedState,
        changes: BookingChanges,
    ) -> AppResult<UpdateOutcome> {
        let provider_guard = match expected.provider_id {
            Some(provider_id) => booking::Column::ProviderId.eq(provider_id),
            None => booking::Column::ProviderId.is_null(),
        };

        // Single UPDATE .. WHERE: the guard and the write cannot interleave
        let result = BookingEntity::update_many()
            .col_expr(
                booking::Column::Status,
                Expr::value(changes.status.as_str()),
            )
            .col_expr(booking::Column::ProviderId, Expr::value(changes.provider_id))
            .col_expr(booking::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.eq(expected.status.as_str()))
            .filter(provider_guard)
            .exec(self.db.as_ref())
            .await;

        let result = match result {
            Ok(result) => result,
            Err(e) if is_slot_violation(&e) => return Ok(UpdateOutcome::SlotTaken),
            Err(e) => return Err(AppError::from(e)),
        };

        if result.rows_affected == 0 {
            tracing::debug!("Conditional update of booking {} matched no row", id);
            return Ok(UpdateOutcome::Stale);
        }

        let updated = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal(format!("Booking {} vanished after update", id)))?;

        Ok(UpdateOutcome::Updated(updated))
    }
}
