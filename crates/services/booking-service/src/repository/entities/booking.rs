//! Booking database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::AppError;
use domain::{Area, Booking, BookingStatus, PaymentStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    /// NULL until a provider claims the booking
    pub provider_id: Option<Uuid>,
    pub service_id: Uuid,
    pub date: Date,
    pub time_slot: Time,
    pub area: String,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub paid_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl TryFrom<Model> for Booking {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let status: BookingStatus = model.status.parse().map_err(|e| {
            AppError::internal(format!("Booking {} has a corrupt status: {}", model.id, e))
        })?;
        let area: Area = model.area.parse().map_err(|e| {
            AppError::internal(format!("Booking {} has a corrupt area: {}", model.id, e))
        })?;

        Ok(Booking {
            id: model.id,
            user_id: model.user_id,
            provider_id: model.provider_id,
            service_id: model.service_id,
            date: model.date,
            time_slot: model.time_slot,
            area,
            status,
            payment_status: PaymentStatus::from(model.payment_status.as_str()),
            payment_method: model.payment_method,
            paid_at: model.paid_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
