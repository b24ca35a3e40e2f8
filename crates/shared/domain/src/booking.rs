//! Booking domain entity, its status machine and related types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    PAYMENT_PAID, PAYMENT_REFUNDED, PAYMENT_UNPAID, STATUS_CANCELLED, STATUS_COMPLETED,
    STATUS_CONFIRMED, STATUS_DECLINED, STATUS_PENDING, VALID_STATUSES,
};
use crate::error::DomainError;

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Declined,
    Cancelled,
}

impl BookingStatus {
    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => STATUS_PENDING,
            BookingStatus::Confirmed => STATUS_CONFIRMED,
            BookingStatus::Completed => STATUS_COMPLETED,
            BookingStatus::Declined => STATUS_DECLINED,
            BookingStatus::Cancelled => STATUS_CANCELLED,
        }
    }

    /// COMPLETED and CANCELLED accept no further transition of any kind.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Statuses that must always carry a provider.
    pub fn requires_provider(&self) -> bool {
        matches!(
            self,
            BookingStatus::Confirmed | BookingStatus::Completed | BookingStatus::Declined
        )
    }

    /// Statuses in which an assigned provider occupies the (date, time slot).
    pub fn holds_slot(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Legal edges of the booking state machine.
    pub fn can_transition_to(&self, to: BookingStatus) -> bool {
        match self {
            BookingStatus::Pending => matches!(
                to,
                BookingStatus::Confirmed | BookingStatus::Declined | BookingStatus::Cancelled
            ),
            BookingStatus::Confirmed => {
                matches!(to, BookingStatus::Completed | BookingStatus::Cancelled)
            }
            BookingStatus::Completed | BookingStatus::Declined | BookingStatus::Cancelled => false,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            STATUS_PENDING => Ok(BookingStatus::Pending),
            STATUS_CONFIRMED => Ok(BookingStatus::Confirmed),
            STATUS_COMPLETED => Ok(BookingStatus::Completed),
            STATUS_DECLINED => Ok(BookingStatus::Declined),
            STATUS_CANCELLED => Ok(BookingStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "Unknown booking status '{}', expected one of: {}",
                other,
                VALID_STATUSES.join(", ")
            ))),
        }
    }
}

/// City zones a booking can be placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Area {
    Central,
    North,
    South,
    East,
    West,
    Riverside,
    Airport,
    Outskirts,
}

impl Area {
    pub const ALL: [Area; 8] = [
        Area::Central,
        Area::North,
        Area::South,
        Area::East,
        Area::West,
        Area::Riverside,
        Area::Airport,
        Area::Outskirts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Area::Central => "central",
            Area::North => "north",
            Area::South => "south",
            Area::East => "east",
            Area::West => "west",
            Area::Riverside => "riverside",
            Area::Airport => "airport",
            Area::Outskirts => "outskirts",
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Area {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Area::ALL
            .into_iter()
            .find(|area| area.as_str() == normalized)
            .ok_or_else(|| DomainError::validation(format!("Unknown area '{}'", s)))
    }
}

/// Payment state written by the downstream payment process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => PAYMENT_UNPAID,
            PaymentStatus::Paid => PAYMENT_PAID,
            PaymentStatus::Refunded => PAYMENT_REFUNDED,
        }
    }
}

impl From<&str> for PaymentStatus {
    fn from(s: &str) -> Self {
        match s {
            PAYMENT_PAID => PaymentStatus::Paid,
            PAYMENT_REFUNDED => PaymentStatus::Refunded,
            _ => PaymentStatus::Unpaid,
        }
    }
}

/// Who is acting on a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// The customer who owns bookings
    User(Uuid),
    /// A service provider account
    Provider(Uuid),
}

/// Booking domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: NaiveTime,
    pub area: Area,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Build a freshly requested booking from creation input.
    pub fn new(id: Uuid, new: NewBooking) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id: new.user_id,
            provider_id: new.provider_id,
            service_id: new.service_id,
            date: new.date,
            time_slot: new.time_slot,
            area: new.area,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_method: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.provider_id.is_some()
    }

    pub fn is_assigned_to(&self, provider_id: Uuid) -> bool {
        self.provider_id == Some(provider_id)
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Unassigned PENDING bookings are open for claiming.
    pub fn is_open(&self) -> bool {
        self.provider_id.is_none() && self.status == BookingStatus::Pending
    }

    /// Whether this booking occupies `provider_id`'s (date, time slot).
    pub fn holds_slot_of(&self, provider_id: Uuid) -> bool {
        self.is_assigned_to(provider_id) && self.status.holds_slot()
    }

    /// Check the provider-presence invariant.
    pub fn is_consistent(&self) -> bool {
        !self.status.requires_provider() || self.provider_id.is_some()
    }
}

/// Booking creation data (validated input to the store)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub service_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time_slot: NaiveTime,
    pub area: Area,
}

/// Booking creation request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBooking {
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: NaiveTime,
    pub area: Area,
    /// Requested provider (honoured only under the direct assignment policy)
    #[serde(default)]
    pub provider_id: Option<Uuid>,
}

/// Fields changed by a transition, written together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingChanges {
    pub status: BookingStatus,
    pub provider_id: Option<Uuid>,
}

/// State the booking must still be in for a conditional write to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedState {
    pub status: BookingStatus,
    pub provider_id: Option<Uuid>,
}

impl From<&Booking> for ExpectedState {
    fn from(booking: &Booking) -> Self {
        Self {
            status: booking.status,
            provider_id: booking.provider_id,
        }
    }
}
