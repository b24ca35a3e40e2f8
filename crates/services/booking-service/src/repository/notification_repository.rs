//! Notification sink.
//!
//! Emission is best-effort: the lifecycle engine logs and drops any error
//! returned here.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entities::notification::ActiveModel;
use common::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Event a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingAvailable,
    BookingAccepted,
    BookingDeclined,
    BookingCompleted,
    BookingCancelled,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BookingAvailable => "booking_available",
            NotificationKind::BookingAccepted => "booking_accepted",
            NotificationKind::BookingDeclined => "booking_declined",
            NotificationKind::BookingCompleted => "booking_completed",
            NotificationKind::BookingCancelled => "booking_cancelled",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message addressed to a user, a provider, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub booking_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<Uuid>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        booking_id: Uuid,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            booking_id,
            user_id: None,
            provider_id: None,
        }
    }

    pub fn to_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn to_provider(mut self, provider_id: Uuid) -> Self {
        self.provider_id = Some(provider_id);
        self
    }
}

/// Notification sink trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn emit(&self, notification: Notification) -> AppResult<()>;
}

/// Notifier that stores notifications in the `notifications` table
pub struct NotificationStore {
    db: Arc<DatabaseConnection>,
}

impl NotificationStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Notifier for NotificationStore {
    async fn emit(&self, notification: Notification) -> AppResult<()> {
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(notification.kind.as_str().to_string()),
            title: Set(notification.title),
            message: Set(notification.message),
            booking_id: Set(notification.booking_id),
            user_id: Set(notification.user_id),
            provider_id: Set(notification.provider_id),
            is_read: Set(false),
            created_at: Set(Utc::now()),
        };

        active_model.insert(self.db.as_ref()).await.map_err(AppError::from)?;
        Ok(())
    }
}
