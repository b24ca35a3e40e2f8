//! Service catalog entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Service domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Service {
    /// Create a new active service
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Mark the service as no longer bookable
    pub fn deactivate(mut self) -> Self {
        self.is_active = false;
        self
    }
}
