//! Provider profile entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provider profile, one per provider account.
///
/// `service_role` is the output of the (external) verification process and
/// stays `None` until verification assigns a profession.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_role: Option<String>,
    pub verified: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderProfile {
    /// Create an active, verified provider with the given role
    pub fn new(id: Uuid, service_role: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            verified: service_role.is_some(),
            service_role,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Role label, if verification assigned one and it is not blank
    pub fn role(&self) -> Option<&str> {
        self.service_role
            .as_deref()
            .map(str::trim)
            .filter(|role| !role.is_empty())
    }

    /// Mark the provider as not accepting new work
    pub fn deactivate(mut self) -> Self {
        self.active = false;
        self.updated_at = Utc::now();
        self
    }
}
