//! Read-only access to the service catalog and provider profiles.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use super::entities::{provider_profile, service};
use common::{AppError, AppResult};
use domain::{ProviderProfile, Service};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Directory trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// Find a catalog service by ID
    async fn find_service_by_id(&self, id: Uuid) -> AppResult<Option<Service>>;

    /// Find a provider profile by provider ID
    async fn find_provider_profile_by_id(&self, id: Uuid) -> AppResult<Option<ProviderProfile>>;

    /// Profiles of providers currently accepting work
    async fn find_active_providers(&self) -> AppResult<Vec<ProviderProfile>>;

    /// Every catalog service, active or not
    async fn list_services(&self) -> AppResult<Vec<Service>>;
}

/// Concrete implementation of DirectoryRepository backed by SeaORM
pub struct DirectoryStore {
    db: Arc<DatabaseConnection>,
}

impl DirectoryStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DirectoryRepository for DirectoryStore {
    async fn find_service_by_id(&self, id: Uuid) -> AppResult<Option<Service>> {
        let result = service::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Service::from))
    }

    async fn find_provider_profile_by_id(&self, id: Uuid) -> AppResult<Option<ProviderProfile>> {
        let result = provider_profile::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(AppError::from)?;

        Ok(result.map(ProviderProfile::from))
    }

    async fn find_active_providers(&self) -> AppResult<Vec<ProviderProfile>> {
        let models = provider_profile::Entity::find()
            .filter(provider_profile::Column::Active.eq(true))
            .order_by_asc(provider_profile::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(ProviderProfile::from).collect())
    }

    async fn list_services(&self) -> AppResult<Vec<Service>> {
        let models = service::Entity::find()
            .order_by_asc(service::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Service::from).collect())
    }
}
