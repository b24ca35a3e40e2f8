//! Provider profile entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::ProviderProfile;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "provider_profiles")]
pub struct Model {
    /// Same id as the provider account
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_role: Option<String>,
    pub verified: bool,
    pub active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ProviderProfile {
    fn from(model: Model) -> Self {
        ProviderProfile {
            id: model.id,
            service_role: model.service_role,
            verified: model.verified,
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
