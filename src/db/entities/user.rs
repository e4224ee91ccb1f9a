use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

use super::enums::UserRole;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(unique)]
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[sea_orm(unique)]
    pub employee_id: Option<Uuid>,
    #[sea_orm(has_many)]
    pub oauth_accounts: HasMany<super::oauth_account::Entity>,
    #[sea_orm(has_many)]
    pub sessions: HasMany<super::session::Entity>,
    #[sea_orm(has_many)]
    pub api_keys: HasMany<super::api_key::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
