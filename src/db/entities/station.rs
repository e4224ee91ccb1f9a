use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "stations")]
pub struct Model {
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
    /// Concurrent open work logs allowed; `None` means unlimited.
    pub capacity: Option<i32>,
    #[sea_orm(default_value = true)]
    pub is_active: bool,
    pub zone: Option<String>,
    #[sea_orm(has_many)]
    pub task_types: HasMany<super::task_type::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
