use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "task_types")]
pub struct Model {
    pub name: String,
    #[sea_orm(indexed)]
    pub station_id: Uuid,
    pub description: Option<String>,
    pub estimated_minutes_per_unit: Option<f64>,
    #[sea_orm(default_value = true)]
    pub is_active: bool,
    #[sea_orm(belongs_to, from = "station_id", to = "id", on_delete = "Cascade")]
    pub station: HasOne<super::station::Entity>,
    #[sea_orm(has_many)]
    pub task_assignments: HasMany<super::task_assignment::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
