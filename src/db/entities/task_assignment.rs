use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "task_assignments")]
pub struct Model {
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    #[sea_orm(indexed)]
    pub task_type_id: Uuid,
    pub start_time: DateTimeWithTimeZone,
    pub end_time: Option<DateTimeWithTimeZone>,
    #[sea_orm(default_value = 0)]
    pub units_completed: i32,
    pub notes: Option<String>,
    #[sea_orm(belongs_to, from = "employee_id", to = "id", on_delete = "Cascade")]
    pub employee: HasOne<super::employee::Entity>,
    #[sea_orm(belongs_to, from = "task_type_id", to = "id", on_delete = "Cascade")]
    pub task_type: HasOne<super::task_type::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
