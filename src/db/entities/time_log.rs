use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

use super::enums::{ClockMethod, TimeLogType};

#[base_entity(soft_delete = "deleted_at")]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "time_logs")]
pub struct Model {
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    #[sea_orm(indexed)]
    pub station_id: Option<Uuid>,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub log_type: TimeLogType,
    pub start_time: DateTimeWithTimeZone,
    pub end_time: Option<DateTimeWithTimeZone>,
    pub note: Option<String>,
    pub corrected_by: Option<Uuid>,
    #[sea_orm(indexed)]
    pub task_id: Option<Uuid>,
    pub clock_method: ClockMethod,
    #[sea_orm(belongs_to, from = "employee_id", to = "id", on_delete = "Cascade")]
    pub employee: HasOne<super::employee::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
