use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

use super::enums::EmployeeStatus;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing, default)]
    pub pin_hash: String,
    pub daily_hours_limit: f64,
    pub weekly_hours_limit: f64,
    #[sea_orm(unique)]
    pub employee_code: Option<String>,
    pub phone_number: Option<String>,
    pub hire_date: Option<Date>,
    pub status: EmployeeStatus,
    #[sea_orm(indexed)]
    pub default_station_id: Option<Uuid>,
    #[sea_orm(indexed)]
    pub last_station_id: Option<Uuid>,
    #[sea_orm(has_many)]
    pub time_logs: HasMany<super::time_log::Entity>,
    #[sea_orm(has_many)]
    pub task_assignments: HasMany<super::task_assignment::Entity>,
    #[sea_orm(has_many)]
    pub performance_metrics: HasMany<super::performance_metric::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
