use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "performance_metrics")]
pub struct Model {
    #[sea_orm(unique_key = "employee_day_station")]
    pub employee_id: Uuid,
    #[sea_orm(unique_key = "employee_day_station")]
    pub date: Date,
    #[sea_orm(unique_key = "employee_day_station")]
    pub station_id: Option<Uuid>,
    pub hours_worked: f64,
    pub units_processed: i32,
    pub efficiency: Option<f64>,
    pub quality_score: Option<f64>,
    pub overtime_hours: f64,
    #[sea_orm(belongs_to, from = "employee_id", to = "id", on_delete = "Cascade")]
    pub employee: HasOne<super::employee::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
