use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::employee;
use crate::db::entities::prelude::Employee;

#[derive(Clone)]
pub struct EmployeeDao {
    db: DatabaseConnection,
}

impl DaoBase for EmployeeDao {
    type Entity = Employee;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl EmployeeDao {
    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<employee::Model>> {
        let email = email.to_string();
        self.find_first(move |query| query.filter(employee::Column::Email.eq(email)))
            .await
    }

    pub async fn find_by_code(&self, code: &str) -> DaoResult<Option<employee::Model>> {
        let code = code.to_string();
        self.find_first(move |query| query.filter(employee::Column::EmployeeCode.eq(code)))
            .await
    }

    pub async fn set_pin_hash(&self, id: Uuid, pin_hash: String) -> DaoResult<employee::Model> {
        self.update(id, move |active| {
            active.pin_hash = Set(pin_hash);
        })
        .await
    }

    pub async fn set_last_station_on<C>(
        conn: &C,
        id: Uuid,
        station_id: Option<Uuid>,
    ) -> DaoResult<employee::Model>
    where
        C: ConnectionTrait + Sync,
    {
        Self::update_on(conn, id, move |active| {
            active.last_station_id = Set(station_id);
        })
        .await
    }
}
