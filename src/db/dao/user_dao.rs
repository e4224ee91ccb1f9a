use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::prelude::User;
use crate::db::entities::{UserRole, user};

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

impl DaoBase for UserDao {
    type Entity = User;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl UserDao {
    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        let email = email.to_string();
        self.find_first(move |query| query.filter(user::Column::Email.eq(email)))
            .await
    }

    pub async fn find_by_employee(&self, employee_id: Uuid) -> DaoResult<Option<user::Model>> {
        self.find_first(move |query| query.filter(user::Column::EmployeeId.eq(employee_id)))
            .await
    }

    pub async fn create_user(
        &self,
        email: &str,
        name: Option<String>,
        role: UserRole,
        employee_id: Option<Uuid>,
    ) -> DaoResult<user::Model> {
        let model = user::ActiveModel {
            email: Set(email.to_string()),
            name: Set(name),
            image: Set(None),
            role: Set(role),
            employee_id: Set(employee_id),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn set_role(&self, id: Uuid, role: UserRole) -> DaoResult<user::Model> {
        self.update(id, move |active| {
            active.role = Set(role);
        })
        .await
    }
}
