use sea_orm::Set;

use crate::{
    db::dao::TodoDao,
    db::entities::todo,
    error::AppError,
    services::crud_service::{CrudErrors, CrudService},
};

#[derive(Clone)]
pub struct TodoService {
    todo_dao: TodoDao,
}

impl TodoService {
    pub fn new(todo_dao: TodoDao) -> Self {
        Self { todo_dao }
    }

    pub async fn create_todo(&self, title: &str) -> Result<todo::Model, AppError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::bad_request("Todo title is required"));
        }
        let model = todo::ActiveModel {
            title: Set(title.to_string()),
            completed: Set(false),
            ..Default::default()
        };

        CrudService::create(self, model).await
    }
}

impl CrudService for TodoService {
    type Dao = TodoDao;

    fn dao(&self) -> &Self::Dao {
        &self.todo_dao
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "Todo not found",
            ..CrudErrors::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::TodoService;
    use crate::{
        db::dao::{DaoBase, TodoDao},
        error::AppError,
        test_helpers::fixtures,
    };

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = TodoService::new(TodoDao::new(&db));

        let err = service
            .create_todo("   ")
            .await
            .expect_err("blank title should fail");

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn title_is_trimmed_before_insert() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fixtures::todo("restock labels")]])
            .into_connection();
        let service = TodoService::new(TodoDao::new(&db));

        let created = service
            .create_todo("  restock labels ")
            .await
            .expect("create should succeed");

        assert_eq!(created.title, "restock labels");
        assert!(!created.completed);
    }
}
