use sea_orm::DatabaseConnection;

use super::DaoBase;
use crate::db::entities::prelude::Todo;

#[derive(Clone)]
pub struct TodoDao {
    db: DatabaseConnection,
}

impl DaoBase for TodoDao {
    type Entity = Todo;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use sea_orm::{
        ColumnTrait, DatabaseBackend, DbErr, MockDatabase, MockExecResult, QueryFilter, Set, Value,
        sea_query::Expr,
    };

    use super::TodoDao;
    use crate::db::dao::{DaoBase, DaoLayerError};
    use crate::db::entities::todo;

    fn pending(title: &str) -> todo::ActiveModel {
        todo::ActiveModel {
            title: Set(title.to_string()),
            completed: Set(false),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn find_rejects_oversized_pages() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = TodoDao::new(&db);

        let err = dao
            .find(1, 101, None, |query| query)
            .await
            .expect_err("page size above the limit should fail");
        assert!(matches!(
            err,
            DaoLayerError::InvalidPagination { page: 1, page_size: 101 }
        ));
    }

    #[tokio::test]
    async fn find_reports_has_next_from_extra_row() {
        let rows = vec![
            crate::test_helpers::fixtures::todo("a"),
            crate::test_helpers::fixtures::todo("b"),
            crate::test_helpers::fixtures::todo("c"),
        ];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows])
            .into_connection();
        let dao = TodoDao::new(&db);

        let page = dao
            .find(1, 2, None, |query| query)
            .await
            .expect("find should succeed");
        assert_eq!(page.data.len(), 2);
        assert!(page.has_next);
    }

    #[tokio::test]
    async fn find_iter_walks_until_last_page() {
        let todo = crate::test_helpers::fixtures::todo;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![todo("a"), todo("b"), todo("c")]])
            .append_query_results([vec![todo("c")]])
            .into_connection();
        let dao = TodoDao::new(&db);

        let rows = dao
            .find_iter(Some(2), None, |query| query)
            .collect_all()
            .await
            .expect("pager should succeed");
        let titles: Vec<_> = rows.iter().map(|row| row.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn delete_many_returns_rows_affected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            }])
            .into_connection();
        let dao = TodoDao::new(&db);

        let removed = dao
            .delete_many(|query| query)
            .await
            .expect("delete should succeed");
        assert_eq!(removed, 3);
    }

    #[tokio::test]
    async fn count_maps_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("count failed".to_string())])
            .into_connection();
        let dao = TodoDao::new(&db);

        let err = dao
            .count(|query| query)
            .await
            .expect_err("count should fail");
        assert!(matches!(err, DaoLayerError::Db(_)));
    }

    #[tokio::test]
    async fn aggregate_counts_text_columns_without_statistics() {
        let row = BTreeMap::from([("count".to_string(), Value::BigInt(Some(3)))]);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .into_connection();
        let dao = TodoDao::new(&db);

        let result = dao
            .aggregate(todo::Column::Title, |query| query)
            .await
            .expect("text column should be counted");
        assert_eq!(result.column, "title");
        assert_eq!(result.count, 3);
        assert_eq!(result.sum, None);
        assert_eq!(result.max, None);

        let log = db.into_transaction_log();
        let sql = &log[0].statements()[0].sql;
        assert!(sql.contains("COUNT(\"title\")"), "{sql}");
        assert!(!sql.contains("SUM("), "{sql}");
    }

    #[tokio::test]
    async fn create_many_commits_and_counts_rows() {
        let todo = crate::test_helpers::fixtures::todo;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![todo("a")]])
            .append_query_results([vec![todo("b")]])
            .into_connection();
        let dao = TodoDao::new(&db);

        let inserted = dao
            .create_many(vec![pending("a"), pending("b")])
            .await
            .expect("bulk insert should succeed");

        assert_eq!(inserted, 2);
        let log = db.into_transaction_log();
        let sql: Vec<&str> = log[0].statements().iter().map(|stmt| stmt.sql.as_str()).collect();
        assert_eq!(sql.first(), Some(&"BEGIN"));
        assert_eq!(sql.iter().filter(|sql| sql.starts_with("INSERT")).count(), 2);
        assert_eq!(sql.last(), Some(&"COMMIT"));
    }

    #[tokio::test]
    async fn create_many_rolls_back_when_a_row_fails() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![crate::test_helpers::fixtures::todo("a")]])
            .append_query_errors([DbErr::Custom("insert failed".to_string())])
            .into_connection();
        let dao = TodoDao::new(&db);

        let err = dao
            .create_many(vec![pending("a"), pending("b"), pending("c")])
            .await
            .expect_err("second insert should abort the batch");

        assert!(matches!(err, DaoLayerError::Db(_)));
        let log = db.into_transaction_log();
        let sql: Vec<&str> = log[0].statements().iter().map(|stmt| stmt.sql.as_str()).collect();
        assert_eq!(sql.iter().filter(|sql| sql.starts_with("INSERT")).count(), 2);
        assert_eq!(sql.last(), Some(&"ROLLBACK"));
        assert!(!sql.contains(&"COMMIT"));
    }

    #[tokio::test]
    async fn create_many_of_nothing_skips_the_database() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = TodoDao::new(&db);

        let inserted = dao.create_many(Vec::new()).await.expect("empty batch is fine");

        assert_eq!(inserted, 0);
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn update_many_bumps_updated_at_and_reports_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 4,
            }])
            .into_connection();
        let dao = TodoDao::new(&db);

        let changed = dao
            .update_many(|update| {
                update
                    .col_expr(todo::Column::Completed, Expr::value(true))
                    .filter(todo::Column::Completed.eq(false))
            })
            .await
            .expect("update should succeed");

        assert_eq!(changed, 4);
        let log = db.into_transaction_log();
        let sql = &log[0].statements()[0].sql;
        assert!(sql.starts_with(r#"UPDATE "todos" SET "completed" = $1"#));
        assert!(sql.contains(r#""updated_at" = $2"#));
        assert!(sql.contains(r#"WHERE "todos"."completed" = $3"#));
    }

    #[tokio::test]
    async fn update_many_maps_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("update failed".to_string())])
            .into_connection();
        let dao = TodoDao::new(&db);

        let err = dao
            .update_many(|update| update.col_expr(todo::Column::Completed, Expr::value(true)))
            .await
            .expect_err("update should fail");

        assert!(matches!(err, DaoLayerError::Db(_)));
    }
}
