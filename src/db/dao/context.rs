use futures_util::future::BoxFuture;
use sea_orm::{DatabaseConnection, DatabaseTransaction, JsonValue, Statement, Value};

use super::{
    ApiKeyDao, DaoBase, DaoResult, EmployeeDao, OAuthAccountDao, PerformanceMetricDao, SessionDao,
    StationDao, TaskAssignmentDao, TaskTypeDao, TimeLogDao, TodoDao, UserDao,
};
use crate::db::transaction::{self, TransactionOptions};

/// One handle per model delegate, plus the `$transaction` entry points.
#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
    transaction_options: TransactionOptions,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self {
            db: db.clone(),
            transaction_options: TransactionOptions::default(),
        }
    }

    pub fn with_transaction_options(mut self, options: TransactionOptions) -> Self {
        self.transaction_options = options;
        self
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn transaction_options(&self) -> TransactionOptions {
        self.transaction_options
    }

    pub fn employee(&self) -> EmployeeDao {
        DaoBase::new(&self.db)
    }

    pub fn station(&self) -> StationDao {
        DaoBase::new(&self.db)
    }

    pub fn time_log(&self) -> TimeLogDao {
        DaoBase::new(&self.db)
    }

    pub fn task_type(&self) -> TaskTypeDao {
        DaoBase::new(&self.db)
    }

    pub fn task_assignment(&self) -> TaskAssignmentDao {
        DaoBase::new(&self.db)
    }

    pub fn performance_metric(&self) -> PerformanceMetricDao {
        DaoBase::new(&self.db)
    }

    pub fn user(&self) -> UserDao {
        DaoBase::new(&self.db)
    }

    pub fn oauth_account(&self) -> OAuthAccountDao {
        DaoBase::new(&self.db)
    }

    pub fn session(&self) -> SessionDao {
        DaoBase::new(&self.db)
    }

    pub fn api_key(&self) -> ApiKeyDao {
        DaoBase::new(&self.db)
    }

    pub fn todo(&self) -> TodoDao {
        DaoBase::new(&self.db)
    }

    pub async fn transaction<T, F>(&self, work: F) -> DaoResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, DaoResult<T>> + Send,
    {
        transaction::run(&self.db, self.transaction_options, work).await
    }

    pub async fn transaction_with<T, F>(&self, options: TransactionOptions, work: F) -> DaoResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, DaoResult<T>> + Send,
    {
        transaction::run(&self.db, options, work).await
    }

    pub async fn batch(&self, statements: Vec<Statement>) -> DaoResult<Vec<u64>> {
        transaction::run_batch(&self.db, self.transaction_options, statements).await
    }

    pub async fn execute_raw(&self, sql: &str, values: Vec<Value>) -> DaoResult<u64> {
        transaction::execute_raw(&self.db, sql, values).await
    }

    pub async fn query_raw(&self, sql: &str, values: Vec<Value>) -> DaoResult<Vec<JsonValue>> {
        transaction::query_raw(&self.db, sql, values).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sea_orm::{DatabaseBackend, IsolationLevel, MockDatabase, MockExecResult};

    use super::DaoContext;
    use crate::db::{
        dao::DaoLayerError,
        transaction::{self, TransactionOptions},
    };

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn batch_uses_context_options() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(3)])
            .into_connection();
        let daos = DaoContext::new(&db);

        let affected = daos
            .batch(vec![transaction::statement(
                DatabaseBackend::Postgres,
                "UPDATE stations SET is_active = false",
                vec![],
            )])
            .await
            .expect("batch should succeed");

        assert_eq!(affected, vec![3]);
    }

    #[tokio::test]
    async fn execute_raw_reports_rows_affected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(2)])
            .into_connection();

        let affected = DaoContext::new(&db)
            .execute_raw("DELETE FROM sessions WHERE revoked_at IS NOT NULL", vec![])
            .await
            .expect("statement should run");

        assert_eq!(affected, 2);
    }

    #[tokio::test]
    async fn transaction_with_overrides_timeout() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let daos = DaoContext::new(&db);
        let options = TransactionOptions {
            timeout: Duration::from_millis(10),
            ..daos.transaction_options()
        };

        let err = daos
            .transaction_with(options, |_txn| {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok(())
                })
            })
            .await
            .expect_err("slow work should time out");

        assert!(matches!(err, DaoLayerError::TransactionTimeout(_)));
    }

    #[test]
    fn isolation_is_opt_in() {
        let options = TransactionOptions::default();
        assert!(options.isolation_level.is_none());
        let options = options.with_isolation(IsolationLevel::Serializable);
        assert!(matches!(
            options.isolation_level,
            Some(IsolationLevel::Serializable)
        ));
    }
}
