//! Interactive and batch transactions plus raw SQL escape hatches.
//!
//! Beginning a transaction is bounded by `max_wait` and running it by
//! `timeout`; either bound elapsing rolls back and yields
//! [`DaoLayerError::TransactionTimeout`].

use std::time::Duration;

use futures_util::future::BoxFuture;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, FromQueryResult,
    IsolationLevel, JsonValue, Statement, TransactionTrait, Value,
};
use tracing::warn;

use crate::config::TransactionConfig;
use crate::db::dao::{DaoLayerError, DaoResult};

#[derive(Debug, Clone, Copy)]
pub struct TransactionOptions {
    pub max_wait: Duration,
    pub timeout: Duration,
    pub isolation_level: Option<IsolationLevel>,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_millis(2_000),
            timeout: Duration::from_millis(5_000),
            isolation_level: None,
        }
    }
}

impl From<&TransactionConfig> for TransactionOptions {
    fn from(cfg: &TransactionConfig) -> Self {
        Self {
            max_wait: cfg.max_wait(),
            timeout: cfg.timeout(),
            isolation_level: None,
        }
    }
}

impl TransactionOptions {
    pub fn with_isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = Some(level);
        self
    }
}

async fn begin(
    db: &DatabaseConnection,
    options: &TransactionOptions,
) -> DaoResult<DatabaseTransaction> {
    tokio::time::timeout(
        options.max_wait,
        db.begin_with_config(options.isolation_level, None),
    )
    .await
    .map_err(|_| DaoLayerError::TransactionTimeout("starting"))?
    .map_err(DaoLayerError::from)
}

async fn rollback(txn: DatabaseTransaction) {
    if let Err(err) = txn.rollback().await {
        warn!(error = %err, "transaction rollback failed");
    }
}

pub async fn run<T, F>(
    db: &DatabaseConnection,
    options: TransactionOptions,
    work: F,
) -> DaoResult<T>
where
    T: Send,
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, DaoResult<T>> + Send,
{
    let txn = begin(db, &options).await?;
    let outcome = tokio::time::timeout(options.timeout, work(&txn)).await;
    match outcome {
        Ok(Ok(value)) => {
            txn.commit().await.map_err(DaoLayerError::from)?;
            Ok(value)
        }
        Ok(Err(err)) => {
            rollback(txn).await;
            Err(err)
        }
        Err(_) => {
            rollback(txn).await;
            Err(DaoLayerError::TransactionTimeout("running"))
        }
    }
}

/// Executes every statement in one transaction and returns the rows affected
/// by each, in order.
pub async fn run_batch(
    db: &DatabaseConnection,
    options: TransactionOptions,
    statements: Vec<Statement>,
) -> DaoResult<Vec<u64>> {
    run(db, options, move |txn| {
        Box::pin(async move {
            let mut affected = Vec::with_capacity(statements.len());
            for statement in statements {
                let result = txn.execute_raw(statement).await.map_err(DaoLayerError::from)?;
                affected.push(result.rows_affected());
            }
            Ok(affected)
        })
    })
    .await
}

pub fn statement(backend: DbBackend, sql: &str, values: Vec<Value>) -> Statement {
    Statement::from_sql_and_values(backend, sql, values)
}

pub async fn execute_raw<C>(conn: &C, sql: &str, values: Vec<Value>) -> DaoResult<u64>
where
    C: ConnectionTrait,
{
    let stmt = statement(conn.get_database_backend(), sql, values);
    conn.execute_raw(stmt)
        .await
        .map(|result| result.rows_affected())
        .map_err(DaoLayerError::from)
}

pub async fn query_raw<C>(conn: &C, sql: &str, values: Vec<Value>) -> DaoResult<Vec<JsonValue>>
where
    C: ConnectionTrait,
{
    let stmt = statement(conn.get_database_backend(), sql, values);
    JsonValue::find_by_statement(stmt)
        .all(conn)
        .await
        .map_err(DaoLayerError::from)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, Value};

    use super::{TransactionOptions, execute_raw, query_raw, run, run_batch, statement};
    use crate::config::TransactionConfig;
    use crate::db::dao::DaoLayerError;

    #[test]
    fn options_follow_config() {
        let options = TransactionOptions::from(&TransactionConfig {
            max_wait_ms: 100,
            timeout_ms: 250,
        });
        assert_eq!(options.max_wait, Duration::from_millis(100));
        assert_eq!(options.timeout, Duration::from_millis(250));
        assert!(options.isolation_level.is_none());
    }

    #[tokio::test]
    async fn run_commits_on_success() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();

        let affected = run(&db, TransactionOptions::default(), |txn| {
            Box::pin(async move {
                execute_raw(txn, "UPDATE todos SET completed = true", vec![]).await
            })
        })
        .await
        .expect("transaction should commit");
        assert_eq!(affected, 2);
    }

    #[tokio::test]
    async fn run_rolls_back_on_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = run(&db, TransactionOptions::default(), |_txn| {
            Box::pin(async move { Err::<(), _>(DaoLayerError::Db(DbErr::Custom("nope".into()))) })
        })
        .await
        .expect_err("transaction should fail");
        assert!(matches!(err, DaoLayerError::Db(_)));
    }

    #[tokio::test]
    async fn run_times_out_long_work() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let options = TransactionOptions {
            timeout: Duration::from_millis(10),
            ..TransactionOptions::default()
        };

        let err = run(&db, options, |_txn| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            })
        })
        .await
        .expect_err("transaction should time out");
        assert!(matches!(err, DaoLayerError::TransactionTimeout("running")));
    }

    #[tokio::test]
    async fn batch_reports_rows_per_statement() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 4,
                },
            ])
            .into_connection();

        let affected = run_batch(
            &db,
            TransactionOptions::default(),
            vec![
                statement(
                    DatabaseBackend::Postgres,
                    "DELETE FROM todos WHERE title = $1",
                    vec!["done".into()],
                ),
                statement(
                    DatabaseBackend::Postgres,
                    "UPDATE todos SET completed = false",
                    vec![],
                ),
            ],
        )
        .await
        .expect("batch should succeed");
        assert_eq!(affected, vec![1, 4]);
    }

    #[tokio::test]
    async fn query_raw_returns_rows_as_json_objects() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                BTreeMap::from([
                    ("title", Value::String(Some("restock".to_string()))),
                    ("open", Value::BigInt(Some(3))),
                ]),
                BTreeMap::from([
                    ("title", Value::String(Some("sweep".to_string()))),
                    ("open", Value::BigInt(Some(0))),
                ]),
            ]])
            .into_connection();

        let rows = query_raw(
            &db,
            "SELECT title, count(*) AS open FROM todos WHERE completed = $1 GROUP BY title",
            vec![false.into()],
        )
        .await
        .expect("query should succeed");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["title"], "restock");
        assert_eq!(rows[0]["open"], 3);
        assert_eq!(rows[1]["title"], "sweep");
        let log = db.into_transaction_log();
        let stmt = &log[0].statements()[0];
        assert!(stmt.sql.starts_with("SELECT title"));
        assert!(stmt.values.is_some());
    }

    #[tokio::test]
    async fn query_raw_maps_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("relation does not exist".to_string())])
            .into_connection();

        let err = query_raw(&db, "SELECT * FROM missing", vec![])
            .await
            .expect_err("query should fail");

        assert!(matches!(err, DaoLayerError::Db(_)));
    }
}
