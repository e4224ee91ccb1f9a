use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DaoLayerError {
    #[error("Database error: {0}")]
    Db(DbErr),
    #[error("{entity} not found (id={id})")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("Invalid pagination: page={page} page_size={page_size}")]
    InvalidPagination { page: u64, page_size: u64 },
    #[error("Invalid aggregate: {0}")]
    InvalidAggregate(String),
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("Transaction timed out while {0}")]
    TransactionTimeout(&'static str),
}

pub type DaoResult<T> = Result<T, DaoLayerError>;

impl From<DbErr> for DaoLayerError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                DaoLayerError::UniqueViolation(detail)
            }
            _ => DaoLayerError::Db(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::DbErr;
    use uuid::Uuid;

    use super::DaoLayerError;

    #[test]
    fn custom_db_errors_stay_database_errors() {
        let err = DaoLayerError::from(DbErr::Custom("boom".to_string()));
        assert!(matches!(err, DaoLayerError::Db(_)));
    }

    #[test]
    fn not_found_message_names_entity_and_id() {
        let id = Uuid::nil();
        let err = DaoLayerError::NotFound {
            entity: "station",
            id,
        };
        assert_eq!(err.to_string(), format!("station not found (id={id})"));
    }
}
