use sea_orm::{DbErr, SqlErr};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum DaoLayerError {
    #[error("Database error: {0}")]
    Db(DbErr),
    #[error("{entity} not found (id={id})")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("{entity} already exists")]
    Duplicate { entity: &'static str },
}

pub type DaoResult<T> = Result<T, DaoLayerError>;

impl DaoLayerError {
    /// Classifies a driver error, surfacing unique-index violations as `Duplicate`.
    pub fn from_db(err: DbErr, entity: &'static str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => DaoLayerError::Duplicate { entity },
            _ => DaoLayerError::Db(err),
        }
    }
}
