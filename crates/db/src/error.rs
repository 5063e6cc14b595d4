//! Error types for the database handle

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("failed to connect to '{endpoint}'")]
    Connect {
        endpoint: String,
        #[source]
        source: surrealdb::Error,
    },

    #[error("database '{database}' is not connected")]
    Disconnected { database: String },

    #[error("query failed: {0}")]
    Query(#[from] surrealdb::Error),
}

pub type DbResult<T> = Result<T, DbError>;
