//! Errors returned by pgshelf.

use std::time::Duration;
use thiserror::Error;
use tokio_postgres::error::SqlState;

pub type OrmResult<T> = Result<T, OrmError>;

#[derive(Debug, Error)]
pub enum OrmError {
    /// The URL was malformed or the server could not be reached.
    #[error("could not connect: {0}")]
    Connection(String),

    #[error("statement failed: {0}")]
    Query(#[source] tokio_postgres::Error),

    /// SQLSTATE 42P01, usually a missing migration.
    #[error("table missing: {0}")]
    UndefinedTable(String),

    #[error("no row returned by {0}")]
    NotFound(String),

    #[error("column `{column}` could not be decoded: {message}")]
    Decode { column: String, message: String },

    /// Rejected before anything was sent to the server.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("statement cancelled after {0:?}")]
    Timeout(Duration),
}

impl OrmError {
    pub fn decode(column: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.to_string(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<tokio_postgres::Error> for OrmError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.as_db_error() {
            Some(db) if db.code() == &SqlState::UNDEFINED_TABLE => {
                Self::UndefinedTable(db.message().to_owned())
            }
            _ => Self::Query(err),
        }
    }
}
