//! Turning result rows into structs.

use crate::error::{OrmError, OrmResult};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

/// Build `Self` from a row whose columns carry the field names.
///
/// Normally derived: `#[derive(FromRow)]`, with `#[orm(column = "...")]` for renames.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> OrmResult<Self>;
}

/// Build `Self` from the columns named `{prefix}{column}`.
///
/// The joined loader selects parent and child side by side and aliases the child
/// columns with a prefix; the derive implements this next to [`FromRow`].
pub trait FromPrefixedRow: Sized {
    fn from_prefixed_row(row: &Row, prefix: &str) -> OrmResult<Self>;
}

/// Typed column access that reports failures as [`OrmError::Decode`].
pub trait RowExt {
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a>;

    fn try_get_prefixed<T>(&self, prefix: &str, column: &str) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get_column(&format!("{prefix}{column}"))
    }
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column).map_err(|e| OrmError::decode(column, e))
    }
}
