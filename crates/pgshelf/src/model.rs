//! What the loaders need to know about a model.
//!
//! `#[derive(Model)]` implements both traits. Everything generic in this crate is written
//! against them, never against the generated inherent methods.

use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::row::FromRow;
use crate::sql::sql;
use std::collections::HashSet;
use std::hash::Hash;
use tokio_postgres::types::ToSql;

/// Access to a model's primary key value.
pub trait ModelPk {
    type Id;

    fn pk(&self) -> &Self::Id;
}

/// Table name and columns of a model.
pub trait TableMeta {
    fn table_name() -> &'static str;

    /// Column names in field order.
    fn columns() -> &'static [&'static str];

    fn primary_key() -> Option<&'static str> {
        None
    }
}

pub(crate) fn require_pk<M: TableMeta>() -> OrmResult<&'static str> {
    M::primary_key().ok_or_else(|| {
        OrmError::validation(format!(
            "`{}` has no #[orm(id)] column to look rows up by",
            M::table_name()
        ))
    })
}

/// Drop repeated ids. Order is not kept; every query that takes the result sorts.
pub(crate) fn distinct<Id: Eq + Hash>(ids: Vec<Id>) -> Vec<Id> {
    ids.into_iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect()
}

/// `table.c1, table.c2, ...`
pub fn qualified_columns(table: &str, columns: &[&str]) -> String {
    columns
        .iter()
        .map(|col| format!("{table}.{col}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `table.c1 AS "{prefix}c1", ...`; the quotes keep the alias case-exact.
pub fn prefixed_columns(table: &str, columns: &[&str], prefix: &str) -> String {
    columns
        .iter()
        .map(|col| format!("{table}.{col} AS \"{prefix}{col}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Find every `M` whose primary key is in `ids`, in primary key order.
///
/// Ids without a row are left out and repeated ids count once. An empty `ids` is
/// answered without a round trip.
pub async fn select_by_ids<M, Id>(conn: &impl GenericClient, ids: Vec<Id>) -> OrmResult<Vec<M>>
where
    M: FromRow + TableMeta,
    Id: ToSql + Eq + Hash + Send + Sync + 'static,
{
    let ids = distinct(ids);
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let table = M::table_name();
    let pk = require_pk::<M>()?;

    let mut q = sql(format!(
        "SELECT {} FROM ",
        qualified_columns(table, M::columns())
    ));
    q.push_ident(table)?.push(" WHERE ");
    q.push_column(table, pk)?.push_any(ids).push(" ORDER BY ");
    q.push_column(table, pk)?;
    q.tag(format!("{table}.select_by_ids"));

    q.fetch_all_as(conn).await
}
