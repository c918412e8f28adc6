//! Eager loading for many-to-many relations.
//!
//! Loading N parents with their children never costs N+1 round trips:
//!
//! - [`LoadStrategy::SelectIn`] fetches the parents, then every child of every parent with
//!   one query through the join table.
//! - [`LoadStrategy::Joined`] fetches both in one `LEFT JOIN` and folds the rows back
//!   into parents.
//!
//! Results come back as [`Loaded<M, R>`], which derefs to the parent.

use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::model::{ModelPk, TableMeta, distinct, prefixed_columns, qualified_columns, require_pk};
use crate::row::{FromPrefixedRow, FromRow, RowExt};
use crate::sql::{Sql, sql};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use tokio_postgres::types::{FromSqlOwned, ToSql};

/// Children per parent id.
pub type HasManyMap<Id, Child> = HashMap<Id, Vec<Child>>;

const PARENT_ID_ALIAS: &str = "__pgshelf_parent_id";
const CHILD_PREFIX: &str = "__rel_";

/// A many-to-many relation seen from the parent:
///
/// ```text
/// parent.pk = through.self_key    through.other_key = child.pk
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManyToMany {
    pub through: &'static str,
    pub self_key: &'static str,
    pub other_key: &'static str,
    /// Join table column that orders children within one parent, e.g. `position`.
    pub order_by: Option<&'static str>,
}

impl ManyToMany {
    pub const fn new(
        through: &'static str,
        self_key: &'static str,
        other_key: &'static str,
    ) -> Self {
        Self {
            through,
            self_key,
            other_key,
            order_by: None,
        }
    }

    pub const fn order_by(mut self, column: &'static str) -> Self {
        self.order_by = Some(column);
        self
    }

    /// `[jt.order_by, ] child.pk`; the pk keeps ties deterministic.
    fn push_child_order(&self, q: &mut Sql, child: &str, child_pk: &str) -> OrmResult<()> {
        if let Some(col) = self.order_by {
            q.push_column("jt", col)?.push(", ");
        }
        q.push_column(child, child_pk)?;
        Ok(())
    }
}

/// How related rows are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStrategy {
    /// Parents, then one `= ANY($1)` query through the join table.
    #[default]
    SelectIn,
    /// Parents and children in one `LEFT JOIN`.
    Joined,
}

impl fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadStrategy::SelectIn => "selectin",
            LoadStrategy::Joined => "joined",
        })
    }
}

impl FromStr for LoadStrategy {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "selectin" | "select_in" => Ok(LoadStrategy::SelectIn),
            "joined" | "join" => Ok(LoadStrategy::Joined),
            other => Err(OrmError::validation(format!(
                "unknown load strategy `{other}`, expected selectin or joined"
            ))),
        }
    }
}

/// A parent with its loaded relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<M, R> {
    pub base: M,
    pub rel: R,
}

impl<M, R> std::ops::Deref for Loaded<M, R> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.base
    }
}

impl<M, R> std::ops::DerefMut for Loaded<M, R> {
    fn deref_mut(&mut self) -> &mut M {
        &mut self.base
    }
}

/// Children of every id in `parent_ids`, in one query. Childless parents are absent.
pub async fn load_many_to_many_map<Child, Id>(
    conn: &impl GenericClient,
    parent_ids: Vec<Id>,
    rel: &ManyToMany,
) -> OrmResult<HasManyMap<Id, Child>>
where
    Child: FromRow + TableMeta,
    Id: ToSql + FromSqlOwned + Eq + Hash + Send + Sync + 'static,
{
    let parent_ids = distinct(parent_ids);
    if parent_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let child = Child::table_name();
    let child_pk = require_pk::<Child>()?;

    let mut q = sql("SELECT ");
    q.push_column("jt", rel.self_key)?;
    q.push(&format!(
        " AS {PARENT_ID_ALIAS}, {} FROM ",
        qualified_columns(child, Child::columns())
    ));
    q.push_ident(child)?.push(" JOIN ");
    q.push_ident(rel.through)?.push(" jt ON ");
    q.push_column("jt", rel.other_key)?.push(" = ");
    q.push_column(child, child_pk)?.push(" WHERE ");
    q.push_column("jt", rel.self_key)?.push_any(parent_ids).push(" ORDER BY ");
    rel.push_child_order(&mut q, child, child_pk)?;
    q.tag(format!("{}.load_many_to_many", rel.through));

    let mut map = HashMap::new();
    for row in q.fetch_all(conn).await? {
        let parent_id: Id = row.try_get_column(PARENT_ID_ALIAS)?;
        map.entry(parent_id)
            .or_insert_with(Vec::new)
            .push(Child::from_row(&row)?);
    }
    Ok(map)
}

/// Pair each parent with its children from `map`, keeping parent order.
pub fn attach_many_to_many<Parent, Child, Id>(
    parents: Vec<Parent>,
    map: &HasManyMap<Id, Child>,
) -> Vec<Loaded<Parent, Vec<Child>>>
where
    Parent: ModelPk<Id = Id>,
    Child: Clone,
    Id: Eq + Hash,
{
    parents
        .into_iter()
        .map(|base| Loaded {
            rel: map.get(base.pk()).cloned().unwrap_or_default(),
            base,
        })
        .collect()
}

/// Fold `(parent id, parent, child)` rows into parents, in first-seen order.
///
/// Only the first row of each parent supplies the parent value. A `None` child is the
/// `LEFT JOIN` miss of a parent without children.
pub(crate) fn group_joined<Id, P, C>(
    rows: impl IntoIterator<Item = (Id, P, Option<C>)>,
) -> Vec<Loaded<P, Vec<C>>>
where
    Id: Eq + Hash,
{
    let mut out: Vec<Loaded<P, Vec<C>>> = Vec::new();
    let mut slot_of: HashMap<Id, usize> = HashMap::new();
    for (id, parent, child) in rows {
        let slot = *slot_of.entry(id).or_insert_with(|| {
            out.push(Loaded {
                base: parent,
                rel: Vec::new(),
            });
            out.len() - 1
        });
        out[slot].rel.extend(child);
    }
    out
}

/// Parents with `ids` and their children, in a single `LEFT JOIN` query.
pub async fn select_many_to_many_joined<Parent, Child, Id>(
    conn: &impl GenericClient,
    ids: Vec<Id>,
    rel: &ManyToMany,
) -> OrmResult<Vec<Loaded<Parent, Vec<Child>>>>
where
    Parent: FromRow + TableMeta,
    Child: FromPrefixedRow + TableMeta + ModelPk,
    Child::Id: FromSqlOwned,
    Id: ToSql + FromSqlOwned + Eq + Hash + Send + Sync + 'static,
{
    let ids = distinct(ids);
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let parent = Parent::table_name();
    let parent_pk = require_pk::<Parent>()?;
    let child = Child::table_name();
    let child_pk = require_pk::<Child>()?;

    let mut q = sql(format!(
        "SELECT {}, {} FROM ",
        qualified_columns(parent, Parent::columns()),
        prefixed_columns(child, Child::columns(), CHILD_PREFIX),
    ));
    q.push_ident(parent)?.push(" LEFT JOIN (");
    q.push_ident(rel.through)?.push(" jt JOIN ");
    q.push_ident(child)?.push(" ON ");
    q.push_column(child, child_pk)?.push(" = ");
    q.push_column("jt", rel.other_key)?.push(") ON ");
    q.push_column("jt", rel.self_key)?.push(" = ");
    q.push_column(parent, parent_pk)?.push(" WHERE ");
    q.push_column(parent, parent_pk)?.push_any(ids).push(" ORDER BY ");
    q.push_column(parent, parent_pk)?.push(", ");
    rel.push_child_order(&mut q, child, child_pk)?;
    q.tag(format!("{}.select_joined", rel.through));

    let rows = q.fetch_all(conn).await?;
    let decoded = rows
        .iter()
        .map(|row| {
            let id: Id = row.try_get_column(parent_pk)?;
            let child_key: Option<Child::Id> = row.try_get_prefixed(CHILD_PREFIX, child_pk)?;
            let child = match child_key {
                Some(_) => Some(Child::from_prefixed_row(row, CHILD_PREFIX)?),
                None => None,
            };
            Ok((id, Parent::from_row(row)?, child))
        })
        .collect::<OrmResult<Vec<_>>>()?;

    Ok(group_joined(decoded))
}

/// Parents with `ids`, in primary key order, each with its children in relation order.
///
/// `SelectIn` costs two round trips (one when nothing matches), `Joined` costs one, and
/// an empty id set costs none.
pub async fn find_many_to_many<Parent, Child, Id>(
    conn: &impl GenericClient,
    ids: Vec<Id>,
    rel: &ManyToMany,
    strategy: LoadStrategy,
) -> OrmResult<Vec<Loaded<Parent, Vec<Child>>>>
where
    Parent: FromRow + TableMeta + ModelPk<Id = Id>,
    Child: FromRow + FromPrefixedRow + TableMeta + ModelPk + Clone,
    Child::Id: FromSqlOwned,
    Id: ToSql + FromSqlOwned + Clone + Eq + Hash + Send + Sync + 'static,
{
    match strategy {
        LoadStrategy::SelectIn => {
            let parents: Vec<Parent> = crate::model::select_by_ids(conn, ids).await?;
            let parent_ids = parents.iter().map(|p| p.pk().clone()).collect();
            let children = load_many_to_many_map::<Child, Id>(conn, parent_ids, rel).await?;
            Ok(attach_many_to_many(parents, &children))
        }
        LoadStrategy::Joined => select_many_to_many_joined(conn, ids, rel).await,
    }
}
