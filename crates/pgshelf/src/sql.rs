//! Statement building with automatic `$n` placeholders.
//!
//! ```ignore
//! let mut q = pgshelf::sql("SELECT books.title FROM books WHERE ");
//! q.push_column("books", "book_id")?.push_any(ids);
//! q.tag("books.titles");
//! let rows = q.fetch_all(&conn).await?;
//! ```

use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use crate::row::FromRow;
use std::fmt::Write;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

type Param = Box<dyn ToSql + Send + Sync>;

/// A statement under construction.
///
/// Placeholders are numbered as values are bound, so the text and the parameter list
/// cannot drift apart.
#[must_use]
pub struct Sql {
    text: String,
    params: Vec<Param>,
    tag: Option<String>,
}

/// Start a statement with `initial` as its leading text.
pub fn sql(initial: impl Into<String>) -> Sql {
    Sql {
        text: initial.into(),
        params: Vec::new(),
        tag: None,
    }
}

impl Sql {
    /// Append raw text. Never pass user input here.
    pub fn push(&mut self, fragment: &str) -> &mut Self {
        self.text.push_str(fragment);
        self
    }

    /// Bind `value` as the next parameter and append its `$n`.
    pub fn push_bind<T>(&mut self, value: T) -> &mut Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.params.push(Box::new(value));
        let _ = write!(self.text, "${}", self.params.len());
        self
    }

    pub fn push_ident(&mut self, name: &str) -> OrmResult<&mut Self> {
        let ident = Ident::new(name)?;
        Ok(self.push(ident.as_str()))
    }

    /// Append `table.column`.
    pub fn push_column(&mut self, table: &str, column: &str) -> OrmResult<&mut Self> {
        let (table, column) = (Ident::new(table)?, Ident::new(column)?);
        Ok(self.push(table.as_str()).push(".").push(column.as_str()))
    }

    /// Append ` = ANY($n)` with `values` bound as a single array parameter.
    ///
    /// One placeholder regardless of how many ids are asked for.
    pub fn push_any<T>(&mut self, values: Vec<T>) -> &mut Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.push(" = ANY(").push_bind(values).push(")")
    }

    /// Name the statement for monitors, e.g. `books.select_by_ids`.
    pub fn tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    fn param_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect()
    }

    pub async fn fetch_all(&self, conn: &impl GenericClient) -> OrmResult<Vec<Row>> {
        let params = self.param_refs();
        match &self.tag {
            Some(tag) => conn.query_tagged(tag, &self.text, &params).await,
            None => conn.query(&self.text, &params).await,
        }
    }

    pub async fn fetch_all_as<T: FromRow>(&self, conn: &impl GenericClient) -> OrmResult<Vec<T>> {
        let rows = self.fetch_all(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Map the first row; no row at all is [`OrmError::NotFound`].
    pub async fn fetch_one_as<T: FromRow>(&self, conn: &impl GenericClient) -> OrmResult<T> {
        let rows = self.fetch_all(conn).await?;
        match rows.first() {
            Some(row) => T::from_row(row),
            None => Err(OrmError::not_found(
                self.tag.as_deref().unwrap_or(self.text.as_str()),
            )),
        }
    }
}
