//! # pgshelf
//!
//! A small, model-first mapping layer over `tokio-postgres`.
//!
//! ## Features
//!
//! - **Model mapping**: Row → Struct via `FromRow`, table metadata via `#[derive(Model)]`
//! - **Batch eager loading**: many-to-many relations loaded in a bounded number of queries,
//!   either `SelectIn` (parents + one join-table query) or `Joined` (one `LEFT JOIN`)
//! - **Safe SQL building**: `$n` placeholders generated for you, identifiers validated
//! - **Query monitoring**: statement echo via `tracing`, timing, slow-query alerts, timeouts
//!
//! ## Example
//!
//! ```ignore
//! use pgshelf::{EchoMonitor, FromRow, InstrumentedClient, LoadStrategy, Model};
//!
//! #[derive(Debug, Clone, FromRow, Model)]
//! #[orm(table = "authors")]
//! struct Author {
//!     #[orm(id)]
//!     author_id: uuid::Uuid,
//!     name: Option<String>,
//! }
//!
//! #[derive(Debug, Clone, FromRow, Model)]
//! #[orm(table = "books")]
//! #[orm(many_to_many(Author, through = "book_authors", self_key = "book_id",
//!                    other_key = "author_id", order_by = "position", as = "authors"))]
//! struct Book {
//!     #[orm(id)]
//!     book_id: uuid::Uuid,
//!     title: Option<String>,
//! }
//!
//! let client = InstrumentedClient::new(pgshelf::connect(&url).await?)
//!     .with_monitor(EchoMonitor);
//! let books = Book::select_by_ids_with_authors(&client, ids, LoadStrategy::SelectIn).await?;
//! for book in &books {
//!     println!("{:?} by {:?}", book.title, book.rel);
//! }
//! ```

pub mod client;
pub mod eager;
pub mod error;
pub mod ident;
pub mod model;
pub mod monitor;
pub mod row;
pub mod sql;

#[cfg(test)]
mod test_util;

pub use client::{GenericClient, connect};
pub use eager::{
    HasManyMap, LoadStrategy, Loaded, ManyToMany, attach_many_to_many, find_many_to_many,
    load_many_to_many_map, select_many_to_many_joined,
};
pub use error::{OrmError, OrmResult};
pub use ident::Ident;
pub use model::{ModelPk, TableMeta, select_by_ids};
pub use monitor::{
    EchoMonitor, InstrumentedClient, QueryContext, QueryMonitor, QueryResult, QueryStats,
    QueryType, StatsMonitor, TracingMonitor,
};
pub use row::{FromPrefixedRow, FromRow, RowExt};
pub use sql::{Sql, sql};

// Generated code refers to `::pgshelf::tokio_postgres`.
pub use tokio_postgres;

#[cfg(feature = "derive")]
pub use pgshelf_derive::{FromRow, Model};
