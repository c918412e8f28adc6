//! Generated metadata and SQL for `#[derive(FromRow, Model)]`.
//!
//! These run against a recording client; nothing touches a database.

#![allow(dead_code)]

use pgshelf::{
    FromRow, GenericClient, LoadStrategy, ManyToMany, Model, ModelPk, OrmResult, TableMeta,
};
use std::sync::Mutex;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Model)]
#[orm(table = "authors")]
struct Author {
    #[orm(id)]
    author_id: Uuid,
    name: Option<String>,
}

#[derive(Debug, Clone, FromRow, Model)]
#[orm(table = "books")]
#[orm(many_to_many(
    Author,
    through = "book_authors",
    self_key = "book_id",
    other_key = "author_id",
    order_by = "position",
    as = "authors"
))]
struct Book {
    #[orm(id)]
    book_id: Uuid,
    #[orm(column = "title")]
    heading: Option<String>,
}

#[derive(Debug, Clone, FromRow, Model)]
#[orm(table = "tags")]
struct Tag {
    label: String,
}

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<(Option<String>, String)>>,
}

impl Recorder {
    fn seen(&self) -> Vec<(Option<String>, String)> {
        self.seen.lock().unwrap().clone()
    }
}

impl GenericClient for Recorder {
    async fn query(&self, sql: &str, _: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        self.seen.lock().unwrap().push((None, sql.to_string()));
        Ok(Vec::new())
    }

    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        _: &[&(dyn ToSql + Sync)],
    ) -> OrmResult<Vec<Row>> {
        self.seen
            .lock()
            .unwrap()
            .push((Some(tag.to_string()), sql.to_string()));
        Ok(Vec::new())
    }
}

#[test]
fn model_constants_and_table_meta() {
    assert_eq!(Book::TABLE, "books");
    assert_eq!(Book::ID, "book_id");
    assert_eq!(Book::SELECT_LIST, "book_id, title");
    assert_eq!(Book::select_list_as("b"), "b.book_id, b.title");

    assert_eq!(<Author as TableMeta>::table_name(), "authors");
    assert_eq!(<Author as TableMeta>::columns(), &["author_id", "name"]);
    assert_eq!(<Author as TableMeta>::primary_key(), Some("author_id"));
    assert_eq!(<Tag as TableMeta>::primary_key(), None);
}

#[test]
fn model_pk_points_at_id_field() {
    let id = Uuid::from_u128(7);
    let book = Book {
        book_id: id,
        heading: None,
    };
    assert_eq!(book.pk(), &id);
}

#[test]
fn relation_constant_mirrors_attribute() {
    assert_eq!(
        Book::REL_AUTHORS,
        ManyToMany::new("book_authors", "book_id", "author_id").order_by("position")
    );
}

#[tokio::test]
async fn select_all_and_select_one_sql() {
    let conn = Recorder::default();
    let _ = Book::select_all(&conn).await.unwrap();
    let _ = Tag::select_all(&conn).await.unwrap();
    let err = Book::select_one(&conn, Uuid::nil()).await.unwrap_err();
    assert!(err.is_not_found());

    let seen = conn.seen();
    assert_eq!(
        seen[0],
        (
            Some("books.select_all".to_string()),
            "SELECT book_id, title FROM books ORDER BY book_id".to_string()
        )
    );
    assert_eq!(seen[1].1, "SELECT label FROM tags");
    assert_eq!(
        seen[2],
        (
            Some("books.select_one".to_string()),
            "SELECT book_id, title FROM books WHERE book_id = $1".to_string()
        )
    );
}

#[tokio::test]
async fn selectin_issues_parent_query_only_when_nothing_matches() {
    let conn = Recorder::default();
    let books = Book::select_by_ids_with_authors(
        &conn,
        [Uuid::from_u128(1), Uuid::from_u128(2)],
        LoadStrategy::SelectIn,
    )
    .await
    .unwrap();
    assert!(books.is_empty());

    let seen = conn.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.as_deref(), Some("books.select_by_ids"));
}

#[tokio::test]
async fn joined_strategy_is_one_query() {
    let conn = Recorder::default();
    let _ = Book::select_by_ids_with_authors(&conn, [Uuid::from_u128(1)], LoadStrategy::Joined)
        .await
        .unwrap();

    let seen = conn.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.as_deref(), Some("book_authors.select_joined"));
    assert!(seen[0].1.contains("LEFT JOIN (book_authors jt JOIN authors"));
}

#[tokio::test]
async fn load_relation_for_existing_parents() {
    let conn = Recorder::default();
    let parents = vec![
        Book {
            book_id: Uuid::from_u128(2),
            heading: Some("Second".into()),
        },
        Book {
            book_id: Uuid::from_u128(1),
            heading: None,
        },
    ];

    let loaded = Book::load_authors(&conn, parents).await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].heading.as_deref(), Some("Second"));
    assert!(loaded.iter().all(|b| b.rel.is_empty()));

    let seen = conn.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.as_deref(), Some("book_authors.load_many_to_many"));

    // No parents, no query.
    let none = Book::load_authors_map(&conn, &[]).await.unwrap();
    assert!(none.is_empty());
    assert_eq!(conn.seen().len(), 1);
}
