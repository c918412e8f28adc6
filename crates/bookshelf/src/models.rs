use pgshelf::{FromRow, Model};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, Model)]
#[orm(table = "authors")]
pub struct Author {
    #[orm(id)]
    pub author_id: Uuid,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, Model)]
#[orm(table = "books")]
#[orm(many_to_many(
    Author,
    through = "book_authors",
    self_key = "book_id",
    other_key = "author_id",
    order_by = "position",
    as = "authors"
))]
pub struct Book {
    #[orm(id)]
    pub book_id: Uuid,
    pub title: Option<String>,
}
