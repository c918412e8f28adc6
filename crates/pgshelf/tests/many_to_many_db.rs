//! Eager loading against a live Postgres.
//!
//! Skipped unless `DATABASE_URL` is set. Each run works in its own schema and drops it
//! afterwards.

use pgshelf::{
    FromRow, GenericClient, InstrumentedClient, LoadStrategy, Model, OrmError, OrmResult,
    StatsMonitor,
};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, FromRow, Model)]
#[orm(table = "authors")]
struct Author {
    #[orm(id)]
    author_id: Uuid,
    name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Model)]
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
    title: Option<String>,
}

const BOOK_A: Uuid = Uuid::from_u128(0x1FB112D1_54C9_4308_99C6_0163BFD0172D);
const BOOK_B: Uuid = Uuid::from_u128(0x554BC347_F36C_4766_B66F_D651C84C56BA);
const BOOK_LONELY: Uuid = Uuid::from_u128(3);
const ANN: Uuid = Uuid::from_u128(10);
const BOB: Uuid = Uuid::from_u128(11);
const CY: Uuid = Uuid::from_u128(12);

async fn setup(client: &tokio_postgres::Client) -> OrmResult<String> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    let schema = format!("pgshelf_test_{}_{}", std::process::id(), nanos);

    let ddl = format!(
        "CREATE SCHEMA {schema};
         SET search_path TO {schema};
         CREATE TABLE books (book_id uuid PRIMARY KEY, title text);
         CREATE TABLE authors (author_id uuid PRIMARY KEY, name text);
         CREATE TABLE book_authors (
             book_id uuid NOT NULL REFERENCES books,
             author_id uuid NOT NULL REFERENCES authors,
             position int NOT NULL,
             PRIMARY KEY (book_id, author_id)
         );"
    );
    client.batch_execute(&ddl).await?;

    client
        .execute(
            "INSERT INTO books (book_id, title) VALUES ($1, $2), ($3, $4), ($5, NULL)",
            &[&BOOK_A, &"Shared Shelf", &BOOK_B, &"Solo Shelf", &BOOK_LONELY],
        )
        .await?;
    client
        .execute(
            "INSERT INTO authors (author_id, name) VALUES ($1, 'Ann'), ($2, 'Bob'), ($3, NULL)",
            &[&ANN, &BOB, &CY],
        )
        .await?;
    // Positions deliberately disagree with primary key order.
    client
        .execute(
            "INSERT INTO book_authors (book_id, author_id, position)
             VALUES ($1, $2, 2), ($1, $3, 1), ($4, $2, 1), ($4, $5, 2)",
            &[&BOOK_A, &ANN, &BOB, &BOOK_B, &CY],
        )
        .await?;

    Ok(schema)
}

async fn teardown(client: &tokio_postgres::Client, schema: &str) {
    let _ = client
        .batch_execute(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
        .await;
}

#[tokio::test]
async fn books_with_authors_both_strategies() -> OrmResult<()> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping books_with_authors_both_strategies");
            return Ok(());
        }
    };

    let client = pgshelf::connect(&database_url).await?;
    let schema = setup(&client).await?;

    let stats = Arc::new(StatsMonitor::new());
    let client = InstrumentedClient::new(client).with_shared_monitor(stats.clone());

    let outcome = async {
        let missing = Uuid::from_u128(999);
        let mut per_strategy = Vec::new();
        for strategy in [LoadStrategy::SelectIn, LoadStrategy::Joined] {
            let before = stats.stats().total;
            let books = Book::select_by_ids_with_authors(
                &client,
                [BOOK_B, BOOK_A, missing, BOOK_LONELY, BOOK_A],
                strategy,
            )
            .await?;
            let used = stats.stats().total - before;
            per_strategy.push((strategy, books, used));
        }
        Ok::<_, OrmError>(per_strategy)
    }
    .await;

    teardown(client.inner(), &schema).await;
    let per_strategy = outcome?;

    for (strategy, books, used) in per_strategy {
        let expected_queries = match strategy {
            LoadStrategy::SelectIn => 2,
            LoadStrategy::Joined => 1,
        };
        assert_eq!(used, expected_queries, "{strategy}");

        // Parents in primary key order, missing id skipped, duplicates collapsed.
        let ids: Vec<Uuid> = books.iter().map(|b| b.book_id).collect();
        let mut want = vec![BOOK_A, BOOK_B, BOOK_LONELY];
        want.sort();
        assert_eq!(ids, want, "{strategy}");

        for book in &books {
            let names: Vec<Option<&str>> = book.rel.iter().map(|a| a.name.as_deref()).collect();
            match book.book_id {
                id if id == BOOK_A => {
                    assert_eq!(book.title.as_deref(), Some("Shared Shelf"));
                    assert_eq!(names, vec![Some("Bob"), Some("Ann")], "{strategy}");
                }
                id if id == BOOK_B => {
                    assert_eq!(names, vec![Some("Ann"), None], "{strategy}");
                }
                _ => {
                    assert_eq!(book.title, None);
                    assert!(book.rel.is_empty(), "{strategy}");
                }
            }
        }
    }

    Ok(())
}

#[tokio::test]
async fn empty_id_set_never_queries() -> OrmResult<()> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping empty_id_set_never_queries");
            return Ok(());
        }
    };

    let stats = Arc::new(StatsMonitor::new());
    let client = InstrumentedClient::new(pgshelf::connect(&database_url).await?)
        .with_shared_monitor(stats.clone());

    let books =
        Book::select_by_ids_with_authors(&client, Vec::<Uuid>::new(), LoadStrategy::SelectIn)
            .await?;
    assert!(books.is_empty());
    assert_eq!(stats.stats().total, 0);

    // Sanity check that the connection itself works.
    let rows = client.query("SELECT 1", &[]).await?;
    assert_eq!(rows.len(), 1);
    Ok(())
}
