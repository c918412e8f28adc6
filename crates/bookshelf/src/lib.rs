//! Find books by id with their authors eagerly loaded, and print them.

pub mod cli;
pub mod config;
pub mod models;
pub mod render;

use anyhow::{Context, anyhow};
use config::Settings;
use models::Book;
use pgshelf::{
    EchoMonitor, GenericClient, InstrumentedClient, LoadStrategy, StatsMonitor, TracingMonitor,
};
use render::BookWithAuthors;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Slower statements are reported at `WARN` when `--debug` is on.
const SLOW_QUERY_THRESHOLD: Duration = Duration::from_millis(500);

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let run_args = match cli::parse_args(&args)? {
        cli::Command::Help => {
            cli::print_help();
            return Ok(());
        }
        cli::Command::Run(run_args) => run_args,
    };

    let settings = Settings::resolve(&run_args)?;
    init_tracing(settings.debug)?;
    tracing::debug!(
        strategy = %settings.strategy,
        format = %settings.format,
        ids = settings.ids.len(),
        "resolved settings"
    );

    let client = pgshelf::connect(&settings.database_url)
        .await
        .context("failed to connect to database")?;
    let stats = Arc::new(StatsMonitor::new());
    let client = instrument(client, &settings, &stats);

    let books = load_books(&client, settings.ids.clone(), settings.strategy).await?;
    tracing::info!(found = books.len(), requested = settings.ids.len(), "loaded books");
    if settings.debug {
        let summary = stats.stats();
        tracing::info!(
            queries = summary.total,
            failed = summary.failed,
            elapsed = ?summary.total_elapsed,
            "query summary"
        );
    }

    println!("{}", render::render(&books, settings.format)?);
    Ok(())
}

/// Find books by id with their authors, in book id order.
pub async fn load_books(
    conn: &impl GenericClient,
    ids: Vec<Uuid>,
    strategy: LoadStrategy,
) -> anyhow::Result<Vec<BookWithAuthors>> {
    let books = Book::select_by_ids_with_authors(conn, ids, strategy)
        .await
        .with_context(|| format!("failed to load books with authors ({strategy})"))?;
    Ok(books.into_iter().map(BookWithAuthors::from).collect())
}

/// Apply the statement timeout, and with `--debug` echo, time and count every statement.
fn instrument<C: GenericClient>(
    client: C,
    settings: &Settings,
    stats: &Arc<StatsMonitor>,
) -> InstrumentedClient<C> {
    let mut client = InstrumentedClient::new(client);
    if let Some(timeout) = settings.timeout {
        client = client.with_query_timeout(timeout);
    }
    if !settings.debug {
        return client;
    }

    client
        .with_monitor(EchoMonitor)
        .with_monitor(TracingMonitor::new().slow_threshold(SLOW_QUERY_THRESHOLD))
        .with_shared_monitor(stats.clone())
}

fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let default_filter = if debug {
        "info,pgshelf.sql=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
