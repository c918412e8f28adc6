//! Fake clients for unit tests.

use crate::client::GenericClient;
use crate::error::OrmResult;
use std::sync::Mutex;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Recorded {
    pub sql: String,
    pub param_count: usize,
    pub tag: Option<String>,
}

/// Remembers every statement and answers with no rows.
#[derive(Default)]
pub(crate) struct RecordingClient {
    seen: Mutex<Vec<Recorded>>,
}

impl RecordingClient {
    pub fn statements(&self) -> Vec<Recorded> {
        self.seen.lock().unwrap().clone()
    }

    fn record(&self, tag: Option<&str>, sql: &str, param_count: usize) -> OrmResult<Vec<Row>> {
        self.seen.lock().unwrap().push(Recorded {
            sql: sql.to_owned(),
            param_count,
            tag: tag.map(str::to_owned),
        });
        Ok(Vec::new())
    }
}

impl GenericClient for RecordingClient {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        self.record(None, sql, params.len())
    }

    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> OrmResult<Vec<Row>> {
        self.record(Some(tag), sql, params.len())
    }
}

/// Fails the test if anything reaches the database.
pub(crate) struct PanicClient;

impl GenericClient for PanicClient {
    async fn query(&self, sql: &str, _: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        panic!("no statement expected, got: {sql}")
    }
}
