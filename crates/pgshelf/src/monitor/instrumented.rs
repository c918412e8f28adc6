use super::types::{QueryContext, QueryMonitor, QueryResult};
use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_postgres::types::ToSql;
use tokio_postgres::{CancelToken, NoTls, Row};

/// A [`GenericClient`] that reports every statement to its monitors.
///
/// With no monitors and no timeout it only adds a context allocation per statement.
pub struct InstrumentedClient<C> {
    inner: C,
    monitors: Vec<Arc<dyn QueryMonitor>>,
    timeout: Option<Duration>,
}

impl<C: GenericClient> InstrumentedClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            monitors: Vec::new(),
            timeout: None,
        }
    }

    /// Add a monitor; monitors are notified in the order they were added.
    pub fn with_monitor(self, monitor: impl QueryMonitor + 'static) -> Self {
        self.with_shared_monitor(Arc::new(monitor))
    }

    /// Add a monitor the caller keeps a handle to, e.g. a [`StatsMonitor`](super::StatsMonitor).
    pub fn with_shared_monitor(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitors.push(monitor);
        self
    }

    /// Give up on statements after `timeout`, asking the server to cancel them.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    async fn run(
        &self,
        tag: Option<&str>,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> OrmResult<Vec<Row>> {
        let ctx = QueryContext::new(sql, params.len(), tag);
        for monitor in &self.monitors {
            monitor.on_start(&ctx);
        }

        let started = Instant::now();
        let result = match tag {
            Some(tag) => self.bounded(self.inner.query_tagged(tag, sql, params)).await,
            None => self.bounded(self.inner.query(sql, params)).await,
        };
        let elapsed = started.elapsed();

        if !self.monitors.is_empty() {
            let outcome = match &result {
                Ok(rows) => QueryResult::Rows(rows.len()),
                Err(e) => QueryResult::Error(e.to_string()),
            };
            for monitor in &self.monitors {
                monitor.on_finish(&ctx, elapsed, &outcome);
            }
        }
        result
    }

    async fn bounded<F>(&self, query: F) -> OrmResult<Vec<Row>>
    where
        F: Future<Output = OrmResult<Vec<Row>>> + Send,
    {
        let Some(limit) = self.timeout else {
            return query.await;
        };

        match tokio::time::timeout(limit, query).await {
            Ok(result) => result,
            Err(_) => {
                if let Some(token) = self.inner.cancel_token() {
                    tokio::spawn(cancel_on_server(token));
                }
                Err(OrmError::Timeout(limit))
            }
        }
    }
}

async fn cancel_on_server(token: CancelToken) {
    if let Err(e) = token.cancel_query(NoTls).await {
        tracing::debug!(target: "pgshelf.monitor", error = %e, "cancel request failed");
    }
}

impl<C: GenericClient> GenericClient for InstrumentedClient<C> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        self.run(None, sql, params).await
    }

    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> OrmResult<Vec<Row>> {
        self.run(Some(tag), sql, params).await
    }

    fn cancel_token(&self) -> Option<CancelToken> {
        self.inner.cancel_token()
    }
}
