//! The connection seam every loader is written against.

use crate::error::{OrmError, OrmResult};
use std::future::Future;
use tokio_postgres::types::ToSql;
use tokio_postgres::{CancelToken, Client, NoTls, Row};

/// Something that can run a read statement.
///
/// Implemented for a plain [`tokio_postgres::Client`] and for
/// [`InstrumentedClient`](crate::InstrumentedClient), so loaders take `&impl GenericClient`
/// and work with either.
pub trait GenericClient: Send + Sync {
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Like [`GenericClient::query`], with a name for monitors. Plain clients drop it.
    fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = OrmResult<Vec<Row>>> + Send {
        let _ = tag;
        self.query(sql, params)
    }

    /// Token for cancelling the statement in flight on the server, when there is one.
    fn cancel_token(&self) -> Option<CancelToken> {
        None
    }
}

impl GenericClient for Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        Ok(Client::query(self, sql, params).await?)
    }

    fn cancel_token(&self) -> Option<CancelToken> {
        Some(Client::cancel_token(self))
    }
}

/// Open one connection to `database_url` without TLS.
///
/// The connection driver runs as a background tokio task; if it dies the error is
/// logged on `pgshelf.connection` and later statements fail.
pub async fn connect(database_url: &str) -> OrmResult<Client> {
    let config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| OrmError::Connection(e.to_string()))?;

    let (client, driver) = config
        .connect(NoTls)
        .await
        .map_err(|e| OrmError::Connection(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = driver.await {
            tracing::error!(target: "pgshelf.connection", error = %e, "connection closed");
        }
    });

    tracing::debug!(target: "pgshelf.connection", "connected");
    Ok(client)
}
