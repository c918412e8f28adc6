use super::types::{QueryContext, QueryMonitor, QueryResult, QueryType};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const MAX_LOGGED_SQL: usize = 500;

/// Cut `sql` to at most `max` bytes on a char boundary, marking the cut with `...`.
pub(crate) fn clip(sql: &str, max: usize) -> String {
    if sql.len() <= max {
        return sql.to_owned();
    }
    let end = (0..=max).rev().find(|&i| sql.is_char_boundary(i)).unwrap_or(0);
    format!("{}...", &sql[..end])
}

/// Logs each statement at `DEBUG` on `pgshelf.sql` before it is sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoMonitor;

impl QueryMonitor for EchoMonitor {
    fn on_start(&self, ctx: &QueryContext) {
        tracing::debug!(
            target: "pgshelf.sql",
            tag = ctx.label(),
            params = ctx.param_count,
            sql = %clip(&ctx.sql, MAX_LOGGED_SQL),
            "statement"
        );
    }

    fn on_finish(&self, _: &QueryContext, _: Duration, _: &QueryResult) {}
}

/// Logs how each statement finished on `pgshelf.monitor`.
///
/// Successes go out at `INFO`. Failures, and statements slower than the threshold,
/// go out at `WARN`.
#[derive(Debug, Clone, Default)]
pub struct TracingMonitor {
    slow_threshold: Option<Duration>,
}

impl TracingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    pub(crate) fn is_slow(&self, elapsed: Duration) -> bool {
        self.slow_threshold.is_some_and(|limit| elapsed > limit)
    }
}

impl QueryMonitor for TracingMonitor {
    fn on_finish(&self, ctx: &QueryContext, elapsed: Duration, result: &QueryResult) {
        let tag = ctx.label();
        if result.is_error() {
            tracing::warn!(target: "pgshelf.monitor", tag, ?elapsed, %result, "query failed");
        } else if self.is_slow(elapsed) {
            tracing::warn!(
                target: "pgshelf.monitor",
                tag,
                ?elapsed,
                %result,
                sql = %clip(&ctx.sql, MAX_LOGGED_SQL),
                "slow query"
            );
        } else {
            tracing::info!(target: "pgshelf.monitor", tag, ?elapsed, %result, "query done");
        }
    }
}

/// Totals collected by a [`StatsMonitor`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub total: u64,
    pub failed: u64,
    pub selects: u64,
    pub total_elapsed: Duration,
    /// Tag (or SQL, when untagged) and duration of the slowest statement.
    pub slowest: Option<(String, Duration)>,
}

/// Counts statements, so a caller can tell how many round trips a load took.
#[derive(Debug, Default)]
pub struct StatsMonitor {
    stats: Mutex<QueryStats>,
}

impl StatsMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> QueryStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl QueryMonitor for StatsMonitor {
    fn on_finish(&self, ctx: &QueryContext, elapsed: Duration, result: &QueryResult) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.total += 1;
        stats.failed += u64::from(result.is_error());
        stats.selects += u64::from(ctx.query_type == QueryType::Select);
        stats.total_elapsed = stats.total_elapsed.saturating_add(elapsed);

        if stats.slowest.as_ref().is_none_or(|(_, worst)| elapsed > *worst) {
            let name = ctx.tag.clone().unwrap_or_else(|| ctx.sql.clone());
            stats.slowest = Some((name, elapsed));
        }
    }
}
