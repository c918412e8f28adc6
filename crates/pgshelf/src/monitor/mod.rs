//! Watching statements as they run.
//!
//! [`InstrumentedClient`] wraps a [`GenericClient`](crate::GenericClient), tells every
//! registered [`QueryMonitor`] when a statement starts and how it finished, and can
//! cancel statements that exceed a timeout.
//!
//! ```ignore
//! use pgshelf::{EchoMonitor, InstrumentedClient, StatsMonitor, TracingMonitor};
//!
//! let stats = Arc::new(StatsMonitor::new());
//! let client = InstrumentedClient::new(client)
//!     .with_query_timeout(Duration::from_secs(30))
//!     .with_monitor(EchoMonitor)
//!     .with_monitor(TracingMonitor::new().slow_threshold(Duration::from_millis(200)))
//!     .with_shared_monitor(stats.clone());
//! ```

mod instrumented;
mod monitors;
mod types;


pub use instrumented::InstrumentedClient;
pub use monitors::{EchoMonitor, QueryStats, StatsMonitor, TracingMonitor};
pub use types::{QueryContext, QueryMonitor, QueryResult, QueryType};
