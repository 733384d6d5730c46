//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Interceptors and handlers produce:
//!     → access_log.rs (one structured entry per log-worthy request event)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Sinks:
//!     → logging.rs (tracing subscriber: human or JSON lines on stdout)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Interceptors receive the access log as a constructor argument; they only
//!   supply fields and never format output
//! - Request ID appears on every request log entry
//! - Metrics are cheap (atomic increments)

pub mod access_log;
pub mod logging;
pub mod metrics;

pub use access_log::{AccessLog, LogEntry, LogLevel, MemoryAccessLog, TracingAccessLog};
