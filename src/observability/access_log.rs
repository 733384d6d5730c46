//! Request log entries and the sinks that receive them.

use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use axum::http::StatusCode;

use crate::http::context::RequestContext;
use crate::store::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One structured log line about a request.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub status_code: u16,
    pub duration: Option<Duration>,
    pub remote_addr: Option<SocketAddr>,
    pub request_id: Option<String>,
    pub method: String,
    pub path: String,
    pub user_id: Option<UserId>,
}

impl LogEntry {
    /// Build an entry from everything the context knows about the request.
    pub fn new(
        level: LogLevel,
        message: impl Into<String>,
        ctx: &RequestContext,
        status: StatusCode,
    ) -> Self {
        Self {
            level,
            message: message.into(),
            status_code: status.as_u16(),
            duration: None,
            remote_addr: ctx.remote_addr(),
            request_id: ctx.request_id().map(|id| id.to_string()),
            method: ctx.method().to_string(),
            path: ctx.path().to_string(),
            user_id: ctx.user_id(),
        }
    }

    /// Attach the time the request took.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Receives request log entries.
pub trait AccessLog: Send + Sync {
    fn record(&self, entry: &LogEntry);
}

/// Forwards entries to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAccessLog;

impl AccessLog for TracingAccessLog {
    fn record(&self, entry: &LogEntry) {
        let remote_addr = entry
            .remote_addr
            .map(|a| a.to_string())
            .unwrap_or_default();
        let request_id = entry.request_id.as_deref().unwrap_or_default();
        let duration_ms = entry.duration.map(|d| d.as_secs_f64() * 1000.0);
        let user_id = entry.user_id.map(|u| u.0);

        macro_rules! emit {
            ($level:ident) => {
                tracing::$level!(
                    status_code = entry.status_code,
                    duration_ms,
                    remote_addr = %remote_addr,
                    request_id = %request_id,
                    method = %entry.method,
                    path = %entry.path,
                    user_id,
                    "{}",
                    entry.message
                )
            };
        }

        match entry.level {
            LogLevel::Info => emit!(info),
            LogLevel::Warn => emit!(warn),
            LogLevel::Error => emit!(error),
        }
    }
}

/// Keeps entries in memory. Useful for inspecting what a pipeline logged.
#[derive(Debug, Default)]
pub struct MemoryAccessLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryAccessLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry recorded so far, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .expect("access log mutex poisoned")
            .clone()
    }

    /// Entries carrying the given request id.
    pub fn for_request(&self, request_id: &str) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.request_id.as_deref() == Some(request_id))
            .collect()
    }
}

impl AccessLog for MemoryAccessLog {
    fn record(&self, entry: &LogEntry) {
        self.entries
            .lock()
            .expect("access log mutex poisoned")
            .push(entry.clone());
    }
}
