//! Request logging interceptor.

use std::sync::Arc;

use crate::http::chain::Interceptor;
use crate::http::handler::Handler;
use crate::observability::{metrics, AccessLog, LogEntry, LogLevel};

/// Logs one entry per request once the response is known: status code,
/// duration, peer, request id, method and path.
pub struct RequestLogger {
    log: Arc<dyn AccessLog>,
}

impl RequestLogger {
    /// Create a logger writing to `log`.
    pub fn new(log: Arc<dyn AccessLog>) -> Self {
        Self { log }
    }
}

impl Interceptor for RequestLogger {
    fn wrap(&self, next: Handler) -> Handler {
        let log = self.log.clone();
        Handler::new(move |ctx, request| {
            let next = next.clone();
            let log = log.clone();
            async move {
                let logged = ctx.clone();

                let response = next.run(ctx, request).await;

                let duration = logged.elapsed();
                metrics::record_request(response.status().as_u16(), duration);
                log.record(
                    &LogEntry::new(LogLevel::Info, "Log request", &logged, response.status())
                        .with_duration(duration),
                );
                response
            }
        })
    }
}
