//! Ordered composition of interceptors.
//!
//! `build_chain([a, b, c]).then(h)` is `a(b(c(h)))`: the first interceptor
//! sees the request first and the response last. Any interceptor can answer
//! without calling `next`, in which case nothing after it runs.

use std::sync::Arc;

use crate::http::handler::Handler;

/// Something that wraps the next handler in the chain.
pub trait Interceptor: Send + Sync {
    fn wrap(&self, next: Handler) -> Handler;
}

/// An ordered list of interceptors.
#[derive(Clone, Default)]
pub struct Chain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

/// Compose interceptors in declaration order.
pub fn build_chain<I>(interceptors: I) -> Chain
where
    I: IntoIterator<Item = Arc<dyn Interceptor>>,
{
    Chain {
        interceptors: interceptors.into_iter().collect(),
    }
}

impl Chain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor; it runs after every one already present.
    pub fn with<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Wrap `terminal` so the first interceptor is outermost.
    pub fn then(&self, terminal: Handler) -> Handler {
        self.interceptors
            .iter()
            .rev()
            .fold(terminal, |next, interceptor| interceptor.wrap(next))
    }

    /// Number of interceptors in the chain.
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Whether the chain has no interceptors.
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl Interceptor for Chain {
    fn wrap(&self, next: Handler) -> Handler {
        self.then(next)
    }
}
