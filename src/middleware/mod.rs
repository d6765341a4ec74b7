//! Middleware layer.
//!
//! A [`Filter`] turns a handler into another handler. Filters are applied
//! when a route is registered, not per request: the router folds its current
//! [`FilterChain`] around the raw handler once and stores the result.
//!
//! The first filter added is the outermost wrapper. With `[F1, F2]`:
//!
//! ```text
//! request  → F1 → F2 → handler
//! response ← F1 ← F2 ← handler
//! ```
//!
//! Built-in filters:
//! - [`Cors`] — preflight short-circuit and origin headers
//! - [`Logging`] — per-request start/finish events with latency
//! - [`ErrorHandling`] — failures and panics become a 500 JSON body
//! - [`CorrelationId`] — propagate or mint a per-request identifier
//! - [`BearerAuth`] — reject requests without an accepted bearer token

use std::sync::Arc;

use crate::handler::BoxedHandler;

mod auth;
mod correlation;
mod cors;
mod error_handling;
mod logging;

pub use auth::BearerAuth;
pub use correlation::CorrelationId;
pub use cors::Cors;
pub use error_handling::ErrorHandling;
pub use logging::Logging;

/// A handler-to-handler transform.
pub trait Filter: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

/// A type-erased filter, cheap to clone into child routers.
pub type BoxedFilter = Arc<dyn Filter>;

/// Builds a filter from a closure.
///
/// ```rust
/// use std::sync::Arc;
/// use switchyard::{Request, handler, middleware};
///
/// let tag = middleware::from_fn(|next| {
///     handler::boxed(move |req: Request| {
///         let next = Arc::clone(&next);
///         async move { next.call(req).await.map(|res| res.with_header("x-tag", "1")) }
///     })
/// });
/// ```
pub fn from_fn<F>(f: F) -> FnFilter<F>
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    FnFilter(f)
}

pub struct FnFilter<F>(F);

impl<F> Filter for FnFilter<F>
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        (self.0)(next)
    }
}

/// Ordered list of filters.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<BoxedFilter>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: BoxedFilter) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Wraps `handler` so that the first filter in the chain is outermost.
    pub fn apply(&self, handler: BoxedHandler) -> BoxedHandler {
        self.filters.iter().rev().fold(handler, |inner, filter| filter.wrap(inner))
    }
}

impl Extend<BoxedFilter> for FilterChain {
    fn extend<I: IntoIterator<Item = BoxedFilter>>(&mut self, iter: I) {
        self.filters.extend(iter);
    }
}
