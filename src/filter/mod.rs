//! Request handlers and the filter chain around them.
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::BoxError;
use crate::exchange::Exchange;


/// An owned, boxed future, as returned by [`Handler`] and [`Filter`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Terminal request handler.
pub trait Handler: Send + Sync + 'static {
    /// Handle one exchange.
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a, Result<(), BoxError>>;
}

/// Middleware wrapped around every handler.
///
/// A filter decides whether the exchange proceeds by calling
/// [`FilterChain::next`]. Not calling it short circuits the chain, the
/// response the filter produced is sent as is.
pub trait Filter: Send + Sync + 'static {
    /// Process one exchange, delegating to `chain` to continue.
    fn call<'a>(
        &'a self,
        exchange: &'a mut Exchange,
        chain: FilterChain,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

/// One pass through the registered filters ending at a handler.
///
/// The chain is consumed by [`next`](FilterChain::next), each invocation
/// advances to the following filter.
pub struct FilterChain {
    filters: Arc<[Arc<dyn Filter>]>,
    handler: Arc<dyn Handler>,
    cursor: usize,
}

impl FilterChain {
    pub(crate) fn new(filters: Arc<[Arc<dyn Filter>]>, handler: Arc<dyn Handler>) -> FilterChain {
        FilterChain { filters, handler, cursor: 0 }
    }

    /// Run the next filter, or the handler once all filters have run.
    pub fn next<'a>(mut self, exchange: &'a mut Exchange) -> BoxFuture<'a, Result<(), BoxError>> {
        match self.filters.get(self.cursor).cloned() {
            Some(filter) => {
                self.cursor += 1;
                Box::pin(async move { filter.call(exchange, self).await })
            }
            None => {
                let handler = self.handler.clone();
                Box::pin(async move { handler.handle(exchange).await })
            }
        }
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filters.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

// ===== fn adapters =====

struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Exchange) -> BoxFuture<'a, Result<(), BoxError>>
        + Send
        + Sync
        + 'static,
{
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a, Result<(), BoxError>> {
        (self.0)(exchange)
    }
}

/// Create a [`Handler`] from a closure returning a boxed future.
pub fn handler_fn<F>(f: F) -> Arc<dyn Handler>
where
    F: for<'a> Fn(&'a mut Exchange) -> BoxFuture<'a, Result<(), BoxError>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnHandler(f))
}

struct FnFilter<F>(F);

impl<F> Filter for FnFilter<F>
where
    F: for<'a> Fn(&'a mut Exchange, FilterChain) -> BoxFuture<'a, Result<(), BoxError>>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        exchange: &'a mut Exchange,
        chain: FilterChain,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        (self.0)(exchange, chain)
    }
}

/// Create a [`Filter`] from a closure returning a boxed future.
pub fn filter_fn<F>(f: F) -> Arc<dyn Filter>
where
    F: for<'a> Fn(&'a mut Exchange, FilterChain) -> BoxFuture<'a, Result<(), BoxError>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnFilter(f))
}
