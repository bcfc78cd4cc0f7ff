//! Embedded HTTP/1.1 application serving engine.
//!
//! `portico` hosts application handlers behind a small HTTP/1.1 front:
//! requests are matched against a URL pattern table, wrapped in a filter
//! chain, given streamed request bodies with backpressure, buffered
//! response output and an in-memory session store.
//!
//! # Example
//!
//! ```no_run
//! use portico::{App, BoxError, BoxFuture, Config, Engine, Exchange, handler_fn};
//!
//! fn hello(ex: &mut Exchange) -> BoxFuture<'_, Result<(), BoxError>> {
//!     Box::pin(async move {
//!         let res = ex.response_mut();
//!         res.set_content_type("text/plain");
//!         res.writer()?.write_str("hello").await?;
//!         Ok(())
//!     })
//! }
//!
//! # async fn serve() -> Result<(), BoxError> {
//! let mut engine = Engine::new(Config::default());
//! engine.register_route("/hello", "hello", handler_fn(hello))?;
//! let app: App = engine.build();
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! app.serve(listener).await;
//! # Ok(())
//! # }
//! ```
#![warn(missing_debug_implementations)]
mod log;

mod conn;
mod engine;
mod server;

pub mod body;
pub mod codec;
pub mod error;
pub mod exchange;
pub mod filter;
pub mod headers;
pub mod http;
pub mod request;
pub mod response;
pub mod route;
pub mod session;

pub use engine::{App, Config, Engine};
pub use error::BoxError;
pub use exchange::Exchange;
pub use filter::{BoxFuture, Filter, FilterChain, Handler, filter_fn, handler_fn};
pub use server::Listener;
