//! Engine construction and the running application handle.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::conn;
use crate::error::RouteError;
use crate::filter::{Filter, Handler};
use crate::log::{info, warning};
use crate::request::DecoderFactory;
use crate::route::{RouteTable, Routes};
use crate::server::{self, Listener};
use crate::session::SessionStore;

/// Engine tuning knobs.
#[derive(Clone, Debug)]
pub struct Config {
    /// Response buffer size before an automatic flush.
    pub buffer_size: usize,
    /// Buffered request body bytes before the reader is backpressured.
    pub body_watermark: usize,
    /// Largest accepted request head.
    pub max_head_bytes: usize,
    /// Default session inactivity timeout.
    pub session_timeout: Duration,
    /// Interval between expired session sweeps.
    pub sweep_interval: Duration,
    /// How long an idle keep alive connection is held open.
    pub keep_alive_timeout: Duration,
    /// Path prefix stripped from every request before routing.
    pub context_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            buffer_size: crate::response::DEFAULT_BUFFER_SIZE,
            body_watermark: 64 * 1024,
            max_head_bytes: 8 * 1024,
            session_timeout: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(60),
            keep_alive_timeout: Duration::from_secs(60),
            context_path: String::new(),
        }
    }
}

/// Builder for an [`App`].
pub struct Engine {
    config: Config,
    table: RouteTable,
    filters: Vec<(i32, Arc<dyn Filter>)>,
    decoders: Option<Arc<dyn DecoderFactory>>,
}

impl Engine {
    /// Create an engine with the given configuration.
    pub fn new(config: Config) -> Engine {
        let table = RouteTable::new(config.context_path.clone());
        Engine { config, table, filters: Vec::new(), decoders: None }
    }

    /// Register a handler under a URL pattern.
    ///
    /// Registering the same pattern twice is rejected.
    pub fn register_route(
        &mut self,
        pattern: &str,
        id: impl Into<Arc<str>>,
        handler: Arc<dyn Handler>,
    ) -> Result<&mut Engine, RouteError> {
        self.table.register(pattern, id, handler)?;
        Ok(self)
    }

    /// Register a filter, run around every handler.
    ///
    /// Filters run sorted by `order`, lowest first; equal orders keep
    /// their registration order.
    pub fn register_filter(&mut self, order: i32, filter: Arc<dyn Filter>) -> &mut Engine {
        self.filters.push((order, filter));
        self
    }

    /// Install a form decoder factory, e.g: [`UrlFormFactory`].
    ///
    /// [`UrlFormFactory`]: crate::request::UrlFormFactory
    pub fn decoder_factory(&mut self, factory: Arc<dyn DecoderFactory>) -> &mut Engine {
        self.decoders = Some(factory);
        self
    }

    /// Finalize into a running application handle.
    pub fn build(self) -> App {
        let mut filters = self.filters;
        filters.sort_by_key(|(order, _)| *order);
        App {
            inner: Arc::new(AppShared {
                routes: Routes::new(self.table),
                filters: filters.into_iter().map(|(_, filter)| filter).collect(),
                sessions: SessionStore::new(self.config.session_timeout),
                decoders: self.decoders,
                config: self.config,
                sweeping: AtomicBool::new(false),
            }),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("filters", &self.filters.len())
            .finish_non_exhaustive()
    }
}

pub(crate) struct AppShared {
    pub(crate) routes: Routes,
    pub(crate) filters: Arc<[Arc<dyn Filter>]>,
    pub(crate) sessions: SessionStore,
    pub(crate) decoders: Option<Arc<dyn DecoderFactory>>,
    pub(crate) config: Config,
    sweeping: AtomicBool,
}

/// A running application, cheap to clone.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppShared>,
}

impl App {
    /// Register a handler while the application is serving.
    ///
    /// Connections pick the new table up on their next exchange.
    pub fn register_route(
        &self,
        pattern: &str,
        id: impl Into<Arc<str>>,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        self.inner.routes.register(pattern, id, handler)
    }

    /// Returns the session store.
    #[inline]
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Accept connections from the listener forever.
    ///
    /// Accept errors are logged, the loop keeps going.
    pub async fn serve<L: Listener>(&self, listener: L) {
        self.start_sweeper();
        info!("serving");
        loop {
            match server::accept(&listener).await {
                Ok((stream, _addr)) => {
                    crate::log::debug!("accepted {_addr:?}");
                    tokio::spawn(conn::serve(stream, self.inner.clone()));
                }
                Err(_err) => {
                    warning!("accept error: {_err}");
                }
            }
        }
    }

    /// Drive a single already accepted connection.
    pub async fn serve_connection<IO>(&self, io: IO)
    where
        IO: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        self.start_sweeper();
        conn::serve(io, self.inner.clone()).await
    }

    fn start_sweeper(&self) {
        if !self.inner.sweeping.swap(true, Ordering::AcqRel) {
            let sessions = self.inner.sessions.clone();
            tokio::spawn(sessions.sweep_loop(self.inner.config.sweep_interval));
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.inner.routes)
            .field("filters", &self.inner.filters.len())
            .field("sessions", &self.inner.sessions.len())
            .finish()
    }
}
