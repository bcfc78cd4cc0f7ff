//! Response side of an exchange.
//!
//! Response state accumulates until the first flush commits it, rendering
//! the head. After commit the status and headers are frozen and later
//! setter calls are silently ignored.
use std::sync::Arc;
use std::time::SystemTime;

use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc;

use crate::error::StreamError;
use crate::headers::HeaderMap;
use crate::http::{Cookie, StatusCode, Version};
use crate::session::{SESSION_COOKIE_NAME, Session};

mod output;

pub use output::{Output, Writer};

#[cfg(test)]
mod test;

/// Default response buffer size.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Largest accepted response buffer size.
pub const MAX_BUFFER_SIZE: usize = 4 * 1024 * 1024;

const SERVER_NAME: &str = concat!("portico/", env!("CARGO_PKG_VERSION"));

/// Body framing chosen at commit time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Framing {
    Fixed(u64),
    Chunked,
}

/// A frame handed from the exchange to the connection writer.
#[derive(Debug)]
pub(crate) enum OutFrame {
    Head { bytes: Bytes, framing: Framing, body_allowed: bool },
    Data(Bytes),
    End { close: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BodyMode {
    Unset,
    Stream,
    Writer,
}

/// An outbound HTTP response.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    content_type: Option<String>,
    charset: Option<String>,
    cookies: Vec<Cookie>,
    declared_len: Option<u64>,
    session: Option<Arc<Session>>,
    host: Option<String>,
    keep_alive: bool,
    head_request: bool,
    body_mode: BodyMode,
    buffer: BytesMut,
    buffer_size: usize,
    committed: bool,
    closed: bool,
    aborted: bool,
    body_allowed: bool,
    tx: mpsc::Sender<OutFrame>,
}

impl Response {
    pub(crate) fn new(
        tx: mpsc::Sender<OutFrame>,
        keep_alive: bool,
        head_request: bool,
        host: Option<String>,
    ) -> Response {
        Response {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            content_type: None,
            charset: None,
            cookies: Vec::new(),
            declared_len: None,
            session: None,
            host,
            keep_alive,
            head_request,
            body_mode: BodyMode::Unset,
            buffer: BytesMut::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            committed: false,
            closed: false,
            aborted: false,
            body_allowed: true,
            tx,
        }
    }

    /// Returns the current status.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Set the status. Ignored once committed.
    pub fn set_status(&mut self, status: StatusCode) {
        if !self.committed {
            self.status = status;
        }
    }

    /// Returns reference to the headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set a header, replacing previous values. Ignored once committed.
    ///
    /// `content-type` and `content-length` are routed to their dedicated
    /// state so commit renders them once.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        if self.committed {
            return;
        }
        let value = value.into();
        if name.eq_ignore_ascii_case("content-type") {
            self.set_full_content_type(&value);
        } else if name.eq_ignore_ascii_case("content-length") {
            if let Ok(len) = value.trim().parse() {
                self.declared_len = Some(len);
            }
        } else {
            self.headers.insert(crate::headers::HeaderName::from_string(name), value);
        }
    }

    /// Add a header, keeping previous values. Ignored once committed.
    pub fn add_header(&mut self, name: &str, value: impl Into<String>) {
        if self.committed {
            return;
        }
        self.headers
            .append(crate::headers::HeaderName::from_string(name), value.into());
    }

    /// Returns the content type, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Set the content type, e.g: `text/html`. Ignored once committed.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        if !self.committed {
            self.set_full_content_type(&content_type.into());
        }
    }

    fn set_full_content_type(&mut self, value: &str) {
        match value.split_once(';') {
            Some((mime, params)) => {
                self.content_type = Some(mime.trim().to_owned());
                if let Some(cs) = params.trim().strip_prefix("charset=") {
                    self.charset = Some(cs.trim().to_owned());
                }
            }
            None => self.content_type = Some(value.trim().to_owned()),
        }
    }

    /// Set the character encoding appended to the content type.
    pub fn set_charset(&mut self, charset: impl Into<String>) {
        if !self.committed {
            self.charset = Some(charset.into());
        }
    }

    /// Declare the body length up front. Ignored once committed.
    pub fn set_content_length(&mut self, len: u64) {
        if !self.committed {
            self.declared_len = Some(len);
        }
    }

    /// Add a cookie to be set on the client. Ignored once committed.
    pub fn add_cookie(&mut self, cookie: Cookie) {
        if !self.committed {
            self.cookies.push(cookie);
        }
    }

    /// Returns `true` once the head has been rendered and sent.
    #[inline]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Returns the buffer size the body accumulates into before an
    /// automatic flush.
    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Change the buffer size.
    ///
    /// Fails once committed or after body bytes were buffered. Sizes above
    /// 4 MiB are clamped.
    pub fn set_buffer_size(&mut self, size: usize) -> Result<(), StreamError> {
        if self.committed {
            return Err(StreamError::Committed);
        }
        if !self.buffer.is_empty() {
            return Err(StreamError::BufferInUse);
        }
        self.buffer_size = size.min(MAX_BUFFER_SIZE);
        Ok(())
    }

    /// Discard buffered body bytes. Fails once committed.
    pub fn reset_buffer(&mut self) -> Result<(), StreamError> {
        if self.committed {
            return Err(StreamError::Committed);
        }
        self.buffer.clear();
        Ok(())
    }

    /// Send an error response with an empty body and end the exchange.
    ///
    /// Fails with [`StreamError::Committed`] if the head already went out.
    pub async fn send_error(&mut self, status: StatusCode) -> Result<(), StreamError> {
        if self.committed {
            return Err(StreamError::Committed);
        }
        self.status = status;
        self.buffer.clear();
        self.declared_len = Some(0);
        self.finish().await
    }

    /// Send a `302 Found` redirect and end the exchange.
    ///
    /// Fails with [`StreamError::Committed`] if the head already went out.
    pub async fn send_redirect(&mut self, location: &str) -> Result<(), StreamError> {
        if self.committed {
            return Err(StreamError::Committed);
        }
        self.status = StatusCode::FOUND;
        self.headers.insert("location", location.to_owned());
        self.buffer.clear();
        self.declared_len = Some(0);
        self.finish().await
    }

    /// Returns the byte oriented body stream.
    ///
    /// Fails if [`writer`](Response::writer) was already taken.
    pub fn output(&mut self) -> Result<Output<'_>, StreamError> {
        match self.body_mode {
            BodyMode::Writer => Err(StreamError::WriterAlreadyTaken),
            _ => {
                self.body_mode = BodyMode::Stream;
                Ok(Output { response: self })
            }
        }
    }

    /// Returns the text oriented body writer.
    ///
    /// Fails if [`output`](Response::output) was already taken.
    pub fn writer(&mut self) -> Result<Writer<'_>, StreamError> {
        match self.body_mode {
            BodyMode::Stream => Err(StreamError::StreamAlreadyTaken),
            _ => {
                self.body_mode = BodyMode::Writer;
                Ok(Writer { inner: Output { response: self } })
            }
        }
    }

    pub(crate) fn set_session(&mut self, session: Arc<Session>) {
        self.session = Some(session);
    }

    /// Gracefully end the body, committing first when needed.
    ///
    /// Ending twice is a no-op.
    pub(crate) async fn finish(&mut self) -> Result<(), StreamError> {
        if self.closed || self.aborted {
            return Ok(());
        }
        if !self.committed {
            self.declared_len = Some(self.declared_len.unwrap_or(self.buffer.len() as u64));
        }
        self.commit().await?;
        self.flush_data().await?;
        self.closed = true;
        self.send(OutFrame::End { close: !self.keep_alive }).await
    }

    pub(crate) fn abort(&mut self) {
        self.aborted = true;
        self.closed = true;
    }

    /// Render and send the head. Committing twice is a no-op.
    async fn commit(&mut self) -> Result<(), StreamError> {
        if self.committed {
            return Ok(());
        }
        self.committed = true;
        self.body_allowed = !self.head_request && self.status.body_allowed();
        let framing = if self.status.body_allowed() {
            match self.declared_len {
                Some(len) => Framing::Fixed(len),
                None => Framing::Chunked,
            }
        } else {
            Framing::Fixed(0)
        };
        let bytes = self.render_head(framing);
        let body_allowed = self.body_allowed;
        self.send(OutFrame::Head { bytes, framing, body_allowed }).await
    }

    /// Send buffered body bytes, committing first when needed.
    async fn flush_data(&mut self) -> Result<(), StreamError> {
        self.commit().await?;
        if self.buffer.is_empty() {
            return Ok(());
        }
        let data = self.buffer.split().freeze();
        if self.body_allowed {
            self.send(OutFrame::Data(data)).await?;
        }
        Ok(())
    }

    async fn send(&mut self, frame: OutFrame) -> Result<(), StreamError> {
        if self.aborted {
            return Err(StreamError::Aborted);
        }
        if self.tx.send(frame).await.is_err() {
            self.abort();
            return Err(StreamError::Aborted);
        }
        Ok(())
    }

    fn render_head(&mut self, framing: Framing) -> Bytes {
        let mut head = BytesMut::with_capacity(256);
        let mut itoa = itoa::Buffer::new();

        head.extend_from_slice(Version::HTTP_11.as_str().as_bytes());
        head.extend_from_slice(b" ");
        head.extend_from_slice(itoa.format(self.status.status()).as_bytes());
        head.extend_from_slice(b" ");
        head.extend_from_slice(self.status.reason().as_bytes());
        head.extend_from_slice(b"\r\n");

        head.extend_from_slice(b"date: ");
        head.extend_from_slice(httpdate::fmt_http_date(SystemTime::now()).as_bytes());
        head.extend_from_slice(b"\r\nserver: ");
        head.extend_from_slice(SERVER_NAME.as_bytes());
        head.extend_from_slice(b"\r\n");

        if let Some(content_type) = &self.content_type {
            head.extend_from_slice(b"content-type: ");
            head.extend_from_slice(content_type.as_bytes());
            if let Some(charset) = &self.charset {
                head.extend_from_slice(b"; charset=");
                head.extend_from_slice(charset.as_bytes());
            }
            head.extend_from_slice(b"\r\n");
        }

        for (name, value) in self.headers.iter() {
            head.extend_from_slice(name.as_str().as_bytes());
            head.extend_from_slice(b": ");
            head.extend_from_slice(value.as_bytes());
            head.extend_from_slice(b"\r\n");
        }

        if let Some(session) = &self.session {
            if session.is_new() {
                let mut cookie = Cookie::new(SESSION_COOKIE_NAME, session.id());
                cookie.set_path("/");
                cookie.set_http_only(true);
                if let Some(host) = &self.host {
                    let domain = host.split(':').next().unwrap_or(host);
                    cookie.set_domain(domain);
                }
                head.extend_from_slice(b"set-cookie: ");
                head.extend_from_slice(cookie.render().as_bytes());
                head.extend_from_slice(b"\r\n");
                session.set_old();
            }
        }
        for cookie in &self.cookies {
            head.extend_from_slice(b"set-cookie: ");
            head.extend_from_slice(cookie.render().as_bytes());
            head.extend_from_slice(b"\r\n");
        }

        match framing {
            Framing::Fixed(len) => {
                head.extend_from_slice(b"content-length: ");
                head.extend_from_slice(itoa.format(len).as_bytes());
                head.extend_from_slice(b"\r\n");
            }
            Framing::Chunked => {
                head.extend_from_slice(b"transfer-encoding: chunked\r\n");
            }
        }
        if !self.keep_alive {
            head.extend_from_slice(b"connection: close\r\n");
        }
        head.extend_from_slice(b"\r\n");
        head.freeze()
    }
}
