//! Request side of an exchange.
use bytes::Bytes;
use tokio::sync::oneshot;

use crate::body::BodyStream;
use crate::codec::RequestHead;
use crate::error::ProtocolError;
use crate::headers::HeaderMap;
use crate::http::{Cookie, Method, Version};
use crate::session::{SESSION_COOKIE_NAME, SESSION_URL_PARAMETER};

/// An inbound HTTP request with its streamed body.
#[derive(Debug)]
pub struct Request {
    head: RequestHead,
    path: String,
    query: Option<String>,
    cookies: Vec<Cookie>,
    session_id: Option<String>,
    session_from_url: bool,
    body: BodyStream,
    form: Option<oneshot::Receiver<Result<FormData, ProtocolError>>>,
}

impl Request {
    pub(crate) fn new(
        head: RequestHead,
        body: BodyStream,
        form: Option<oneshot::Receiver<Result<FormData, ProtocolError>>>,
    ) -> Request {
        let (raw_path, query) = match head.target().split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (head.target(), None),
        };
        let (path, url_session_id) = strip_session_param(raw_path);

        let mut cookies = Vec::new();
        for value in head.headers().get_all("cookie") {
            if let Some(value) = value.try_as_str() {
                cookies.extend(Cookie::parse_header(value));
            }
        }

        let cookie_session_id = cookies
            .iter()
            .find(|c| c.name() == SESSION_COOKIE_NAME)
            .map(|c| c.value().to_owned());
        let session_from_url = cookie_session_id.is_none() && url_session_id.is_some();
        let session_id = cookie_session_id.or(url_session_id);

        Request { head, path, query, cookies, session_id, session_from_url, body, form }
    }

    /// Returns the request method.
    #[inline]
    pub fn method(&self) -> Method {
        self.head.method()
    }

    /// Returns the request path, query and session parameter removed.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string, if any.
    #[inline]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the raw request target as received.
    #[inline]
    pub fn target(&self) -> &str {
        self.head.target()
    }

    /// Returns the request version.
    #[inline]
    pub fn version(&self) -> Version {
        self.head.version()
    }

    /// Returns reference to the headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        self.head.headers()
    }

    /// Returns the parsed request cookies.
    #[inline]
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Returns the `content-type` header, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.head.content_type()
    }

    /// Returns the session id the client presented, if any.
    ///
    /// The cookie takes precedence over the URL parameter.
    #[inline]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Returns `true` if the session id came from the URL parameter rather
    /// than a cookie.
    #[inline]
    pub fn session_from_url(&self) -> bool {
        self.session_from_url
    }

    /// Returns the request body stream.
    #[inline]
    pub fn body(&mut self) -> &mut BodyStream {
        &mut self.body
    }

    pub(crate) fn body_ref(&self) -> &BodyStream {
        &self.body
    }

    /// Await the decoded form parameters.
    ///
    /// Returns `None` when no form decoder matched the request, or on a
    /// repeated call.
    pub async fn form(&mut self) -> Option<Result<FormData, ProtocolError>> {
        let rx = self.form.take()?;
        Some(rx.await.unwrap_or(Err(ProtocolError::UnexpectedEof)))
    }
}

/// Remove the session path parameter, returning the clean path and the id.
///
/// The parameter only counts inside the path, e.g: `/cart;sessionid=abc`.
fn strip_session_param(path: &str) -> (String, Option<String>) {
    let marker = format!(";{SESSION_URL_PARAMETER}=");
    let Some(at) = path.find(&marker) else {
        return (path.to_owned(), None);
    };
    let rest = &path[at + marker.len()..];
    let value_end = rest.find(['/', ';']).unwrap_or(rest.len());
    let value = &rest[..value_end];
    let mut clean = String::with_capacity(path.len());
    clean.push_str(&path[..at]);
    clean.push_str(&rest[value_end..]);
    let id = if value.is_empty() { None } else { Some(value.to_owned()) };
    (clean, id)
}

// ===== forms =====

/// Decoded form parameters.
#[derive(Debug, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    /// Returns the first value for the given field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// Returns all values for the given field.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.fields.iter().filter(move |(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// Iterate over all fields in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no field was decoded.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Incremental form body decoder.
pub trait FormDecoder: Send + 'static {
    /// Feed a chunk of body payload.
    fn offer(&mut self, chunk: Bytes) -> Result<(), ProtocolError>;

    /// Consume the decoder once the body is complete.
    fn finish(self: Box<Self>) -> Result<FormData, ProtocolError>;
}

/// Picks a form decoder per request based on its head.
pub trait DecoderFactory: Send + Sync + 'static {
    /// Returns a decoder when the request should be form decoded.
    fn decoder_for(&self, head: &RequestHead) -> Option<Box<dyn FormDecoder>>;
}

/// Decoder for `application/x-www-form-urlencoded` bodies.
///
/// Bodies above 1 MiB are rejected.
#[derive(Debug, Default)]
pub struct UrlFormDecoder {
    buf: Vec<u8>,
}

const MAX_FORM: usize = 1024 * 1024;

impl UrlFormDecoder {
    /// The content type this decoder handles.
    pub const CONTENT_TYPE: &'static str = "application/x-www-form-urlencoded";
}

impl FormDecoder for UrlFormDecoder {
    fn offer(&mut self, chunk: Bytes) -> Result<(), ProtocolError> {
        if self.buf.len() + chunk.len() > MAX_FORM {
            return Err(ProtocolError::BodyTooLarge);
        }
        self.buf.extend_from_slice(&chunk);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<FormData, ProtocolError> {
        let mut fields = Vec::new();
        for pair in self.buf.split(|&b| b == b'&') {
            if pair.is_empty() {
                continue;
            }
            let (name, value) = match pair.iter().position(|&b| b == b'=') {
                Some(at) => (&pair[..at], &pair[at + 1..]),
                None => (pair, &pair[pair.len()..]),
            };
            fields.push((percent_decode(name)?, percent_decode(value)?));
        }
        Ok(FormData { fields })
    }
}

/// A [`DecoderFactory`] recognizing urlencoded POST bodies.
#[derive(Debug, Default)]
pub struct UrlFormFactory;

impl DecoderFactory for UrlFormFactory {
    fn decoder_for(&self, head: &RequestHead) -> Option<Box<dyn FormDecoder>> {
        let content_type = head.content_type()?;
        let mime = content_type.split(';').next().unwrap_or(content_type).trim();
        if mime.eq_ignore_ascii_case(UrlFormDecoder::CONTENT_TYPE) {
            Some(Box::new(UrlFormDecoder::default()))
        } else {
            None
        }
    }
}

/// Decode `%xx` escapes and `+` as space.
fn percent_decode(input: &[u8]) -> Result<String, ProtocolError> {
    let mut out = Vec::with_capacity(input.len());
    let mut iter = input.iter();
    while let Some(&b) = iter.next() {
        match b {
            b'+' => out.push(b' '),
            b'%' => {
                let hi = iter.next().and_then(|&b| (b as char).to_digit(16));
                let lo = iter.next().and_then(|&b| (b as char).to_digit(16));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => out.push((hi * 16 + lo) as u8),
                    _ => return Err(ProtocolError::InvalidForm),
                }
            }
            _ => out.push(b),
        }
    }
    String::from_utf8(out).map_err(|_| ProtocolError::InvalidForm)
}
