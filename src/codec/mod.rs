//! HTTP/1.1 wire codec.
//!
//! Head parsing is delegated to [`httparse`], body framing is decoded here.
use bytes::{Buf, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::headers::{HeaderMap, HeaderValue};
use crate::http::{Method, Version};

mod chunked;

pub use chunked::ChunkedDecoder;

#[cfg(test)]
mod test;

const MAX_HEADERS: usize = 64;

/// Parsed request line and headers.
#[derive(Debug)]
pub struct RequestHead {
    method: Method,
    target: String,
    version: Version,
    headers: HeaderMap,
}

impl RequestHead {
    /// Returns the request method.
    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns the raw request target, e.g: `/index?q=1`.
    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the request version.
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns reference to the headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the `host` header, if any.
    pub fn host(&self) -> Option<&str> {
        self.headers.get("host").and_then(HeaderValue::try_as_str)
    }

    /// Returns the `content-type` header, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").and_then(HeaderValue::try_as_str)
    }

    /// Returns `true` if the client asked for `100 Continue`.
    pub fn expect_continue(&self) -> bool {
        self.headers
            .get("expect")
            .and_then(HeaderValue::try_as_str)
            .is_some_and(|v| v.eq_ignore_ascii_case("100-continue"))
    }

    /// Returns `true` if the connection should be kept open after the
    /// exchange completes.
    ///
    /// HTTP/1.0 connections always close.
    pub fn keep_alive(&self) -> bool {
        if self.version == Version::HTTP_10 {
            return false;
        }
        match self.headers.get("connection").and_then(HeaderValue::try_as_str) {
            Some(conn) => !conn.eq_ignore_ascii_case("close"),
            None => true,
        }
    }
}

/// Try to parse a request head from the buffer.
///
/// Returns `Ok(None)` when the buffer does not yet contain a full head. On
/// success the head bytes are consumed from the buffer.
pub fn parse_head(buf: &mut BytesMut, max: usize) -> Result<Option<RequestHead>, ProtocolError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);

    let len = match req.parse(buf)? {
        httparse::Status::Complete(len) => len,
        httparse::Status::Partial => {
            if buf.len() > max {
                return Err(ProtocolError::HeadTooLarge);
            }
            return Ok(None);
        }
    };

    if len > max {
        return Err(ProtocolError::HeadTooLarge);
    }

    let method = req
        .method
        .and_then(|m| Method::from_bytes(m.as_bytes()))
        .ok_or(ProtocolError::InvalidHead)?;
    let target = req.path.ok_or(ProtocolError::InvalidHead)?.to_owned();
    let version = match req.version {
        Some(0) => Version::HTTP_10,
        Some(1) => Version::HTTP_11,
        _ => return Err(ProtocolError::UnsupportedVersion),
    };

    let mut map = HeaderMap::with_capacity(req.headers.len());
    for header in req.headers.iter() {
        map.append(
            crate::headers::HeaderName::from_string(header.name),
            HeaderValue::copy_from_slice(header.value),
        );
    }

    buf.advance(len);

    Ok(Some(RequestHead { method, target, version, headers: map }))
}

/// Decoded piece of a request body.
#[derive(Debug, PartialEq, Eq)]
pub enum BodyEvent {
    /// A chunk of body payload.
    Data(Bytes),
    /// The body is complete.
    End,
}

/// Incremental request body decoder.
///
/// Framing is negotiated from the request head, then [`decode`] is fed the
/// connection buffer until it yields [`BodyEvent::End`].
///
/// [`decode`]: BodyDecoder::decode
#[derive(Debug)]
pub struct BodyDecoder {
    coding: Coding,
}

#[derive(Debug)]
enum Coding {
    Empty,
    Fixed(u64),
    Chunked(ChunkedDecoder),
}

impl BodyDecoder {
    /// Negotiate body framing from the request head.
    pub fn from_head(head: &RequestHead) -> Result<BodyDecoder, ProtocolError> {
        let headers = head.headers();
        let mut chunked = false;

        for value in headers.get_all("transfer-encoding") {
            let value = value.try_as_str().ok_or(ProtocolError::UnknownCoding)?;
            for coding in value.split(',') {
                // chunked must be the final coding, and it is the only one
                // supported, so anything else is rejected outright
                if !coding.trim().eq_ignore_ascii_case("chunked") {
                    return Err(ProtocolError::UnknownCoding);
                }
                chunked = true;
            }
        }

        let mut content_length = None;
        for value in headers.get_all("content-length") {
            let value = value
                .try_as_str()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .ok_or(ProtocolError::InvalidContentLength)?;
            match content_length {
                None => content_length = Some(value),
                Some(prev) if prev == value => {}
                Some(_) => return Err(ProtocolError::InvalidContentLength),
            }
        }

        let coding = match (content_length, chunked) {
            (Some(_), true) => return Err(ProtocolError::ConflictingCodings),
            (None, true) => Coding::Chunked(ChunkedDecoder::new()),
            (Some(0), false) => Coding::Empty,
            (Some(len), false) => Coding::Fixed(len),
            (None, false) => Coding::Empty,
        };

        Ok(BodyDecoder { coding })
    }

    /// Returns `true` if the request carries no body at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.coding, Coding::Empty)
    }

    /// Decode the next body event from the buffer.
    ///
    /// Returns `Ok(None)` when more input is required.
    pub fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<BodyEvent>, ProtocolError> {
        match &mut self.coding {
            Coding::Empty => Ok(Some(BodyEvent::End)),
            Coding::Fixed(0) => Ok(Some(BodyEvent::End)),
            Coding::Fixed(remaining) => {
                if buf.is_empty() {
                    return Ok(None);
                }
                let take = (*remaining).min(buf.len() as u64) as usize;
                *remaining -= take as u64;
                Ok(Some(BodyEvent::Data(buf.split_to(take).freeze())))
            }
            Coding::Chunked(chunked) => chunked.decode(buf),
        }
    }
}

/// Write a chunk size line, e.g: `1a\r\n`.
pub(crate) fn encode_chunk_head(len: usize, buf: &mut BytesMut) {
    use std::fmt::Write;
    let _ = write!(buf, "{len:x}\r\n");
}

/// Terminal chunk of a chunked response body.
pub(crate) const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

/// Trailing CRLF after each chunk payload.
pub(crate) const CHUNK_END: &[u8] = b"\r\n";
