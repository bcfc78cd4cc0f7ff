use super::Response;
use crate::error::StreamError;

/// Byte oriented response body stream.
///
/// Bytes accumulate in the response buffer and are flushed automatically
/// when it fills, or explicitly through [`flush`](Output::flush). The first
/// flush commits the response.
#[derive(Debug)]
pub struct Output<'a> {
    pub(super) response: &'a mut Response,
}

impl Output<'_> {
    /// Append bytes to the body.
    pub async fn write(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        if self.response.closed {
            return Err(StreamError::Closed);
        }
        if self.response.aborted {
            return Err(StreamError::Aborted);
        }
        self.response.buffer.extend_from_slice(buf);
        if self.response.buffer.len() >= self.response.buffer_size {
            self.response.flush_data().await?;
        }
        Ok(())
    }

    /// Flush buffered bytes, committing the response if needed.
    ///
    /// An uncommitted response without a declared length commits as chunked
    /// here, so an explicit early flush gives up the computed
    /// `content-length`.
    pub async fn flush(&mut self) -> Result<(), StreamError> {
        if self.response.closed {
            return Err(StreamError::Closed);
        }
        self.response.flush_data().await
    }

    /// End the body.
    ///
    /// When nothing was flushed yet the whole body is still buffered, so it
    /// goes out with an exact `content-length`. Closing twice is a no-op.
    pub async fn close(&mut self) -> Result<(), StreamError> {
        self.response.finish().await
    }
}

/// Text oriented response body writer.
#[derive(Debug)]
pub struct Writer<'a> {
    pub(super) inner: Output<'a>,
}

impl Writer<'_> {
    /// Append a string to the body.
    pub async fn write_str(&mut self, s: &str) -> Result<(), StreamError> {
        self.inner.write(s.as_bytes()).await
    }

    /// Flush buffered bytes, committing the response if needed.
    pub async fn flush(&mut self) -> Result<(), StreamError> {
        self.inner.flush().await
    }

    /// End the body.
    pub async fn close(&mut self) -> Result<(), StreamError> {
        self.inner.close().await
    }
}
