//! Streamed request body.
//!
//! The connection task feeds decoded chunks through a [`ChunkSender`] while
//! the application consumes them from the paired [`BodyStream`]. The channel
//! applies backpressure once the buffered amount crosses its watermark.
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use bytes::{Buf, Bytes};

use crate::error::StreamError;


/// Callback interface for non-blocking body consumption.
///
/// At most one listener can be installed per stream. Callbacks run on the
/// task that produced the state change, so they must not block.
pub trait ReadListener: Send + Sync + 'static {
    /// Data became available after the stream was drained.
    fn on_data_available(&self);

    /// The final chunk has been buffered and consumed.
    fn on_all_data_read(&self);

    /// The connection failed before the body completed.
    fn on_error(&self, _error: StreamError) {}
}

/// Outcome of a non-blocking read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRead {
    /// Bytes were copied into the caller's buffer.
    Read(usize),
    /// No data is buffered right now.
    Empty,
    /// The body is complete.
    Finished,
}

struct State {
    chunks: VecDeque<Bytes>,
    buffered: usize,
    last: bool,
    aborted: bool,
    all_read_sent: bool,
    listener: Option<Arc<dyn ReadListener>>,
    read_waker: Option<Waker>,
    send_waker: Option<Waker>,
}

struct Shared {
    closed: AtomicBool,
    state: Mutex<State>,
}

/// Create a paired body channel with the given backpressure watermark.
pub fn channel(watermark: usize) -> (ChunkSender, BodyStream) {
    let shared = Arc::new(Shared {
        closed: AtomicBool::new(false),
        state: Mutex::new(State {
            chunks: VecDeque::new(),
            buffered: 0,
            last: false,
            aborted: false,
            all_read_sent: false,
            listener: None,
            read_waker: None,
            send_waker: None,
        }),
    });
    (
        ChunkSender { shared: shared.clone(), watermark, finished: false },
        BodyStream { shared },
    )
}

// ===== BodyStream =====

/// Consumer half of the body channel.
///
/// Closing is idempotent. All reads after [`close`] fail with
/// [`StreamError::Closed`].
///
/// [`close`]: BodyStream::close
pub struct BodyStream {
    shared: Arc<Shared>,
}

impl BodyStream {
    /// Returns `true` if a read would complete without waiting.
    pub fn is_ready(&self) -> bool {
        if self.shared.closed.load(Ordering::Acquire) {
            return true;
        }
        let state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        !state.chunks.is_empty() || state.last || state.aborted
    }

    /// Returns `true` once the final chunk has been consumed, or after the
    /// stream was closed.
    pub fn is_finished(&self) -> bool {
        if self.shared.closed.load(Ordering::Acquire) {
            return true;
        }
        let state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        state.last && state.chunks.is_empty()
    }

    /// Returns the number of buffered bytes.
    pub fn available(&self) -> usize {
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner()).buffered
    }

    /// Install a read listener for push style consumption.
    ///
    /// If data is already buffered, or the body already completed, the
    /// matching callback fires immediately.
    pub fn set_read_listener(&self, listener: Arc<dyn ReadListener>) -> Result<(), StreamError> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(StreamError::Closed);
        }
        let notify = {
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.listener.is_some() {
                return Err(StreamError::ListenerAlreadySet);
            }
            state.listener = Some(listener.clone());
            if !state.chunks.is_empty() {
                Some(Notify::DataAvailable)
            } else if state.last && !state.all_read_sent {
                state.all_read_sent = true;
                Some(Notify::AllDataRead)
            } else if state.aborted {
                Some(Notify::Error)
            } else {
                None
            }
        };
        match notify {
            Some(Notify::DataAvailable) => listener.on_data_available(),
            Some(Notify::AllDataRead) => listener.on_all_data_read(),
            Some(Notify::Error) => listener.on_error(StreamError::Aborted),
            None => {}
        }
        Ok(())
    }

    /// Try to read buffered bytes without waiting.
    pub fn try_read(&self, buf: &mut [u8]) -> Result<TryRead, StreamError> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(StreamError::Closed);
        }
        let (result, notify) = {
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.chunks.is_empty() {
                if state.aborted {
                    return Err(StreamError::Aborted);
                }
                if state.last {
                    (Ok(TryRead::Finished), state.finish_notify())
                } else {
                    (Ok(TryRead::Empty), None)
                }
            } else {
                let read = state.copy_into(buf);
                state.wake_sender();
                let notify = if state.chunks.is_empty() { state.finish_notify() } else { None };
                (Ok(TryRead::Read(read)), notify)
            }
        };
        if let Some(listener) = notify {
            listener.on_all_data_read();
        }
        result
    }

    /// Read into the buffer, waiting for data when none is buffered.
    ///
    /// Returns `Ok(0)` once the body is complete.
    pub async fn read(&self, buf: &mut [u8]) -> Result<usize, StreamError> {
        std::future::poll_fn(|cx| self.poll_read(cx, buf)).await
    }

    /// Poll based variant of [`read`](BodyStream::read).
    pub fn poll_read(&self, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<Result<usize, StreamError>> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Poll::Ready(Err(StreamError::Closed));
        }
        let (result, notify) = {
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.chunks.is_empty() {
                if state.aborted {
                    return Poll::Ready(Err(StreamError::Aborted));
                }
                if state.last {
                    (Poll::Ready(Ok(0)), state.finish_notify())
                } else {
                    state.read_waker = Some(cx.waker().clone());
                    return Poll::Pending;
                }
            } else {
                let read = state.copy_into(buf);
                state.wake_sender();
                let notify = if state.chunks.is_empty() { state.finish_notify() } else { None };
                (Poll::Ready(Ok(read)), notify)
            }
        };
        if let Some(listener) = notify {
            listener.on_all_data_read();
        }
        result
    }

    /// Discard up to `n` buffered bytes, returning how many were dropped.
    pub fn skip(&self, n: usize) -> usize {
        if self.shared.closed.load(Ordering::Acquire) {
            return 0;
        }
        let (skipped, notify) = {
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            let mut remaining = n;
            while remaining > 0 {
                let Some(mut chunk) = state.chunks.pop_front() else { break };
                let take = remaining.min(chunk.len());
                chunk.advance(take);
                state.buffered -= take;
                remaining -= take;
                if !chunk.is_empty() {
                    state.chunks.push_front(chunk);
                }
            }
            state.wake_sender();
            let notify = if state.chunks.is_empty() { state.finish_notify() } else { None };
            (n - remaining, notify)
        };
        if let Some(listener) = notify {
            listener.on_all_data_read();
        }
        skipped
    }

    /// Close the stream, discarding any buffered data.
    ///
    /// Closing twice is a no-op. A producer blocked on backpressure is
    /// released, its further chunks are silently dropped.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        state.chunks.clear();
        state.buffered = 0;
        state.listener = None;
        if let Some(waker) = state.read_waker.take() {
            waker.wake();
        }
        if let Some(waker) = state.send_waker.take() {
            waker.wake();
        }
    }
}

impl futures_core::Stream for BodyStream {
    type Item = Result<Bytes, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Poll::Ready(None);
        }
        let (result, notify) = {
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            match state.chunks.pop_front() {
                Some(chunk) => {
                    state.buffered -= chunk.len();
                    state.wake_sender();
                    let notify =
                        if state.chunks.is_empty() { state.finish_notify() } else { None };
                    (Poll::Ready(Some(Ok(chunk))), notify)
                }
                None if state.aborted => (Poll::Ready(Some(Err(StreamError::Aborted))), None),
                None if state.last => (Poll::Ready(None), state.finish_notify()),
                None => {
                    state.read_waker = Some(cx.waker().clone());
                    return Poll::Pending;
                }
            }
        };
        if let Some(listener) = notify {
            listener.on_all_data_read();
        }
        result
    }
}

impl Drop for BodyStream {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("BodyStream")
            .field("available", &self.available())
            .field("finished", &self.is_finished())
            .finish()
    }
}

// ===== ChunkSender =====

/// Producer half of the body channel.
///
/// Dropping the sender without [`finish`] marks the body as aborted.
///
/// [`finish`]: ChunkSender::finish
pub struct ChunkSender {
    shared: Arc<Shared>,
    watermark: usize,
    finished: bool,
}

impl ChunkSender {
    /// Buffer a chunk for the consumer, waiting while the watermark is
    /// exceeded.
    ///
    /// Chunks offered to a closed stream are silently dropped.
    pub async fn offer(&mut self, chunk: Bytes) {
        if chunk.is_empty() || self.shared.closed.load(Ordering::Acquire) {
            return;
        }
        let notify = {
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            let was_empty = state.chunks.is_empty();
            state.buffered += chunk.len();
            state.chunks.push_back(chunk);
            if let Some(waker) = state.read_waker.take() {
                waker.wake();
            }
            if was_empty { state.listener.clone() } else { None }
        };
        if let Some(listener) = notify {
            listener.on_data_available();
        }
        std::future::poll_fn(|cx| {
            if self.shared.closed.load(Ordering::Acquire) {
                return Poll::Ready(());
            }
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.buffered <= self.watermark {
                Poll::Ready(())
            } else {
                state.send_waker = Some(cx.waker().clone());
                Poll::Pending
            }
        })
        .await;
    }

    /// Mark the body as complete.
    pub fn finish(&mut self) {
        self.finished = true;
        let notify = {
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            state.last = true;
            if let Some(waker) = state.read_waker.take() {
                waker.wake();
            }
            if state.chunks.is_empty() { state.finish_notify() } else { None }
        };
        if let Some(listener) = notify {
            listener.on_all_data_read();
        }
    }

    /// Mark the body as failed.
    pub fn abort(&mut self) {
        self.finished = true;
        let notify = {
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            state.aborted = true;
            if let Some(waker) = state.read_waker.take() {
                waker.wake();
            }
            state.listener.clone()
        };
        if let Some(listener) = notify {
            listener.on_error(StreamError::Aborted);
        }
    }
}

impl Drop for ChunkSender {
    fn drop(&mut self) {
        if !self.finished {
            self.abort();
        }
    }
}

impl std::fmt::Debug for ChunkSender {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ChunkSender")
            .field("watermark", &self.watermark)
            .field("finished", &self.finished)
            .finish()
    }
}

// ===== State =====

enum Notify {
    DataAvailable,
    AllDataRead,
    Error,
}

impl State {
    /// Copy buffered bytes into `buf`, consuming what fits.
    fn copy_into(&mut self, buf: &mut [u8]) -> usize {
        let mut read = 0;
        while read < buf.len() {
            let Some(mut chunk) = self.chunks.pop_front() else { break };
            let take = chunk.len().min(buf.len() - read);
            buf[read..read + take].copy_from_slice(&chunk[..take]);
            chunk.advance(take);
            self.buffered -= take;
            read += take;
            if !chunk.is_empty() {
                self.chunks.push_front(chunk);
            }
        }
        read
    }

    fn wake_sender(&mut self) {
        if let Some(waker) = self.send_waker.take() {
            waker.wake();
        }
    }

    /// Returns the listener if the final chunk was just drained and the
    /// completion callback has not fired yet.
    fn finish_notify(&mut self) -> Option<Arc<dyn ReadListener>> {
        if self.last && !self.all_read_sent {
            self.all_read_sent = true;
            self.listener.clone()
        } else {
            None
        }
    }
}
