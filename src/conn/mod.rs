//! Connection lifecycle.
//!
//! Each connection runs one task that reads request heads, then for every
//! exchange spawns the dispatch task and concurrently pumps decoded body
//! chunks in while draining response frames out. The two halves meet only
//! through channels, so a slow handler never stalls the socket reader and
//! vice versa.
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};

use crate::body;
use crate::codec::{self, BodyDecoder, BodyEvent, parse_head};
use crate::engine::AppShared;
use crate::error::ProtocolError;
use crate::exchange::Exchange;
use crate::http::{Method, StatusCode};
use crate::log::{debug, warning};
use crate::request::Request;
use crate::response::{Framing, OutFrame, Response};

mod dispatch;
mod error;

pub(crate) use error::ConnError;


/// Drive a connection to completion, logging any failure.
pub(crate) async fn serve<IO>(io: IO, app: Arc<AppShared>)
where
    IO: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    if let Err(_err) = try_serve(io, app).await {
        warning!("connection error: {_err}");
    }
}

async fn try_serve<IO>(io: IO, app: Arc<AppShared>) -> Result<(), ConnError>
where
    IO: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (mut reader, mut writer) = tokio::io::split(io);
    let mut buf = BytesMut::with_capacity(1024);

    loop {
        // ===== request head =====

        let head = loop {
            match parse_head(&mut buf, app.config.max_head_bytes) {
                Ok(Some(head)) => break head,
                Ok(None) => {}
                Err(err) => {
                    reject(&mut writer, status_for(&err)).await?;
                    return Err(ConnError::Protocol(err));
                }
            }
            if buf.is_empty() {
                // idle between requests, bounded by the keep alive timeout
                let read = tokio::time::timeout(
                    app.config.keep_alive_timeout,
                    reader.read_buf(&mut buf),
                );
                match read.await {
                    Ok(Ok(0)) => return Ok(()),
                    Ok(Ok(_)) => {}
                    Ok(Err(err)) => return Err(ConnError::Io(err)),
                    Err(_elapsed) => return Ok(()),
                }
            } else if reader.read_buf(&mut buf).await? == 0 {
                return Err(ConnError::Protocol(ProtocolError::UnexpectedEof));
            }
        };

        let keep_alive = head.keep_alive();
        let head_request = head.method() == Method::HEAD;
        let host = head.host().map(str::to_owned);
        debug!("{} {}", head.method(), head.target());

        if head.expect_continue() {
            writer.write_all(b"HTTP/1.1 100 Continue\r\n\r\n").await?;
            writer.flush().await?;
        }

        let mut decoder = match BodyDecoder::from_head(&head) {
            Ok(decoder) => decoder,
            Err(err) => {
                reject(&mut writer, status_for(&err)).await?;
                return Err(ConnError::Protocol(err));
            }
        };

        // ===== exchange setup =====

        let mut form_decoder = app.decoders.as_ref().and_then(|d| d.decoder_for(&head));
        let mut form_tx = None;
        let form_rx = if form_decoder.is_some() {
            let (tx, rx) = oneshot::channel();
            form_tx = Some(tx);
            Some(rx)
        } else {
            None
        };

        let (mut body_tx, body_rx) = body::channel(app.config.body_watermark);
        let request = Request::new(head, body_rx, form_rx);
        let (frame_tx, mut frame_rx) = mpsc::channel(8);
        let mut response = Response::new(frame_tx, keep_alive, head_request, host);
        let _ = response.set_buffer_size(app.config.buffer_size);

        let mut exchange = Exchange::new(request, response, app.sessions.clone());
        exchange.resolve_session();
        let dispatched = tokio::spawn(dispatch::run(exchange, app.clone()));

        // ===== pump body in, drain frames out =====

        let pump = async {
            let result = loop {
                match decoder.decode(&mut buf) {
                    Ok(Some(BodyEvent::Data(chunk))) => {
                        if let Some(form) = form_decoder.as_mut() {
                            if let Err(err) = form.offer(chunk.clone()) {
                                form_decoder = None;
                                if let Some(tx) = form_tx.take() {
                                    let _ = tx.send(Err(err));
                                }
                            }
                        }
                        body_tx.offer(chunk).await;
                    }
                    Ok(Some(BodyEvent::End)) => {
                        body_tx.finish();
                        if let Some(form) = form_decoder.take() {
                            if let Some(tx) = form_tx.take() {
                                let _ = tx.send(form.finish());
                            }
                        }
                        break Ok(());
                    }
                    Ok(None) => match reader.read_buf(&mut buf).await {
                        Ok(0) => break Err(ConnError::Protocol(ProtocolError::UnexpectedEof)),
                        Ok(_) => {}
                        Err(err) => break Err(ConnError::Io(err)),
                    },
                    Err(err) => break Err(ConnError::Protocol(err)),
                }
            };
            if result.is_err() {
                // wake a handler blocked on the body or the form
                body_tx.abort();
                drop(form_tx.take());
            }
            result
        };

        let drain = async {
            let result = async {
                let mut framing = None;
                let mut body_allowed = true;
                loop {
                    match frame_rx.recv().await {
                        Some(OutFrame::Head { bytes, framing: head_framing, body_allowed: allowed }) => {
                            writer.write_all(&bytes).await?;
                            framing = Some(head_framing);
                            body_allowed = allowed;
                        }
                        Some(OutFrame::Data(data)) => {
                            if !body_allowed || data.is_empty() {
                                continue;
                            }
                            if framing == Some(Framing::Chunked) {
                                let mut size = BytesMut::with_capacity(18);
                                codec::encode_chunk_head(data.len(), &mut size);
                                writer.write_all(&size).await?;
                                writer.write_all(&data).await?;
                                writer.write_all(codec::CHUNK_END).await?;
                            } else {
                                writer.write_all(&data).await?;
                            }
                        }
                        Some(OutFrame::End { close }) => {
                            if body_allowed && framing == Some(Framing::Chunked) {
                                writer.write_all(codec::LAST_CHUNK).await?;
                            }
                            writer.flush().await?;
                            return Ok(close);
                        }
                        None => return Err(ConnError::Dispatch),
                    }
                }
            }
            .await;
            if result.is_err() {
                // wake a dispatch task blocked on a full frame channel
                frame_rx.close();
            }
            result
        };

        let (pump_result, drain_result) = tokio::join!(pump, drain);
        let _ = dispatched.await;

        let close = drain_result?;
        pump_result?;
        if close {
            return Ok(());
        }
    }
}

/// Write a minimal error response before giving up on the connection.
async fn reject<W>(writer: &mut W, status: StatusCode) -> Result<(), ConnError>
where
    W: AsyncWrite + Unpin,
{
    let head = format!(
        "HTTP/1.1 {} {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        status.status(),
        status.reason(),
    );
    writer.write_all(head.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

fn status_for(err: &ProtocolError) -> StatusCode {
    match err {
        ProtocolError::HeadTooLarge => StatusCode::HEADER_FIELDS_TOO_LARGE,
        ProtocolError::UnsupportedVersion | ProtocolError::UnknownCoding => {
            StatusCode::NOT_IMPLEMENTED
        }
        ProtocolError::InvalidContentLength => StatusCode::LENGTH_REQUIRED,
        ProtocolError::BodyTooLarge | ProtocolError::ChunkTooLarge => {
            StatusCode::PAYLOAD_TOO_LARGE
        }
        _ => StatusCode::BAD_REQUEST,
    }
}
