use bytes::{Buf, BytesMut};

use super::BodyEvent;
use crate::error::ProtocolError;

/// Longest accepted chunk size line, extensions included.
const MAX_SIZE_LINE: usize = 256;

/// Largest accepted single chunk.
const MAX_CHUNK: u64 = 16 * 1024 * 1024;

/// Incremental `Transfer-Encoding: chunked` decoder.
///
/// Chunk extensions are skipped, trailer fields are discarded.
#[derive(Debug)]
pub struct ChunkedDecoder {
    state: State,
}

#[derive(Debug)]
enum State {
    Size,
    Data(u64),
    DataEnd,
    Trailer,
    Eof,
}

impl ChunkedDecoder {
    pub(crate) const fn new() -> ChunkedDecoder {
        ChunkedDecoder { state: State::Size }
    }

    /// Decode the next body event from the buffer.
    ///
    /// Returns `Ok(None)` when more input is required.
    pub fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<BodyEvent>, ProtocolError> {
        loop {
            match &mut self.state {
                State::Size => {
                    let Some(line_end) = find_crlf(buf) else {
                        if buf.len() > MAX_SIZE_LINE {
                            return Err(ProtocolError::InvalidChunk);
                        }
                        return Ok(None);
                    };
                    let size = parse_size(&buf[..line_end])?;
                    buf.advance(line_end + 2);
                    if size > MAX_CHUNK {
                        return Err(ProtocolError::ChunkTooLarge);
                    }
                    self.state = if size == 0 { State::Trailer } else { State::Data(size) };
                }
                State::Data(remaining) => {
                    if buf.is_empty() {
                        return Ok(None);
                    }
                    let take = (*remaining).min(buf.len() as u64) as usize;
                    *remaining -= take as u64;
                    if *remaining == 0 {
                        self.state = State::DataEnd;
                    }
                    return Ok(Some(BodyEvent::Data(buf.split_to(take).freeze())));
                }
                State::DataEnd => {
                    if buf.len() < 2 {
                        return Ok(None);
                    }
                    if &buf[..2] != b"\r\n" {
                        return Err(ProtocolError::InvalidChunk);
                    }
                    buf.advance(2);
                    self.state = State::Size;
                }
                State::Trailer => {
                    let Some(line_end) = find_crlf(buf) else {
                        return Ok(None);
                    };
                    buf.advance(line_end + 2);
                    if line_end == 0 {
                        self.state = State::Eof;
                        return Ok(Some(BodyEvent::End));
                    }
                }
                State::Eof => return Ok(Some(BodyEvent::End)),
            }
        }
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Parse the hex size from a size line, ignoring chunk extensions.
fn parse_size(line: &[u8]) -> Result<u64, ProtocolError> {
    let digits = match line.iter().position(|&b| b == b';') {
        Some(at) => &line[..at],
        None => line,
    };
    if digits.is_empty() {
        return Err(ProtocolError::InvalidChunk);
    }
    let mut size = 0u64;
    for &b in digits {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return Err(ProtocolError::InvalidChunk),
        };
        size = size
            .checked_mul(16)
            .and_then(|s| s.checked_add(digit as u64))
            .ok_or(ProtocolError::ChunkTooLarge)?;
    }
    Ok(size)
}
