//! Error types shared across the engine.
use std::fmt;

/// Type erased error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ===== Protocol Error =====

/// Wire-level error, fatal to the connection that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// Malformed request line or header section.
    InvalidHead,
    /// Request head exceeds the configured limit.
    HeadTooLarge,
    /// Unsupported HTTP version.
    UnsupportedVersion,
    /// Missing, conflicting or unparsable `content-length`.
    InvalidContentLength,
    /// Both `content-length` and `transfer-encoding` present.
    ConflictingCodings,
    /// A transfer coding other than `chunked`.
    UnknownCoding,
    /// Malformed chunked framing.
    InvalidChunk,
    /// Chunk size beyond what this engine accepts.
    ChunkTooLarge,
    /// Submitted form body exceeds the decoder limit.
    BodyTooLarge,
    /// Malformed form payload.
    InvalidForm,
    /// Connection closed before the message was complete.
    UnexpectedEof,
}

impl std::error::Error for ProtocolError { }

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHead => f.write_str("invalid request head"),
            Self::HeadTooLarge => f.write_str("request head too large"),
            Self::UnsupportedVersion => f.write_str("unsupported http version"),
            Self::InvalidContentLength => f.write_str("invalid content length"),
            Self::ConflictingCodings => f.write_str("conflicting message codings"),
            Self::UnknownCoding => f.write_str("unknown transfer coding"),
            Self::InvalidChunk => f.write_str("invalid chunked framing"),
            Self::ChunkTooLarge => f.write_str("chunk too large"),
            Self::BodyTooLarge => f.write_str("form body too large"),
            Self::InvalidForm => f.write_str("invalid form payload"),
            Self::UnexpectedEof => f.write_str("connection closed mid message"),
        }
    }
}

impl From<httparse::Error> for ProtocolError {
    #[inline]
    fn from(_: httparse::Error) -> Self {
        Self::InvalidHead
    }
}

// ===== Stream Error =====

/// Stream contract violation, reported to the caller and never to the peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamError {
    /// Operation on a closed stream.
    Closed,
    /// The peer reset the connection mid exchange.
    Aborted,
    /// Mutation attempted after the response was committed.
    Committed,
    /// A read listener is already installed.
    ListenerAlreadySet,
    /// The text writer was already requested for this response.
    WriterAlreadyTaken,
    /// The byte output stream was already requested for this response.
    StreamAlreadyTaken,
    /// Buffer size change after bytes were buffered.
    BufferInUse,
}

impl std::error::Error for StreamError { }

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("stream is closed"),
            Self::Aborted => f.write_str("aborted by peer"),
            Self::Committed => f.write_str("response already committed"),
            Self::ListenerAlreadySet => f.write_str("read listener already set"),
            Self::WriterAlreadyTaken => f.write_str("writer already taken"),
            Self::StreamAlreadyTaken => f.write_str("output stream already taken"),
            Self::BufferInUse => f.write_str("buffer already in use"),
        }
    }
}

// ===== Route Error =====

/// Configuration-time routing error, surfaced to the embedding host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteError {
    /// The pattern collides with an already registered one of the same class.
    DuplicatePattern(String),
}

impl std::error::Error for RouteError { }

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicatePattern(pattern) => write!(f, "duplicate url pattern: {pattern:?}"),
        }
    }
}
