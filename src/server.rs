//! Accept source abstraction.
use std::io;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite};

/// A source of accepted connections.
///
/// Implemented for tokio's TCP and Unix listeners, custom transports can
/// plug in by implementing it themselves.
pub trait Listener {
    /// The accepted stream type.
    type Stream: AsyncRead + AsyncWrite + Send + Unpin + 'static;

    /// The peer address type.
    type Addr: std::fmt::Debug;

    /// Poll for the next inbound connection.
    fn poll_accept(&self, cx: &mut Context<'_>) -> Poll<io::Result<(Self::Stream, Self::Addr)>>;
}

impl Listener for tokio::net::TcpListener {
    type Stream = tokio::net::TcpStream;
    type Addr = std::net::SocketAddr;

    fn poll_accept(&self, cx: &mut Context<'_>) -> Poll<io::Result<(Self::Stream, Self::Addr)>> {
        tokio::net::TcpListener::poll_accept(self, cx)
    }
}

#[cfg(unix)]
impl Listener for tokio::net::UnixListener {
    type Stream = tokio::net::UnixStream;
    type Addr = tokio::net::unix::SocketAddr;

    fn poll_accept(&self, cx: &mut Context<'_>) -> Poll<io::Result<(Self::Stream, Self::Addr)>> {
        tokio::net::UnixListener::poll_accept(self, cx)
    }
}

/// Await the next inbound connection.
pub(crate) async fn accept<L: Listener>(listener: &L) -> io::Result<(L::Stream, L::Addr)> {
    std::future::poll_fn(|cx| listener.poll_accept(cx)).await
}
