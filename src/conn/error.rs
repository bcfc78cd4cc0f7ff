use crate::error::ProtocolError;

/// Reason a connection was torn down.
#[derive(Debug)]
pub(crate) enum ConnError {
    /// The socket failed.
    Io(std::io::Error),
    /// The peer violated the protocol.
    Protocol(ProtocolError),
    /// The dispatch task went away without finishing the response.
    Dispatch,
}

impl From<std::io::Error> for ConnError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ProtocolError> for ConnError {
    fn from(err: ProtocolError) -> Self {
        Self::Protocol(err)
    }
}

impl std::error::Error for ConnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Protocol(err) => Some(err),
            Self::Dispatch => None,
        }
    }
}

impl std::fmt::Display for ConnError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Protocol(err) => write!(f, "protocol error: {err}"),
            Self::Dispatch => f.write_str("dispatch task dropped the response"),
        }
    }
}
