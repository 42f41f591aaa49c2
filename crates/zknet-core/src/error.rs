//! Shared error type across zknet crates.

use thiserror::Error;

/// Stable error-kind tags (the closed set a packed failure may carry).
///
/// Error values do not survive a context boundary, so failures travel as a
/// `(kind, message)` pair and the receiving side rebuilds from this finite
/// mapping. An unknown tag degrades to a generic error carrying the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport is not open; nothing was sent.
    NotOpen,
    /// Call went unanswered past its deadline.
    Timeout,
    /// Socket closed while the call was in flight.
    ConnectionClosed,
    /// Remote-reported JSON-RPC error.
    Rpc,
    /// Local client process is not running / not yet seen.
    ClientNotRunning,
    /// Client is running but not connected to a network.
    NetworkNotConnected,
    /// Walletshield listen address could not be parsed.
    BadListenAddress,
    /// Call name has no implementer on the bus.
    NoListener,
    /// Payload did not match its closed schema.
    BadMessage,
    /// HTTP fetch failed.
    Fetch,
    /// Internal error.
    Internal,
}

impl ErrorKind {
    /// String representation used in packed failures.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotOpen => "NOT_OPEN",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::ConnectionClosed => "CONNECTION_CLOSED",
            ErrorKind::Rpc => "RPC",
            ErrorKind::ClientNotRunning => "CLIENT_NOT_RUNNING",
            ErrorKind::NetworkNotConnected => "NETWORK_NOT_CONNECTED",
            ErrorKind::BadListenAddress => "BAD_LISTEN_ADDRESS",
            ErrorKind::NoListener => "NO_LISTENER",
            ErrorKind::BadMessage => "BAD_MESSAGE",
            ErrorKind::Fetch => "FETCH",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    /// Reverse lookup for a received tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "NOT_OPEN" => ErrorKind::NotOpen,
            "TIMEOUT" => ErrorKind::Timeout,
            "CONNECTION_CLOSED" => ErrorKind::ConnectionClosed,
            "RPC" => ErrorKind::Rpc,
            "CLIENT_NOT_RUNNING" => ErrorKind::ClientNotRunning,
            "NETWORK_NOT_CONNECTED" => ErrorKind::NetworkNotConnected,
            "BAD_LISTEN_ADDRESS" => ErrorKind::BadListenAddress,
            "NO_LISTENER" => ErrorKind::NoListener,
            "BAD_MESSAGE" => ErrorKind::BadMessage,
            "FETCH" => ErrorKind::Fetch,
            "INTERNAL" => ErrorKind::Internal,
            _ => return None,
        })
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ZknetError>;

/// Unified error type used by core and relay.
#[derive(Debug, Clone, Error)]
pub enum ZknetError {
    #[error("transport not open")]
    NotOpen,
    #[error("rpc call timed out: {0}")]
    Timeout(String),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("remote error: {0}")]
    Rpc(String),
    #[error("client is not running")]
    ClientNotRunning,
    #[error("network is not connected")]
    NetworkNotConnected,
    #[error("invalid listen address: {0}")]
    BadListenAddress(String),
    #[error("no listener for {0}")]
    NoListener(String),
    #[error("bad message: {0}")]
    BadMessage(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl ZknetError {
    /// Map to the stable kind tag.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ZknetError::NotOpen => ErrorKind::NotOpen,
            ZknetError::Timeout(_) => ErrorKind::Timeout,
            ZknetError::ConnectionClosed => ErrorKind::ConnectionClosed,
            ZknetError::Rpc(_) => ErrorKind::Rpc,
            ZknetError::ClientNotRunning => ErrorKind::ClientNotRunning,
            ZknetError::NetworkNotConnected => ErrorKind::NetworkNotConnected,
            ZknetError::BadListenAddress(_) => ErrorKind::BadListenAddress,
            ZknetError::NoListener(_) => ErrorKind::NoListener,
            ZknetError::BadMessage(_) => ErrorKind::BadMessage,
            ZknetError::Fetch(_) => ErrorKind::Fetch,
            ZknetError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The transmissible message: the payload for carrying variants, the
    /// display text for unit variants. `from_kind(kind(), message())`
    /// reproduces an observably equal error.
    pub fn message(&self) -> String {
        match self {
            ZknetError::Timeout(m)
            | ZknetError::Rpc(m)
            | ZknetError::BadListenAddress(m)
            | ZknetError::NoListener(m)
            | ZknetError::BadMessage(m)
            | ZknetError::Fetch(m)
            | ZknetError::Internal(m) => m.clone(),
            other => other.to_string(),
        }
    }

    /// Rebuild from a known kind; unit kinds ignore the message.
    pub fn from_kind(kind: ErrorKind, message: &str) -> Self {
        match kind {
            ErrorKind::NotOpen => ZknetError::NotOpen,
            ErrorKind::Timeout => ZknetError::Timeout(message.to_owned()),
            ErrorKind::ConnectionClosed => ZknetError::ConnectionClosed,
            ErrorKind::Rpc => ZknetError::Rpc(message.to_owned()),
            ErrorKind::ClientNotRunning => ZknetError::ClientNotRunning,
            ErrorKind::NetworkNotConnected => ZknetError::NetworkNotConnected,
            ErrorKind::BadListenAddress => ZknetError::BadListenAddress(message.to_owned()),
            ErrorKind::NoListener => ZknetError::NoListener(message.to_owned()),
            ErrorKind::BadMessage => ZknetError::BadMessage(message.to_owned()),
            ErrorKind::Fetch => ZknetError::Fetch(message.to_owned()),
            ErrorKind::Internal => ZknetError::Internal(message.to_owned()),
        }
    }

    /// Rebuild from a possibly-unknown tag; the message is always preserved.
    pub fn from_tag(tag: &str, message: &str) -> Self {
        match ErrorKind::from_tag(tag) {
            Some(kind) => ZknetError::from_kind(kind, message),
            None => ZknetError::Internal(message.to_owned()),
        }
    }
}
