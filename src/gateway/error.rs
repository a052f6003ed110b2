use std::io;
use thiserror::Error;

use super::constants::GatewayOpcode;

/// Shorthand result for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure of the gateway connection or protocol.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Establishing the WebSocket connection failed.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        /// What went wrong.
        message: String,
    },

    /// The gateway closed the connection.
    #[error("connection closed with code {code}: {reason}")]
    ConnectionClosed {
        /// The WebSocket close code.
        code: u16,
        /// The close reason sent by the gateway.
        reason: String,
    },

    /// A WebSocket-level failure.
    #[error("websocket error: {message}")]
    WebSocket {
        /// What went wrong.
        message: String,
    },

    /// The token was rejected during identify.
    #[error("authentication failed: {message}")]
    AuthenticationFailed {
        /// What went wrong.
        message: String,
    },

    /// The gateway invalidated the session.
    #[error("session invalidated, resumable: {resumable}")]
    SessionInvalidated {
        /// Whether the session can still be resumed.
        resumable: bool,
    },

    /// A heartbeat went unacknowledged for too long.
    #[error("heartbeat timeout: no acknowledgment received")]
    HeartbeatTimeout,

    /// Reconnection was attempted too many times.
    #[error("reconnection limit exceeded after {attempts} attempts")]
    ReconnectionLimitExceeded {
        /// How many attempts were made.
        attempts: u32,
    },

    /// The zlib stream could not be decompressed.
    #[error("compression error: {message}")]
    CompressionError {
        /// What went wrong.
        message: String,
    },

    /// A payload could not be serialized or deserialized.
    #[error("serialization error: {message}")]
    SerializationError {
        /// What went wrong.
        message: String,
    },

    /// The gateway sent an opcode that was not expected at this point.
    #[error("protocol error: unexpected opcode {opcode:?}")]
    UnexpectedOpcode {
        /// The offending opcode, if it was a known one.
        opcode: Option<GatewayOpcode>,
    },

    /// The gateway violated the protocol.
    #[error("protocol error: {message}")]
    ProtocolError {
        /// What went wrong.
        message: String,
    },

    /// An expected message did not arrive in time.
    #[error("timeout waiting for {operation}")]
    Timeout {
        /// What was being waited for.
        operation: String,
    },

    /// An internal channel was closed.
    #[error("channel closed")]
    ChannelClosed,

    /// An operation required an active connection.
    #[error("not connected to gateway")]
    NotConnected,

    /// A connection attempt was made while one is already active.
    #[error("already connecting or connected")]
    AlreadyConnected,

    /// The client is shutting down.
    #[error("gateway shutting down")]
    ShuttingDown,

    /// An I/O error from the underlying transport.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl GatewayError {
    /// A [`GatewayError::ConnectionFailed`] with the given message.
    #[must_use]
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    /// A [`GatewayError::WebSocket`] with the given message.
    #[must_use]
    pub fn websocket(message: impl Into<String>) -> Self {
        Self::WebSocket {
            message: message.into(),
        }
    }

    /// A [`GatewayError::AuthenticationFailed`] with the given message.
    #[must_use]
    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            message: message.into(),
        }
    }

    /// A [`GatewayError::CompressionError`] with the given message.
    #[must_use]
    pub fn compression(message: impl Into<String>) -> Self {
        Self::CompressionError {
            message: message.into(),
        }
    }

    /// A [`GatewayError::SerializationError`] with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// A [`GatewayError::ProtocolError`] with the given message.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }

    /// A [`GatewayError::Timeout`] for the given operation.
    #[must_use]
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Whether retrying could succeed at all.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::ConnectionClosed { .. }
                | Self::WebSocket { .. }
                | Self::HeartbeatTimeout
                | Self::SessionInvalidated { .. }
                | Self::Io(_)
        )
    }

    /// Whether the supervising loop should attempt another connection.
    #[must_use]
    pub const fn should_reconnect(&self) -> bool {
        match self {
            // A non-resumable invalidation already cleared the session,
            // so the next attempt identifies afresh.
            Self::SessionInvalidated { .. }
            | Self::ConnectionFailed { .. }
            | Self::ConnectionClosed { .. }
            | Self::WebSocket { .. }
            | Self::HeartbeatTimeout
            | Self::CompressionError { .. }
            | Self::Io(_) => true,

            Self::AuthenticationFailed { .. }
            | Self::ReconnectionLimitExceeded { .. }
            | Self::ShuttingDown
            | Self::NotConnected
            | Self::AlreadyConnected
            | Self::ProtocolError { .. }
            | Self::SerializationError { .. }
            | Self::UnexpectedOpcode { .. }
            | Self::ChannelClosed
            | Self::Timeout { .. } => false,
        }
    }

    /// Whether the session may still be resumable after this failure.
    #[must_use]
    pub const fn can_resume(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed { .. }
                | Self::WebSocket { .. }
                | Self::HeartbeatTimeout
                | Self::Io(_)
        )
    }

    /// The close code, for connection-closed errors.
    #[must_use]
    pub const fn close_code(&self) -> Option<u16> {
        if let Self::ConnectionClosed { code, .. } = self {
            Some(*code)
        } else {
            None
        }
    }
}

/// Close codes the gateway uses when ending a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum GatewayCloseCode {
    UnknownError = 4000,
    UnknownOpcode = 4001,
    DecodeError = 4002,
    NotAuthenticated = 4003,
    AuthenticationFailed = 4004,
    AlreadyAuthenticated = 4005,
    InvalidSequence = 4007,
    RateLimited = 4008,
    SessionTimedOut = 4009,
    InvalidShard = 4010,
    ShardingRequired = 4011,
    InvalidApiVersion = 4012,
    InvalidIntents = 4013,
    DisallowedIntents = 4014,
}

impl GatewayCloseCode {
    /// Maps a raw close code, if it is a known one.
    #[must_use]
    pub const fn from_u16(code: u16) -> Option<Self> {
        match code {
            4000 => Some(Self::UnknownError),
            4001 => Some(Self::UnknownOpcode),
            4002 => Some(Self::DecodeError),
            4003 => Some(Self::NotAuthenticated),
            4004 => Some(Self::AuthenticationFailed),
            4005 => Some(Self::AlreadyAuthenticated),
            4007 => Some(Self::InvalidSequence),
            4008 => Some(Self::RateLimited),
            4009 => Some(Self::SessionTimedOut),
            4010 => Some(Self::InvalidShard),
            4011 => Some(Self::ShardingRequired),
            4012 => Some(Self::InvalidApiVersion),
            4013 => Some(Self::InvalidIntents),
            4014 => Some(Self::DisallowedIntents),
            _ => None,
        }
    }

    /// Whether the session survives this close and can be resumed.
    #[must_use]
    pub const fn is_resumable(self) -> bool {
        matches!(
            self,
            Self::UnknownError
                | Self::UnknownOpcode
                | Self::DecodeError
                | Self::NotAuthenticated
                | Self::InvalidSequence
                | Self::RateLimited
                | Self::SessionTimedOut
        )
    }

    /// Whether reconnecting is pointless until the caller fixes something.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed
                | Self::InvalidShard
                | Self::ShardingRequired
                | Self::InvalidApiVersion
                | Self::InvalidIntents
                | Self::DisallowedIntents
        )
    }
}

impl From<GatewayCloseCode> for u16 {
    fn from(code: GatewayCloseCode) -> Self {
        code as Self
    }
}
