use std::time::Instant;

use super::constants::HEARTBEAT_TIMEOUT_MULTIPLIER;

/// Lifecycle of a gateway connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection is active.
    #[default]
    Disconnected,
    /// The WebSocket connection is being established.
    Connecting,
    /// Connected, waiting for the Hello payload.
    WaitingForHello,
    /// Identify was sent, waiting for Ready.
    Identifying,
    /// Resume was sent, waiting for Resumed.
    Resuming,
    /// The session is live and receiving dispatches.
    Connected,
    /// The client is shutting down.
    ShuttingDown,
}

impl ConnectionState {
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Connecting
                | Self::WaitingForHello
                | Self::Identifying
                | Self::Resuming
                | Self::Connected
        )
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::WaitingForHello => write!(f, "Waiting for Hello"),
            Self::Identifying => write!(f, "Identifying"),
            Self::Resuming => write!(f, "Resuming"),
            Self::Connected => write!(f, "Connected"),
            Self::ShuttingDown => write!(f, "Shutting Down"),
        }
    }
}

/// Mutable book-keeping of the gateway task: connection lifecycle and
/// heartbeat timing.
pub struct GatewayState {
    connection: ConnectionState,
    last_heartbeat_sent: Option<Instant>,
    last_heartbeat_ack: Option<Instant>,
    heartbeat_interval_ms: Option<u64>,
    latency_ms: Option<u64>,
}

impl GatewayState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            last_heartbeat_sent: None,
            last_heartbeat_ack: None,
            heartbeat_interval_ms: None,
            latency_ms: None,
        }
    }

    #[must_use]
    pub const fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub const fn transition_to_connecting(&mut self) {
        self.connection = ConnectionState::Connecting;
    }

    pub const fn transition_to_waiting_hello(&mut self) {
        self.connection = ConnectionState::WaitingForHello;
    }

    pub const fn transition_to_identifying(&mut self) {
        self.connection = ConnectionState::Identifying;
    }

    pub const fn transition_to_resuming(&mut self) {
        self.connection = ConnectionState::Resuming;
    }

    pub const fn transition_to_connected(&mut self) {
        self.connection = ConnectionState::Connected;
    }

    pub const fn transition_to_shutdown(&mut self) {
        self.connection = ConnectionState::ShuttingDown;
    }

    pub const fn set_heartbeat_interval(&mut self, interval_ms: u64) {
        self.heartbeat_interval_ms = Some(interval_ms);
    }

    #[must_use]
    pub const fn heartbeat_interval_ms(&self) -> Option<u64> {
        self.heartbeat_interval_ms
    }

    pub fn record_heartbeat_sent(&mut self) {
        self.last_heartbeat_sent = Some(Instant::now());
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn record_heartbeat_ack(&mut self) {
        let now = Instant::now();
        if let Some(sent) = self.last_heartbeat_sent {
            self.latency_ms = Some(now.duration_since(sent).as_millis() as u64);
        }
        self.last_heartbeat_ack = Some(now);
    }

    #[must_use]
    pub const fn latency_ms(&self) -> Option<u64> {
        self.latency_ms
    }

    /// Whether the last heartbeat has gone unacknowledged for longer than
    /// the tolerated window.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn is_heartbeat_overdue(&self) -> bool {
        let Some(interval) = self.heartbeat_interval_ms else {
            return false;
        };
        let timeout = interval as f64 * HEARTBEAT_TIMEOUT_MULTIPLIER;

        match (self.last_heartbeat_ack, self.last_heartbeat_sent) {
            (Some(ack), _) => ack.elapsed().as_millis() as f64 > timeout,
            (None, Some(sent)) => sent.elapsed().as_millis() as f64 > timeout,
            (None, None) => false,
        }
    }
}

impl Default for GatewayState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "Connected");
        assert_eq!(ConnectionState::WaitingForHello.to_string(), "Waiting for Hello");
    }

    #[test]
    fn test_connection_state_checks() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(ConnectionState::Identifying.is_active());
        assert!(!ConnectionState::Disconnected.is_active());
        assert!(!ConnectionState::ShuttingDown.is_active());
    }

    #[test]
    fn test_gateway_state_transitions() {
        let mut state = GatewayState::new();
        assert_eq!(state.connection(), ConnectionState::Disconnected);

        state.transition_to_connecting();
        assert_eq!(state.connection(), ConnectionState::Connecting);

        state.transition_to_connected();
        assert!(state.connection().is_connected());
    }

    #[test]
    fn test_heartbeat_latency_recorded() {
        let mut state = GatewayState::new();
        state.record_heartbeat_sent();
        state.record_heartbeat_ack();
        assert!(state.latency_ms().is_some());
    }

    #[test]
    fn test_heartbeat_not_overdue_without_interval() {
        let state = GatewayState::new();
        assert!(!state.is_heartbeat_overdue());
    }
}
