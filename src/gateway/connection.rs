use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use super::codec::{EventParser, GatewayCodec};
use super::constants::{
    CONNECTION_TIMEOUT, GATEWAY_QUERY, GATEWAY_URL, GatewayOpcode, HELLO_TIMEOUT, IDENTIFY_TIMEOUT,
};
use super::error::{GatewayError, GatewayResult};
use super::events::{DispatchEvent, GatewayEvent};
use super::payloads::{GatewayMessage, GatewayPayload};
use super::session::SessionInfo;
use super::state::GatewayState;
use crate::models::GatewayIntents;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, WsMessage>;
type WsReader = SplitStream<WsStream>;

/// Transport seam for the gateway, so the protocol handler can be
/// driven by a fake connection in tests.
#[async_trait]
pub trait GatewayConnection: Send + Sync {
    async fn connect(&mut self, gateway_url: Option<&str>) -> GatewayResult<()>;
    async fn disconnect(&mut self) -> GatewayResult<()>;
    async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()>;
    async fn receive(&mut self) -> GatewayResult<Option<GatewayMessage>>;
    fn is_connected(&self) -> bool;
}

/// WebSocket transport with zlib-stream decoding.
pub struct WebSocketConnection {
    writer: Option<WsWriter>,
    reader: Option<WsReader>,
    codec: GatewayCodec,
    connected: bool,
}

impl WebSocketConnection {
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: None,
            reader: None,
            codec: GatewayCodec::new(),
            connected: false,
        }
    }

    async fn connect_internal(&mut self, url: &str) -> GatewayResult<()> {
        let (ws_stream, _) = timeout(CONNECTION_TIMEOUT, connect_async(url))
            .await
            .map_err(|_| GatewayError::timeout("connection"))?
            .map_err(|e| GatewayError::connection_failed(e.to_string()))?;

        let (writer, reader) = ws_stream.split();
        self.writer = Some(writer);
        self.reader = Some(reader);
        self.connected = true;
        self.codec.reset();

        Ok(())
    }
}

impl Default for WebSocketConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GatewayConnection for WebSocketConnection {
    async fn connect(&mut self, gateway_url: Option<&str>) -> GatewayResult<()> {
        // Resume URLs from READY come without query parameters.
        let url = gateway_url.map_or_else(
            || GATEWAY_URL.to_string(),
            |base| format!("{base}/{GATEWAY_QUERY}"),
        );
        self.connect_internal(&url).await
    }

    async fn disconnect(&mut self) -> GatewayResult<()> {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.close().await;
        }
        self.reader = None;
        self.connected = false;
        self.codec.reset();
        debug!("WebSocket connection closed");
        Ok(())
    }

    async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()> {
        let writer = self.writer.as_mut().ok_or(GatewayError::NotConnected)?;

        let json = serde_json::to_string(payload)
            .map_err(|e| GatewayError::serialization(e.to_string()))?;

        writer
            .send(WsMessage::Text(json.into()))
            .await
            .map_err(|e| GatewayError::websocket(e.to_string()))?;

        Ok(())
    }

    async fn receive(&mut self) -> GatewayResult<Option<GatewayMessage>> {
        let reader = self.reader.as_mut().ok_or(GatewayError::NotConnected)?;

        loop {
            match reader.next().await {
                Some(Ok(WsMessage::Binary(data))) => {
                    if let Some(json) = self.codec.decode_binary(&data)? {
                        return EventParser::parse_message(&json).map(Some);
                    }
                }
                Some(Ok(WsMessage::Text(text))) => {
                    return EventParser::parse_message(&text).map(Some);
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    self.connected = false;
                    let (code, reason) = frame.map_or_else(
                        || (1000, "Normal closure".to_string()),
                        |f| (f.code.into(), f.reason.to_string()),
                    );

                    return Err(GatewayError::ConnectionClosed { code, reason });
                }
                Some(Ok(WsMessage::Ping(data))) => {
                    if let Some(writer) = self.writer.as_mut() {
                        let _ = writer.send(WsMessage::Pong(data)).await;
                    }
                }
                Some(Ok(WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                Some(Err(e)) => {
                    self.connected = false;
                    return Err(GatewayError::websocket(e.to_string()));
                }
                None => {
                    self.connected = false;
                    return Err(GatewayError::ConnectionClosed {
                        code: 1000,
                        reason: "Stream ended".to_string(),
                    });
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Drives the gateway protocol over a connection: hello, identify or
/// resume, then the dispatch loop.
pub struct ConnectionHandler {
    connection: Box<dyn GatewayConnection>,
    state: GatewayState,
    session: SessionInfo,
    token: String,
    intents: GatewayIntents,
    gateway_url: Option<String>,
    sequence: Arc<AtomicU64>,
    heartbeat_ack: Option<Arc<AtomicBool>>,
    event_tx: mpsc::UnboundedSender<GatewayEvent>,
    payload_rx: mpsc::Receiver<String>,
}

impl ConnectionHandler {
    pub fn new(
        connection: Box<dyn GatewayConnection>,
        token: String,
        intents: GatewayIntents,
        event_tx: mpsc::UnboundedSender<GatewayEvent>,
        payload_rx: mpsc::Receiver<String>,
    ) -> Self {
        Self {
            connection,
            state: GatewayState::new(),
            session: SessionInfo::new(),
            token,
            intents,
            gateway_url: None,
            sequence: Arc::new(AtomicU64::new(0)),
            heartbeat_ack: None,
            event_tx,
            payload_rx,
        }
    }

    pub async fn connect(&mut self) -> GatewayResult<()> {
        self.state.transition_to_connecting();

        let url = self
            .session
            .resume_gateway_url()
            .or(self.gateway_url.as_deref())
            .map(String::from);
        self.connection.connect(url.as_deref()).await?;

        self.state.transition_to_waiting_hello();
        self.await_hello().await?;

        if self.session.can_resume() {
            self.resume().await?;
        } else {
            self.identify().await?;
        }

        Ok(())
    }

    pub async fn disconnect(&mut self) -> GatewayResult<()> {
        self.state.transition_to_shutdown();
        self.connection.disconnect().await
    }

    async fn await_hello(&mut self) -> GatewayResult<()> {
        let message = timeout(HELLO_TIMEOUT, self.connection.receive())
            .await
            .map_err(|_| GatewayError::timeout("Hello"))?
            .map_err(|e| GatewayError::connection_failed(format!("Failed to receive Hello: {e}")))?
            .ok_or_else(|| GatewayError::protocol("Expected Hello message"))?;

        let opcode = GatewayOpcode::from_u8(message.op);
        if opcode != Some(GatewayOpcode::Hello) {
            return Err(GatewayError::UnexpectedOpcode { opcode });
        }

        let data = message
            .d
            .ok_or_else(|| GatewayError::protocol("Hello missing data"))?;

        let hello = EventParser::parse_hello(&data)?;
        self.state.set_heartbeat_interval(hello.heartbeat_interval);

        debug!(
            interval_ms = hello.heartbeat_interval,
            "Received Hello from gateway"
        );

        Ok(())
    }

    async fn identify(&mut self) -> GatewayResult<()> {
        self.state.transition_to_identifying();

        let payload = GatewayPayload::identify(&self.token, self.intents.as_u32());
        self.connection.send(&payload).await?;

        self.await_ready().await
    }

    async fn resume(&mut self) -> GatewayResult<()> {
        self.state.transition_to_resuming();

        let session_id = self
            .session
            .session_id()
            .ok_or_else(|| GatewayError::protocol("No session to resume"))?
            .to_string();

        let sequence = self
            .session
            .sequence()
            .ok_or_else(|| GatewayError::protocol("No sequence to resume"))?;

        let payload = GatewayPayload::resume(&self.token, &session_id, sequence);
        self.connection.send(&payload).await?;

        debug!(session_id = %session_id, sequence = sequence, "Sent Resume payload");

        self.await_resumed().await
    }

    async fn await_ready(&mut self) -> GatewayResult<()> {
        let message = timeout(IDENTIFY_TIMEOUT, self.connection.receive())
            .await
            .map_err(|_| GatewayError::timeout("Ready"))?
            .map_err(|e| GatewayError::connection_failed(format!("Failed to receive Ready: {e}")))?
            .ok_or_else(|| GatewayError::protocol("Expected Ready message"))?;

        match GatewayOpcode::from_u8(message.op) {
            Some(GatewayOpcode::Dispatch) if message.t.as_deref() == Some("READY") => {
                self.handle_ready_event(message)?;
                self.state.transition_to_connected();
                Ok(())
            }
            Some(GatewayOpcode::InvalidSession) => {
                let resumable = message.d.and_then(|d| d.as_bool()).unwrap_or(false);
                Err(GatewayError::SessionInvalidated { resumable })
            }
            _ => Err(GatewayError::protocol("Expected Ready event")),
        }
    }

    async fn await_resumed(&mut self) -> GatewayResult<()> {
        let message = timeout(IDENTIFY_TIMEOUT, self.connection.receive())
            .await
            .map_err(|_| GatewayError::timeout("Resumed"))?
            .map_err(|e| {
                GatewayError::connection_failed(format!("Failed to receive Resumed: {e}"))
            })?
            .ok_or_else(|| GatewayError::protocol("Expected Resumed message"))?;

        match GatewayOpcode::from_u8(message.op) {
            Some(GatewayOpcode::Dispatch) if message.t.as_deref() == Some("RESUMED") => {
                info!("Session resumed successfully");
                self.state.transition_to_connected();

                let _ = self.event_tx.send(GatewayEvent::Resumed);
                Ok(())
            }
            Some(GatewayOpcode::InvalidSession) => {
                let resumable = message.d.and_then(|d| d.as_bool()).unwrap_or(false);
                if !resumable {
                    self.session.clear();
                }
                Err(GatewayError::SessionInvalidated { resumable })
            }
            _ => Err(GatewayError::protocol("Expected Resumed event")),
        }
    }

    fn handle_ready_event(&mut self, message: GatewayMessage) -> GatewayResult<()> {
        self.update_sequence(message.s);

        let dispatch = EventParser::parse_dispatch("READY", message.d)?;

        if let DispatchEvent::Ready(ready) = &dispatch {
            self.session
                .set_session(ready.session_id.clone(), ready.resume_gateway_url.clone());

            info!(session_id = %ready.session_id, guilds = ready.guilds.len(), "Gateway ready");

            let _ = self.event_tx.send(GatewayEvent::Connected {
                session_id: ready.session_id.clone(),
                resume_url: ready.resume_gateway_url.clone(),
            });
        }

        let _ = self.event_tx.send(GatewayEvent::Dispatch(dispatch));
        Ok(())
    }

    /// Runs the dispatch loop until the connection drops or shutdown.
    pub async fn run(&mut self) -> GatewayResult<()> {
        let mut liveness = tokio::time::interval(Duration::from_secs(5));
        liveness.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        while self.state.connection().is_active() {
            tokio::select! {
                result = self.connection.receive() => {
                    match result {
                        Ok(Some(message)) => {
                            self.handle_message(message).await?;
                        }
                        Ok(None) => {}
                        Err(e) => return Err(e),
                    }
                }

                Some(payload) = self.payload_rx.recv() => {
                    if let Ok(gateway_payload) = serde_json::from_str::<GatewayPayload>(&payload) {
                        if gateway_payload.op == GatewayOpcode::Heartbeat.as_u8() {
                            self.state.record_heartbeat_sent();
                        }
                        if let Err(e) = self.connection.send(&gateway_payload).await {
                            warn!(error = %e, "Failed to send payload");
                        }
                    }
                }

                _ = liveness.tick() => {
                    if self.state.is_heartbeat_overdue() {
                        warn!("Heartbeat went unacknowledged, dropping connection");
                        return Err(GatewayError::HeartbeatTimeout);
                    }
                }
            }
        }

        Ok(())
    }

    async fn handle_message(&mut self, message: GatewayMessage) -> GatewayResult<()> {
        self.update_sequence(message.s);

        let opcode = GatewayOpcode::from_u8(message.op);
        match opcode {
            Some(GatewayOpcode::Dispatch) => {
                if let Some(event_type) = message.t.as_deref() {
                    trace!(event = event_type, "Raw dispatch received");
                    self.handle_dispatch(event_type, message.d);
                }
            }
            Some(GatewayOpcode::HeartbeatAck) => {
                self.state.record_heartbeat_ack();
                if let Some(ack) = &self.heartbeat_ack {
                    ack.store(true, Ordering::SeqCst);
                }
                if let Some(latency) = self.state.latency_ms() {
                    let _ = self.event_tx.send(GatewayEvent::HeartbeatAck {
                        latency_ms: latency,
                    });
                }
            }
            Some(GatewayOpcode::Heartbeat) => {
                debug!("Gateway requested immediate heartbeat");
                let seq = self.session.sequence();
                self.state.record_heartbeat_sent();
                self.connection.send(&GatewayPayload::heartbeat(seq)).await?;
            }
            Some(GatewayOpcode::Reconnect) => {
                info!("Gateway requested reconnect");
                return Err(GatewayError::ConnectionClosed {
                    code: 4000,
                    reason: "Reconnect requested".to_string(),
                });
            }
            Some(GatewayOpcode::InvalidSession) => {
                let resumable = message.d.and_then(|d| d.as_bool()).unwrap_or(false);

                warn!(resumable = resumable, "Session invalidated");
                if !resumable {
                    self.session.clear();
                }

                return Err(GatewayError::SessionInvalidated { resumable });
            }
            _ => {
                debug!(opcode = ?opcode, "Unhandled opcode");
            }
        }

        Ok(())
    }

    fn handle_dispatch(&self, event_type: &str, data: Option<serde_json::Value>) {
        match EventParser::parse_dispatch(event_type, data) {
            Ok(event) => {
                debug!(event = event_type, "Dispatching event");
                let _ = self.event_tx.send(GatewayEvent::Dispatch(event));
            }
            Err(e) => {
                warn!(event = event_type, error = %e, "Failed to parse dispatch event");
            }
        }
    }

    fn update_sequence(&mut self, sequence: Option<u64>) {
        self.session.update_sequence(sequence);
        if let Some(seq) = sequence {
            self.sequence.store(seq, Ordering::SeqCst);
        }
    }

    #[must_use]
    pub const fn session(&self) -> &SessionInfo {
        &self.session
    }

    /// Overrides the gateway URL used for fresh connections.
    pub fn set_gateway_url(&mut self, url: String) {
        self.gateway_url = Some(url);
    }

    /// Wires the heartbeat loop's ACK flag so it stops warning once the
    /// gateway acknowledges a beat.
    pub fn set_heartbeat_ack(&mut self, ack: Arc<AtomicBool>) {
        self.heartbeat_ack = Some(ack);
    }

    /// Seeds the handler with a previous session so the next connect
    /// attempts a resume instead of a fresh identify.
    pub fn restore_session(&mut self, session: SessionInfo) {
        if let Some(seq) = session.sequence() {
            self.sequence.store(seq, Ordering::SeqCst);
        }
        self.session = session;
    }

    #[must_use]
    pub const fn heartbeat_interval(&self) -> Option<u64> {
        self.state.heartbeat_interval_ms()
    }

    #[must_use]
    pub const fn state(&self) -> &GatewayState {
        &self.state
    }

    /// Shared sequence counter, read by the heartbeat loop.
    #[must_use]
    pub fn sequence_handle(&self) -> Arc<AtomicU64> {
        self.sequence.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct FakeConnection {
        incoming: Mutex<VecDeque<GatewayResult<Option<GatewayMessage>>>>,
        sent: Arc<Mutex<Vec<GatewayPayload>>>,
        connected: bool,
    }

    impl FakeConnection {
        fn new(incoming: Vec<GatewayResult<Option<GatewayMessage>>>) -> Self {
            Self {
                incoming: Mutex::new(incoming.into()),
                sent: Arc::new(Mutex::new(Vec::new())),
                connected: false,
            }
        }

        fn message(json: serde_json::Value) -> GatewayResult<Option<GatewayMessage>> {
            Ok(Some(serde_json::from_value(json).unwrap()))
        }
    }

    #[async_trait]
    impl GatewayConnection for FakeConnection {
        async fn connect(&mut self, _gateway_url: Option<&str>) -> GatewayResult<()> {
            self.connected = true;
            Ok(())
        }

        async fn disconnect(&mut self) -> GatewayResult<()> {
            self.connected = false;
            Ok(())
        }

        async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()> {
            self.sent.lock().unwrap().push(GatewayPayload {
                op: payload.op,
                d: payload.d.clone(),
                s: payload.s,
                t: payload.t.clone(),
            });
            Ok(())
        }

        async fn receive(&mut self) -> GatewayResult<Option<GatewayMessage>> {
            self.incoming
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GatewayError::ConnectionClosed {
                    code: 1000,
                    reason: "Stream ended".to_string(),
                }))
        }

        fn is_connected(&self) -> bool {
            self.connected
        }
    }

    fn hello() -> GatewayResult<Option<GatewayMessage>> {
        FakeConnection::message(serde_json::json!({
            "op": 10,
            "d": {"heartbeat_interval": 41250}
        }))
    }

    fn ready() -> GatewayResult<Option<GatewayMessage>> {
        FakeConnection::message(serde_json::json!({
            "op": 0,
            "s": 1,
            "t": "READY",
            "d": {
                "session_id": "sess",
                "resume_gateway_url": "wss://resume.example",
                "user": {"id": "1", "username": "bot", "discriminator": "0000", "bot": true},
                "guilds": []
            }
        }))
    }

    fn handler(
        connection: FakeConnection,
    ) -> (
        ConnectionHandler,
        mpsc::UnboundedReceiver<GatewayEvent>,
        mpsc::Sender<String>,
    ) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (payload_tx, payload_rx) = mpsc::channel(8);
        let handler = ConnectionHandler::new(
            Box::new(connection),
            "token".to_string(),
            GatewayIntents::unprivileged(),
            event_tx,
            payload_rx,
        );
        (handler, event_rx, payload_tx)
    }

    #[test]
    fn test_websocket_connection_initial_state() {
        let conn = WebSocketConnection::new();
        assert!(!conn.is_connected());
    }

    #[tokio::test]
    async fn test_fresh_connect_identifies_and_reports_ready() {
        let connection = FakeConnection::new(vec![hello(), ready()]);
        let sent = connection.sent.clone();
        let (mut handler, mut event_rx, _payload_tx) = handler(connection);

        handler.connect().await.unwrap();

        assert!(handler.state().connection().is_connected());
        assert_eq!(handler.session().session_id(), Some("sess"));
        assert_eq!(handler.session().sequence(), Some(1));

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].op, 2);

        assert!(matches!(
            event_rx.recv().await,
            Some(GatewayEvent::Connected { .. })
        ));
        assert!(matches!(
            event_rx.recv().await,
            Some(GatewayEvent::Dispatch(DispatchEvent::Ready(_)))
        ));
    }

    #[tokio::test]
    async fn test_unexpected_opcode_before_hello() {
        let connection = FakeConnection::new(vec![FakeConnection::message(serde_json::json!({
            "op": 11, "d": null
        }))]);
        let (mut handler, _event_rx, _payload_tx) = handler(connection);

        let err = handler.connect().await.unwrap_err();
        assert!(matches!(err, GatewayError::UnexpectedOpcode { .. }));
    }

    #[tokio::test]
    async fn test_invalid_session_during_identify() {
        let connection = FakeConnection::new(vec![
            hello(),
            FakeConnection::message(serde_json::json!({"op": 9, "d": false})),
        ]);
        let (mut handler, _event_rx, _payload_tx) = handler(connection);

        let err = handler.connect().await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::SessionInvalidated { resumable: false }
        ));
    }

    #[tokio::test]
    async fn test_run_loop_emits_dispatch_and_ack() {
        let connection = FakeConnection::new(vec![
            hello(),
            ready(),
            FakeConnection::message(serde_json::json!({
                "op": 0,
                "s": 2,
                "t": "GUILD_ROLE_DELETE",
                "d": {"guild_id": "1", "role_id": "2"}
            })),
            Err(GatewayError::ConnectionClosed {
                code: 1001,
                reason: "going away".to_string(),
            }),
        ]);
        let (mut handler, mut event_rx, _payload_tx) = handler(connection);

        handler.connect().await.unwrap();
        let err = handler.run().await.unwrap_err();
        assert_eq!(err.close_code(), Some(1001));
        assert_eq!(handler.session().sequence(), Some(2));

        // Connected, Ready dispatch, then the role delete
        let _ = event_rx.recv().await;
        let _ = event_rx.recv().await;
        assert!(matches!(
            event_rx.recv().await,
            Some(GatewayEvent::Dispatch(DispatchEvent::RoleDelete(_)))
        ));
    }

    #[tokio::test]
    async fn test_gateway_requested_heartbeat_is_answered() {
        let connection = FakeConnection::new(vec![
            hello(),
            ready(),
            FakeConnection::message(serde_json::json!({"op": 1, "d": null})),
            Err(GatewayError::ConnectionClosed {
                code: 1000,
                reason: "done".to_string(),
            }),
        ]);
        let sent = connection.sent.clone();
        let (mut handler, _event_rx, _payload_tx) = handler(connection);

        handler.connect().await.unwrap();
        let _ = handler.run().await;

        let sent = sent.lock().unwrap();
        // identify followed by the immediate heartbeat
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].op, 1);
        assert_eq!(sent[1].d, serde_json::Value::Number(1.into()));
    }
}
