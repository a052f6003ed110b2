use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::connection::{ConnectionHandler, WebSocketConnection};
use super::constants::{
    MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_BASE, RECONNECT_DELAY_MAX, RECONNECT_JITTER_MAX,
};
use super::error::{GatewayCloseCode, GatewayError, GatewayResult};
use super::events::GatewayEvent;
use super::heartbeat::HeartbeatManager;
use super::session::SessionInfo;
use crate::models::GatewayIntents;

/// Settings for the gateway connection loop.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// The intents to identify with.
    pub intents: GatewayIntents,
    /// Whether to reconnect automatically when the connection drops.
    pub auto_reconnect: bool,
    /// The reconnect attempt limit before giving up.
    pub max_reconnect_attempts: u32,
    /// Overrides the gateway URL to connect to.
    pub gateway_url: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            intents: GatewayIntents::unprivileged(),
            auto_reconnect: true,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            gateway_url: None,
        }
    }
}

/// Owns the background gateway task: connects, heartbeats, resumes and
/// reconnects with backoff, forwarding everything as [`GatewayEvent`]s.
pub struct GatewayClient {
    config: GatewayConfig,
    running: Arc<AtomicBool>,
}

impl GatewayClient {
    /// Creates a client with the given configuration.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawns the gateway task and returns the event stream.
    ///
    /// # Errors
    /// Returns [`GatewayError::AlreadyConnected`] if the task is running.
    pub fn connect(
        &mut self,
        token: &str,
    ) -> GatewayResult<mpsc::UnboundedReceiver<GatewayEvent>> {
        if self.running.load(Ordering::SeqCst) {
            return Err(GatewayError::AlreadyConnected);
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let config = self.config.clone();
        let token = token.to_string();
        let running = self.running.clone();

        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let result = std::panic::AssertUnwindSafe(run_gateway_loop(
                config,
                token,
                event_tx.clone(),
                running.clone(),
            ));

            if let Err(panic_info) = result.catch_unwind().await {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };

                error!(panic = %panic_msg, "Gateway task panicked");
                running.store(false, Ordering::SeqCst);
                let _ = event_tx.send(GatewayEvent::Error {
                    message: format!("Gateway task panicked: {panic_msg}"),
                    recoverable: false,
                });
            }
        });

        Ok(event_rx)
    }

    /// Signals the gateway task to stop.
    pub fn disconnect(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the gateway task is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

async fn run_gateway_loop(
    config: GatewayConfig,
    token: String,
    event_tx: mpsc::UnboundedSender<GatewayEvent>,
    running: Arc<AtomicBool>,
) {
    let mut reconnect_attempts: u32 = 0;
    let mut session = SessionInfo::new();

    while running.load(Ordering::SeqCst) {
        let (payload_tx, payload_rx) = mpsc::channel(32);

        let connection = Box::new(WebSocketConnection::new());
        let mut handler = ConnectionHandler::new(
            connection,
            token.clone(),
            config.intents,
            event_tx.clone(),
            payload_rx,
        );
        handler.restore_session(session.clone());
        if let Some(url) = &config.gateway_url {
            handler.set_gateway_url(url.clone());
        }

        let result = run_single_connection(handler, &payload_tx, &running, &mut session).await;

        match result {
            ConnectionResult::Success => {
                reconnect_attempts = 0;
            }
            ConnectionResult::Error(e) => {
                error!(error = %e, "Failed to connect to gateway");

                // A dead resume must not be retried; the next attempt
                // identifies afresh.
                if let GatewayError::SessionInvalidated { resumable: false } = e {
                    session.clear();
                }

                let _ = event_tx.send(GatewayEvent::Error {
                    message: e.to_string(),
                    recoverable: e.should_reconnect(),
                });

                if !e.should_reconnect() || !config.auto_reconnect {
                    break;
                }

                reconnect_attempts += 1;
            }
            ConnectionResult::Disconnected(e) => {
                handle_connection_error(&e, &event_tx, &mut session, &mut reconnect_attempts);

                if !e.should_reconnect() {
                    break;
                }
            }
        }

        if !running.load(Ordering::SeqCst) {
            break;
        }

        if !config.auto_reconnect {
            let _ = event_tx.send(GatewayEvent::Disconnected {
                reason: "Connection closed".to_string(),
                can_resume: session.can_resume(),
            });
            break;
        }

        if reconnect_attempts >= config.max_reconnect_attempts {
            error!(
                attempts = reconnect_attempts,
                "Max reconnection attempts exceeded"
            );
            let _ = event_tx.send(GatewayEvent::Error {
                message: format!(
                    "Max reconnection attempts ({}) exceeded",
                    config.max_reconnect_attempts
                ),
                recoverable: false,
            });
            break;
        }

        let delay = calculate_backoff_delay(reconnect_attempts);
        info!(
            attempt = reconnect_attempts,
            delay_ms = delay.as_millis(),
            "Reconnecting to gateway"
        );

        let _ = event_tx.send(GatewayEvent::Reconnecting {
            attempt: reconnect_attempts,
        });

        sleep(delay).await;
    }

    running.store(false, Ordering::SeqCst);
    info!("Gateway loop terminated");
}

enum ConnectionResult {
    Success,
    Error(GatewayError),
    Disconnected(GatewayError),
}

async fn run_single_connection(
    mut handler: ConnectionHandler,
    payload_tx: &mpsc::Sender<String>,
    running: &Arc<AtomicBool>,
    session: &mut SessionInfo,
) -> ConnectionResult {
    match handler.connect().await {
        Ok(()) => {
            info!("Gateway connected");

            let mut run_result = Ok(());
            if let Some(interval) = handler.heartbeat_interval() {
                let heartbeat = HeartbeatManager::new(interval, handler.sequence_handle());
                handler.set_heartbeat_ack(heartbeat.ack_handle());
                let _heartbeat_handle = heartbeat.start(payload_tx.clone());

                run_result = run_connection_loop(&mut handler, running).await;

                heartbeat.stop();
            }

            *session = handler.session().clone();

            if let Err(e) = run_result {
                return ConnectionResult::Disconnected(e);
            }

            ConnectionResult::Success
        }
        Err(e) => ConnectionResult::Error(e),
    }
}

async fn run_connection_loop(
    handler: &mut ConnectionHandler,
    running: &Arc<AtomicBool>,
) -> GatewayResult<()> {
    while running.load(Ordering::SeqCst) && handler.state().connection().is_connected() {
        handler.run().await?;
    }

    Ok(())
}

fn handle_connection_error(
    error: &GatewayError,
    event_tx: &mpsc::UnboundedSender<GatewayEvent>,
    session: &mut SessionInfo,
    reconnect_attempts: &mut u32,
) {
    warn!(error = %error, "Connection error");

    let can_resume = error.can_resume() && session.can_resume();

    if let GatewayError::SessionInvalidated { resumable } = error
        && !resumable
    {
        session.clear();
    }

    if let Some(code) = error.close_code()
        && let Some(close_code) = GatewayCloseCode::from_u16(code)
        && close_code.is_fatal()
    {
        session.clear();
    }

    let _ = event_tx.send(GatewayEvent::Disconnected {
        reason: error.to_string(),
        can_resume,
    });

    if error.should_reconnect() {
        *reconnect_attempts += 1;
    }
}

#[allow(clippy::cast_possible_truncation)]
fn calculate_backoff_delay(attempt: u32) -> Duration {
    let base_delay = RECONNECT_DELAY_BASE.as_millis() as u64;
    let max_delay = RECONNECT_DELAY_MAX.as_millis() as u64;
    let jitter_max = RECONNECT_JITTER_MAX.as_millis() as u64;

    let exponential_delay = base_delay.saturating_mul(2_u64.saturating_pow(attempt.min(6)));
    let capped_delay = exponential_delay.min(max_delay);

    let jitter = rand_jitter(jitter_max);
    Duration::from_millis(capped_delay.saturating_add(jitter))
}

fn rand_jitter(max: u64) -> u64 {
    use std::time::SystemTime;

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or(0);

    nanos % max
}
