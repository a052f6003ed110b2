use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};
use tracing::{debug, warn};

use super::constants::HEARTBEAT_JITTER_PERCENT;
use super::payloads::GatewayPayload;

/// Periodic heartbeat sender.
///
/// The first beat fires one interval minus jitter after `HELLO`, as the
/// gateway asks; later beats follow the plain interval. Beats carry the
/// last seen dispatch sequence.
pub struct HeartbeatManager {
    interval_ms: u64,
    sequence: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    ack_received: Arc<AtomicBool>,
}

impl HeartbeatManager {
    #[must_use]
    pub fn new(interval_ms: u64, sequence: Arc<AtomicU64>) -> Self {
        Self {
            interval_ms,
            sequence,
            running: Arc::new(AtomicBool::new(false)),
            ack_received: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Shared ACK flag, set by the dispatch loop when the gateway
    /// acknowledges a beat.
    #[must_use]
    pub fn ack_handle(&self) -> Arc<AtomicBool> {
        self.ack_received.clone()
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn start(&self, payload_tx: mpsc::Sender<String>) -> tokio::task::JoinHandle<()> {
        let interval_ms = self.interval_ms;
        let sequence = self.sequence.clone();
        let running = self.running.clone();
        let ack_received = self.ack_received.clone();

        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let jitter = (interval_ms as f64 * HEARTBEAT_JITTER_PERCENT) as u64;
            let first_delay = Duration::from_millis(interval_ms - jitter);
            let mut ticker = interval_at(
                Instant::now() + first_delay,
                Duration::from_millis(interval_ms),
            );

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;

                if !running.load(Ordering::SeqCst) {
                    break;
                }

                if !ack_received.load(Ordering::SeqCst) {
                    warn!("Heartbeat ACK not received, connection may be dead");
                }

                let seq = sequence.load(Ordering::SeqCst);
                let seq_opt = if seq == 0 { None } else { Some(seq) };

                let payload = GatewayPayload::heartbeat(seq_opt);
                if let Ok(json) = serde_json::to_string(&payload) {
                    ack_received.store(false, Ordering::SeqCst);
                    if payload_tx.send(json).await.is_err() {
                        debug!("Heartbeat channel closed");
                        break;
                    }
                    debug!(sequence = ?seq_opt, "Sent heartbeat");
                }
            }

            debug!("Heartbeat loop stopped");
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for HeartbeatManager {
    fn drop(&mut self) {
        self.stop();
    }
}
