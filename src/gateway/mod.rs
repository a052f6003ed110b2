//! Gateway WebSocket connection: the hello/identify/resume handshake,
//! heartbeating, zlib-stream decoding and dispatch parsing.

mod client;
mod codec;
mod connection;
mod constants;
mod error;
mod events;
mod heartbeat;
mod payloads;
mod session;
mod state;

pub use constants::GatewayOpcode;
pub use error::{GatewayCloseCode, GatewayError, GatewayResult};
pub use state::ConnectionState;

pub(crate) use client::{GatewayClient, GatewayConfig};
pub(crate) use events::{DispatchEvent, GatewayEvent};
