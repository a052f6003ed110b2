//! Raw payload types received from the Discord API.
//!
//! These structs mirror the JSON shapes of the HTTP and gateway APIs.
//! They are an internal detail: entity models are built from them by the
//! library and handed to consumers fully formed.

mod guild;
mod user;

pub use guild::{GuildData, MemberData, RoleData, RoleTagsData};
pub use user::UserData;

use serde::Deserialize;

/// Response of `GET /gateway`.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayInfo {
    /// The WebSocket URL clients should connect to.
    pub url: String,
}
