use super::payloads::{
    GuildDeletePayload, GuildMemberPayload, GuildRolePayload, MemberRemovePayload, ReadyPayload,
    RoleDeletePayload,
};
use crate::types::{GuildData, UserData};

/// Connection-level events emitted by the gateway task.
#[derive(Debug)]
#[allow(clippy::large_enum_variant)]
pub enum GatewayEvent {
    /// The handshake finished and a session is live.
    Connected {
        /// The session id to resume with later.
        session_id: String,
        /// The gateway URL to resume against, if one was given.
        resume_url: Option<String>,
    },
    /// The connection dropped.
    Disconnected {
        /// Why the connection ended.
        reason: String,
        /// Whether the session can be resumed.
        can_resume: bool,
    },
    /// A reconnect attempt is about to start.
    Reconnecting {
        /// The attempt number, starting at 1.
        attempt: u32,
    },
    /// A resume completed and missed dispatches were replayed.
    Resumed,
    /// The gateway acknowledged a heartbeat.
    HeartbeatAck {
        /// Round-trip latency of the beat.
        latency_ms: u64,
    },
    /// A dispatch payload arrived.
    Dispatch(DispatchEvent),
    /// The gateway task hit an error.
    Error {
        /// What went wrong.
        message: String,
        /// Whether the task will try to recover.
        recoverable: bool,
    },
}

/// Parsed dispatch payloads, routed by event name.
#[derive(Debug)]
#[allow(clippy::large_enum_variant)]
pub enum DispatchEvent {
    Ready(ReadyPayload),
    UserUpdate(UserData),
    GuildCreate(GuildData),
    GuildUpdate(GuildData),
    GuildDelete(GuildDeletePayload),
    MemberAdd(GuildMemberPayload),
    MemberUpdate(GuildMemberPayload),
    MemberRemove(MemberRemovePayload),
    RoleCreate(GuildRolePayload),
    RoleUpdate(GuildRolePayload),
    RoleDelete(RoleDeletePayload),
    /// A dispatch the library does not model.
    Unknown {
        /// The raw event name, e.g. `TYPING_START`.
        event_type: String,
    },
}
