//! Events delivered to the consumer of a [`crate::Client`].

use crate::models::{ClientUser, Guild, GuildId, Member, Role, User};

/// An event received over the gateway, with cache updates already
/// applied: by the time an event is delivered, reads through the client
/// observe the new state.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum Event {
    /// The connection finished identifying and the client user is known.
    Ready {
        /// The user belonging to the connected token.
        user: ClientUser,
    },

    /// The client user's account was changed.
    UserUpdate {
        /// The account before the change.
        before: ClientUser,
        /// The account after the change.
        after: ClientUser,
    },

    /// A guild came back from an outage.
    GuildAvailable(Guild),

    /// The client joined a guild, or an already joined guild was sent
    /// during startup.
    GuildJoin(Guild),

    /// A guild's settings changed.
    GuildUpdate {
        /// The guild before the change.
        before: Guild,
        /// The guild after the change.
        after: Guild,
    },

    /// The client left or was removed from a guild.
    GuildLeave(Guild),

    /// A member joined a guild.
    MemberJoin(Member),

    /// A member's guild profile changed.
    MemberUpdate {
        /// The member before the change.
        before: Member,
        /// The member after the change.
        after: Member,
    },

    /// A user left or was removed from a guild.
    MemberRemove {
        /// The guild the user left.
        guild_id: GuildId,
        /// The user that left.
        user: User,
    },

    /// A role was created in a guild.
    RoleCreate {
        /// The guild owning the role.
        guild_id: GuildId,
        /// The new role.
        role: Role,
    },

    /// A role was changed.
    RoleUpdate {
        /// The guild owning the role.
        guild_id: GuildId,
        /// The role before the change.
        before: Role,
        /// The role after the change.
        after: Role,
    },

    /// A role was deleted.
    RoleDelete {
        /// The guild that owned the role.
        guild_id: GuildId,
        /// The deleted role.
        role: Role,
    },

    /// The gateway connection was established.
    Connected,

    /// A dropped gateway session was resumed without missing events.
    Resumed,

    /// The gateway connection dropped.
    Disconnected {
        /// Why the connection ended.
        reason: String,
    },

    /// The client is waiting to reconnect.
    Reconnecting {
        /// The reconnect attempt number, starting at 1.
        attempt: u32,
    },
}
