//! Bit-flag containers for protocol feature bits.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Gateway intents select which event categories the client receives
    /// over the gateway connection.
    ///
    /// `MEMBERS` and `PRESENCES` are privileged intents that must be
    /// explicitly enabled in the Discord developer portal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct GatewayIntents: u32 {
        const GUILDS = 1 << 0;
        const MEMBERS = 1 << 1;
        const BANS = 1 << 2;
        const EMOJIS_AND_STICKERS = 1 << 3;
        const INTEGRATIONS = 1 << 4;
        const WEBHOOKS = 1 << 5;
        const INVITES = 1 << 6;
        const VOICE_STATES = 1 << 7;
        const PRESENCES = 1 << 8;
        const GUILD_MESSAGES = 1 << 9;
        const GUILD_MESSAGE_REACTIONS = 1 << 10;
        const GUILD_MESSAGE_TYPING = 1 << 11;
        const DIRECT_MESSAGES = 1 << 12;
        const DIRECT_MESSAGE_REACTIONS = 1 << 13;
        const DIRECT_MESSAGE_TYPING = 1 << 14;
    }
}

impl GatewayIntents {
    /// Returns every intent except the privileged ones.
    ///
    /// This is the default used by [`crate::ClientConfig`].
    #[must_use]
    pub const fn unprivileged() -> Self {
        Self::all()
            .difference(Self::MEMBERS)
            .difference(Self::PRESENCES)
    }

    /// Returns whether any privileged intent is enabled.
    #[must_use]
    pub const fn has_privileged(self) -> bool {
        self.intersects(Self::MEMBERS.union(Self::PRESENCES))
    }

    /// Returns the raw integer value sent in the identify payload.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.bits()
    }
}

bitflags! {
    /// Public flags on a user account, shown as badges in the UI.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct UserFlags: u64 {
        const STAFF = 1 << 0;
        const PARTNER = 1 << 1;
        const HYPESQUAD = 1 << 2;
        const BUG_HUNTER_LEVEL_1 = 1 << 3;
        const HYPESQUAD_BRAVERY = 1 << 6;
        const HYPESQUAD_BRILLIANCE = 1 << 7;
        const HYPESQUAD_BALANCE = 1 << 8;
        const EARLY_SUPPORTER = 1 << 9;
        const TEAM_USER = 1 << 10;
        const BUG_HUNTER_LEVEL_2 = 1 << 14;
        const VERIFIED_BOT = 1 << 16;
        const VERIFIED_DEVELOPER = 1 << 17;
        const CERTIFIED_MODERATOR = 1 << 18;
    }
}

impl UserFlags {
    /// Constructs flags from the raw wire value, keeping unknown bits.
    #[must_use]
    pub const fn from_value(value: u64) -> Self {
        Self::from_bits_retain(value)
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.bits()
    }
}
