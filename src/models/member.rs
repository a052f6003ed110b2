//! Guild member entity.

use std::fmt;

use chrono::{DateTime, Utc};

use super::asset::CdnAsset;
use super::id::{GuildId, RoleId, UserId};
use super::user::User;
use crate::types::MemberData;

/// A member of a guild.
///
/// Wraps the underlying [`User`] with guild-specific state such as the
/// nickname and role assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    guild_id: GuildId,
    user: User,
    nick: Option<String>,
    deaf: bool,
    mute: bool,
    pending: bool,
    joined_at: Option<DateTime<Utc>>,
    premium_since: Option<DateTime<Utc>>,
    roles: Vec<RoleId>,
    avatar: Option<String>,
    permissions: Option<u64>,
}

impl Member {
    pub(crate) fn from_data(guild_id: GuildId, data: &MemberData) -> Self {
        Self {
            guild_id,
            user: User::from_data(&data.user),
            nick: data.nick.clone(),
            deaf: data.deaf,
            mute: data.mute,
            pending: data.pending,
            joined_at: data.joined_at,
            premium_since: data.premium_since,
            roles: data.roles.clone(),
            avatar: data.avatar.clone(),
            permissions: data
                .permissions
                .as_deref()
                .and_then(|raw| raw.parse().ok()),
        }
    }

    /// The ID of the guild the member belongs to.
    #[must_use]
    pub const fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// The user entity behind this member.
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    /// The user's unique snowflake ID.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.user.id()
    }

    /// The nickname of the member inside the guild, if set.
    #[must_use]
    pub fn nick(&self) -> Option<&str> {
        self.nick.as_deref()
    }

    /// The name shown for the member: the nickname if set, otherwise the
    /// username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or_else(|| self.user.username())
    }

    /// Whether the member is deafened in voice channels.
    #[must_use]
    pub const fn is_deaf(&self) -> bool {
        self.deaf
    }

    /// Whether the member is muted in voice channels.
    #[must_use]
    pub const fn is_mute(&self) -> bool {
        self.mute
    }

    /// Whether the member has not yet passed membership screening.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// When the member joined the guild.
    #[must_use]
    pub const fn joined_at(&self) -> Option<DateTime<Utc>> {
        self.joined_at
    }

    /// When the member started boosting the guild, if they are.
    #[must_use]
    pub const fn premium_since(&self) -> Option<DateTime<Utc>> {
        self.premium_since
    }

    /// The IDs of the roles assigned to the member.
    #[must_use]
    pub fn role_ids(&self) -> &[RoleId] {
        &self.roles
    }

    /// The member's total permissions bitfield. Only present on payloads
    /// delivered inside an interaction.
    #[must_use]
    pub const fn permissions(&self) -> Option<u64> {
        self.permissions
    }

    /// The member's guild-specific avatar, if one is set.
    #[must_use]
    pub fn avatar(&self) -> Option<CdnAsset> {
        self.avatar
            .as_deref()
            .map(|hash| CdnAsset::from_guild_member_avatar(self.guild_id, self.id(), hash))
    }

    /// The avatar shown for the member inside the guild: the guild-specific
    /// one, falling back to the user's own and then the default.
    #[must_use]
    pub fn display_avatar(&self) -> CdnAsset {
        self.avatar()
            .or_else(|| self.user.avatar())
            .unwrap_or_else(|| self.user.default_avatar())
    }

    /// A string that mentions the member inside Discord.
    #[must_use]
    pub fn mention(&self) -> String {
        self.user.mention()
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data(nick: Option<&str>, avatar: Option<&str>) -> MemberData {
        serde_json::from_value(serde_json::json!({
            "user": {
                "id": "80351110224678912",
                "username": "nelly",
                "discriminator": "1337"
            },
            "nick": nick,
            "avatar": avatar,
            "joined_at": "2021-06-12T14:22:01.123000+00:00",
            "roles": ["41771983423143936", "41771983423143937"]
        }))
        .unwrap()
    }

    #[test]
    fn test_display_name_prefers_nick() {
        let guild_id = GuildId::from(1_u64);
        let member = Member::from_data(guild_id, &sample_data(Some("nel"), None));
        assert_eq!(member.display_name(), "nel");

        let member = Member::from_data(guild_id, &sample_data(None, None));
        assert_eq!(member.display_name(), "nelly");
    }

    #[test]
    fn test_roles_preserved() {
        let member = Member::from_data(GuildId::from(1_u64), &sample_data(None, None));
        assert_eq!(member.role_ids().len(), 2);
        assert_eq!(member.role_ids()[0].as_u64(), 41_771_983_423_143_936);
    }

    #[test]
    fn test_display_avatar_prefers_guild_avatar() {
        let guild_id = GuildId::from(1_u64);
        let member = Member::from_data(guild_id, &sample_data(None, Some("guildhash")));
        assert!(member.display_avatar().url().contains("/guilds/1/users/"));

        let member = Member::from_data(guild_id, &sample_data(None, None));
        assert!(member.avatar().is_none());
        assert_eq!(member.display_avatar(), member.user().default_avatar());
    }
}
