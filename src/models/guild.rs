//! Guild entity.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

use super::asset::CdnAsset;
use super::enums::{
    ContentFilter, MfaLevel, NotificationLevel, NsfwLevel, PremiumTier, VerificationLevel,
};
use super::id::{ApplicationId, ChannelId, GuildId, RoleId, UserId};
use super::member::Member;
use super::role::Role;
use crate::types::GuildData;

const DEFAULT_LOCALE: &str = "en-US";

/// A guild ("server") on Discord.
///
/// Guilds are created from gateway and HTTP payloads and kept up to date
/// by the connection; consumers read them through [`crate::Client`].
#[derive(Debug, Clone, PartialEq)]
pub struct Guild {
    id: GuildId,
    name: String,
    afk_timeout: u64,
    widget_enabled: bool,
    verification_level: VerificationLevel,
    default_message_notifications: NotificationLevel,
    explicit_content_filter: ContentFilter,
    features: Vec<String>,
    mfa_level: MfaLevel,
    application_id: Option<ApplicationId>,
    large: bool,
    unavailable: bool,
    member_count: Option<u64>,
    vanity_url_code: Option<String>,
    description: Option<String>,
    premium_tier: PremiumTier,
    premium_subscription_count: u64,
    preferred_locale: Option<String>,
    approximate_member_count: Option<u64>,
    approximate_presence_count: Option<u64>,
    nsfw_level: NsfwLevel,
    owner_id: Option<UserId>,
    afk_channel_id: Option<ChannelId>,
    system_channel_id: Option<ChannelId>,
    rules_channel_id: Option<ChannelId>,
    public_updates_channel_id: Option<ChannelId>,
    system_channel_flags: u64,
    icon: Option<String>,
    splash: Option<String>,
    discovery_splash: Option<String>,
    banner: Option<String>,
    joined_at: Option<DateTime<Utc>>,
    members: HashMap<UserId, Member>,
    roles: HashMap<RoleId, Role>,
}

impl Guild {
    pub(crate) fn from_data(data: &GuildData) -> Self {
        let members = data
            .members
            .iter()
            .map(|m| (m.user.id, Member::from_data(data.id, m)))
            .collect();
        let roles = data
            .roles
            .iter()
            .map(|r| (r.id, Role::from_data(r)))
            .collect();

        Self {
            id: data.id,
            name: data.name.clone(),
            afk_timeout: data.afk_timeout,
            widget_enabled: data.widget_enabled,
            verification_level: data.verification_level,
            default_message_notifications: data.default_message_notifications,
            explicit_content_filter: data.explicit_content_filter,
            features: data.features.clone(),
            mfa_level: data.mfa_level,
            application_id: data.application_id,
            large: data.large,
            unavailable: data.unavailable.unwrap_or(false),
            member_count: data.member_count,
            vanity_url_code: data.vanity_url_code.clone(),
            description: data.description.clone(),
            premium_tier: data.premium_tier,
            premium_subscription_count: data.premium_subscription_count,
            preferred_locale: data.preferred_locale.clone(),
            approximate_member_count: data.approximate_member_count,
            approximate_presence_count: data.approximate_presence_count,
            nsfw_level: data.nsfw_level,
            owner_id: data.owner_id,
            afk_channel_id: data.afk_channel_id,
            system_channel_id: data.system_channel_id,
            rules_channel_id: data.rules_channel_id,
            public_updates_channel_id: data.public_updates_channel_id,
            system_channel_flags: data.system_channel_flags,
            icon: data.icon.clone(),
            splash: data.splash.clone(),
            discovery_splash: data.discovery_splash.clone(),
            banner: data.banner.clone(),
            joined_at: data.joined_at,
            members,
            roles,
        }
    }

    /// Applies a partial update payload while keeping state the payload
    /// does not carry, such as the member list on `GUILD_UPDATE`.
    pub(crate) fn update_from_data(&mut self, data: &GuildData) {
        let mut updated = Self::from_data(data);
        if updated.members.is_empty() {
            updated.members = std::mem::take(&mut self.members);
        }
        if updated.roles.is_empty() {
            updated.roles = std::mem::take(&mut self.roles);
        }
        if updated.joined_at.is_none() {
            updated.joined_at = self.joined_at;
        }
        *self = updated;
    }

    pub(crate) fn insert_member(&mut self, member: Member) {
        self.members.insert(member.id(), member);
    }

    pub(crate) fn remove_member(&mut self, user_id: UserId) -> Option<Member> {
        self.members.remove(&user_id)
    }

    pub(crate) fn insert_role(&mut self, role: Role) {
        self.roles.insert(role.id(), role);
    }

    pub(crate) fn remove_role(&mut self, role_id: RoleId) -> Option<Role> {
        self.roles.remove(&role_id)
    }

    /// The guild's unique snowflake ID.
    #[must_use]
    pub const fn id(&self) -> GuildId {
        self.id
    }

    /// The name of the guild.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The creation time of the guild, derived from the ID.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.id.created_at()
    }

    /// The CDN asset for the guild's icon, if one is set.
    #[must_use]
    pub fn icon(&self) -> Option<CdnAsset> {
        self.icon
            .as_deref()
            .map(|hash| CdnAsset::from_guild_icon(self.id, hash))
    }

    /// The CDN asset for the guild's invite splash image, if one is set.
    #[must_use]
    pub fn splash(&self) -> Option<CdnAsset> {
        self.splash
            .as_deref()
            .map(|hash| CdnAsset::from_guild_image(self.id, hash, "splashes"))
    }

    /// The CDN asset for the guild's discovery splash image, if one is
    /// set.
    #[must_use]
    pub fn discovery_splash(&self) -> Option<CdnAsset> {
        self.discovery_splash
            .as_deref()
            .map(|hash| CdnAsset::from_guild_image(self.id, hash, "discovery-splashes"))
    }

    /// The CDN asset for the guild's banner, if one is set.
    #[must_use]
    pub fn banner(&self) -> Option<CdnAsset> {
        self.banner
            .as_deref()
            .map(|hash| CdnAsset::from_guild_image(self.id, hash, "banners"))
    }

    /// The ID of the user owning the guild, when known.
    #[must_use]
    pub const fn owner_id(&self) -> Option<UserId> {
        self.owner_id
    }

    /// The AFK channel timeout in seconds.
    #[must_use]
    pub const fn afk_timeout(&self) -> u64 {
        self.afk_timeout
    }

    /// The ID of the AFK voice channel, if one is configured.
    #[must_use]
    pub const fn afk_channel_id(&self) -> Option<ChannelId> {
        self.afk_channel_id
    }

    /// Whether the server widget is enabled.
    #[must_use]
    pub const fn widget_enabled(&self) -> bool {
        self.widget_enabled
    }

    /// The verification level required of members.
    #[must_use]
    pub const fn verification_level(&self) -> VerificationLevel {
        self.verification_level
    }

    /// The default message notification setting.
    #[must_use]
    pub const fn default_message_notifications(&self) -> NotificationLevel {
        self.default_message_notifications
    }

    /// The explicit content filter setting.
    #[must_use]
    pub const fn explicit_content_filter(&self) -> ContentFilter {
        self.explicit_content_filter
    }

    /// The feature strings enabled on the guild.
    #[must_use]
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// The multi-factor authentication requirement for moderation.
    #[must_use]
    pub const fn mfa_level(&self) -> MfaLevel {
        self.mfa_level
    }

    /// The ID of the application that created the guild, for bot-created
    /// guilds.
    #[must_use]
    pub const fn application_id(&self) -> Option<ApplicationId> {
        self.application_id
    }

    /// Whether the guild is considered large by the gateway.
    #[must_use]
    pub const fn is_large(&self) -> bool {
        self.large
    }

    /// Whether the guild is currently unavailable due to an outage.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        self.unavailable
    }

    /// The total number of members, when carried by the payload.
    #[must_use]
    pub const fn member_count(&self) -> Option<u64> {
        self.member_count
    }

    /// The guild's vanity invite code, if one is set.
    #[must_use]
    pub fn vanity_url_code(&self) -> Option<&str> {
        self.vanity_url_code.as_deref()
    }

    /// The description of the guild, if one is set.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The server boost tier of the guild.
    #[must_use]
    pub const fn premium_tier(&self) -> PremiumTier {
        self.premium_tier
    }

    /// The number of active server boosts.
    #[must_use]
    pub const fn premium_subscription_count(&self) -> u64 {
        self.premium_subscription_count
    }

    /// The preferred locale of the guild, defaulting to `en-US`.
    #[must_use]
    pub fn preferred_locale(&self) -> &str {
        self.preferred_locale.as_deref().unwrap_or(DEFAULT_LOCALE)
    }

    /// The approximate member count, present when fetched with counts.
    #[must_use]
    pub const fn approximate_member_count(&self) -> Option<u64> {
        self.approximate_member_count
    }

    /// The approximate number of online members, present when fetched
    /// with counts.
    #[must_use]
    pub const fn approximate_presence_count(&self) -> Option<u64> {
        self.approximate_presence_count
    }

    /// The NSFW level of the guild.
    #[must_use]
    pub const fn nsfw_level(&self) -> NsfwLevel {
        self.nsfw_level
    }

    /// The ID of the channel receiving system messages, if one is set.
    #[must_use]
    pub const fn system_channel_id(&self) -> Option<ChannelId> {
        self.system_channel_id
    }

    /// The ID of the rules channel of community guilds.
    #[must_use]
    pub const fn rules_channel_id(&self) -> Option<ChannelId> {
        self.rules_channel_id
    }

    /// The ID of the channel receiving community updates.
    #[must_use]
    pub const fn public_updates_channel_id(&self) -> Option<ChannelId> {
        self.public_updates_channel_id
    }

    /// The raw system channel flags bitfield.
    #[must_use]
    pub const fn system_channel_flags(&self) -> u64 {
        self.system_channel_flags
    }

    /// When the connected user joined the guild, if known.
    #[must_use]
    pub const fn joined_at(&self) -> Option<DateTime<Utc>> {
        self.joined_at
    }

    /// Looks up a cached member by user ID.
    #[must_use]
    pub fn get_member(&self, user_id: UserId) -> Option<&Member> {
        self.members.get(&user_id)
    }

    /// All cached members of the guild, in no particular order.
    #[must_use]
    pub fn members(&self) -> Vec<&Member> {
        self.members.values().collect()
    }

    /// Looks up a role by ID.
    #[must_use]
    pub fn get_role(&self, role_id: RoleId) -> Option<&Role> {
        self.roles.get(&role_id)
    }

    /// All roles of the guild, ordered from the highest position down,
    /// with the default role last.
    #[must_use]
    pub fn roles(&self) -> Vec<&Role> {
        let default_id = RoleId::from(self.id.as_u64());
        let mut roles: Vec<&Role> = self
            .roles
            .values()
            .filter(|role| role.id() != default_id)
            .collect();
        roles.sort_by(|a, b| b.position().cmp(&a.position()));
        if let Some(default) = self.roles.get(&default_id) {
            roles.push(default);
        }
        roles
    }

    /// The `@everyone` role of the guild, which shares its ID.
    #[must_use]
    pub fn default_role(&self) -> Option<&Role> {
        self.roles.get(&RoleId::from(self.id.as_u64()))
    }
}

impl fmt::Display for Guild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> GuildData {
        serde_json::from_value(serde_json::json!({
            "id": "41771983423143937",
            "name": "Discord Developers",
            "verification_level": 3,
            "premium_tier": 2,
            "preferred_locale": "de",
            "joined_at": "2021-06-12T14:22:01.123000+00:00",
            "members": [
                {"user": {"id": "10", "username": "a", "discriminator": "0001"}},
                {"user": {"id": "11", "username": "b", "discriminator": "0002"}}
            ],
            "roles": [
                {"id": "41771983423143937", "name": "@everyone", "position": 0},
                {"id": "50", "name": "mods", "position": 5},
                {"id": "51", "name": "members", "position": 1}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_guild_from_data() {
        let guild = Guild::from_data(&sample_data());

        assert_eq!(guild.name(), "Discord Developers");
        assert_eq!(guild.verification_level(), VerificationLevel::High);
        assert_eq!(guild.premium_tier(), PremiumTier::Tier2);
        assert_eq!(guild.preferred_locale(), "de");
        assert!(!guild.is_unavailable());
        assert_eq!(guild.members().len(), 2);
    }

    #[test]
    fn test_preferred_locale_defaults() {
        let data: GuildData =
            serde_json::from_value(serde_json::json!({"id": "1", "name": "g"})).unwrap();
        let guild = Guild::from_data(&data);
        assert_eq!(guild.preferred_locale(), "en-US");
    }

    #[test]
    fn test_roles_ordered_with_default_last() {
        let guild = Guild::from_data(&sample_data());
        let names: Vec<&str> = guild.roles().iter().map(|r| r.name()).collect();
        assert_eq!(names, ["mods", "members", "@everyone"]);
    }

    #[test]
    fn test_default_role_shares_guild_id() {
        let guild = Guild::from_data(&sample_data());
        let default = guild.default_role().unwrap();
        assert_eq!(default.id().as_u64(), guild.id().as_u64());
    }

    #[test]
    fn test_member_lookup() {
        let guild = Guild::from_data(&sample_data());
        let member = guild.get_member(UserId::from(10_u64)).unwrap();
        assert_eq!(member.user().username(), "a");
        assert!(guild.get_member(UserId::from(99_u64)).is_none());
    }

    #[test]
    fn test_update_keeps_members_when_payload_has_none() {
        let mut guild = Guild::from_data(&sample_data());
        let update: GuildData = serde_json::from_value(serde_json::json!({
            "id": "41771983423143937",
            "name": "Renamed"
        }))
        .unwrap();

        guild.update_from_data(&update);

        assert_eq!(guild.name(), "Renamed");
        assert_eq!(guild.members().len(), 2);
        assert_eq!(guild.roles().len(), 3);
        assert!(guild.joined_at().is_some());
    }

    #[test]
    fn test_guild_image_urls() {
        let data: GuildData = serde_json::from_value(serde_json::json!({
            "id": "7",
            "name": "g",
            "splash": "spl",
            "banner": "ban"
        }))
        .unwrap();
        let guild = Guild::from_data(&data);

        assert_eq!(
            guild.splash().unwrap().url(),
            "https://cdn.discordapp.com/splashes/7/spl.png?size=1024"
        );
        assert_eq!(
            guild.banner().unwrap().url(),
            "https://cdn.discordapp.com/banners/7/ban.png?size=1024"
        );
        assert!(guild.discovery_splash().is_none());
    }

    #[test]
    fn test_member_insert_and_remove() {
        let mut guild = Guild::from_data(&sample_data());
        let removed = guild.remove_member(UserId::from(10_u64)).unwrap();
        assert_eq!(removed.user().username(), "a");
        assert_eq!(guild.members().len(), 1);

        guild.insert_member(removed);
        assert_eq!(guild.members().len(), 2);
    }
}
