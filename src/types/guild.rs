use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use super::user::UserData;
use crate::models::{
    ApplicationId, ChannelId, ContentFilter, GuildId, IntegrationId, MfaLevel,
    NotificationLevel, NsfwLevel, PremiumTier, RoleId, UserId, VerificationLevel,
};

/// A guild object as sent by the API.
///
/// Fields like `joined_at`, `large`, `member_count` and the member list are
/// only present on `GUILD_CREATE` gateway payloads; the approximate counts
/// only when fetching over HTTP with `with_counts`.
#[derive(Debug, Clone, Deserialize)]
pub struct GuildData {
    pub id: GuildId,
    /// Absent on the unavailable guild stubs carried by `READY`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub afk_timeout: u64,
    #[serde(default)]
    pub widget_enabled: bool,
    #[serde(default)]
    pub verification_level: VerificationLevel,
    #[serde(default)]
    pub default_message_notifications: NotificationLevel,
    #[serde(default)]
    pub explicit_content_filter: ContentFilter,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub mfa_level: MfaLevel,
    #[serde(default)]
    pub application_id: Option<ApplicationId>,
    #[serde(default)]
    pub large: bool,
    #[serde(default)]
    pub unavailable: Option<bool>,
    #[serde(default)]
    pub member_count: Option<u64>,
    #[serde(default)]
    pub vanity_url_code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub premium_tier: PremiumTier,
    #[serde(default)]
    pub premium_subscription_count: u64,
    #[serde(default)]
    pub preferred_locale: Option<String>,
    #[serde(default)]
    pub approximate_member_count: Option<u64>,
    #[serde(default)]
    pub approximate_presence_count: Option<u64>,
    #[serde(default)]
    pub nsfw_level: NsfwLevel,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub afk_channel_id: Option<ChannelId>,
    #[serde(default)]
    pub system_channel_id: Option<ChannelId>,
    #[serde(default)]
    pub rules_channel_id: Option<ChannelId>,
    #[serde(default)]
    pub public_updates_channel_id: Option<ChannelId>,
    #[serde(default)]
    pub system_channel_flags: u64,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub splash: Option<String>,
    #[serde(default)]
    pub discovery_splash: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub members: Vec<MemberData>,
    #[serde(default)]
    pub roles: Vec<RoleData>,
}

/// A guild member object as sent by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberData {
    pub user: UserData,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub premium_since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub roles: Vec<RoleId>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub permissions: Option<String>,
}

/// A role object as sent by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleData {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub mentionable: bool,
    #[serde(default)]
    pub unicode_emoji: Option<String>,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub tags: RoleTagsData,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Role tags, carrying ownership information for a role.
///
/// The API encodes `premium_subscriber` as a field that is present but
/// null when true and absent when false.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleTagsData {
    #[serde(default)]
    pub bot_id: Option<UserId>,
    #[serde(default)]
    pub integration_id: Option<IntegrationId>,
    #[serde(default, deserialize_with = "present_means_true")]
    pub premium_subscriber: bool,
}

fn present_means_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    serde::de::IgnoredAny::deserialize(deserializer)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guild_payload_defaults() {
        let data: GuildData = serde_json::from_value(serde_json::json!({
            "id": "41771983423143937",
            "name": "Discord Developers"
        }))
        .unwrap();

        assert_eq!(data.name, "Discord Developers");
        assert_eq!(data.afk_timeout, 0);
        assert_eq!(data.verification_level, VerificationLevel::None);
        assert!(data.unavailable.is_none());
        assert!(data.members.is_empty());
        assert!(data.roles.is_empty());
    }

    #[test]
    fn test_guild_payload_with_members_and_roles() {
        let data: GuildData = serde_json::from_value(serde_json::json!({
            "id": "1",
            "name": "Test",
            "joined_at": "2021-06-12T14:22:01.123000+00:00",
            "member_count": 2,
            "members": [
                {"user": {"id": "10", "username": "a", "discriminator": "0001"}},
                {"user": {"id": "11", "username": "b", "discriminator": "0002"}, "nick": "bee"}
            ],
            "roles": [
                {"id": "1", "name": "@everyone", "position": 0}
            ]
        }))
        .unwrap();

        assert_eq!(data.members.len(), 2);
        assert_eq!(data.members[1].nick.as_deref(), Some("bee"));
        assert_eq!(data.roles[0].name, "@everyone");
        assert!(data.joined_at.is_some());
    }

    #[test]
    fn test_role_tags_premium_subscriber_null_means_true() {
        let tags: RoleTagsData =
            serde_json::from_value(serde_json::json!({"premium_subscriber": null})).unwrap();
        assert!(tags.premium_subscriber);

        let tags: RoleTagsData = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(!tags.premium_subscriber);
    }

    #[test]
    fn test_role_tags_ownership() {
        let tags: RoleTagsData = serde_json::from_value(serde_json::json!({
            "bot_id": "123",
            "integration_id": "456"
        }))
        .unwrap();

        assert_eq!(tags.bot_id.unwrap().as_u64(), 123);
        assert_eq!(tags.integration_id.unwrap().as_u64(), 456);
        assert!(!tags.premium_subscriber);
    }
}
