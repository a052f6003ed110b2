//! Guild role entity.

use std::fmt;

use chrono::{DateTime, Utc};

use super::asset::CdnAsset;
use super::colour::Colour;
use super::id::{IntegrationId, RoleId, UserId};
use crate::types::{RoleData, RoleTagsData};

/// Tags carried by a role, describing what owns or grants it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleTags {
    bot_id: Option<UserId>,
    integration_id: Option<IntegrationId>,
    premium_subscriber: bool,
}

impl RoleTags {
    pub(crate) fn from_data(data: &RoleTagsData) -> Self {
        Self {
            bot_id: data.bot_id,
            integration_id: data.integration_id,
            premium_subscriber: data.premium_subscriber,
        }
    }

    /// The ID of the bot the role belongs to, if it is a bot role.
    #[must_use]
    pub const fn bot_id(&self) -> Option<UserId> {
        self.bot_id
    }

    /// The ID of the integration the role belongs to, if it is managed by
    /// one.
    #[must_use]
    pub const fn integration_id(&self) -> Option<IntegrationId> {
        self.integration_id
    }

    /// Whether this is the guild's booster role.
    #[must_use]
    pub const fn is_premium_subscriber(&self) -> bool {
        self.premium_subscriber
    }
}

/// A role inside a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    id: RoleId,
    name: String,
    hoist: bool,
    position: i64,
    managed: bool,
    mentionable: bool,
    unicode_emoji: Option<String>,
    colour: Colour,
    tags: RoleTags,
    icon: Option<String>,
}

impl Role {
    pub(crate) fn from_data(data: &RoleData) -> Self {
        Self {
            id: data.id,
            name: data.name.clone(),
            hoist: data.hoist,
            position: data.position,
            managed: data.managed,
            mentionable: data.mentionable,
            unicode_emoji: data.unicode_emoji.clone(),
            colour: Colour(data.color),
            tags: RoleTags::from_data(&data.tags),
            icon: data.icon.clone(),
        }
    }

    /// The role's unique snowflake ID.
    #[must_use]
    pub const fn id(&self) -> RoleId {
        self.id
    }

    /// The name of the role.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether members with this role are listed separately in the sidebar.
    #[must_use]
    pub const fn is_hoisted(&self) -> bool {
        self.hoist
    }

    /// The position of the role in the guild's hierarchy. Higher values
    /// sit higher; the default role is always position 0.
    #[must_use]
    pub const fn position(&self) -> i64 {
        self.position
    }

    /// Whether the role is managed by an integration and cannot be
    /// assigned by hand.
    #[must_use]
    pub const fn is_managed(&self) -> bool {
        self.managed
    }

    /// Whether the role can be mentioned by anyone.
    #[must_use]
    pub const fn is_mentionable(&self) -> bool {
        self.mentionable
    }

    /// The unicode emoji shown next to the role, if set.
    #[must_use]
    pub fn unicode_emoji(&self) -> Option<&str> {
        self.unicode_emoji.as_deref()
    }

    /// The colour of the role.
    #[must_use]
    pub const fn colour(&self) -> Colour {
        self.colour
    }

    /// The tags attached to the role.
    #[must_use]
    pub const fn tags(&self) -> &RoleTags {
        &self.tags
    }

    /// The creation time of the role, derived from the ID.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.id.created_at()
    }

    /// The CDN asset for the role's icon, if one is set.
    #[must_use]
    pub fn icon(&self) -> Option<CdnAsset> {
        self.icon
            .as_deref()
            .map(|hash| CdnAsset::from_role_icon(self.id, hash))
    }

    /// A string that mentions the role inside Discord.
    #[must_use]
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.id)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
