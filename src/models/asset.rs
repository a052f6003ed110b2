//! Assets served from Discord's CDN: avatars, banners, icons.

use std::fmt;

use super::id::{GuildId, RoleId, UserId};

const BASE_CDN_URL: &str = "https://cdn.discordapp.com";

/// An asset on Discord's CDN, such as an avatar or a guild icon.
///
/// Instances are derived from the image hashes carried by entity payloads;
/// they are never constructed by consumers directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnAsset {
    url: String,
    key: String,
    animated: bool,
}

impl CdnAsset {
    /// The URL of the asset.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The unique identification key of the asset.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the asset is an animated image.
    #[must_use]
    pub const fn animated(&self) -> bool {
        self.animated
    }

    pub(crate) fn from_default_avatar(discriminator: &str) -> Self {
        let index = discriminator.parse::<u16>().unwrap_or(0) % 5;
        Self {
            url: format!("{BASE_CDN_URL}/embed/avatars/{index}.png"),
            key: index.to_string(),
            animated: false,
        }
    }

    pub(crate) fn from_avatar(user_id: UserId, hash: &str) -> Self {
        let (animated, format) = detect_format(hash);
        Self {
            url: format!("{BASE_CDN_URL}/avatars/{user_id}/{hash}.{format}?size=1024"),
            key: hash.to_string(),
            animated,
        }
    }

    pub(crate) fn from_banner(user_id: UserId, hash: &str) -> Self {
        let (animated, format) = detect_format(hash);
        Self {
            url: format!("{BASE_CDN_URL}/banners/{user_id}/{hash}.{format}?size=512"),
            key: hash.to_string(),
            animated,
        }
    }

    pub(crate) fn from_guild_member_avatar(
        guild_id: GuildId,
        user_id: UserId,
        hash: &str,
    ) -> Self {
        let (animated, format) = detect_format(hash);
        Self {
            url: format!(
                "{BASE_CDN_URL}/guilds/{guild_id}/users/{user_id}/avatars/{hash}.{format}?size=1024"
            ),
            key: hash.to_string(),
            animated,
        }
    }

    pub(crate) fn from_guild_icon(guild_id: GuildId, hash: &str) -> Self {
        let (animated, format) = detect_format(hash);
        Self {
            url: format!("{BASE_CDN_URL}/icons/{guild_id}/{hash}.{format}?size=1024"),
            key: hash.to_string(),
            animated,
        }
    }

    pub(crate) fn from_role_icon(role_id: RoleId, hash: &str) -> Self {
        Self {
            url: format!("{BASE_CDN_URL}/role-icons/{role_id}/{hash}.png?size=1024"),
            key: hash.to_string(),
            animated: false,
        }
    }

    pub(crate) fn from_guild_image(guild_id: GuildId, hash: &str, path: &str) -> Self {
        Self {
            url: format!("{BASE_CDN_URL}/{path}/{guild_id}/{hash}.png?size=1024"),
            key: hash.to_string(),
            animated: false,
        }
    }
}

/// Hashes prefixed with `a_` denote animated images served as gif.
fn detect_format(hash: &str) -> (bool, &'static str) {
    if hash.starts_with("a_") {
        (true, "gif")
    } else {
        (false, "png")
    }
}

impl fmt::Display for CdnAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
