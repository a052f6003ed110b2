//! User entities.

use std::fmt;

use chrono::{DateTime, Utc};

use super::asset::CdnAsset;
use super::colour::Colour;
use super::flags::UserFlags;
use super::id::UserId;
use crate::types::UserData;

/// A user entity on Discord.
///
/// Users are created by the library from protocol payloads and cached
/// internally; consumers read them but never construct or mutate them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: String,
    discriminator: String,
    bot: bool,
    system: bool,
    avatar: Option<String>,
    banner: Option<String>,
    accent_colour: Option<u32>,
    public_flags: u64,
}

impl User {
    pub(crate) fn from_data(data: &UserData) -> Self {
        Self {
            id: data.id,
            username: data.username.clone(),
            discriminator: data.discriminator.clone(),
            bot: data.bot,
            system: data.system,
            avatar: data.avatar.clone(),
            banner: data.banner.clone(),
            accent_colour: data.accent_color,
            public_flags: data.public_flags,
        }
    }

    /// The user's unique snowflake ID.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// The username as shown on Discord.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The 4-digit discriminator of the user.
    #[must_use]
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// Whether the user is a bot account.
    #[must_use]
    pub const fn is_bot(&self) -> bool {
        self.bot
    }

    /// Whether the user is an official Discord system user.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        self.system
    }

    /// The creation time of the account, derived from the ID.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.id.created_at()
    }

    /// The colour representation of the user's accent colour.
    #[must_use]
    pub fn accent_colour(&self) -> Colour {
        Colour(self.accent_colour.unwrap_or(0))
    }

    /// The public flags ("badges") on the account.
    #[must_use]
    pub const fn public_flags(&self) -> UserFlags {
        UserFlags::from_value(self.public_flags)
    }

    /// The CDN asset for the user's avatar, if one is set.
    #[must_use]
    pub fn avatar(&self) -> Option<CdnAsset> {
        self.avatar
            .as_deref()
            .map(|hash| CdnAsset::from_avatar(self.id, hash))
    }

    /// The CDN asset for the user's default avatar, calculated from the
    /// discriminator.
    #[must_use]
    pub fn default_avatar(&self) -> CdnAsset {
        CdnAsset::from_default_avatar(&self.discriminator)
    }

    /// The avatar shown for the user: their own if set, otherwise the
    /// default one.
    #[must_use]
    pub fn display_avatar(&self) -> CdnAsset {
        self.avatar().unwrap_or_else(|| self.default_avatar())
    }

    /// The CDN asset for the user's profile banner, if one is set.
    #[must_use]
    pub fn banner(&self) -> Option<CdnAsset> {
        self.banner
            .as_deref()
            .map(|hash| CdnAsset::from_banner(self.id, hash))
    }

    /// A string that mentions the user inside Discord.
    #[must_use]
    pub fn mention(&self) -> String {
        format!("<@!{}>", self.id)
    }

    /// The `username#discriminator` tag of the user.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("{}#{}", self.username, self.discriminator)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.username, self.discriminator)
    }
}

/// The user belonging to the connected client, as returned by
/// [`crate::Client::current_user`].
///
/// Carries account fields only visible to the account itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientUser {
    user: User,
    verified: bool,
    locale: Option<String>,
    mfa_enabled: bool,
}

impl ClientUser {
    pub(crate) fn from_data(data: &UserData) -> Self {
        Self {
            user: User::from_data(data),
            verified: data.verified.unwrap_or(false),
            locale: data.locale.clone(),
            mfa_enabled: data.mfa_enabled.unwrap_or(false),
        }
    }

    /// The underlying user entity.
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    /// The user's unique snowflake ID.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.user.id()
    }

    /// The username as shown on Discord.
    #[must_use]
    pub fn username(&self) -> &str {
        self.user.username()
    }

    /// Whether the account has a verified email.
    #[must_use]
    pub const fn verified(&self) -> bool {
        self.verified
    }

    /// The language tag of the account, if known.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Whether the account has multi-factor authentication enabled.
    #[must_use]
    pub const fn mfa_enabled(&self) -> bool {
        self.mfa_enabled
    }
}

impl fmt::Display for ClientUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.user.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> UserData {
        serde_json::from_value(serde_json::json!({
            "id": "80351110224678912",
            "username": "nelly",
            "discriminator": "1337",
            "avatar": "8342729096ea3675442027381ff50dfe",
            "accent_color": 16711680,
            "public_flags": 64
        }))
        .unwrap()
    }

    #[test]
    fn test_user_from_data() {
        let user = User::from_data(&sample_data());

        assert_eq!(user.id().as_u64(), 80_351_110_224_678_912);
        assert_eq!(user.username(), "nelly");
        assert_eq!(user.tag(), "nelly#1337");
        assert_eq!(user.mention(), "<@!80351110224678912>");
        assert!(!user.is_bot());
    }

    #[test]
    fn test_user_accent_colour() {
        let user = User::from_data(&sample_data());
        assert_eq!(user.accent_colour().r(), 255);
        assert_eq!(user.accent_colour().g(), 0);
    }

    #[test]
    fn test_user_public_flags() {
        let user = User::from_data(&sample_data());
        assert!(user.public_flags().contains(UserFlags::HYPESQUAD_BRAVERY));
        assert!(!user.public_flags().contains(UserFlags::STAFF));
    }

    #[test]
    fn test_display_avatar_falls_back_to_default() {
        let mut data = sample_data();
        data.avatar = None;
        let user = User::from_data(&data);

        assert!(user.avatar().is_none());
        assert_eq!(user.display_avatar(), user.default_avatar());
    }

    #[test]
    fn test_client_user_extras_default_off() {
        let client_user = ClientUser::from_data(&sample_data());
        assert!(!client_user.verified());
        assert!(!client_user.mfa_enabled());
        assert!(client_user.locale().is_none());
        assert_eq!(client_user.user().username(), "nelly");
    }
}
