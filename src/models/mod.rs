//! Entity models exposed by the library.
//!
//! All models are built internally from API payloads; their fields are
//! private and read through accessor methods.

mod asset;
mod colour;
mod enums;
mod flags;
mod guild;
mod id;
mod member;
mod role;
mod user;

pub use asset::CdnAsset;
pub use colour::{Color, Colour};
pub use enums::{
    ContentFilter, MfaLevel, NotificationLevel, NsfwLevel, PremiumTier, PremiumType,
    VerificationLevel,
};
pub use flags::{GatewayIntents, UserFlags};
pub use guild::Guild;
pub use id::{
    ApplicationId, ChannelId, GuildId, IntegrationId, RoleId, Snowflake, UserId,
};
pub use member::Member;
pub use role::{Role, RoleTags};
pub use user::{ClientUser, User};
