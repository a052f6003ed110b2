//! Integer-backed enumerations mirroring protocol constants.
//!
//! The numeric values must match the Discord API exactly. Unknown wire
//! values decode to the default variant so new API additions do not break
//! deserialization.

use serde::{Deserialize, Serialize};

macro_rules! int_enum {
    (
        $(#[$meta:meta])*
        $name:ident: $($(#[$vmeta:meta])* $variant:ident = $value:expr),+ $(,)?
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(from = "u8", into = "u8")]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl $name {
            /// Returns the raw protocol value.
            #[must_use]
            pub const fn as_u8(self) -> u8 {
                self as u8
            }
        }

        impl From<u8> for $name {
            fn from(value: u8) -> Self {
                match value {
                    $($value => Self::$variant,)+
                    _ => Self::default(),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> Self {
                value.as_u8()
            }
        }
    };
}

int_enum!(
    /// The kind of premium ("Nitro") subscription on a user account.
    PremiumType:
        /// No subscription.
        #[default]
        None = 0,
        /// A Nitro Classic subscription.
        NitroClassic = 1,
        /// A full Nitro subscription.
        Nitro = 2,
);

int_enum!(
    /// The verification requirement applied to members of a guild.
    VerificationLevel:
        /// No verification level set.
        #[default]
        None = 0,
        /// Members must have a verified email on their account.
        Low = 1,
        /// Members must also be registered on Discord for over 5 minutes.
        Medium = 2,
        /// Members must also be in the guild for over 10 minutes.
        High = 3,
        /// Members must have a verified phone number.
        VeryHigh = 4,
);

int_enum!(
    /// The default message notification level of a guild.
    NotificationLevel:
        /// Notifications trigger on every message.
        #[default]
        AllMessages = 0,
        /// Notifications trigger only on mentions.
        OnlyMentions = 1,
);

int_enum!(
    /// The explicit content filter of a guild, controlling whether sent
    /// media is scanned.
    ContentFilter:
        /// Media is not scanned.
        #[default]
        Disabled = 0,
        /// Media from members without roles is scanned.
        MembersWithoutRoles = 1,
        /// Media from all members is scanned.
        AllMembers = 2,
);

int_enum!(
    /// The multi-factor authentication requirement for guild moderation
    /// actions.
    MfaLevel:
        /// Moderators do not need MFA.
        #[default]
        None = 0,
        /// Moderators must have MFA enabled.
        Elevated = 1,
);

int_enum!(
    /// The NSFW designation of a guild.
    NsfwLevel:
        /// No NSFW level set.
        #[default]
        Default = 0,
        /// The guild is marked explicit.
        Explicit = 1,
        /// The guild is marked safe for work.
        Safe = 2,
        /// The guild is age restricted.
        AgeRestricted = 3,
);

int_enum!(
    /// The premium tier (server boost level) of a guild.
    PremiumTier:
        /// No boost level unlocked.
        #[default]
        None = 0,
        /// Tier 1 unlocked.
        Tier1 = 1,
        /// Tier 2 unlocked.
        Tier2 = 2,
        /// Tier 3 unlocked.
        Tier3 = 3,
);

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, PremiumType::None)]
    #[test_case(1, PremiumType::NitroClassic)]
    #[test_case(2, PremiumType::Nitro)]
    #[test_case(200, PremiumType::None; "unknown value falls back")]
    fn test_premium_type_from_wire(value: u8, expected: PremiumType) {
        assert_eq!(PremiumType::from(value), expected);
    }

    #[test_case(0, VerificationLevel::None)]
    #[test_case(2, VerificationLevel::Medium)]
    #[test_case(4, VerificationLevel::VeryHigh)]
    fn test_verification_level_from_wire(value: u8, expected: VerificationLevel) {
        assert_eq!(VerificationLevel::from(value), expected);
    }

    #[test]
    fn test_enum_values_match_protocol() {
        assert_eq!(NotificationLevel::OnlyMentions.as_u8(), 1);
        assert_eq!(ContentFilter::AllMembers.as_u8(), 2);
        assert_eq!(MfaLevel::Elevated.as_u8(), 1);
        assert_eq!(NsfwLevel::AgeRestricted.as_u8(), 3);
        assert_eq!(PremiumTier::Tier3.as_u8(), 3);
    }

    #[test]
    fn test_enum_json_roundtrip() {
        let level: VerificationLevel = serde_json::from_str("3").unwrap();
        assert_eq!(level, VerificationLevel::High);
        assert_eq!(serde_json::to_string(&level).unwrap(), "3");
    }
}
