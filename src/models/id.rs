//! Snowflake identifiers.
//!
//! Every Discord entity is identified by a snowflake: a 64-bit integer that
//! embeds its creation time. On the wire snowflakes travel as decimal
//! strings, but some payloads carry them as bare integers, so
//! deserialization accepts both.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Milliseconds between the Unix epoch and the Discord epoch
/// (first second of 2015).
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// A raw Discord snowflake ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Snowflake(pub u64);

impl Snowflake {
    /// Returns the underlying integer value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the creation time embedded in the snowflake.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn created_at(self) -> DateTime<Utc> {
        let epoch_ms = (self.0 >> 22) + DISCORD_EPOCH_MS;
        DateTime::from_timestamp_millis(epoch_ms as i64).unwrap_or_default()
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::str::FromStr for Snowflake {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

impl Serialize for Snowflake {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer snowflake ID")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Snowflake(value))
            }

            #[allow(clippy::cast_sign_loss)]
            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Snowflake(value as u64))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value.parse::<u64>().map(Snowflake).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Snowflake);

        impl $name {
            /// Returns the underlying integer value.
            #[must_use]
            pub const fn as_u64(self) -> u64 {
                self.0.as_u64()
            }

            /// Returns the creation time embedded in the ID.
            #[must_use]
            pub fn created_at(self) -> DateTime<Utc> {
                self.0.created_at()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(Snowflake(value))
            }
        }

        impl From<Snowflake> for $name {
            fn from(value: Snowflake) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Snowflake {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

id_type!(
    /// Unique identifier for a user.
    UserId
);
id_type!(
    /// Unique identifier for a guild (server).
    GuildId
);
id_type!(
    /// Unique identifier for a channel.
    ChannelId
);
id_type!(
    /// Unique identifier for a role.
    RoleId
);
id_type!(
    /// Unique identifier for an application.
    ApplicationId
);
id_type!(
    /// Unique identifier for an integration.
    IntegrationId
);
