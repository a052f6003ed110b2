//! Integer colour values in `(r, g, b)` form.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A colour as encoded by the Discord API: a 24-bit integer packing the
/// red, green and blue channels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Colour(pub u32);

/// Alias for American spelling.
pub type Color = Colour;

impl Colour {
    /// Discord brand blurple.
    pub const BLURPLE: Self = Self(0x5865F2);
    /// Discord brand green.
    pub const GREEN: Self = Self(0x57F287);
    /// Discord brand yellow.
    pub const YELLOW: Self = Self(0xFEE75C);
    /// Discord brand fuchsia.
    pub const FUCHSIA: Self = Self(0xEB459E);
    /// Discord brand red.
    pub const RED: Self = Self(0xED4245);

    /// Creates a colour from the raw integer value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Creates a colour from individual channel values.
    #[must_use]
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the red channel.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn r(self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    /// Returns the green channel.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn g(self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    /// Returns the blue channel.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn b(self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl From<u32> for Colour {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
