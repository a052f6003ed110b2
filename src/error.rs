//! Top-level error type.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::http::HttpError;

/// Any failure surfaced by the library.
#[derive(Debug, Error)]
pub enum Error {
    /// An HTTP API request failed.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The gateway connection failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Image bytes were not in a supported format.
    #[error("unsupported image format, expected PNG, JPEG, GIF or WebP")]
    UnsupportedImage,
}

/// Shorthand result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;
