//! Scrapcord - a Discord API client library.
//!
//! Connects to the Discord gateway, keeps an in-memory cache of users,
//! guilds, members and roles, and exposes the REST API for the pieces
//! the cache cannot answer.
//!
//! ```no_run
//! use scrapcord::{Client, Event};
//!
//! # async fn run() -> scrapcord::Result<()> {
//! let mut client = Client::new("token")?;
//! let mut events = client.connect()?;
//!
//! while let Some(event) = events.recv().await {
//!     if let Event::Ready { user } = event {
//!         println!("logged in as {user}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod error;
mod events;
/// Gateway connection internals: handshake, heartbeat and dispatch.
pub mod gateway;
/// HTTP client for the REST API.
pub mod http;
/// Entity models: users, guilds, members, roles and their value types.
pub mod models;
mod state;
mod types;
mod utils;

pub use client::{Client, ClientConfig, EditCurrentUser, EditRole};
pub use error::{Error, Result};
pub use events::Event;
pub use models::{
    CdnAsset, ClientUser, Color, Colour, ContentFilter, GatewayIntents, Guild, GuildId, Member,
    MfaLevel, NotificationLevel, NsfwLevel, PremiumTier, PremiumType, Role, RoleId, RoleTags,
    Snowflake, User, UserFlags, UserId, VerificationLevel,
};

/// Current version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
