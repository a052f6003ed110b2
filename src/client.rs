//! The high-level client tying the HTTP API, gateway and cache together.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::events::Event;
use crate::gateway::{GatewayClient, GatewayConfig, GatewayEvent};
use crate::http::{EditFields, HttpClient};
use crate::models::{
    ClientUser, Colour, GatewayIntents, Guild, GuildId, Member, Role, RoleId, User, UserId,
};
use crate::state::Cache;
use crate::utils;

/// Settings for a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    intents: GatewayIntents,
    auto_reconnect: bool,
    max_reconnect_attempts: u32,
    api_base: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            intents: GatewayIntents::unprivileged(),
            auto_reconnect: true,
            max_reconnect_attempts: 10,
            api_base: None,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The gateway intents to identify with.
    #[must_use]
    pub const fn with_intents(mut self, intents: GatewayIntents) -> Self {
        self.intents = intents;
        self
    }

    /// Whether to reconnect automatically when the connection drops.
    #[must_use]
    pub const fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// The reconnect attempt limit before giving up.
    #[must_use]
    pub const fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Overrides the HTTP API base URL.
    #[must_use]
    pub fn with_api_base(mut self, base_url: impl Into<String>) -> Self {
        self.api_base = Some(base_url.into());
        self
    }
}

/// A Discord client: connects to the gateway, keeps the cache current
/// and exposes the HTTP API.
///
/// Entities handed out by the client are snapshots; re-reading after an
/// event reflects the updated cache.
pub struct Client {
    token: String,
    http: HttpClient,
    cache: Cache,
    gateway: GatewayClient,
}

impl Client {
    /// Creates a client with default configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_config(token, ClientConfig::default())
    }

    /// Creates a client with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_config(token: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let token = token.into();
        let http = match &config.api_base {
            Some(base) => HttpClient::with_base_url(&token, base)?,
            None => HttpClient::new(&token)?,
        };

        let gateway = GatewayClient::new(GatewayConfig {
            intents: config.intents,
            auto_reconnect: config.auto_reconnect,
            max_reconnect_attempts: config.max_reconnect_attempts,
            gateway_url: None,
        });

        Ok(Self {
            token,
            http,
            cache: Cache::new(),
            gateway,
        })
    }

    /// Connects to the gateway and returns the event stream.
    ///
    /// A background task owns the connection; events arrive on the
    /// returned receiver after the cache has been updated.
    ///
    /// # Errors
    /// Returns an error if a connection is already active.
    pub fn connect(&mut self) -> Result<mpsc::UnboundedReceiver<Event>> {
        let mut gateway_rx = self.gateway.connect(&self.token)?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let cache = self.cache.clone();

        tokio::spawn(async move {
            while let Some(gateway_event) = gateway_rx.recv().await {
                for event in translate(&cache, gateway_event) {
                    if event_tx.send(event).is_err() {
                        debug!("Event receiver dropped, stopping dispatcher");
                        return;
                    }
                }
            }
        });

        Ok(event_rx)
    }

    /// Stops the gateway connection. The event stream ends shortly after.
    pub fn disconnect(&self) {
        self.gateway.disconnect();
    }

    /// Whether the gateway task is running.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.gateway.is_running()
    }

    /// The user belonging to the token, available once `READY` arrived.
    #[must_use]
    pub fn current_user(&self) -> Option<ClientUser> {
        self.cache.current_user()
    }

    /// A cached user by ID.
    #[must_use]
    pub fn get_user(&self, user_id: UserId) -> Option<User> {
        self.cache.get_user(user_id)
    }

    /// All cached users.
    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.cache.users()
    }

    /// A cached guild by ID.
    #[must_use]
    pub fn get_guild(&self, guild_id: GuildId) -> Option<Guild> {
        self.cache.get_guild(guild_id)
    }

    /// All cached guilds.
    #[must_use]
    pub fn guilds(&self) -> Vec<Guild> {
        self.cache.guilds()
    }

    /// A cached guild member.
    #[must_use]
    pub fn get_member(&self, guild_id: GuildId, user_id: UserId) -> Option<Member> {
        self.cache
            .get_guild(guild_id)
            .and_then(|guild| guild.get_member(user_id).cloned())
    }

    /// Fetches a user from the API, bypassing the cache.
    ///
    /// # Errors
    /// Returns an error if the request fails or the user does not exist.
    pub async fn fetch_user(&self, user_id: UserId) -> Result<User> {
        let data = self.http.get_user(user_id).await?;
        Ok(User::from_data(&data))
    }

    /// Fetches a guild from the API, bypassing the cache. Fetched guilds
    /// carry approximate member counts but no member list.
    ///
    /// # Errors
    /// Returns an error if the request fails or the guild is inaccessible.
    pub async fn fetch_guild(&self, guild_id: GuildId) -> Result<Guild> {
        let data = self.http.get_guild(guild_id, true).await?;
        Ok(Guild::from_data(&data))
    }

    /// Edits the account belonging to the token.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn edit_current_user(&self, edit: EditCurrentUser) -> Result<ClientUser> {
        let data = self.http.edit_current_user(edit.fields.into_value()).await?;
        Ok(ClientUser::from_data(&data))
    }

    /// Edits a role.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn edit_role(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        edit: EditRole,
        reason: Option<&str>,
    ) -> Result<Role> {
        let data = self
            .http
            .edit_role(guild_id, role_id, edit.fields.into_value(), reason)
            .await?;
        Ok(Role::from_data(&data))
    }

    /// Reorders roles inside a guild. Returns the full role list in its
    /// new order.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn edit_role_positions(
        &self,
        guild_id: GuildId,
        positions: &[(RoleId, i64)],
        reason: Option<&str>,
    ) -> Result<Vec<Role>> {
        let data = self
            .http
            .edit_role_positions(guild_id, positions, reason)
            .await?;
        Ok(data.iter().map(Role::from_data).collect())
    }

    /// Deletes a role.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn delete_role(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        reason: Option<&str>,
    ) -> Result<()> {
        self.http.delete_role(guild_id, role_id, reason).await?;
        Ok(())
    }
}

fn translate(cache: &Cache, gateway_event: GatewayEvent) -> Vec<Event> {
    match gateway_event {
        GatewayEvent::Dispatch(dispatch) => cache.apply(dispatch),
        GatewayEvent::Connected { .. } => {
            // A fresh identify invalidates everything cached from the
            // previous session.
            cache.clear();
            vec![Event::Connected]
        }
        GatewayEvent::Resumed => vec![Event::Resumed],
        GatewayEvent::Disconnected { reason, .. } => vec![Event::Disconnected { reason }],
        GatewayEvent::Reconnecting { attempt } => vec![Event::Reconnecting { attempt }],
        GatewayEvent::HeartbeatAck { latency_ms } => {
            debug!(latency_ms, "Heartbeat acknowledged");
            Vec::new()
        }
        GatewayEvent::Error {
            message,
            recoverable,
        } => {
            warn!(recoverable, "Gateway error: {message}");
            Vec::new()
        }
    }
}

/// Partial update of the client's own account. Unset fields keep their
/// current value.
#[derive(Debug, Clone, Default)]
pub struct EditCurrentUser {
    fields: EditFields,
}

impl EditCurrentUser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a new username.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.fields.set("username", username.into());
        self
    }

    /// Sets a new avatar from raw image bytes.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedImage`] for unrecognised image data.
    pub fn avatar(mut self, image: &[u8]) -> Result<Self> {
        self.fields.set("avatar", utils::image_data(image)?);
        Ok(self)
    }

    /// Removes the avatar, reverting to the default one.
    #[must_use]
    pub fn clear_avatar(mut self) -> Self {
        self.fields.clear("avatar");
        self
    }

    /// Whether any field was set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Partial update of a role. Unset fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct EditRole {
    fields: EditFields,
}

impl EditRole {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the role name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.fields.set("name", name.into());
        self
    }

    /// Sets the role colour.
    #[must_use]
    pub fn colour(mut self, colour: Colour) -> Self {
        self.fields.set("color", colour.value());
        self
    }

    /// Sets whether members with the role are listed separately.
    #[must_use]
    pub fn hoist(mut self, hoist: bool) -> Self {
        self.fields.set("hoist", hoist);
        self
    }

    /// Sets whether the role can be mentioned by anyone.
    #[must_use]
    pub fn mentionable(mut self, mentionable: bool) -> Self {
        self.fields.set("mentionable", mentionable);
        self
    }

    /// Sets the permissions bitfield, encoded as a string on the wire.
    #[must_use]
    pub fn permissions(mut self, permissions: u64) -> Self {
        self.fields.set("permissions", permissions.to_string());
        self
    }

    /// Sets the unicode emoji shown next to the role.
    #[must_use]
    pub fn unicode_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.fields.set("unicode_emoji", emoji.into());
        self
    }

    /// Removes the unicode emoji.
    #[must_use]
    pub fn clear_unicode_emoji(mut self) -> Self {
        self.fields.clear("unicode_emoji");
        self
    }

    /// Sets the role icon from raw image bytes.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedImage`] for unrecognised image data.
    pub fn icon(mut self, image: &[u8]) -> Result<Self> {
        self.fields.set("icon", utils::image_data(image)?);
        Ok(self)
    }

    /// Removes the role icon.
    #[must_use]
    pub fn clear_icon(mut self) -> Self {
        self.fields.clear("icon");
        self
    }

    /// Whether any field was set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
