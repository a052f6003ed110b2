//! HTTP client for the Discord REST API.

mod error;

pub use error::HttpError;

use reqwest::{Method, StatusCode, header};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::models::{GuildId, RoleId, UserId};
use crate::types::{GatewayInfo, GuildData, RoleData, UserData};

const API_BASE: &str = "https://discord.com/api/v9";
const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/scrapcord/scrapcord, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);
const REQUEST_TIMEOUT_SECS: u64 = 30;
const AUDIT_LOG_REASON_HEADER: &str = "X-Audit-Log-Reason";

/// Error body shape the API uses for non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
    #[serde(default)]
    retry_after: Option<f64>,
}

/// A single API route: method plus path relative to the API base.
#[derive(Debug, Clone)]
struct Route {
    method: Method,
    path: String,
}

impl Route {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

/// Client for the Discord REST API, authenticated with a bot token.
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpClient {
    /// Creates a client using the default API base URL.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(token: impl Into<String>) -> Result<Self, HttpError> {
        Self::with_base_url(token, API_BASE)
    }

    /// Creates a client against a custom API base URL.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| HttpError::network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: format!("Bot {}", token.into()),
        })
    }

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        route: Route,
        body: Option<Value>,
        reason: Option<&str>,
    ) -> Result<T, HttpError> {
        let response = self.send(route, body, reason).await?;
        response
            .json()
            .await
            .map_err(|e| HttpError::decode(e.to_string()))
    }

    async fn request_no_content(
        &self,
        route: Route,
        reason: Option<&str>,
    ) -> Result<(), HttpError> {
        self.send(route, None, reason).await.map(drop)
    }

    async fn send(
        &self,
        route: Route,
        body: Option<Value>,
        reason: Option<&str>,
    ) -> Result<reqwest::Response, HttpError> {
        let url = format!("{}{}", self.base_url, route.path);
        debug!(method = %route.method, path = %route.path, "Sending API request");

        let mut request = self
            .client
            .request(route.method, &url)
            .header(header::AUTHORIZATION, &self.token);
        if let Some(reason) = reason {
            request = request.header(AUDIT_LOG_REASON_HEADER, reason);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, url = %url, "API request failed to send");
            if e.is_timeout() {
                HttpError::network("request timed out")
            } else if e.is_connect() {
                HttpError::network("failed to connect to Discord")
            } else {
                HttpError::network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(Self::error_from_response(status, response).await)
    }

    async fn error_from_response(status: StatusCode, response: reqwest::Response) -> HttpError {
        let error = response.json::<ErrorResponse>().await.ok();
        let message = error
            .as_ref()
            .map_or_else(|| format!("HTTP {status}"), |e| e.message.clone());

        match status {
            StatusCode::UNAUTHORIZED => HttpError::Unauthorized(message),
            StatusCode::FORBIDDEN => HttpError::Forbidden(message),
            StatusCode::NOT_FOUND => HttpError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => HttpError::RateLimited {
                retry_after_secs: error.and_then(|e| e.retry_after).unwrap_or(5.0),
            },
            _ if status.is_server_error() => HttpError::ServerError {
                status: status.as_u16(),
            },
            _ => HttpError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Fetches the gateway WebSocket URL.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_gateway(&self) -> Result<GatewayInfo, HttpError> {
        self.request(Route::new(Method::GET, "/gateway"), None, None)
            .await
    }

    /// Fetches the user belonging to the token.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_current_user(&self) -> Result<UserData, HttpError> {
        self.request(Route::new(Method::GET, "/users/@me"), None, None)
            .await
    }

    /// Fetches a user by ID.
    ///
    /// # Errors
    /// Returns an error if the request fails or the user does not exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<UserData, HttpError> {
        self.request(Route::new(Method::GET, format!("/users/{user_id}")), None, None)
            .await
    }

    /// Fetches a guild by ID, optionally with approximate member counts.
    ///
    /// # Errors
    /// Returns an error if the request fails or the guild is inaccessible.
    pub async fn get_guild(
        &self,
        guild_id: GuildId,
        with_counts: bool,
    ) -> Result<GuildData, HttpError> {
        let path = format!("/guilds/{guild_id}?with_counts={with_counts}");
        self.request(Route::new(Method::GET, path), None, None).await
    }

    /// Edits the user belonging to the token.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn edit_current_user(&self, fields: Value) -> Result<UserData, HttpError> {
        self.request(Route::new(Method::PATCH, "/users/@me"), Some(fields), None)
            .await
    }

    /// Edits a role inside a guild.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn edit_role(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        fields: Value,
        reason: Option<&str>,
    ) -> Result<RoleData, HttpError> {
        let path = format!("/guilds/{guild_id}/roles/{role_id}");
        self.request(Route::new(Method::PATCH, path), Some(fields), reason)
            .await
    }

    /// Reorders roles inside a guild.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn edit_role_positions(
        &self,
        guild_id: GuildId,
        positions: &[(RoleId, i64)],
        reason: Option<&str>,
    ) -> Result<Vec<RoleData>, HttpError> {
        let body = Value::Array(
            positions
                .iter()
                .map(|(id, position)| json!({"id": id, "position": position}))
                .collect(),
        );
        let path = format!("/guilds/{guild_id}/roles");
        self.request(Route::new(Method::PATCH, path), Some(body), reason)
            .await
    }

    /// Deletes a role from a guild.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn delete_role(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        reason: Option<&str>,
    ) -> Result<(), HttpError> {
        let path = format!("/guilds/{guild_id}/roles/{role_id}");
        self.request_no_content(Route::new(Method::DELETE, path), reason)
            .await
    }
}

/// Partial-update body builder shared by the edit endpoints.
///
/// Only fields that were set appear in the payload, so untouched fields
/// keep their current value on Discord's side. Clearing a field sends an
/// explicit `null`.
#[derive(Debug, Clone, Default)]
pub(crate) struct EditFields {
    map: Map<String, Value>,
}

impl EditFields {
    pub(crate) fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.map.insert(key.to_owned(), value.into());
    }

    pub(crate) fn clear(&mut self, key: &str) {
        self.map.insert(key.to_owned(), Value::Null);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub(crate) fn into_value(self) -> Value {
        Value::Object(self.map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(HttpClient::new("token").is_ok());
    }

    #[test]
    fn test_edit_fields_partial_body() {
        let mut fields = EditFields::default();
        assert!(fields.is_empty());

        fields.set("name", "new name");
        fields.clear("icon");
        let value = fields.into_value();

        assert_eq!(value["name"], "new name");
        assert!(value["icon"].is_null());
        assert!(value.get("color").is_none());
    }

    #[test]
    fn test_error_response_shape() {
        let error: ErrorResponse = serde_json::from_value(serde_json::json!({
            "message": "You are being rate limited.",
            "retry_after": 64.57,
            "global": false
        }))
        .unwrap();

        assert_eq!(error.retry_after, Some(64.57));
        assert_eq!(error.message, "You are being rate limited.");
    }
}
