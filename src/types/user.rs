use serde::Deserialize;

use crate::models::UserId;

/// A user object as sent by the API.
///
/// `GET /users/@me` additionally carries the `verified`, `locale` and
/// `mfa_enabled` fields; they are absent on other users.
#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub discriminator: String,
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub accent_color: Option<u32>,
    #[serde(default)]
    pub public_flags: u64,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub mfa_enabled: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_user_payload() {
        let data: UserData = serde_json::from_value(serde_json::json!({
            "id": "80351110224678912",
            "username": "nelly",
            "discriminator": "1337"
        }))
        .unwrap();

        assert_eq!(data.id.as_u64(), 80_351_110_224_678_912);
        assert_eq!(data.username, "nelly");
        assert!(!data.bot);
        assert!(data.avatar.is_none());
        assert_eq!(data.public_flags, 0);
    }

    #[test]
    fn test_client_user_payload_extras() {
        let data: UserData = serde_json::from_value(serde_json::json!({
            "id": "1",
            "username": "me",
            "discriminator": "0001",
            "verified": true,
            "locale": "en-US",
            "mfa_enabled": false
        }))
        .unwrap();

        assert_eq!(data.verified, Some(true));
        assert_eq!(data.locale.as_deref(), Some("en-US"));
        assert_eq!(data.mfa_enabled, Some(false));
    }
}
