use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::constants::{
    CLIENT_PROPERTIES_BROWSER, CLIENT_PROPERTIES_DEVICE, CLIENT_PROPERTIES_OS, LARGE_THRESHOLD,
};
use crate::models::{GuildId, RoleId};
use crate::types::{GuildData, MemberData, RoleData, UserData};

/// An outgoing gateway payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    pub d: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayPayload {
    #[must_use]
    pub fn heartbeat(sequence: Option<u64>) -> Self {
        Self {
            op: 1,
            d: sequence.map_or(Value::Null, |s| Value::Number(s.into())),
            s: None,
            t: None,
        }
    }

    #[must_use]
    pub fn identify(token: &str, intents: u32) -> Self {
        let identify = IdentifyData {
            token: token.to_string(),
            properties: IdentifyProperties {
                os: CLIENT_PROPERTIES_OS.to_string(),
                browser: CLIENT_PROPERTIES_BROWSER.to_string(),
                device: CLIENT_PROPERTIES_DEVICE.to_string(),
            },
            compress: true,
            large_threshold: LARGE_THRESHOLD,
            intents,
        };

        Self {
            op: 2,
            d: serde_json::to_value(identify).unwrap_or(Value::Null),
            s: None,
            t: None,
        }
    }

    #[must_use]
    pub fn resume(token: &str, session_id: &str, sequence: u64) -> Self {
        let resume = ResumeData {
            token: token.to_string(),
            session_id: session_id.to_string(),
            seq: sequence,
        };

        Self {
            op: 6,
            d: serde_json::to_value(resume).unwrap_or(Value::Null),
            s: None,
            t: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct IdentifyData {
    token: String,
    properties: IdentifyProperties,
    compress: bool,
    large_threshold: u16,
    intents: u32,
}

#[derive(Debug, Serialize)]
struct IdentifyProperties {
    #[serde(rename = "$os")]
    os: String,
    #[serde(rename = "$browser")]
    browser: String,
    #[serde(rename = "$device")]
    device: String,
}

#[derive(Debug, Serialize)]
struct ResumeData {
    token: String,
    session_id: String,
    seq: u64,
}

/// An incoming gateway frame, before dispatch routing.
#[derive(Debug, Deserialize)]
pub struct GatewayMessage {
    pub op: u8,
    pub d: Option<Value>,
    pub s: Option<u64>,
    pub t: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HelloPayload {
    pub heartbeat_interval: u64,
}

#[derive(Debug, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,
    pub resume_gateway_url: Option<String>,
    pub user: UserData,
    #[serde(default)]
    pub guilds: Vec<GuildData>,
}

#[derive(Debug, Deserialize)]
pub struct GuildDeletePayload {
    pub id: GuildId,
    #[serde(default)]
    pub unavailable: Option<bool>,
}

/// `GUILD_MEMBER_ADD` and `GUILD_MEMBER_UPDATE` carry a member object
/// with an extra `guild_id` field spliced in.
#[derive(Debug, Deserialize)]
pub struct GuildMemberPayload {
    pub guild_id: GuildId,
    #[serde(flatten)]
    pub member: MemberData,
}

#[derive(Debug, Deserialize)]
pub struct MemberRemovePayload {
    pub guild_id: GuildId,
    pub user: UserData,
}

#[derive(Debug, Deserialize)]
pub struct GuildRolePayload {
    pub guild_id: GuildId,
    pub role: RoleData,
}

#[derive(Debug, Deserialize)]
pub struct RoleDeletePayload {
    pub guild_id: GuildId,
    pub role_id: RoleId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_payload() {
        let payload = GatewayPayload::heartbeat(Some(42));
        assert_eq!(payload.op, 1);
        assert_eq!(payload.d, Value::Number(42.into()));
    }

    #[test]
    fn test_heartbeat_null_sequence() {
        let payload = GatewayPayload::heartbeat(None);
        assert_eq!(payload.d, Value::Null);
    }

    #[test]
    fn test_identify_payload_structure() {
        let payload = GatewayPayload::identify("test_token", 513);
        assert_eq!(payload.op, 2);

        let obj = payload.d.as_object().unwrap();
        assert_eq!(obj.get("token").unwrap(), "test_token");
        assert_eq!(obj.get("intents").unwrap(), 513);
        let properties = obj.get("properties").unwrap().as_object().unwrap();
        assert_eq!(properties.get("$browser").unwrap(), "scrapcord");
    }

    #[test]
    fn test_resume_payload() {
        let payload = GatewayPayload::resume("token", "session123", 100);
        assert_eq!(payload.op, 6);

        let obj = payload.d.as_object().unwrap();
        assert_eq!(obj.get("session_id").unwrap(), "session123");
        assert_eq!(obj.get("seq").unwrap(), 100);
    }

    #[test]
    fn test_member_payload_flattens_guild_id() {
        let payload: GuildMemberPayload = serde_json::from_value(serde_json::json!({
            "guild_id": "1",
            "user": {"id": "10", "username": "a", "discriminator": "0001"},
            "nick": "nick"
        }))
        .unwrap();

        assert_eq!(payload.guild_id.as_u64(), 1);
        assert_eq!(payload.member.nick.as_deref(), Some("nick"));
    }

    #[test]
    fn test_guild_delete_outage_flag() {
        let payload: GuildDeletePayload =
            serde_json::from_value(serde_json::json!({"id": "5", "unavailable": true})).unwrap();
        assert_eq!(payload.unavailable, Some(true));

        let payload: GuildDeletePayload =
            serde_json::from_value(serde_json::json!({"id": "5"})).unwrap();
        assert!(payload.unavailable.is_none());
    }
}
