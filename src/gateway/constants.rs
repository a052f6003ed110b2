use std::time::Duration;

pub const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=9&encoding=json&compress=zlib-stream";
pub const GATEWAY_QUERY: &str = "?v=9&encoding=json&compress=zlib-stream";
pub const ZLIB_SUFFIX: [u8; 4] = [0x00, 0x00, 0xff, 0xff];

pub const HEARTBEAT_JITTER_PERCENT: f64 = 0.05;
pub const HEARTBEAT_TIMEOUT_MULTIPLIER: f64 = 1.5;

pub const RECONNECT_DELAY_BASE: Duration = Duration::from_secs(1);
pub const RECONNECT_DELAY_MAX: Duration = Duration::from_secs(60);
pub const RECONNECT_JITTER_MAX: Duration = Duration::from_millis(500);
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
pub const HELLO_TIMEOUT: Duration = Duration::from_secs(10);
pub const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(10);

pub const CLIENT_PROPERTIES_OS: &str = std::env::consts::OS;
pub const CLIENT_PROPERTIES_BROWSER: &str = "scrapcord";
pub const CLIENT_PROPERTIES_DEVICE: &str = "scrapcord";

pub const LARGE_THRESHOLD: u16 = 250;

/// Operation codes of gateway payloads.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum GatewayOpcode {
    Dispatch = 0,
    Heartbeat = 1,
    Identify = 2,
    PresenceUpdate = 3,
    VoiceStateUpdate = 4,
    Resume = 6,
    Reconnect = 7,
    RequestGuildMembers = 8,
    InvalidSession = 9,
    Hello = 10,
    HeartbeatAck = 11,
}

impl GatewayOpcode {
    /// Maps a raw opcode value, if it is a known one.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dispatch),
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Identify),
            3 => Some(Self::PresenceUpdate),
            4 => Some(Self::VoiceStateUpdate),
            6 => Some(Self::Resume),
            7 => Some(Self::Reconnect),
            8 => Some(Self::RequestGuildMembers),
            9 => Some(Self::InvalidSession),
            10 => Some(Self::Hello),
            11 => Some(Self::HeartbeatAck),
            _ => None,
        }
    }

    /// Returns the raw opcode value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<GatewayOpcode> for u8 {
    fn from(opcode: GatewayOpcode) -> Self {
        opcode.as_u8()
    }
}
