use flate2::{Decompress, FlushDecompress, Status};
use serde::de::DeserializeOwned;

use super::constants::ZLIB_SUFFIX;
use super::error::{GatewayError, GatewayResult};
use super::events::DispatchEvent;
use super::payloads::{GatewayMessage, HelloPayload};

const INITIAL_BUFFER_SIZE: usize = 32 * 1024;
const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Incremental decoder for the zlib-stream transport.
///
/// The gateway sends one shared zlib stream across the whole connection;
/// each message ends with the zlib sync flush suffix. Frames are buffered
/// until the suffix arrives, then inflated with the persistent context.
pub struct GatewayCodec {
    inflater: Decompress,
    compressed_buffer: Vec<u8>,
    decompressed_buffer: Vec<u8>,
}

impl GatewayCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inflater: Decompress::new(true),
            compressed_buffer: Vec::with_capacity(4096),
            decompressed_buffer: Vec::with_capacity(INITIAL_BUFFER_SIZE),
        }
    }

    /// Feeds a binary frame into the decoder. Returns the decoded JSON
    /// text once a complete message has been buffered.
    pub fn decode_binary(&mut self, data: &[u8]) -> GatewayResult<Option<String>> {
        self.compressed_buffer.extend_from_slice(data);

        if !self.is_message_complete() {
            return Ok(None);
        }

        let text = self.decompress()?;
        self.compressed_buffer.clear();
        Ok(Some(text))
    }

    fn is_message_complete(&self) -> bool {
        self.compressed_buffer.len() >= 4
            && self.compressed_buffer[self.compressed_buffer.len() - 4..] == ZLIB_SUFFIX
    }

    fn decompress(&mut self) -> GatewayResult<String> {
        self.decompressed_buffer.clear();
        if self.decompressed_buffer.capacity() < INITIAL_BUFFER_SIZE {
            self.decompressed_buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let mut total_in = 0;
        let mut total_out = 0;

        loop {
            if self.decompressed_buffer.len() == self.decompressed_buffer.capacity() {
                let new_capacity = self
                    .decompressed_buffer
                    .capacity()
                    .saturating_mul(2)
                    .min(MAX_BUFFER_SIZE);

                if new_capacity == self.decompressed_buffer.capacity() {
                    return Err(GatewayError::compression(
                        "decompressed data exceeds maximum size",
                    ));
                }

                self.decompressed_buffer.reserve(new_capacity);
            }

            let spare = self.decompressed_buffer.capacity() - self.decompressed_buffer.len();
            self.decompressed_buffer
                .resize(self.decompressed_buffer.len() + spare, 0);

            let in_before = self.inflater.total_in();
            let out_before = self.inflater.total_out();

            let status = self
                .inflater
                .decompress(
                    &self.compressed_buffer[total_in..],
                    &mut self.decompressed_buffer[total_out..],
                    FlushDecompress::Sync,
                )
                .map_err(|e| GatewayError::compression(e.to_string()))?;

            total_in += usize::try_from(self.inflater.total_in() - in_before).unwrap_or(0);
            total_out += usize::try_from(self.inflater.total_out() - out_before).unwrap_or(0);

            self.decompressed_buffer.truncate(total_out);

            match status {
                Status::Ok | Status::BufError => {
                    if total_in >= self.compressed_buffer.len() {
                        break;
                    }
                }
                Status::StreamEnd => break,
            }
        }

        String::from_utf8(self.decompressed_buffer[..total_out].to_vec())
            .map_err(|e| GatewayError::compression(format!("invalid UTF-8: {e}")))
    }

    /// Resets the decoder for a fresh connection. The zlib context does
    /// not survive across connections.
    pub fn reset(&mut self) {
        self.inflater.reset(true);
        self.compressed_buffer.clear();
        self.decompressed_buffer.clear();
    }
}

impl Default for GatewayCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses decoded gateway frames into typed payloads.
pub struct EventParser;

impl EventParser {
    pub fn parse_message(json: &str) -> GatewayResult<GatewayMessage> {
        serde_json::from_str(json).map_err(|e| GatewayError::serialization(e.to_string()))
    }

    pub fn parse_hello(data: &serde_json::Value) -> GatewayResult<HelloPayload> {
        serde_json::from_value(data.clone())
            .map_err(|e| GatewayError::serialization(format!("failed to parse HELLO: {e}")))
    }

    pub fn parse_dispatch(
        event_type: &str,
        data: Option<serde_json::Value>,
    ) -> GatewayResult<DispatchEvent> {
        let data = data.ok_or_else(|| GatewayError::protocol("missing dispatch data"))?;

        match event_type {
            "READY" => Self::parse_payload(event_type, data).map(DispatchEvent::Ready),
            "USER_UPDATE" => Self::parse_payload(event_type, data).map(DispatchEvent::UserUpdate),
            "GUILD_CREATE" => Self::parse_payload(event_type, data).map(DispatchEvent::GuildCreate),
            "GUILD_UPDATE" => Self::parse_payload(event_type, data).map(DispatchEvent::GuildUpdate),
            "GUILD_DELETE" => Self::parse_payload(event_type, data).map(DispatchEvent::GuildDelete),
            "GUILD_MEMBER_ADD" => {
                Self::parse_payload(event_type, data).map(DispatchEvent::MemberAdd)
            }
            "GUILD_MEMBER_UPDATE" => {
                Self::parse_payload(event_type, data).map(DispatchEvent::MemberUpdate)
            }
            "GUILD_MEMBER_REMOVE" => {
                Self::parse_payload(event_type, data).map(DispatchEvent::MemberRemove)
            }
            "GUILD_ROLE_CREATE" => {
                Self::parse_payload(event_type, data).map(DispatchEvent::RoleCreate)
            }
            "GUILD_ROLE_UPDATE" => {
                Self::parse_payload(event_type, data).map(DispatchEvent::RoleUpdate)
            }
            "GUILD_ROLE_DELETE" => {
                Self::parse_payload(event_type, data).map(DispatchEvent::RoleDelete)
            }
            _ => Ok(DispatchEvent::Unknown {
                event_type: event_type.to_string(),
            }),
        }
    }

    fn parse_payload<T: DeserializeOwned>(
        event_type: &str,
        data: serde_json::Value,
    ) -> GatewayResult<T> {
        serde_json::from_value(data).map_err(|e| {
            GatewayError::serialization(format!("failed to parse {event_type}: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_incomplete_message() {
        let mut codec = GatewayCodec::new();
        let result = codec.decode_binary(&[0x01, 0x02, 0x03]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_codec_decodes_sync_flushed_frame() {
        use flate2::{Compress, Compression, FlushCompress};

        let json = r#"{"op":11,"d":null}"#;
        let mut compressor = Compress::new(Compression::default(), true);
        let mut compressed = Vec::with_capacity(256);
        compressor
            .compress_vec(json.as_bytes(), &mut compressed, FlushCompress::Sync)
            .unwrap();

        let mut codec = GatewayCodec::new();
        let decoded = codec.decode_binary(&compressed).unwrap();
        assert_eq!(decoded.as_deref(), Some(json));
    }

    #[test]
    fn test_codec_reset() {
        let mut codec = GatewayCodec::new();
        codec.compressed_buffer.extend_from_slice(&[1, 2, 3]);
        codec.reset();
        assert!(codec.compressed_buffer.is_empty());
    }

    #[test]
    fn test_parser_unknown_event_passthrough() {
        let data = serde_json::json!({});
        let result = EventParser::parse_dispatch("PRESENCE_UPDATE", Some(data)).unwrap();
        assert!(matches!(
            result,
            DispatchEvent::Unknown { event_type } if event_type == "PRESENCE_UPDATE"
        ));
    }

    #[test]
    fn test_parser_missing_dispatch_data() {
        let result = EventParser::parse_dispatch("READY", None);
        assert!(matches!(result, Err(GatewayError::ProtocolError { .. })));
    }

    #[test]
    fn test_parse_ready() {
        let data = serde_json::json!({
            "session_id": "abc123",
            "resume_gateway_url": "wss://gateway-us-east1-b.discord.gg",
            "user": {"id": "1", "username": "bot", "discriminator": "0000", "bot": true},
            "guilds": [{"id": "2", "unavailable": true}]
        });

        let result = EventParser::parse_dispatch("READY", Some(data)).unwrap();
        match result {
            DispatchEvent::Ready(ready) => {
                assert_eq!(ready.session_id, "abc123");
                assert_eq!(ready.guilds.len(), 1);
                assert_eq!(ready.guilds[0].unavailable, Some(true));
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_role_delete() {
        let data = serde_json::json!({"guild_id": "1", "role_id": "2"});
        let result = EventParser::parse_dispatch("GUILD_ROLE_DELETE", Some(data)).unwrap();
        match result {
            DispatchEvent::RoleDelete(payload) => {
                assert_eq!(payload.guild_id.as_u64(), 1);
                assert_eq!(payload.role_id.as_u64(), 2);
            }
            other => panic!("expected RoleDelete, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_gateway_message() {
        let message = EventParser::parse_message(r#"{"op":0,"d":{},"s":5,"t":"READY"}"#).unwrap();
        assert_eq!(message.op, 0);
        assert_eq!(message.s, Some(5));
        assert_eq!(message.t.as_deref(), Some("READY"));
    }
}
