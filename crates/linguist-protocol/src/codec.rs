use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::MAX_MESSAGE_SIZE;

/// JSON-lines codec for stream transports: one message per `\n`-terminated line.
pub struct MessageCodec;

impl MessageCodec {
    /// Encode a message as a single line, including the trailing newline.
    pub fn encode<M: Serialize>(msg: &M) -> ProtocolResult<String> {
        let mut line =
            serde_json::to_string(msg).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        if line.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: line.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        line.push('\n');
        Ok(line)
    }

    /// Decode one line. Surrounding whitespace (including the newline) is ignored.
    pub fn decode<M: DeserializeOwned>(line: &str) -> ProtocolResult<M> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::FramingError("empty line".into()));
        }
        if line.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: line.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        serde_json::from_str(line).map_err(|e| ProtocolError::Deserialization(e.to_string()))
    }
}
