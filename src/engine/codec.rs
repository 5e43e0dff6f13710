use crate::CodecError;
use serde_json::Value;

/// Converts records to and from their on-disk text form.
pub trait Codec: Send + Sync {
    fn encode(&self, value: &Value) -> std::result::Result<String, CodecError>;
    fn decode(&self, bytes: &[u8]) -> std::result::Result<Value, CodecError>;

    /// File extension (without the leading dot) for records in this format.
    fn extension(&self) -> &str;
}

/// Pretty-printed JSON, stored as `.json` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> std::result::Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> std::result::Result<Value, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn extension(&self) -> &str {
        "json"
    }
}
