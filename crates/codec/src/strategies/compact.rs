use crate::error::CodecError;
use crate::traits::Codec;
use serde_json::Value;

/// Strategy: single-line JSON without insignificant whitespace.
pub struct CompactJson;

impl Codec for CompactJson {
    fn encode(&self, doc: &Value) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(doc).map_err(|e| CodecError::Encode(format!("JSON error: {e}")))
    }

    fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        Ok(serde_json::from_slice(data)?)
    }
}
