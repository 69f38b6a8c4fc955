use crate::error::CodecError;
use crate::traits::Codec;
use serde_json::Value;

/// Strategy: indented JSON with a trailing newline.
///
/// This is the default for snapshots written to disk since it keeps
/// line-oriented diffs readable.
pub struct PrettyJson;

impl Codec for PrettyJson {
    fn encode(&self, doc: &Value) -> Result<Vec<u8>, CodecError> {
        let mut out = serde_json::to_vec_pretty(doc)
            .map_err(|e| CodecError::Encode(format!("JSON error: {e}")))?;
        out.push(b'\n');
        Ok(out)
    }

    fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        Ok(serde_json::from_slice(data)?)
    }
}
