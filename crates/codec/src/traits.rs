use crate::error::CodecError;
use serde_json::Value;

/// Core trait for document codecs.
///
/// A codec turns a structured document into bytes and back. Every strategy
/// must be lossless for the documents it produces: `decode(encode(doc))`
/// yields a document equal to `doc`.
pub trait Codec {
    fn encode(&self, doc: &Value) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, data: &[u8]) -> Result<Value, CodecError>;
}
