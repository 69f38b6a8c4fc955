//! Versioned document header.

use crate::error::CodecError;
use serde_json::Value;

/// Check the `format` and `version` fields of a document.
///
/// Returns the document version on success. Documents with a different
/// format tag, a missing header, or a version newer than `supported` are
/// rejected so that callers never resume from state they cannot interpret.
pub fn check_header(doc: &Value, expected: &str, supported: u64) -> Result<u64, CodecError> {
    let format = doc
        .get("format")
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::Decode("missing 'format' field".into()))?;
    if format != expected {
        return Err(CodecError::Format {
            expected: expected.to_string(),
            found: format.to_string(),
        });
    }
    let version = doc
        .get("version")
        .and_then(Value::as_u64)
        .ok_or_else(|| CodecError::Decode("missing or invalid 'version' field".into()))?;
    if version == 0 || version > supported {
        return Err(CodecError::Version {
            found: version,
            supported,
        });
    }
    Ok(version)
}
