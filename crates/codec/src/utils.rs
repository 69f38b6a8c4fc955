//! Lossless text encoding of 64-bit state words.
//!
//! Generator state is a sequence of raw 64-bit words. Runtimes without an
//! unsigned 64-bit integer type store these words as signed values, so the
//! decoder accepts three spellings of the same bit pattern:
//!
//! - `0x`-prefixed hexadecimal (what the encoder writes),
//! - unsigned decimal,
//! - signed decimal, reinterpreted as two's complement.

use crate::error::CodecError;

/// Encode a word as `0x` followed by exactly 16 lowercase hex digits.
pub fn encode_word(word: u64) -> String {
    format!("{word:#018x}")
}

/// Decode a word written by [`encode_word`] or by a signed/unsigned decimal writer.
pub fn decode_word(text: &str) -> Result<u64, CodecError> {
    let text = text.trim();
    if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        if hex.is_empty() || hex.len() > 16 {
            return Err(CodecError::Word(text.to_string()));
        }
        return u64::from_str_radix(hex, 16).map_err(|_| CodecError::Word(text.to_string()));
    }
    if text.starts_with('-') {
        return text
            .parse::<i64>()
            .map(|v| v as u64)
            .map_err(|_| CodecError::Word(text.to_string()));
    }
    text.parse::<u64>()
        .map_err(|_| CodecError::Word(text.to_string()))
}

pub fn encode_words(words: &[u64]) -> Vec<String> {
    words.iter().map(|&w| encode_word(w)).collect()
}

pub fn decode_words<S: AsRef<str>>(texts: &[S]) -> Result<Vec<u64>, CodecError> {
    texts.iter().map(|t| decode_word(t.as_ref())).collect()
}

/// Split little-endian bytes into 64-bit words. The length must be a multiple of 8.
pub fn bytes_to_words(bytes: &[u8]) -> Result<Vec<u64>, CodecError> {
    if bytes.len() % 8 != 0 {
        return Err(CodecError::Encode(format!(
            "state length {} is not a multiple of 8 bytes",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            u64::from_le_bytes(buf)
        })
        .collect())
}

pub fn words_to_bytes(words: &[u64]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}
