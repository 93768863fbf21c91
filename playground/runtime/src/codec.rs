//! Conversion between host strings and sentinel-terminated byte sequences.
//!
//! Strings cross the module boundary as raw UTF-8 followed by a single zero
//! byte. The length is never transmitted; readers scan for the sentinel.
//! Text that itself contains a NUL character cannot survive the trip: the
//! reader stops at the first zero byte.

use crate::error::Result;

/// The byte that terminates every string in module memory.
pub const SENTINEL: u8 = 0;

/// Encode `text` as UTF-8 bytes followed by the sentinel.
pub fn encode(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len() + 1);
    bytes.extend_from_slice(text.as_bytes());
    bytes.push(SENTINEL);
    bytes
}

/// Decode bytes (sentinel already stripped) back into a string.
///
/// Invalid UTF-8 is an error, never replaced with U+FFFD.
pub fn decode(bytes: &[u8]) -> Result<String> {
    Ok(std::str::from_utf8(bytes)?.to_owned())
}
