//! Byte encoding of [`PrefValue`]s for the on-disk backends.
//!
//! Format (2 bytes overhead):
//! ```text
//! [MAGIC: 0xB5][VERSION: u8][PAYLOAD: postcard-encoded PrefValue]
//! ```

use crate::traits::PrefValue;

/// Magic byte identifying an encoded preference value.
pub const MAGIC_BYTE: u8 = 0xB5;

/// Current encoding version.
pub const CODEC_VERSION: u8 = 1;

/// Size of the header in bytes.
pub const HEADER_SIZE: usize = 2;

/// Error decoding a stored value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// Data is too short to contain a header.
    #[error("data too short for value header")]
    TooShort,
    /// Missing or incorrect magic byte.
    #[error("invalid magic byte: 0x{0:02X}, expected 0xB5")]
    InvalidMagic(u8),
    /// Written by a newer (or unknown) encoder.
    #[error("unsupported value encoding v{0}")]
    UnsupportedVersion(u8),
    /// The payload could not be encoded or decoded.
    #[error("payload error: {0}")]
    Payload(String),
}

/// Encode a value with the current header.
pub fn encode_value(value: &PrefValue) -> Result<Vec<u8>, CodecError> {
    let payload = postcard::to_allocvec(value).map_err(|e| CodecError::Payload(e.to_string()))?;
    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.push(MAGIC_BYTE);
    bytes.push(CODEC_VERSION);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a value written by [`encode_value`].
pub fn decode_value(data: &[u8]) -> Result<PrefValue, CodecError> {
    if data.len() < HEADER_SIZE {
        return Err(CodecError::TooShort);
    }
    if data[0] != MAGIC_BYTE {
        return Err(CodecError::InvalidMagic(data[0]));
    }
    if data[1] != CODEC_VERSION {
        return Err(CodecError::UnsupportedVersion(data[1]));
    }
    postcard::from_bytes(&data[HEADER_SIZE..]).map_err(|e| CodecError::Payload(e.to_string()))
}
