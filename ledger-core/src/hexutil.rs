//! `0x` prefixed hex encoding

use crate::HexError;

/// Encode bytes as a hex string with a `0x` prefix.
pub fn encode<T: AsRef<[u8]>>(bytes: T) -> String {
    let mut out = String::with_capacity(bytes.as_ref().len() * 2 + 2);
    out.push_str("0x");
    out.push_str(&hex::encode(bytes));
    out
}

/// Decode a hex string carrying a `0x` (or `0X`) prefix.
pub fn decode(input: &str) -> Result<Vec<u8>, HexError> {
    if input.is_empty() {
        return Err(HexError::Empty);
    }

    if !has_hex_prefix(input) {
        return Err(HexError::MissingPrefix);
    }

    hex::decode(&input[2..]).map_err(|e| match e {
        hex::FromHexError::OddLength => HexError::OddLength,
        _ => HexError::InvalidCharacter,
    })
}

fn has_hex_prefix(input: &str) -> bool {
    let bytes = input.as_bytes();
    bytes.len() >= 2 && bytes[0] == b'0' && (bytes[1] == b'x' || bytes[1] == b'X')
}
