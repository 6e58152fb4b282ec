//! Binary codec for persisted values
//!
//! Thin wrapper over bincode's standard configuration. Decoding insists on
//! consuming the whole input so a truncated or padded record is an error.

use crate::{CoreError, CoreResult};
use bincode::{Decode, Encode};

/// Encode a value into bytes
pub fn encode<T: Encode>(value: &T) -> CoreResult<Vec<u8>> {
    bincode::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| CoreError::Serialization(e.to_string()))
}

/// Decode a value from bytes
pub fn decode<T: Decode<()>>(data: &[u8]) -> CoreResult<T> {
    let (value, read) = bincode::decode_from_slice(data, bincode::config::standard())
        .map_err(|e| CoreError::Deserialization(e.to_string()))?;

    if read != data.len() {
        return Err(CoreError::Deserialization(format!(
            "{} trailing bytes",
            data.len() - read
        )));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_encoding() {
        let encoded = encode(&42i64).unwrap();
        assert_eq!(decode::<i64>(&encoded).unwrap(), 42);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut encoded = encode(&7i64).unwrap();
        encoded.push(0);
        assert!(matches!(
            decode::<i64>(&encoded),
            Err(CoreError::Deserialization(_))
        ));
    }

    #[test]
    fn test_truncated_input_rejected() {
        assert!(decode::<u64>(&[]).is_err());
    }
}
