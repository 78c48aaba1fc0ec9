//! Generic length-prefixed wire encoding.
//!
//! Spec §6 assumes "a generic length-prefixed serializer"; this is it. The
//! `Converter` trait is the systems-language analogue of the C++
//! original's `converter_t`: anything implementing `Serialize`/
//! `Deserialize` gets framed encode/decode for free via [`encode`]/[`decode`],
//! and structs opt into the scheme with `#[derive(Serialize, Deserialize)]`
//! exactly as `convert(converter)` was implemented by hand in the original.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::FormatError;

/// Encodes `value` with a 4-byte big-endian length prefix.
pub fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    let body = bincode::serialize(value).expect("in-memory serialization cannot fail");
    let mut out = Vec::with_capacity(4 + body.len());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

/// Decodes a value previously produced by [`encode`], rejecting trailing
/// bytes (a truncated or over-long frame is a protocol violation).
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, FormatError> {
    if bytes.len() < 4 {
        return Err(FormatError::Truncated {
            expected: 4,
            got: bytes.len(),
        });
    }
    let len = u32::from_be_bytes(bytes[..4].try_into().unwrap()) as usize;
    if bytes.len() < 4 + len {
        return Err(FormatError::Truncated {
            expected: 4 + len,
            got: bytes.len(),
        });
    }
    if bytes.len() != 4 + len {
        return Err(FormatError::TrailingBytes);
    }
    bincode::deserialize(&bytes[4..4 + len]).map_err(|_| FormatError::TrailingBytes)
}

/// Concatenates several already-framed messages into one wire message, the
/// way `group_message`'s bundling packs mixed broadcast/pairwise traffic
/// destined for one party into a single transport round (spec §4.1).
pub fn bundle(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for frame in frames {
        out.extend_from_slice(&(frame.len() as u32).to_be_bytes());
        out.extend_from_slice(frame);
    }
    out
}

/// Splits a bundle produced by [`bundle`] back into its constituent frames.
pub fn unbundle(bytes: &[u8], count: usize) -> Result<Vec<Vec<u8>>, FormatError> {
    let mut out = Vec::with_capacity(count);
    let mut offset = 0;
    for _ in 0..count {
        if bytes.len() < offset + 4 {
            return Err(FormatError::Truncated {
                expected: offset + 4,
                got: bytes.len(),
            });
        }
        let len = u32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap()) as usize;
        offset += 4;
        if bytes.len() < offset + len {
            return Err(FormatError::Truncated {
                expected: offset + len,
                got: bytes.len(),
            });
        }
        out.push(bytes[offset..offset + len].to_vec());
        offset += len;
    }
    if offset != bytes.len() {
        return Err(FormatError::TrailingBytes);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let v: Vec<u32> = vec![1, 2, 3, 4];
        let encoded = encode(&v);
        let decoded: Vec<u32> = decode(&encoded).unwrap();
        assert_eq!(v, decoded);
    }

    #[test]
    fn truncated_is_rejected() {
        let v = 42u64;
        let mut encoded = encode(&v);
        encoded.truncate(encoded.len() - 1);
        assert!(decode::<u64>(&encoded).is_err());
    }

    #[test]
    fn bundle_round_trip() {
        let frames = vec![encode(&1u8), encode(&"hello".to_string()), encode(&[1, 2, 3])];
        let bundled = bundle(&frames);
        let unbundled = unbundle(&bundled, frames.len()).unwrap();
        assert_eq!(frames, unbundled);
    }
}
