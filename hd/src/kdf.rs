//! Byte-level helpers shared by [`crate::derive`]: wide scalar reduction
//! and HMAC-SHA-512 counter-mode expansion.
//!
//! Grounded on `cb_mpc_primitives::aead::derive_key`'s HMAC-Extract-then-
//! Expand shape, generalized from one 32-byte block to as many blocks as
//! a derivation step needs (spec §4.10 asks for `|q| + 16 + 32` bytes out
//! of one hash).

use generic_ec::{Curve, Point, Scalar};
use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// HKDF-Expand-shaped counter-mode output: as many `HMAC-SHA-512(ikm,
/// info ‖ counter)` blocks as needed to fill `len` bytes.
pub fn expand(ikm: &[u8], info: &[u8], len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    let mut counter: u8 = 1;
    while out.len() < len {
        let mut mac = HmacSha512::new_from_slice(ikm).expect("hmac accepts any key length");
        mac.update(info);
        mac.update(&[counter]);
        out.extend_from_slice(&mac.finalize().into_bytes());
        counter = counter.checked_add(1).expect("derivation never needs this many blocks");
    }
    out.truncate(len);
    out
}

/// Big-endian bytes to a scalar via repeated `acc = acc*256 + byte`
/// (`generic-ec` reduces mod the curve order as arithmetic proceeds) —
/// feeding in `|q| + 16` bytes makes the reduction bias statistically
/// negligible, the "wide reduction" spec §4.10 asks for.
pub fn scalar_from_be_bytes<E: Curve>(bytes: &[u8]) -> Scalar<E> {
    let base = Scalar::<E>::from(256u64);
    let mut acc = Scalar::<E>::from(0u64);
    for &byte in bytes {
        acc = acc * base + Scalar::<E>::from(byte as u64);
    }
    acc
}

/// A point's compressed encoding as a plain byte vector — `to_bytes`'s
/// return type only reliably coerces to `&[u8]` in a typed position, the
/// same coercion `cb_mpc_eddsa::challenge` already relies on.
pub fn point_bytes<E: Curve>(point: &Point<E>) -> Vec<u8> {
    let encoded: &[u8] = &point.to_bytes(true);
    encoded.to_vec()
}

/// The curve order's byte length, read off a scalar's own encoding
/// rather than assuming a per-curve constant.
pub fn scalar_byte_len<E: Curve>() -> usize {
    Scalar::<E>::from(0u64).to_be_bytes().as_bytes().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use generic_ec::curves::Secp256k1;

    type E = Secp256k1;

    #[test]
    fn expand_is_deterministic_and_length_exact() {
        let a = expand(b"ikm", b"info", 100);
        let b = expand(b"ikm", b"info", 100);
        assert_eq!(a, b);
        assert_eq!(a.len(), 100);
    }

    #[test]
    fn expand_is_sensitive_to_info() {
        let a = expand(b"ikm", b"info-a", 64);
        let b = expand(b"ikm", b"info-b", 64);
        assert_ne!(a, b);
    }

    #[test]
    fn scalar_byte_len_is_32_for_secp256k1() {
        assert_eq!(scalar_byte_len::<E>(), 32);
    }

    #[test]
    fn scalar_from_be_bytes_is_deterministic() {
        let bytes = expand(b"seed", b"scalar", 48);
        assert_eq!(scalar_from_be_bytes::<E>(&bytes), scalar_from_be_bytes::<E>(&bytes));
    }
}
