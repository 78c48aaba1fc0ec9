//! Zero-knowledge proof library (spec §4.4): a fixed set of proof
//! systems, each non-interactive and Fiat-Shamir, domain-separated by a
//! `sid` and an `aux` 64-bit tag.

pub mod dl;
pub mod elgamal;
pub mod integer_commit;
pub mod paillier;
pub mod verifier_cache;
