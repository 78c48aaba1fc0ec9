//! Primitives shared by every protocol (spec §4 preamble component table,
//! "Primitives: hashes, AEAD, commitments, Paillier, Pedersen,
//! ECIES/KEM").
//!
//! EC scalar/point arithmetic and hash-to-curve are not reproduced here —
//! spec §1 assumes a competent library provides them, and the workspace
//! takes that library to be `generic-ec`/`generic-ec-zkp`, used directly
//! wherever a protocol crate needs a point or scalar. This crate covers
//! everything *above* that façade: Paillier, the two Pedersen variants,
//! ElGamal-in-the-exponent, and symmetric AEAD. Publicly-verifiable
//! encryption (the "ECIES/KEM" line of the component table, spec §4.11)
//! is built in `cb-mpc-hd::pve` directly on this crate's Paillier type,
//! not on a separate KEM module — see `DESIGN.md`.

pub mod aead;
pub mod elgamal_exp;
pub mod paillier;
pub mod pedersen;
pub mod serde_support;
