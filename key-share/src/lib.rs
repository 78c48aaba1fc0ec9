//! Key-share data types shared across the protocol crates (spec §3):
//! the 2-party ECDSA key share with its Paillier material and the
//! n-party ECDSA/Schnorr key share. Grounded on
//! `examples/felicityin-cggmp21/src/key_share.rs`'s `IncompleteKeyShare`/
//! `KeyShare`/`PartyAux` split and its `validate()` consistency checks,
//! generalized from the teacher's single n-party shape to this spec's
//! separate 2P and n-party representations.

pub mod ecdsa2p_key;
pub mod eckey_mp;

pub use ecdsa2p_key::{Ecdsa2pKey, IncompleteEcdsa2pKey, Role};
pub use eckey_mp::EckeyMp;
