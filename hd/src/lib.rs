//! BIP32-style HD keysets (spec §4.10): two 2P-DKGs bootstrap a signing
//! key `x` and a VRF key `k`; [`vrf::vrf_compute_2p`] turns a derivation
//! label into a deterministic curve point via the VRF key;
//! [`derive::hard_derive_output`]/[`derive::non_hard_derive_offset`]
//! turn that point (or a public chain code) into a share offset.
//! [`refresh`] rotates both keys' additive sharing without moving `Q`.
//! [`pve`] is a separate cold-storage-backup helper (spec §4.11):
//! publicly-verifiable encryption of a share to a recipient's Paillier
//! key, single-recipient or spread over an access-control tree.

pub mod derive;
pub mod error;
pub mod init;
pub mod kdf;
pub mod pve;
pub mod refresh;
pub mod vrf;

pub use derive::{
    apply_hard_derive_ecdsa, apply_hard_derive_eddsa, apply_non_hard_derive_ecdsa,
    apply_non_hard_derive_eddsa, hard_derive_output, non_hard_derive_offset, HardDeriveOutput,
};
pub use error::HdError;
pub use init::{init_ecdsa_2p, init_eddsa_2p, HdKeysetEcdsa2p, HdKeysetEddsa2p};
pub use pve::{AcPveBundle, PveCiphertext, PveError};
pub use refresh::{refresh_ecdsa_2p, refresh_eddsa_2p};
pub use vrf::vrf_compute_2p;
