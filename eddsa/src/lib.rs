//! Schnorr/EdDSA/BIP340 two-party and n-party protocols (spec §4.8,
//! §4.9): committed-broadcast DKG, pairwise-blinding refresh, and a
//! batched additive-share signing protocol for a `Q = Σ x_i·G` key,
//! parameterized over [`challenge::SchnorrVariant`] so the same round
//! logic serves both Ed25519/EdDSA and secp256k1/BIP340. The 2-party
//! entry points in [`sign_2p`] and the n-party ones in [`dkg`]/
//! [`refresh`]/[`sign_mp`] share one implementation via
//! [`cb_mpc_core::job2p::Job2P::as_mp`]. [`threshold`] adds an
//! access-control tree (spec §4.5) on top, so a quorum smaller than the
//! full party set can reconstruct a usable additive share.

pub mod challenge;
pub mod dkg;
pub mod error;
pub mod refresh;
pub mod sign_2p;
pub mod sign_mp;
pub mod threshold;

pub use challenge::{Bip340Variant, Ed25519Variant, SchnorrVariant};
pub use dkg::dkg;
pub use error::EddsaError;
pub use refresh::refresh;
pub use sign_2p::sign_2p;
pub use sign_mp::sign_mp;
pub use threshold::{reexpress_for_quorum, threshold_dkg, ThresholdEckeyShare};
