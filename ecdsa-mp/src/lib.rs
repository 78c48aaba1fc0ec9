//! N-party ECDSA (spec §4.7): committed-broadcast DKG, pairwise-blinding
//! refresh, and an OT-based multiplicative-to-additive signing protocol
//! for a `Q = Σ x_i·G` key split across an arbitrary number of parties,
//! with one designated `sig_receiver` collecting the final signature.

pub mod dkg;
pub mod error;
mod ot;
pub mod refresh;
pub mod sign;

pub use dkg::dkg;
pub use error::EcdsaMpError;
pub use refresh::refresh;
pub use sign::{sign, Signature};
