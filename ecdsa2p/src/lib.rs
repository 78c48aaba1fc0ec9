//! Two-party ECDSA (spec §4.6): distributed key generation, key refresh,
//! and batch signing for a `Q = x_1·G + x_2·G` key split between P1 (who
//! also holds a Paillier keypair over `x_1`) and P2.

pub mod dkg;
pub mod error;
pub mod refresh;
pub mod sign;

pub use dkg::dkg;
pub use error::Ecdsa2pError;
pub use refresh::refresh;
pub use sign::{sign_batch, sign_batch_with_global_abort, Signature};
