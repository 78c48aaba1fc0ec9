//! Error taxonomy for the Schnorr/EdDSA/BIP340 protocols (spec §7
//! `E_CRYPTO`/`E_BADARG`).

use cb_mpc_ac::tree::AcError;
use cb_mpc_core::error::JobError;
use cb_mpc_key_share::eckey_mp::InvalidKeyShare;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EddsaError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Job(#[from] JobError<E>),
    #[error(transparent)]
    InvalidKeyShare(#[from] InvalidKeyShare),
    #[error(transparent)]
    Ac(#[from] AcError),
    #[error("a zero-knowledge proof failed to verify: {0}")]
    ProofFailed(&'static str),
    #[error("{0}")]
    Crypto(&'static str),
    #[error("bad argument: {0}")]
    BadArg(&'static str),
}
