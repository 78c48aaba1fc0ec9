//! Error taxonomy for HD keyset derivation and refresh (spec §7
//! `E_CRYPTO`/`E_BADARG`, spec §4.10).

use cb_mpc_core::error::JobError;
use cb_mpc_core::random_oracle::RandomOracleError;
use cb_mpc_ecdsa2p::error::Ecdsa2pError;
use cb_mpc_eddsa::error::EddsaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HdError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Job(#[from] JobError<E>),
    #[error(transparent)]
    Ecdsa2p(#[from] Ecdsa2pError<E>),
    #[error(transparent)]
    Eddsa(#[from] EddsaError<E>),
    #[error(transparent)]
    RandomOracle(#[from] RandomOracleError),
    #[error("a zero-knowledge proof failed to verify: {0}")]
    ProofFailed(&'static str),
    #[error("bad argument: {0}")]
    BadArg(&'static str),
}
