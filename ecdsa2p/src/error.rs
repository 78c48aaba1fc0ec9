//! Error taxonomy for the 2-party ECDSA protocol (spec §7 `E_CRYPTO`/
//! `E_BADARG`/`E_ECDSA_2P_BIT_LEAK`).

use cb_mpc_core::error::JobError;
use cb_mpc_key_share::ecdsa2p_key::InvalidKeyShare;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Ecdsa2pError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Job(#[from] JobError<E>),
    #[error(transparent)]
    InvalidKeyShare(#[from] InvalidKeyShare),
    #[error("Paillier modulus or ciphertext failed a well-formedness check: {0}")]
    Crypto(&'static str),
    #[error("a zero-knowledge proof failed to verify: {0}")]
    ProofFailed(&'static str),
    #[error("message/signature count mismatch")]
    BadArg,
    /// Spec §7, §4.6 "Global-abort sign": the cheap-message-4 variant
    /// completes the arithmetic before checking the result, so a cheating
    /// P2 can make P1 produce a signature that fails verification — this
    /// is the disclosure the `sign_with_global_abort` variant accepts in
    /// exchange for one fewer zero-knowledge proof per batch entry.
    #[error("signature failed to verify under the global-abort variant (disclosed a bit of x2)")]
    BitLeak,
}
