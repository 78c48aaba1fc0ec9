//! Unified error taxonomy (spec §7): every protocol-level error collapses
//! into one of five categories plus transport, each carrying an optional
//! string message rather than the protocol-specific payload the
//! underlying crates use internally. This is the facade's own type — the
//! sub-crates keep their own richer `thiserror` enums for in-crate
//! matching; `CryptoError` is what an embedder (CLI, FFI boundary) wants
//! instead: a small, stable, serializable-by-name set of codes.

use cb_mpc_ac::tree::AcError;
use cb_mpc_core::error::{FormatError, JobError, TransportError};
use cb_mpc_core::random_oracle::RandomOracleError;
use cb_mpc_ecdsa2p::error::Ecdsa2pError;
use cb_mpc_ecdsa_mp::error::EcdsaMpError;
use cb_mpc_eddsa::error::EddsaError;
use cb_mpc_hd::error::HdError;
use cb_mpc_hd::pve::PveError;
use cb_mpc_key_share::ecdsa2p_key::InvalidKeyShare as Ecdsa2pInvalidKeyShare;
use cb_mpc_key_share::eckey_mp::InvalidKeyShare as EckeyMpInvalidKeyShare;
use cb_mpc_zk::paillier::PaillierProofError;
use thiserror::Error;

/// `E_CRYPTO` / `E_FORMAT` / `E_BADARG` / `E_ECDSA_2P_BIT_LEAK` /
/// `E_INSUFFICIENT`, plus a `Transport` category for errors the job layer
/// propagates unchanged (spec §7: "Transport errors are propagated
/// unchanged and never retried").
#[derive(Debug, Error)]
pub enum CryptoError {
    /// `E_CRYPTO`: a cryptographic check — proof verification, key-share
    /// consistency, ciphertext well-formedness — failed.
    #[error("crypto error: {0}")]
    Crypto(String),
    /// `E_FORMAT`: a peer's message failed to deserialize.
    #[error("format error: {0}")]
    Format(String),
    /// `E_BADARG`: caller supplied inconsistent or out-of-range arguments.
    #[error("bad argument: {0}")]
    BadArg(String),
    /// `E_ECDSA_2P_BIT_LEAK`: the 2-party ECDSA global-abort signing
    /// variant completed but the result failed verification, disclosing
    /// one bit of the other party's share.
    #[error("global-abort signature failed verification (disclosed a bit of the co-signer's share): {0}")]
    EcdsaBitLeak(String),
    /// `E_INSUFFICIENT`: an active party set does not satisfy a
    /// threshold/access-control structure.
    #[error("insufficient parties for the access structure: {0}")]
    Insufficient(String),
    /// A transport-layer failure, surfaced unchanged rather than folded
    /// into one of the categories above.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<FormatError> for CryptoError {
    fn from(e: FormatError) -> Self {
        CryptoError::Format(e.to_string())
    }
}

impl<E: std::error::Error> From<TransportError<E>> for CryptoError {
    fn from(e: TransportError<E>) -> Self {
        CryptoError::Transport(e.to_string())
    }
}

impl<E: std::error::Error> From<JobError<E>> for CryptoError {
    fn from(e: JobError<E>) -> Self {
        match e {
            JobError::Transport(t) => t.into(),
            JobError::Format(f) => f.into(),
        }
    }
}

impl From<RandomOracleError> for CryptoError {
    fn from(e: RandomOracleError) -> Self {
        CryptoError::Crypto(e.to_string())
    }
}

impl From<Ecdsa2pInvalidKeyShare> for CryptoError {
    fn from(e: Ecdsa2pInvalidKeyShare) -> Self {
        CryptoError::Crypto(e.to_string())
    }
}

impl From<EckeyMpInvalidKeyShare> for CryptoError {
    fn from(e: EckeyMpInvalidKeyShare) -> Self {
        CryptoError::Crypto(e.to_string())
    }
}

impl From<AcError> for CryptoError {
    fn from(e: AcError) -> Self {
        match e {
            AcError::QuorumNotSatisfied | AcError::MissingShare => CryptoError::Insufficient(e.to_string()),
            AcError::ThresholdExceedsChildren { .. } | AcError::EmptyChildren => CryptoError::BadArg(e.to_string()),
        }
    }
}

impl From<PaillierProofError> for CryptoError {
    fn from(e: PaillierProofError) -> Self {
        CryptoError::Crypto(e.to_string())
    }
}

impl<E: std::error::Error> From<Ecdsa2pError<E>> for CryptoError {
    fn from(e: Ecdsa2pError<E>) -> Self {
        match e {
            Ecdsa2pError::Job(j) => j.into(),
            Ecdsa2pError::InvalidKeyShare(k) => k.into(),
            Ecdsa2pError::Crypto(msg) => CryptoError::Crypto(msg.to_string()),
            Ecdsa2pError::ProofFailed(msg) => CryptoError::Crypto(msg.to_string()),
            Ecdsa2pError::BadArg => CryptoError::BadArg("message/signature count mismatch".to_string()),
            Ecdsa2pError::BitLeak => {
                CryptoError::EcdsaBitLeak("global-abort signature failed its own verification".to_string())
            }
        }
    }
}

impl<E: std::error::Error> From<EcdsaMpError<E>> for CryptoError {
    fn from(e: EcdsaMpError<E>) -> Self {
        match e {
            EcdsaMpError::Job(j) => j.into(),
            EcdsaMpError::InvalidKeyShare(k) => k.into(),
            EcdsaMpError::ProofFailed(msg) => CryptoError::Crypto(msg.to_string()),
            EcdsaMpError::Crypto(msg) => CryptoError::Crypto(msg.to_string()),
            EcdsaMpError::BadArg(msg) => CryptoError::BadArg(msg.to_string()),
        }
    }
}

impl<E: std::error::Error> From<EddsaError<E>> for CryptoError {
    fn from(e: EddsaError<E>) -> Self {
        match e {
            EddsaError::Job(j) => j.into(),
            EddsaError::InvalidKeyShare(k) => k.into(),
            EddsaError::Ac(a) => a.into(),
            EddsaError::ProofFailed(msg) => CryptoError::Crypto(msg.to_string()),
            EddsaError::Crypto(msg) => CryptoError::Crypto(msg.to_string()),
            EddsaError::BadArg(msg) => CryptoError::BadArg(msg.to_string()),
        }
    }
}

impl<E: std::error::Error> From<HdError<E>> for CryptoError {
    fn from(e: HdError<E>) -> Self {
        match e {
            HdError::Job(j) => j.into(),
            HdError::Ecdsa2p(inner) => inner.into(),
            HdError::Eddsa(inner) => inner.into(),
            HdError::RandomOracle(r) => r.into(),
            HdError::ProofFailed(msg) => CryptoError::Crypto(msg.to_string()),
            HdError::BadArg(msg) => CryptoError::BadArg(msg.to_string()),
        }
    }
}

impl From<PveError> for CryptoError {
    fn from(e: PveError) -> Self {
        let msg = e.to_string();
        match e {
            PveError::Proof(p) => p.into(),
            PveError::Ac(a) => a.into(),
            PveError::Mismatch => CryptoError::Crypto(msg),
            PveError::MissingRecipientKey(_) => CryptoError::BadArg(msg),
        }
    }
}
