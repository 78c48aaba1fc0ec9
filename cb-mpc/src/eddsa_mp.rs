//! n-party Schnorr/EdDSA/BIP340 facade (spec §6): `dkg`/`refresh`/
//! `sign_batch` over `cb-mpc-eddsa`'s n-party entry points, plus the
//! access-control-tree threshold variant (spec §4.5).

use std::collections::HashMap;

use cb_mpc_ac::tree::Node;
use cb_mpc_core::jobmp::JobMp;
use cb_mpc_core::pid::{Pid, PartyIndex};
use cb_mpc_core::transport::Delivery;
use cb_mpc_eddsa::challenge::SchnorrVariant;
use cb_mpc_eddsa::threshold::ThresholdEckeyShare;
use cb_mpc_key_share::eckey_mp::EckeyMp;
use generic_ec::{hash_to_curve::FromHash, Curve, Scalar};
use rand_core::{CryptoRng, RngCore};

use crate::error::CryptoError;

pub async fn dkg<E, D, R>(job: &JobMp<D>, rng: &mut R) -> Result<EckeyMp<E>, CryptoError>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    Ok(cb_mpc_eddsa::dkg::<E, D, R>(job, rng).await?)
}

pub async fn refresh<E, D, R>(job: &JobMp<D>, key: EckeyMp<E>, rng: &mut R) -> Result<EckeyMp<E>, CryptoError>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    Ok(cb_mpc_eddsa::refresh::<E, D, R>(job, key, rng).await?)
}

/// Signs each of `messages`, returning the encoded signatures to
/// `sig_receiver` and empty vectors to everyone else.
pub async fn sign_batch<E, V, D, R>(
    job: &JobMp<D>,
    key: &EckeyMp<E>,
    messages: &[Vec<u8>],
    sig_receiver: PartyIndex,
    rng: &mut R,
) -> Result<Vec<Vec<u8>>, CryptoError>
where
    E: Curve,
    V: SchnorrVariant<E>,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    Ok(cb_mpc_eddsa::sign_mp::<E, V, D, R>(job, key, messages, sig_receiver, rng).await?)
}

/// Threshold DKG (spec §4.5): shares `x` over `node` instead of flatly
/// across all `n` parties, so any quorum `node` accepts can later
/// re-express its shares into a usable additive sharing.
pub async fn threshold_dkg<E, D, R>(
    job: &JobMp<D>,
    node: &Node,
    rng: &mut R,
) -> Result<ThresholdEckeyShare<E>, CryptoError>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    Ok(cb_mpc_eddsa::threshold_dkg::<E, D, R>(job, node, rng).await?)
}

/// Re-expresses a quorum's leaf shares (one `Vec<Scalar<E>>` per active
/// sharer, keyed by pid) into this party's own additive share of `Q`.
pub fn reexpress_for_quorum<E: Curve>(
    share: &ThresholdEckeyShare<E>,
    active: &HashMap<Pid, Vec<Scalar<E>>>,
) -> Result<Scalar<E>, CryptoError> {
    cb_mpc_eddsa::reexpress_for_quorum(share, active).map_err(|e| e.into())
}
