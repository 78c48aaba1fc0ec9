//! n-party ECDSA facade (spec §6): `dkg`/`refresh`/`sign` wrapping
//! `cb-mpc-ecdsa-mp`.

use cb_mpc_core::jobmp::JobMp;
use cb_mpc_core::pid::PartyIndex;
use cb_mpc_core::transport::Delivery;
use cb_mpc_key_share::eckey_mp::EckeyMp;
use generic_ec::coords::AlwaysHasAffineX;
use generic_ec::{hash_to_curve::FromHash, Curve, Point, Scalar};
use rand_core::{CryptoRng, RngCore};

use crate::error::CryptoError;

pub async fn dkg<E, D, R>(job: &JobMp<D>, rng: &mut R) -> Result<EckeyMp<E>, CryptoError>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    Ok(cb_mpc_ecdsa_mp::dkg::<E, D, R>(job, rng).await?)
}

pub async fn refresh<E, D, R>(job: &JobMp<D>, key: EckeyMp<E>, rng: &mut R) -> Result<EckeyMp<E>, CryptoError>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    Ok(cb_mpc_ecdsa_mp::refresh::<E, D, R>(job, key, rng).await?)
}

/// Signs `message`, returning a DER-encoded signature to `sig_receiver`
/// and `None` to everyone else.
pub async fn sign<E, D, R>(
    job: &JobMp<D>,
    key: &EckeyMp<E>,
    message: Scalar<E>,
    sig_receiver: PartyIndex,
    rng: &mut R,
) -> Result<Option<Vec<u8>>, CryptoError>
where
    E: Curve,
    Point<E>: AlwaysHasAffineX<E>,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    let sig = cb_mpc_ecdsa_mp::sign::sign::<E, D, R>(job, key, message, sig_receiver, rng).await?;
    Ok(sig.map(|s| s.to_der()))
}
