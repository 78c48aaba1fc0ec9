//! 2-party ECDSA facade (spec §6): `dkg`/`refresh`/`sign_batch` wrapping
//! `cb-mpc-ecdsa2p`, returning DER-encoded signatures and folding its
//! error taxonomy into [`crate::error::CryptoError`].

use cb_mpc_core::job2p::Job2P;
use cb_mpc_core::security_level::SecurityLevel;
use cb_mpc_core::transport::Delivery;
use cb_mpc_key_share::ecdsa2p_key::Ecdsa2pKey;
use generic_ec::coords::AlwaysHasAffineX;
use generic_ec::{hash_to_curve::FromHash, Curve, Point, Scalar};
use rand_core::{CryptoRng, RngCore};

use crate::error::CryptoError;

pub async fn dkg<E, L, D, R>(job: &Job2P<D>, rng: &mut R) -> Result<Ecdsa2pKey<E>, CryptoError>
where
    E: Curve,
    Scalar<E>: FromHash,
    L: SecurityLevel,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    Ok(cb_mpc_ecdsa2p::dkg::<E, L, D, R>(job, rng).await?)
}

pub async fn refresh<E, L, D, R>(job: &Job2P<D>, key: Ecdsa2pKey<E>, rng: &mut R) -> Result<Ecdsa2pKey<E>, CryptoError>
where
    E: Curve,
    Scalar<E>: FromHash,
    L: SecurityLevel,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    Ok(cb_mpc_ecdsa2p::refresh::<E, L, D, R>(job, key, rng).await?)
}

/// Signs `messages`, returning DER-encoded signatures in the same order.
pub async fn sign_batch<E, L, D, R>(
    job: &Job2P<D>,
    key: &Ecdsa2pKey<E>,
    messages: &[Scalar<E>],
    rng: &mut R,
) -> Result<Vec<Vec<u8>>, CryptoError>
where
    E: Curve,
    Point<E>: AlwaysHasAffineX<E>,
    Scalar<E>: FromHash,
    L: SecurityLevel,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    let sigs = cb_mpc_ecdsa2p::sign::sign_batch::<E, L, D, R>(job, key, messages, rng).await?;
    Ok(sigs.iter().map(|s| s.to_der()).collect())
}

/// The cheap (fewer zero-knowledge proofs) variant: may return
/// [`CryptoError::EcdsaBitLeak`] if the result fails its own check.
pub async fn sign_batch_with_global_abort<E, L, D, R>(
    job: &Job2P<D>,
    key: &Ecdsa2pKey<E>,
    messages: &[Scalar<E>],
    rng: &mut R,
) -> Result<Vec<Vec<u8>>, CryptoError>
where
    E: Curve,
    Point<E>: AlwaysHasAffineX<E>,
    Scalar<E>: FromHash,
    L: SecurityLevel,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    let sigs = cb_mpc_ecdsa2p::sign::sign_batch_with_global_abort::<E, L, D, R>(job, key, messages, rng).await?;
    Ok(sigs.iter().map(|s| s.to_der()).collect())
}
