//! 2-party Schnorr/EdDSA/BIP340 facade (spec §6): `dkg`/`refresh`/`sign`
//! wrapping `cb-mpc-eddsa`'s 2-party entry points, generic over the
//! signature variant (`Ed25519Variant`/`Bip340Variant`).

use cb_mpc_core::job2p::Job2P;
use cb_mpc_core::transport::Delivery;
use cb_mpc_key_share::eckey_mp::EckeyMp;
use cb_mpc_eddsa::challenge::SchnorrVariant;
use generic_ec::{hash_to_curve::FromHash, Curve, Scalar};
use rand_core::{CryptoRng, RngCore};

use crate::error::CryptoError;

pub async fn dkg<E, D, R>(job: &Job2P<D>, rng: &mut R) -> Result<EckeyMp<E>, CryptoError>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    Ok(cb_mpc_eddsa::dkg::<E, D, R>(job.as_mp(), rng).await?)
}

pub async fn refresh<E, D, R>(job: &Job2P<D>, key: EckeyMp<E>, rng: &mut R) -> Result<EckeyMp<E>, CryptoError>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    Ok(cb_mpc_eddsa::refresh::<E, D, R>(job.as_mp(), key, rng).await?)
}

/// Signs `message` under `V`'s encoding (RFC 8032 `R‖S` for Ed25519,
/// `r.x‖s` for BIP340), returning the encoded bytes to P1 and an empty
/// vector to P2.
pub async fn sign<E, V, D, R>(
    job: &Job2P<D>,
    key: &EckeyMp<E>,
    message: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, CryptoError>
where
    E: Curve,
    V: SchnorrVariant<E>,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    Ok(cb_mpc_eddsa::sign_2p::<E, V, D, R>(job, key, message, rng).await?)
}
