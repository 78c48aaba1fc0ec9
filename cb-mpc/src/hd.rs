//! HD keyset facade (spec §6, §4.10/§4.11): `dkg`/`refresh` over
//! `cb-mpc-hd`'s keyset types, plus derivation and the PVE backup helper.
//! HD has no `sign`/`sign_batch` of its own — after deriving a child
//! share with [`derive_hard_ecdsa_2p`]/[`derive_hard_eddsa_2p`] or
//! [`apply_non_hard_derive_ecdsa`]/[`apply_non_hard_derive_eddsa`], sign
//! through [`crate::ecdsa2p`] or [`crate::eddsa2p`] as appropriate.

use cb_mpc_core::job2p::Job2P;
use cb_mpc_core::security_level::SecurityLevel;
use cb_mpc_core::transport::Delivery;
use cb_mpc_hd::derive::{apply_hard_derive_ecdsa, apply_hard_derive_eddsa, hard_derive_output};
use cb_mpc_hd::init::{HdKeysetEcdsa2p, HdKeysetEddsa2p};
use cb_mpc_key_share::ecdsa2p_key::Ecdsa2pKey;
use cb_mpc_key_share::eckey_mp::EckeyMp;
use generic_ec::{hash_to_curve::FromHash, Curve, Scalar};
use rand_core::{CryptoRng, RngCore};

use crate::error::CryptoError;

pub async fn dkg_ecdsa_2p<E, L, D, R>(job: &Job2P<D>, rng: &mut R) -> Result<HdKeysetEcdsa2p<E>, CryptoError>
where
    E: Curve,
    Scalar<E>: FromHash,
    L: SecurityLevel,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    Ok(cb_mpc_hd::init_ecdsa_2p::<E, L, D, R>(job, rng).await?)
}

pub async fn dkg_eddsa_2p<E, D, R>(job: &Job2P<D>, rng: &mut R) -> Result<HdKeysetEddsa2p<E>, CryptoError>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    Ok(cb_mpc_hd::init_eddsa_2p::<E, D, R>(job, rng).await?)
}

pub async fn refresh_ecdsa_2p<E, L, D, R>(
    job: &Job2P<D>,
    keyset: HdKeysetEcdsa2p<E>,
    rng: &mut R,
) -> Result<HdKeysetEcdsa2p<E>, CryptoError>
where
    E: Curve,
    Scalar<E>: FromHash,
    L: SecurityLevel,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    Ok(cb_mpc_hd::refresh_ecdsa_2p::<E, L, D, R>(job, keyset, rng).await?)
}

pub async fn refresh_eddsa_2p<E, D, R>(
    job: &Job2P<D>,
    keyset: HdKeysetEddsa2p<E>,
    rng: &mut R,
) -> Result<HdKeysetEddsa2p<E>, CryptoError>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    Ok(cb_mpc_hd::refresh_eddsa_2p::<E, D, R>(job, keyset, rng).await?)
}

/// Hardened derivation (spec §4.10): computes `Z = VrfCompute2P(k, label)`
/// and rewrites `x`'s share by it, returning a child `Ecdsa2pKey` whose
/// public key is `Q + Z`.
pub async fn derive_hard_ecdsa_2p<E, D, R>(
    job: &Job2P<D>,
    keyset: &HdKeysetEcdsa2p<E>,
    label: &[u8],
    rng: &mut R,
) -> Result<Ecdsa2pKey<E>, CryptoError>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    let z = cb_mpc_hd::vrf_compute_2p::<E, D, R>(job, &keyset.k, label, rng).await?;
    let out = hard_derive_output(keyset.x.core.q, z);
    Ok(apply_hard_derive_ecdsa(keyset.x.clone(), &out))
}

pub async fn derive_hard_eddsa_2p<E, D, R>(
    job: &Job2P<D>,
    keyset: &HdKeysetEddsa2p<E>,
    label: &[u8],
    rng: &mut R,
) -> Result<EckeyMp<E>, CryptoError>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    let z = cb_mpc_hd::vrf_compute_2p::<E, D, R>(job, &keyset.k, label, rng).await?;
    let out = hard_derive_output(keyset.x.q, z);
    Ok(apply_hard_derive_eddsa(keyset.x.clone(), &out))
}

pub use cb_mpc_hd::derive::{
    apply_non_hard_derive_ecdsa, apply_non_hard_derive_eddsa, non_hard_derive_offset,
};
pub use cb_mpc_hd::pve::{decrypt, encrypt, encrypt_ac, reconstruct_ac, verify, AcPveBundle, PveCiphertext};
