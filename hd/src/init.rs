//! HD keyset initialization (spec §4.10 "Initialization"): two 2P-DKGs
//! sharing the same two parties, one for the signing key `x` and one for
//! the VRF key `k`. The ECDSA variant's `x`-DKG additionally produces the
//! Paillier material signing needs (spec §4.6); the VRF key never does,
//! regardless of signing variant, since it's never used to sign — both
//! variants reuse [`cb_mpc_eddsa::dkg`] (a plain n-party EC-DKG, curve-
//! and variant-agnostic) for `k`, over the 2-party job via
//! [`cb_mpc_core::job2p::Job2P::as_mp`].
//!
//! The two DKGs run one after the other, not concurrently: this
//! workspace has no "parallel job" session-multiplexing primitive yet
//! (spec §5's `get_parallel_job`), and a `Job2P`'s transport has no
//! per-call session separation, so interleaving two independent round
//! sequences on it would risk reordering.

use cb_mpc_core::job2p::Job2P;
use cb_mpc_core::security_level::SecurityLevel;
use cb_mpc_core::transport::Delivery;
use cb_mpc_key_share::ecdsa2p_key::Ecdsa2pKey;
use cb_mpc_key_share::eckey_mp::EckeyMp;
use generic_ec::{hash_to_curve::FromHash, Curve, Scalar};
use rand_core::{CryptoRng, RngCore};

use crate::error::HdError;

/// An HD keyset whose signing key is ECDSA: `x` carries the Paillier
/// material `cb-mpc-ecdsa2p::sign` needs, `k` is the bare VRF key.
pub struct HdKeysetEcdsa2p<E: Curve> {
    pub x: Ecdsa2pKey<E>,
    pub k: EckeyMp<E>,
}

/// An HD keyset whose signing key is Schnorr/EdDSA/BIP340: both `x` and
/// `k` are plain n-party (here, `n=2`) EC-DKG shares.
pub struct HdKeysetEddsa2p<E: Curve> {
    pub x: EckeyMp<E>,
    pub k: EckeyMp<E>,
}

pub async fn init_ecdsa_2p<E, L, D, R>(
    job: &Job2P<D>,
    rng: &mut R,
) -> Result<HdKeysetEcdsa2p<E>, HdError<D::Error>>
where
    E: Curve,
    Scalar<E>: FromHash,
    L: SecurityLevel,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    let x = cb_mpc_ecdsa2p::dkg::<E, L, D, R>(job, rng).await?;
    let k = cb_mpc_eddsa::dkg::<E, D, R>(job.as_mp(), rng).await?;
    Ok(HdKeysetEcdsa2p { x, k })
}

pub async fn init_eddsa_2p<E, D, R>(
    job: &Job2P<D>,
    rng: &mut R,
) -> Result<HdKeysetEddsa2p<E>, HdError<D::Error>>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    let x = cb_mpc_eddsa::dkg::<E, D, R>(job.as_mp(), rng).await?;
    let k = cb_mpc_eddsa::dkg::<E, D, R>(job.as_mp(), rng).await?;
    Ok(HdKeysetEddsa2p { x, k })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_mpc_core::security_level::DevLevel;
    use cb_mpc_test_support::local_network_2p;
    use generic_ec::curves::{Ed25519, Secp256k1};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn init_ecdsa_2p_agrees_on_both_public_keys() {
        futures::executor::block_on(async {
            let (job1, job2) = local_network_2p();
            let mut rng1 = ChaCha20Rng::seed_from_u64(1);
            let mut rng2 = ChaCha20Rng::seed_from_u64(2);

            let (a, b) = futures::join!(
                init_ecdsa_2p::<Secp256k1, DevLevel, _, _>(&job1, &mut rng1),
                init_ecdsa_2p::<Secp256k1, DevLevel, _, _>(&job2, &mut rng2)
            );
            let (a, b) = (a.unwrap(), b.unwrap());
            assert_eq!(a.x.core.q, b.x.core.q);
            assert_eq!(a.k.q, b.k.q);
        });
    }

    #[test]
    fn init_eddsa_2p_agrees_on_both_public_keys() {
        futures::executor::block_on(async {
            let (job1, job2) = local_network_2p();
            let mut rng1 = ChaCha20Rng::seed_from_u64(3);
            let mut rng2 = ChaCha20Rng::seed_from_u64(4);

            let (a, b) = futures::join!(
                init_eddsa_2p::<Ed25519, _, _>(&job1, &mut rng1),
                init_eddsa_2p::<Ed25519, _, _>(&job2, &mut rng2)
            );
            let (a, b) = (a.unwrap(), b.unwrap());
            assert_eq!(a.x.q, b.x.q);
            assert_eq!(a.k.q, b.k.q);
        });
    }
}
