//! HD keyset refresh (spec §4.10 "Refresh"): two 2P refreshes, one for
//! `x` and one for `k`, run one after the other for the same reason
//! [`crate::init`] runs its two DKGs sequentially — no parallel-job
//! primitive yet backs a `Job2P`. The ECDSA variant's `x`-refresh also
//! regenerates the Paillier keypair and re-proves ciphertext equality,
//! exactly as `cb_mpc_ecdsa2p::refresh` already does for a bare
//! `Ecdsa2pKey`.

use cb_mpc_core::job2p::Job2P;
use cb_mpc_core::security_level::SecurityLevel;
use cb_mpc_core::transport::Delivery;
use generic_ec::{hash_to_curve::FromHash, Curve, Scalar};
use rand_core::{CryptoRng, RngCore};

use crate::error::HdError;
use crate::init::{HdKeysetEcdsa2p, HdKeysetEddsa2p};

pub async fn refresh_ecdsa_2p<E, L, D, R>(
    job: &Job2P<D>,
    keyset: HdKeysetEcdsa2p<E>,
    rng: &mut R,
) -> Result<HdKeysetEcdsa2p<E>, HdError<D::Error>>
where
    E: Curve,
    Scalar<E>: FromHash,
    L: SecurityLevel,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    let x = cb_mpc_ecdsa2p::refresh::<E, L, D, R>(job, keyset.x, rng).await?;
    let k = cb_mpc_eddsa::refresh::<E, D, R>(job.as_mp(), keyset.k, rng).await?;
    Ok(HdKeysetEcdsa2p { x, k })
}

pub async fn refresh_eddsa_2p<E, D, R>(
    job: &Job2P<D>,
    keyset: HdKeysetEddsa2p<E>,
    rng: &mut R,
) -> Result<HdKeysetEddsa2p<E>, HdError<D::Error>>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    let x = cb_mpc_eddsa::refresh::<E, D, R>(job.as_mp(), keyset.x, rng).await?;
    let k = cb_mpc_eddsa::refresh::<E, D, R>(job.as_mp(), keyset.k, rng).await?;
    Ok(HdKeysetEddsa2p { x, k })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::{init_ecdsa_2p, init_eddsa_2p};
    use cb_mpc_core::security_level::DevLevel;
    use cb_mpc_test_support::local_network_2p;
    use generic_ec::curves::{Ed25519, Secp256k1};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn refresh_ecdsa_2p_preserves_both_public_keys() {
        futures::executor::block_on(async {
            let (job1, job2) = local_network_2p();
            let mut rng1 = ChaCha20Rng::seed_from_u64(11);
            let mut rng2 = ChaCha20Rng::seed_from_u64(12);

            let (a, b) = futures::join!(
                init_ecdsa_2p::<Secp256k1, DevLevel, _, _>(&job1, &mut rng1),
                init_ecdsa_2p::<Secp256k1, DevLevel, _, _>(&job2, &mut rng2)
            );
            let (a, b) = (a.unwrap(), b.unwrap());
            let (x_q, k_q) = (a.x.core.q, a.k.q);

            let (ra, rb) = futures::join!(
                refresh_ecdsa_2p::<Secp256k1, DevLevel, _, _>(&job1, a, &mut rng1),
                refresh_ecdsa_2p::<Secp256k1, DevLevel, _, _>(&job2, b, &mut rng2)
            );
            let (ra, rb) = (ra.unwrap(), rb.unwrap());

            assert_eq!(ra.x.core.q, x_q);
            assert_eq!(rb.x.core.q, x_q);
            assert_eq!(ra.k.q, k_q);
            assert_eq!(rb.k.q, k_q);
            assert!(ra.x.validate().is_ok());
        });
    }

    #[test]
    fn refresh_eddsa_2p_preserves_both_public_keys() {
        futures::executor::block_on(async {
            let (job1, job2) = local_network_2p();
            let mut rng1 = ChaCha20Rng::seed_from_u64(13);
            let mut rng2 = ChaCha20Rng::seed_from_u64(14);

            let (a, b) = futures::join!(
                init_eddsa_2p::<Ed25519, _, _>(&job1, &mut rng1),
                init_eddsa_2p::<Ed25519, _, _>(&job2, &mut rng2)
            );
            let (a, b) = (a.unwrap(), b.unwrap());
            let (x_q, k_q) = (a.x.q, a.k.q);

            let (ra, rb) = futures::join!(
                refresh_eddsa_2p::<Ed25519, _, _>(&job1, a, &mut rng1),
                refresh_eddsa_2p::<Ed25519, _, _>(&job2, b, &mut rng2)
            );
            let (ra, rb) = (ra.unwrap(), rb.unwrap());

            assert_eq!(ra.x.q, x_q);
            assert_eq!(rb.x.q, x_q);
            assert_eq!(ra.k.q, k_q);
            assert_eq!(rb.k.q, k_q);
        });
    }
}
