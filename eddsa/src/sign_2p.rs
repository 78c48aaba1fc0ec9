//! 2-party Schnorr/EdDSA/BIP340 signing (spec §4.8): a thin wrapper over
//! [`crate::sign_mp::sign_mp`] with `sig_receiver = P1` and a batch of
//! one message — spec §4.8 describes the 2P signer's three rounds as
//! exactly the `n = 2` instance of §4.9's batched protocol, so this
//! crate implements it once, through [`Job2P::as_mp`], rather than
//! duplicating the round logic for two parties specifically.

use cb_mpc_core::job2p::{Job2P, P1};
use cb_mpc_core::transport::Delivery;
use cb_mpc_key_share::eckey_mp::EckeyMp;
use generic_ec::{hash_to_curve::FromHash, Curve, Scalar};
use rand_core::{CryptoRng, RngCore};

use crate::challenge::SchnorrVariant;
use crate::error::EddsaError;
use crate::sign_mp::sign_mp;

/// Signs a single `message` under a 2-party Schnorr key, returning the
/// encoded signature to P1 and an empty vector to P2.
pub async fn sign_2p<E, V, D, R>(
    job: &Job2P<D>,
    key: &EckeyMp<E>,
    message: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, EddsaError<D::Error>>
where
    E: Curve,
    V: SchnorrVariant<E>,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    let mut signatures = sign_mp::<E, V, D, R>(job.as_mp(), key, &[message.to_vec()], P1, rng).await?;
    Ok(signatures.pop().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_mpc_test_support::local_network_2p;
    use generic_ec::curves::Ed25519;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    use crate::challenge::Ed25519Variant;
    use crate::dkg::dkg;

    #[test]
    fn sign_2p_produces_a_signature_only_p1_receives() {
        futures::executor::block_on(async {
            let (job1, job2) = local_network_2p();
            let mut rng1 = ChaCha20Rng::seed_from_u64(1);
            let mut rng2 = ChaCha20Rng::seed_from_u64(2);

            let (key1, key2) = futures::join!(
                dkg::<Ed25519, _, _>(job1.as_mp(), &mut rng1),
                dkg::<Ed25519, _, _>(job2.as_mp(), &mut rng2)
            );
            let (key1, key2) = (key1.unwrap(), key2.unwrap());

            let (sig1, sig2) = futures::join!(
                sign_2p::<Ed25519, Ed25519Variant, _, _>(&job1, &key1, b"hello", &mut rng1),
                sign_2p::<Ed25519, Ed25519Variant, _, _>(&job2, &key2, b"hello", &mut rng2)
            );
            let sig1 = sig1.unwrap();
            let sig2 = sig2.unwrap();
            assert_eq!(sig1.len(), 64);
            assert!(sig2.is_empty());
        });
    }
}
