//! 2-party ECDSA key refresh (spec §4.6 "ECDSA-2PC-Refresh"): P1 rotates
//! its Paillier keypair and both parties apply an additive mask `ρ` to
//! their shares so that `x_1' = x_1 + ρ`, `x_2' = x_2 - ρ`, `Q` unchanged.
//!
//! Three rounds, matching the dkg's shape: P1 publishes its freshly
//! generated Paillier material and a commitment to its half of `ρ`; P2
//! replies with its half in the clear (no hiding needed — `ρ1` is still
//! committed, so P2 cannot bias the sum after seeing it); P1 opens and
//! proves the new ciphertext encrypts the same `x_1` the old one did via
//! `two_paillier_equal` (spec §4.4), the exact proof that ceremony is named
//! for in the zk crate.

use cb_mpc_core::commitment::{self, CommitmentValue, Opening};
use cb_mpc_core::error::JobError;
use cb_mpc_core::job2p::Job2P;
use cb_mpc_core::security_level::SecurityLevel;
use cb_mpc_core::sid::generate_sid_fixed_2p;
use cb_mpc_core::transport::Delivery;
use cb_mpc_core::wire;
use cb_mpc_key_share::ecdsa2p_key::{scalar_to_bignumber, Ecdsa2pKey};
use cb_mpc_primitives::paillier::{Ciphertext, PaillierPublicKey, PaillierSecretKey};
use cb_mpc_zk::paillier::{prove_two_paillier_equal, verify_two_paillier_equal, TwoPaillierEqualProof};
use generic_ec::{hash_to_curve::FromHash, Curve, Point, Scalar, SecretScalar};
use paillier_zk::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::Ecdsa2pError;

#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
struct Round1 {
    commit_rho1: [u8; 32],
    paillier_n: PaillierPublicKey,
    c_key_tag: Ciphertext,
}

#[derive(Serialize, Deserialize)]
#[serde(bound(
    serialize = "Scalar<E>: Serialize",
    deserialize = "Scalar<E>: Deserialize<'de>"
))]
struct Round2<E: Curve> {
    rho2: Scalar<E>,
}

#[derive(Serialize, Deserialize)]
#[serde(bound(
    serialize = "Scalar<E>: Serialize",
    deserialize = "Scalar<E>: Deserialize<'de>"
))]
struct Round3<E: Curve> {
    rho1: Scalar<E>,
    opening: [u8; 32],
    equal: TwoPaillierEqualProof,
}

fn curve_order<E: Curve>() -> BigNumber {
    let neg_one = -Scalar::<E>::from(1);
    BigNumber::from_slice(neg_one.to_be_bytes().as_bytes()) + BigNumber::one()
}

fn scalar_to_bn<E: Curve>(x: &Scalar<E>) -> BigNumber {
    BigNumber::from_slice(x.to_be_bytes().as_bytes())
}

/// Runs the refresh ceremony over an existing key share, returning the
/// rotated share in place of the old one. `L` picks the new Paillier
/// modulus size and the statistical-security bound for `two_paillier_equal`.
pub async fn refresh<E, L, D, R>(
    job: &Job2P<D>,
    key: Ecdsa2pKey<E>,
    rng: &mut R,
) -> Result<Ecdsa2pKey<E>, Ecdsa2pError<D::Error>>
where
    E: Curve,
    Scalar<E>: FromHash,
    L: SecurityLevel,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    let sid = generate_sid_fixed_2p(job, rng).await?;
    let is_p1 = job.is_p1();

    let rho1 = if is_p1 { Some(Scalar::<E>::random(rng)) } else { None };
    let (commit_rho1, opening_rho1) = if let Some(rho1) = rho1 {
        let (c, o) = commitment::commit(job.my_pid(), None, Some(sid.as_slice()), &wire::encode(&rho1), rng);
        (Some(c), Some(o))
    } else {
        (None, None)
    };

    // P1 regenerates its Paillier keypair and re-encrypts x1 under it.
    let p1_new_paillier = if is_p1 {
        let half_bits = L::PAILLIER_MODULUS_BITS / 2;
        let p = BigNumber::safe_prime_from_rng(half_bits, rng);
        let q = BigNumber::safe_prime_from_rng(half_bits, rng);
        let sk = PaillierSecretKey::from_primes(p, q, L::PAILLIER_MODULUS_BITS)
            .map_err(|_| Ecdsa2pError::Crypto("freshly generated Paillier modulus rejected"))?;
        let r_key_tag = BigNumber::from_rng(sk.public.n(), rng);
        let c_key_tag = sk
            .public
            .encrypt_with_randomizer(&scalar_to_bignumber(&key.core.x), &r_key_tag)
            .map_err(|_| Ecdsa2pError::Crypto("x1 out of new Paillier plaintext range"))?;
        Some((sk, r_key_tag, c_key_tag))
    } else {
        None
    };

    let round1 = p1_new_paillier.as_ref().map(|(sk, _, c_key_tag)| Round1 {
        commit_rho1: commit_rho1.expect("p1 path"),
        paillier_n: sk.public.clone(),
        c_key_tag: c_key_tag.clone(),
    });
    let received = job.p1_to_p2(round1.as_ref().map(wire::encode)).await?;
    let round1_from_p1: Option<Round1> = if job.is_p2() {
        Some(wire::decode(&received.expect("p2 receives round1")).map_err(JobError::Format)?)
    } else {
        None
    };

    // Round 2: P2 -> P1, rho2 in the clear.
    let rho2 = if job.is_p2() { Some(Scalar::<E>::random(rng)) } else { None };
    let round2 = rho2.map(|rho2| Round2::<E> { rho2 });
    let received = job.p2_to_p1(round2.as_ref().map(wire::encode)).await?;
    let rho2_at_p1: Option<Scalar<E>> = if job.is_p1() {
        let r: Round2<E> = wire::decode(&received.expect("p1 receives round2")).map_err(JobError::Format)?;
        Some(r.rho2)
    } else {
        None
    };

    // Round 3: P1 -> P2, open rho1 and prove the new ciphertext is
    // consistent with the old one.
    let round3 = if is_p1 {
        let rho1 = rho1.expect("p1 path");
        let (sk, r_key_tag, _) = p1_new_paillier.as_ref().expect("p1 path");
        let old_r_key = key.r_key.as_ref().ok_or(Ecdsa2pError::Crypto("P1 key share missing r_key"))?;
        let equal = prove_two_paillier_equal(
            sid.as_slice(),
            0,
            &key.paillier_public,
            &sk.public,
            &curve_order::<E>(),
            L::SECURITY_BITS as u32,
            &scalar_to_bignumber(&key.core.x),
            old_r_key,
            r_key_tag,
            rng,
        );
        Some(Round3::<E> {
            rho1,
            opening: opening_rho1.expect("p1 path").to_bytes(),
            equal,
        })
    } else {
        None
    };
    let received = job.p1_to_p2(round3.as_ref().map(wire::encode)).await?;

    let (rho, new_paillier_public, new_paillier_secret, new_c_key, new_r_key) = if is_p1 {
        let rho2 = rho2_at_p1.expect("p1 has rho2 by round 3");
        let rho1 = rho1.expect("p1 path");
        let rho = rho1 + rho2;
        let (sk, r_key_tag, c_key_tag) = p1_new_paillier.expect("p1 path");
        let c_key_new = sk.public.add_plain(&c_key_tag, &scalar_to_bn::<E>(&rho));
        (rho, sk.public.clone(), Some(sk), c_key_new, Some(r_key_tag))
    } else {
        let round1 = round1_from_p1.expect("p2 has round1");
        let round3: Round3<E> = wire::decode(&received.expect("p2 receives round3")).map_err(JobError::Format)?;

        let committed = wire::encode(&round3.rho1);
        let opening = Opening::from_bytes(round3.opening);
        commitment::open(
            &CommitmentValue(round1.commit_rho1),
            &opening,
            job.peer_pid(),
            None,
            Some(sid.as_slice()),
            &committed,
        )
        .map_err(|_| Ecdsa2pError::Crypto("rho1 commitment did not open"))?;

        let min_bits = L::PAILLIER_MODULUS_BITS;
        if round1.paillier_n.n().bit_length() < min_bits {
            return Err(Ecdsa2pError::Crypto("new Paillier modulus too small"));
        }
        verify_two_paillier_equal(
            sid.as_slice(),
            0,
            &key.paillier_public,
            &round1.paillier_n,
            &key.c_key,
            &round1.c_key_tag,
            &round3.equal,
        )
        .map_err(|_| Ecdsa2pError::ProofFailed("two_paillier_equal"))?;

        let rho2 = rho2.expect("p2 path");
        let rho = round3.rho1 + rho2;
        let c_key_new = round1.paillier_n.add_plain(&round1.c_key_tag, &scalar_to_bn::<E>(&rho));
        (rho, round1.paillier_n, None, c_key_new, None)
    };

    let mut x = key.core.x;
    if is_p1 {
        let shifted = SecretScalar::new(&mut (x.as_ref() + &rho));
        x = shifted;
    } else {
        let shifted = SecretScalar::new(&mut (x.as_ref() - &rho));
        x = shifted;
    }

    let refreshed = Ecdsa2pKey {
        core: cb_mpc_key_share::ecdsa2p_key::IncompleteEcdsa2pKey {
            role: key.core.role,
            q: key.core.q,
            x,
            peer_public_share: key.core.peer_public_share,
        },
        paillier_public: new_paillier_public,
        paillier_secret: new_paillier_secret,
        c_key: new_c_key,
        r_key: new_r_key,
    };
    refreshed.validate()?;
    Ok(refreshed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_mpc_core::security_level::DevLevel;
    use cb_mpc_test_support::local_network_2p;
    use generic_ec::curves::Secp256k1;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    type E = Secp256k1;

    #[test]
    fn refresh_preserves_public_key_and_rotates_paillier() {
        futures::executor::block_on(async {
            let mut rng1 = ChaCha20Rng::seed_from_u64(10);
            let mut rng2 = ChaCha20Rng::seed_from_u64(11);
            let (job1, job2) = local_network_2p();

            let (k1, k2) = futures::join!(
                crate::dkg::dkg::<E, DevLevel, _, _>(&job1, &mut rng1),
                crate::dkg::dkg::<E, DevLevel, _, _>(&job2, &mut rng2),
            );
            let (k1, k2) = (k1.unwrap(), k2.unwrap());
            let q_before = k1.public_key();
            let old_n = k1.paillier_public.n().clone();

            let (r1, r2) = futures::join!(
                refresh::<E, DevLevel, _, _>(&job1, k1, &mut rng1),
                refresh::<E, DevLevel, _, _>(&job2, k2, &mut rng2),
            );
            let (r1, r2) = (r1.unwrap(), r2.unwrap());

            assert_eq!(r1.public_key(), q_before);
            assert_eq!(r2.public_key(), q_before);
            assert_ne!(r1.paillier_public.n(), &old_n);
            assert!(r1.validate().is_ok());
            assert!(r2.validate().is_ok());
        });
    }
}
