//! Schnorr/EdDSA/BIP340 key generation (spec §4.9 "DKG"): committed
//! broadcast of each party's `Q_i`, a UC-DL proof binding `x_i` to it,
//! then open-and-check — the same EC-DKG shape as `cb_mpc_ecdsa_mp::dkg`
//! (spec §3 gives ECDSA-MP and Schnorr-MP the identical key-share shape,
//! so the two crates' DKGs are grounded on the same original source,
//! `examples/original_source/src/cbmpc/protocol/ec_dkg.cpp`'s
//! `key_share_mp_t::dkg`).
//!
//! Spec §4.8 states the 2-party DKG reuses this n-party one; callers
//! needing exactly 2 parties go through [`cb_mpc_core::job2p::Job2P::as_mp`]
//! and call this function directly rather than through a separate
//! 2-party-specific implementation.

use cb_mpc_core::commitment::{self, CommitmentValue};
use cb_mpc_core::error::JobError;
use cb_mpc_core::jobmp::JobMp;
use cb_mpc_core::sid::generate_sid_fixed_mp;
use cb_mpc_core::transport::Delivery;
use cb_mpc_core::wire;
use cb_mpc_key_share::eckey_mp::EckeyMp;
use cb_mpc_zk::dl::{prove_uc_dl, verify_uc_dl, UcDlProof};
use generic_ec::{hash_to_curve::FromHash, Curve, Point, Scalar, SecretScalar};
use rand_core::{CryptoRng, RngCore};
use sha2::Sha256;

use crate::error::EddsaError;

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(bound(serialize = "Point<E>: serde::Serialize", deserialize = "Point<E>: serde::Deserialize<'de>"))]
struct Round2<E: Curve> {
    q_i: Point<E>,
    rid_i: [u8; 32],
    opening: [u8; 32],
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(bound(serialize = "UcDlProof<E>: serde::Serialize", deserialize = "UcDlProof<E>: serde::Deserialize<'de>"))]
struct Round3<E: Curve> {
    proof: UcDlProof<E>,
}

/// Runs the Schnorr-MP EC-DKG, returning this party's share of a fresh
/// `Q = Σ x_i·G`. Works for any party count `n ≥ 2`, including the `n =
/// 2` instance spec §4.8 calls "2P".
pub async fn dkg<E, D, R>(job: &JobMp<D>, rng: &mut R) -> Result<EckeyMp<E>, EddsaError<D::Error>>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    let n = job.n_parties() as usize;
    let i = job.party_index() as usize;

    let x_i = SecretScalar::<E>::random(rng);
    let q_i = Point::<E>::generator() * x_i.as_ref();
    let mut rid_i = [0u8; 32];
    rng.fill_bytes(&mut rid_i);

    let mut committed_payload = wire::encode(&q_i);
    committed_payload.extend_from_slice(&rid_i);
    let (commitment, opening) = commitment::commit(job.pid(), None, None, &committed_payload, rng);

    // Round 1: committed broadcast of (Q_i, rid_i).
    let received = job.plain_broadcast(wire::encode(&commitment.0)).await?;
    let mut commitments: Vec<Option<CommitmentValue>> = vec![None; n];
    commitments[i] = Some(commitment);
    for (j, bytes) in received {
        let arr: [u8; 32] = wire::decode(&bytes).map_err(JobError::Format)?;
        commitments[j as usize] = Some(CommitmentValue(arr));
    }

    // Round 2: open (Q_i, rid_i).
    let round2 = Round2::<E> {
        q_i,
        rid_i,
        opening: opening.to_bytes(),
    };
    let received = job.plain_broadcast(wire::encode(&round2)).await?;

    let mut public_shares: Vec<Option<Point<E>>> = vec![None; n];
    let mut rid = rid_i;
    public_shares[i] = Some(q_i);
    for (j, bytes) in received {
        let r: Round2<E> = wire::decode(&bytes).map_err(JobError::Format)?;
        let j = j as usize;

        let mut committed = wire::encode(&r.q_i);
        committed.extend_from_slice(&r.rid_i);
        let their_opening = cb_mpc_core::commitment::Opening::from_bytes(r.opening);
        commitment::open(
            commitments[j].as_ref().expect("commitment collected in round 1"),
            &their_opening,
            job.pids()[j],
            None,
            None,
            &committed,
        )
        .map_err(|_| EddsaError::Crypto("Q_i commitment did not open"))?;

        for (b, rb) in rid.iter_mut().zip(r.rid_i.iter()) {
            *b ^= rb;
        }
        public_shares[j] = Some(r.q_i);
    }

    // UC-DL challenges bind to `sid || rid`, only fixed once every
    // party's randomness contribution is committed — see
    // `cb_mpc_ecdsa_mp::dkg` for the full rationale.
    let sid = generate_sid_fixed_mp(job, rng).await?;
    let sid_with_rid = [sid.as_slice(), &rid].concat();

    let proof = prove_uc_dl::<E, Sha256, _>(&sid_with_rid, i as u64, &q_i, &x_i, rng)
        .map_err(|_| EddsaError::Crypto("failed to produce this party's own UC-DL proof"))?;
    let round3 = Round3::<E> { proof };
    let received = job.plain_broadcast(wire::encode(&round3)).await?;

    for (j, bytes) in received {
        let r: Round3<E> = wire::decode(&bytes).map_err(JobError::Format)?;
        let j = j as usize;
        let q_j = public_shares[j].expect("filled in round 2");
        verify_uc_dl::<E, Sha256>(&sid_with_rid, j as u64, &q_j, &r.proof)
            .map_err(|_| EddsaError::ProofFailed("uc_dl"))?;
    }

    let public_shares: Vec<Point<E>> = public_shares.into_iter().map(|p| p.expect("filled above")).collect();
    let q = public_shares.iter().fold(Point::<E>::zero(), |acc, p| acc + p);

    let share = EckeyMp {
        party_index: i as u16,
        q,
        x: x_i,
        public_shares,
    };
    share.validate()?;
    Ok(share)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_mpc_test_support::local_network_mp;
    use generic_ec::curves::{Ed25519, Secp256k1};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn dkg_produces_consistent_shares_secp256k1() {
        futures::executor::block_on(async {
            let jobs = local_network_mp(4);
            let futs = jobs.iter().enumerate().map(|(idx, job)| {
                let mut rng = ChaCha20Rng::seed_from_u64(idx as u64);
                async move { dkg::<Secp256k1, _, _>(job, &mut rng).await.unwrap() }
            });
            let shares = futures::future::join_all(futs).await;
            let q0 = shares[0].q;
            for share in &shares {
                assert_eq!(share.q, q0);
                assert!(share.validate().is_ok());
            }
        });
    }

    #[test]
    fn dkg_works_for_two_parties_over_ed25519() {
        futures::executor::block_on(async {
            let jobs = local_network_mp(2);
            let futs = jobs.iter().enumerate().map(|(idx, job)| {
                let mut rng = ChaCha20Rng::seed_from_u64(idx as u64);
                async move { dkg::<Ed25519, _, _>(job, &mut rng).await.unwrap() }
            });
            let shares = futures::future::join_all(futs).await;
            assert_eq!(shares[0].q, shares[1].q);
        });
    }
}
