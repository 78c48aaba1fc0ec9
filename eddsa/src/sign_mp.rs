//! Schnorr/EdDSA/BIP340 batched signing (spec §4.9 "Sign"): each party
//! commits to `R_i = Σ_l k_{i,l}·G` (one nonce per message in the
//! batch), opens with a batched UC-DL proof, computes the per-message
//! challenge `e_l`, and sends `s_{i,l} = e_l·x_i + k_{i,l}` to a
//! designated receiver who sums and verifies. Spec §4.8's 2-party sign
//! is this same protocol generalized down to `n = 2`, `sig_receiver =
//! P1`, and a batch of size one — see [`crate::sign_2p`].
//!
//! Grounded on `examples/original_source/src/cbmpc/protocol/
//! schnorr_mp.cpp`'s `sign_batch_impl`; the variant-specific challenge
//! and signature encoding are isolated in [`crate::challenge`].

use cb_mpc_core::commitment::{self, CommitmentValue, Opening};
use cb_mpc_core::error::JobError;
use cb_mpc_core::jobmp::JobMp;
use cb_mpc_core::pid::PartyIndex;
use cb_mpc_core::sid::generate_sid_fixed_mp;
use cb_mpc_core::transport::Delivery;
use cb_mpc_core::wire;
use cb_mpc_key_share::eckey_mp::EckeyMp;
use cb_mpc_zk::dl::{prove_uc_batch_dl, verify_uc_batch_dl, UcBatchDlProof};
use generic_ec::{hash_to_curve::FromHash, Curve, Point, Scalar, SecretScalar};
use generic_ec_zkp::schnorr_pok;
use rand_core::{CryptoRng, RngCore};
use sha2::Sha256;

use crate::challenge::SchnorrVariant;
use crate::error::EddsaError;

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(bound(
    serialize = "Point<E>: serde::Serialize, schnorr_pok::Commit<E>: serde::Serialize",
    deserialize = "Point<E>: serde::Deserialize<'de>, schnorr_pok::Commit<E>: serde::Deserialize<'de>"
))]
struct Round2<E: Curve> {
    r_points: Vec<Point<E>>,
    commits: Vec<schnorr_pok::Commit<E>>,
    proof: UcBatchDlProof<E>,
    opening: [u8; 32],
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(bound(serialize = "Scalar<E>: serde::Serialize", deserialize = "Scalar<E>: serde::Deserialize<'de>"))]
struct FinalShares<E: Curve>(Vec<Scalar<E>>);

/// Runs the batched Schnorr-MP signing protocol over `messages`,
/// returning `sig_receiver`'s one signature per message (every other
/// party gets an empty vector back).
pub async fn sign_mp<E, V, D, R>(
    job: &JobMp<D>,
    key: &EckeyMp<E>,
    messages: &[Vec<u8>],
    sig_receiver: PartyIndex,
    rng: &mut R,
) -> Result<Vec<Vec<u8>>, EddsaError<D::Error>>
where
    E: Curve,
    V: SchnorrVariant<E>,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    key.validate()?;
    if messages.is_empty() {
        return Err(EddsaError::BadArg("sign requires at least one message"));
    }
    let n = job.n_parties() as usize;
    if (sig_receiver as usize) >= n {
        return Err(EddsaError::BadArg("sig_receiver out of range"));
    }
    let l = messages.len();
    let sid = generate_sid_fixed_mp(job, rng).await?;

    let mut k_shares: Vec<SecretScalar<E>> = (0..l).map(|_| SecretScalar::<E>::random(rng)).collect();
    let r_points: Vec<Point<E>> = k_shares.iter().map(|k| Point::<E>::generator() * k.as_ref()).collect();

    let statements: Vec<(Point<E>, &SecretScalar<E>)> =
        r_points.iter().copied().zip(k_shares.iter()).collect();
    let (commits, proof) = prove_uc_batch_dl::<E, Sha256, _>(sid.as_slice(), key.party_index as u64, &statements, rng)
        .map_err(|_| EddsaError::Crypto("failed to produce this party's own batched UC-DL proof"))?;

    let committed = wire::encode(&(r_points.clone(), commits.clone()));
    let (commitment, opening) = commitment::commit(job.pid(), None, Some(sid.as_slice()), &committed, rng);

    // Round 1: committed broadcast of the nonce-commitment batch.
    let received = job.plain_broadcast(wire::encode(&commitment.0)).await?;
    let mut commitments: Vec<Option<CommitmentValue>> = vec![None; n];
    commitments[job.party_index() as usize] = Some(commitment);
    for (j, bytes) in received {
        let arr: [u8; 32] = wire::decode(&bytes).map_err(JobError::Format)?;
        commitments[j as usize] = Some(CommitmentValue(arr));
    }

    // Round 2: open the batch and its proof.
    let round2 = Round2::<E> {
        r_points: r_points.clone(),
        commits: commits.clone(),
        proof,
        opening: opening.to_bytes(),
    };
    let received = job.plain_broadcast(wire::encode(&round2)).await?;

    let mut r_matrix: Vec<Option<Vec<Point<E>>>> = vec![None; n];
    r_matrix[job.party_index() as usize] = Some(r_points.clone());
    for (j, bytes) in received {
        let j = j as usize;
        let r: Round2<E> = wire::decode(&bytes).map_err(JobError::Format)?;
        if r.r_points.len() != l || r.commits.len() != l {
            return Err(EddsaError::BadArg("nonce batch has wrong length"));
        }

        let committed = wire::encode(&(r.r_points.clone(), r.commits.clone()));
        let their_opening = Opening::from_bytes(r.opening);
        commitment::open(
            commitments[j].as_ref().expect("commitment collected in round 1"),
            &their_opening,
            job.pids()[j],
            None,
            Some(sid.as_slice()),
            &committed,
        )
        .map_err(|_| EddsaError::Crypto("nonce batch commitment did not open"))?;

        verify_uc_batch_dl::<E, Sha256>(sid.as_slice(), j as u64, &r.r_points, &r.commits, &r.proof)
            .map_err(|_| EddsaError::ProofFailed("uc_batch_dl"))?;

        r_matrix[j] = Some(r.r_points);
    }
    let r_matrix: Vec<Vec<Point<E>>> = r_matrix.into_iter().map(|r| r.expect("filled above")).collect();

    // Aggregate nonce per message, then apply the variant's finalization
    // (BIP340 negates both R and this party's k share when R.y is odd).
    let mut r_aggs = Vec::with_capacity(l);
    for msg_idx in 0..l {
        let mut r_agg = Point::<E>::zero();
        for party in r_matrix.iter() {
            r_agg = r_agg + party[msg_idx];
        }
        let r_agg = V::finalize_nonce(r_agg, &mut k_shares[msg_idx]);
        r_aggs.push(r_agg);
    }

    let shares: Vec<Scalar<E>> = (0..l)
        .map(|msg_idx| {
            let e = V::challenge(&r_aggs[msg_idx], &key.q, &messages[msg_idx]);
            e * key.x.as_ref() + k_shares[msg_idx].as_ref()
        })
        .collect();

    // Fan-in: every party sends its share batch to `sig_receiver`.
    let received = job.send_message_all_to_one(sig_receiver, wire::encode(&FinalShares(shares.clone()))).await?;
    if !job.is_party_index(sig_receiver) {
        return Ok(Vec::new());
    }

    let mut share_sums = shares;
    for (_, bytes) in received {
        let FinalShares(their_shares): FinalShares<E> = wire::decode(&bytes).map_err(JobError::Format)?;
        if their_shares.len() != l {
            return Err(EddsaError::BadArg("final share batch has wrong length"));
        }
        for (sum, s) in share_sums.iter_mut().zip(their_shares.into_iter()) {
            *sum = *sum + s;
        }
    }

    let mut signatures = Vec::with_capacity(l);
    for msg_idx in 0..l {
        let encoded = V::encode(&r_aggs[msg_idx], &share_sums[msg_idx]);
        if !verify::<E, V>(&key.q, &messages[msg_idx], &r_aggs[msg_idx], &share_sums[msg_idx]) {
            return Err(EddsaError::Crypto("aggregated signature failed local verification"));
        }
        signatures.push(encoded);
    }
    Ok(signatures)
}

fn verify<E, V>(q: &Point<E>, message: &[u8], r: &Point<E>, s: &Scalar<E>) -> bool
where
    E: Curve,
    V: SchnorrVariant<E>,
{
    let e = V::challenge(r, q, message);
    Point::<E>::generator() * s == *r + *q * e
}
