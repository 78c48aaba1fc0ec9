//! Threshold Schnorr-MP DKG and refresh (spec §4.9 "Threshold DKG /
//! refresh"): the same committed-broadcast EC-DKG as [`crate::dkg`],
//! except every party additionally re-shares its own `x_i` down an
//! access-control tree (spec §4.5) instead of handing it to the group
//! flat. Internal `THRESHOLD` nodes' coefficient commitments are public;
//! every recipient checks its own leaf share against them with
//! [`cb_mpc_ac::tree::verify_leaf_share`] before trusting it.
//!
//! A quorum satisfying the tree later collapses its per-sharer leaf
//! shares to one flat additive share each via
//! [`cb_mpc_ac::tree::additive_reexpression`] (spec §4.5, final
//! paragraph) and signs with the ordinary [`crate::sign_mp::sign_mp`] —
//! the tree only changes *who* must cooperate to reconstruct a usable
//! additive sharing, not the signing arithmetic itself.

use std::collections::HashMap;

use cb_mpc_ac::tree::{self, Node, Shares};
use cb_mpc_core::commitment::{self, CommitmentValue};
use cb_mpc_core::error::JobError;
use cb_mpc_core::jobmp::JobMp;
use cb_mpc_core::pid::Pid;
use cb_mpc_core::sid::generate_sid_fixed_mp;
use cb_mpc_core::transport::Delivery;
use cb_mpc_core::wire;
use cb_mpc_zk::dl::{prove_uc_dl, verify_uc_dl, UcDlProof};
use generic_ec::{hash_to_curve::FromHash, Curve, Point, Scalar, SecretScalar};
use rand_core::{CryptoRng, RngCore};
use sha2::Sha256;

use crate::error::EddsaError;

/// A Schnorr-MP key whose `x_i` contributions are each re-shared down
/// `node` instead of held flat by their one owner.
pub struct ThresholdEckeyShare<E: Curve> {
    pub my_pid: Pid,
    pub q: Point<E>,
    pub node: Node,
    /// `per_sharer_points[i] == Q_i`, indexed by sharer position in
    /// `job.pids()` order, for the same peer-verification purpose as
    /// `EckeyMp::public_shares`.
    pub per_sharer_points: Vec<Point<E>>,
    /// This party's verified leaf share of every sharer's `x_i`,
    /// indexed the same way as `per_sharer_points`.
    pub per_sharer_leaf_shares: Vec<Scalar<E>>,
}

/// Public part of a [`Shares`] tree: every `THRESHOLD` node's
/// coefficient commitments, with secret leaf values stripped so it can
/// be broadcast.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(bound(serialize = "Point<E>: serde::Serialize", deserialize = "Point<E>: serde::Deserialize<'de>"))]
enum PublicSkeleton<E: Curve> {
    Leaf,
    And(Vec<PublicSkeleton<E>>),
    Or(Vec<PublicSkeleton<E>>),
    Threshold { coeff_commitments: Vec<Point<E>>, children: Vec<PublicSkeleton<E>> },
}

fn skeleton_of<E: Curve>(shares: &Shares<E>) -> PublicSkeleton<E> {
    match shares {
        Shares::Leaf(_, _) => PublicSkeleton::Leaf,
        Shares::And(c) => PublicSkeleton::And(c.iter().map(skeleton_of).collect()),
        Shares::Or(c) => PublicSkeleton::Or(c.iter().map(skeleton_of).collect()),
        Shares::Threshold { coeff_commitments, children } => PublicSkeleton::Threshold {
            coeff_commitments: coeff_commitments.clone(),
            children: children.iter().map(skeleton_of).collect(),
        },
    }
}

/// Rebuilds a [`Shares`] tree suitable for [`tree::verify_leaf_share`]
/// of `target`'s share: real value at `target`'s leaf, a zero
/// placeholder everywhere else (every other branch of `And`/`Or`/
/// `Threshold` is never inspected while verifying `target`'s own leaf,
/// since that walk only recurses into the child containing `target`).
fn rebuild_for_verification<E: Curve>(node: &Node, skeleton: &PublicSkeleton<E>, target: Pid, mine: &Scalar<E>) -> Shares<E> {
    match (node, skeleton) {
        (Node::Leaf(pid), PublicSkeleton::Leaf) => {
            let value = if *pid == target { *mine } else { Scalar::<E>::from(0u64) };
            Shares::Leaf(*pid, SecretScalar::new(&mut value.clone()))
        }
        (Node::And(nc), PublicSkeleton::And(sc)) => {
            Shares::And(nc.iter().zip(sc.iter()).map(|(n, s)| rebuild_for_verification(n, s, target, mine)).collect())
        }
        (Node::Or(nc), PublicSkeleton::Or(sc)) => {
            Shares::Or(nc.iter().zip(sc.iter()).map(|(n, s)| rebuild_for_verification(n, s, target, mine)).collect())
        }
        (Node::Threshold(_, nc), PublicSkeleton::Threshold { coeff_commitments, children: sc }) => Shares::Threshold {
            coeff_commitments: coeff_commitments.clone(),
            children: nc.iter().zip(sc.iter()).map(|(n, s)| rebuild_for_verification(n, s, target, mine)).collect(),
        },
        _ => panic!("access-structure node and its public skeleton disagree in shape"),
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(bound(
    serialize = "Point<E>: serde::Serialize, PublicSkeleton<E>: serde::Serialize",
    deserialize = "Point<E>: serde::Deserialize<'de>, PublicSkeleton<E>: serde::Deserialize<'de>"
))]
struct Round2<E: Curve> {
    q_i: Point<E>,
    skeleton: PublicSkeleton<E>,
    opening: [u8; 32],
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(bound(serialize = "UcDlProof<E>: serde::Serialize", deserialize = "UcDlProof<E>: serde::Deserialize<'de>"))]
struct Round3<E: Curve> {
    proof: UcDlProof<E>,
}

/// Runs threshold Schnorr-MP DKG: `node`'s leaves must be exactly
/// `job.pids()` (every party is a sharer and a recipient). Every party
/// ends up with one verified leaf share per sharer; signing with an
/// active quorum first collapses these to a flat share via
/// [`reexpress_for_quorum`].
pub async fn threshold_dkg<E, D, R>(
    job: &JobMp<D>,
    node: &Node,
    rng: &mut R,
) -> Result<ThresholdEckeyShare<E>, EddsaError<D::Error>>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    node.validate()?;
    let n = job.n_parties() as usize;
    let i = job.party_index() as usize;
    let my_pid = job.pid();

    let mut leaves = node.leaves();
    leaves.sort();
    let mut pids = job.pids().to_vec();
    pids.sort();
    if leaves != pids {
        return Err(EddsaError::BadArg("access-structure leaves must equal the job's party set"));
    }

    let x_i = SecretScalar::<E>::random(rng);
    let q_i = Point::<E>::generator() * x_i.as_ref();
    let my_shares = tree::share::<E, _>(node, *x_i.as_ref(), rng);
    let skeleton = skeleton_of(&my_shares);
    let leaf_shares: HashMap<Pid, Scalar<E>> = my_shares.leaf_shares().into_iter().collect();

    let committed_payload = wire::encode(&(q_i, skeleton.clone()));
    let (commitment, opening) = commitment::commit(job.pid(), None, None, &committed_payload, rng);

    // Round 1: committed broadcast of (Q_i, public sharing skeleton).
    let received = job.plain_broadcast(wire::encode(&commitment.0)).await?;
    let mut commitments: Vec<Option<CommitmentValue>> = vec![None; n];
    commitments[i] = Some(commitment);
    for (j, bytes) in received {
        let arr: [u8; 32] = wire::decode(&bytes).map_err(JobError::Format)?;
        commitments[j as usize] = Some(CommitmentValue(arr));
    }

    // Round 2: open (Q_i, skeleton); privately send each leaf its share.
    for (pid, share) in leaf_shares.iter() {
        if *pid == my_pid {
            continue;
        }
        let to = pids_index(job.pids(), *pid);
        job.send(to, wire::encode(share)).await?;
    }
    let mut my_leaf_shares_from: Vec<Option<Scalar<E>>> = vec![None; n];
    my_leaf_shares_from[i] = Some(*leaf_shares.get(&my_pid).expect("my own leaf share is always produced"));
    for j in 0..n {
        if j == i {
            continue;
        }
        let bytes = job.receive(j as u16).await?;
        let share: Scalar<E> = wire::decode(&bytes).map_err(JobError::Format)?;
        my_leaf_shares_from[j] = Some(share);
    }

    let round2 = Round2::<E> {
        q_i,
        skeleton,
        opening: opening.to_bytes(),
    };
    let received = job.plain_broadcast(wire::encode(&round2)).await?;

    let mut per_sharer_points: Vec<Option<Point<E>>> = vec![None; n];
    per_sharer_points[i] = Some(q_i);
    let mut skeletons: Vec<Option<PublicSkeleton<E>>> = vec![None; n];
    skeletons[i] = Some(skeleton_of(&my_shares));
    for (j, bytes) in received {
        let r: Round2<E> = wire::decode(&bytes).map_err(JobError::Format)?;
        let j = j as usize;
        let committed = wire::encode(&(r.q_i, r.skeleton.clone()));
        let their_opening = cb_mpc_core::commitment::Opening::from_bytes(r.opening);
        commitment::open(
            commitments[j].as_ref().expect("commitment collected in round 1"),
            &their_opening,
            job.pids()[j],
            None,
            None,
            &committed,
        )
        .map_err(|_| EddsaError::Crypto("Q_i/skeleton commitment did not open"))?;

        let mine = my_leaf_shares_from[j].expect("collected above");
        let rebuilt = rebuild_for_verification::<E>(node, &r.skeleton, my_pid, &mine);
        if !tree::verify_leaf_share(node, &rebuilt, my_pid, &mine) {
            return Err(EddsaError::Crypto("leaf share failed to verify against its coefficient commitments"));
        }

        per_sharer_points[j] = Some(r.q_i);
        skeletons[j] = Some(r.skeleton);
    }

    let sid = generate_sid_fixed_mp(job, rng).await?;
    let proof = prove_uc_dl::<E, Sha256, _>(sid.as_slice(), i as u64, &q_i, &x_i, rng)
        .map_err(|_| EddsaError::Crypto("failed to produce this party's own UC-DL proof"))?;
    let round3 = Round3::<E> { proof };
    let received = job.plain_broadcast(wire::encode(&round3)).await?;
    for (j, bytes) in received {
        let r: Round3<E> = wire::decode(&bytes).map_err(JobError::Format)?;
        let j = j as usize;
        let q_j = per_sharer_points[j].expect("filled in round 2");
        verify_uc_dl::<E, Sha256>(sid.as_slice(), j as u64, &q_j, &r.proof)
            .map_err(|_| EddsaError::ProofFailed("uc_dl"))?;
    }

    let per_sharer_points: Vec<Point<E>> = per_sharer_points.into_iter().map(|p| p.expect("filled above")).collect();
    let per_sharer_leaf_shares: Vec<Scalar<E>> =
        my_leaf_shares_from.into_iter().map(|s| s.expect("filled above")).collect();
    let q = per_sharer_points.iter().fold(Point::<E>::zero(), |acc, p| acc + p);

    Ok(ThresholdEckeyShare {
        my_pid,
        q,
        node: node.clone(),
        per_sharer_points,
        per_sharer_leaf_shares,
    })
}

fn pids_index(pids: &[Pid], target: Pid) -> u16 {
    pids.iter().position(|p| *p == target).expect("target pid is a party in this job") as u16
}

/// Collapses `share`'s per-sharer leaf shares to this party's flat
/// additive share of `Σ x_i`, given the other active parties' own
/// per-sharer leaf shares (spec §4.5's additive re-expression, applied
/// once per sharer and summed).
pub fn reexpress_for_quorum<E: Curve>(
    share: &ThresholdEckeyShare<E>,
    active: &HashMap<Pid, Vec<Scalar<E>>>,
) -> Result<Scalar<E>, EddsaError<std::convert::Infallible>> {
    let n = share.per_sharer_points.len();
    let mut total = Scalar::<E>::from(0u64);
    for sharer in 0..n {
        let active_shares: HashMap<Pid, Scalar<E>> =
            active.iter().map(|(pid, shares)| (*pid, shares[sharer])).collect();
        let reexpressed = tree::additive_reexpression(&share.node, &active_shares)?;
        let mine = *reexpressed.get(&share.my_pid).ok_or(EddsaError::Crypto("quorum re-expression dropped this party"))?;
        total = total + mine;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_mpc_test_support::local_network_mp;
    use generic_ec::curves::Secp256k1;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;
    use std::collections::HashMap;

    type E = Secp256k1;

    #[test]
    fn threshold_dkg_agrees_on_q_and_every_share_verifies() {
        futures::executor::block_on(async {
            let jobs = local_network_mp(3);
            let pids: Vec<Pid> = jobs[0].pids().to_vec();
            let node = Node::Threshold(2, pids.iter().copied().map(Node::Leaf).collect());

            let futs = jobs.iter().enumerate().map(|(idx, job)| {
                let mut rng = ChaCha20Rng::seed_from_u64(idx as u64);
                let node = node.clone();
                async move { threshold_dkg::<E, _, _>(job, &node, &mut rng).await.unwrap() }
            });
            let shares = futures::future::join_all(futs).await;
            let q0 = shares[0].q;
            for s in &shares {
                assert_eq!(s.q, q0);
            }

            // A 2-of-3 quorum re-expresses to a flat additive share of
            // the same aggregate secret key the DKG agreed on.
            let active: HashMap<Pid, Vec<Scalar<E>>> =
                shares[..2].iter().map(|s| (s.my_pid, s.per_sharer_leaf_shares.clone())).collect();
            let mut total = Scalar::<E>::from(0u64);
            for s in &shares[..2] {
                total = total + reexpress_for_quorum(s, &active).unwrap();
            }
            assert_eq!(Point::<E>::generator() * total, q0);
        });
    }
}
