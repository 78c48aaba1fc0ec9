//! Schnorr/EdDSA/BIP340 key refresh (spec §4.9 "Refresh"): every party
//! picks a pairwise blinding scalar `r_{i,j}` for every other party `j`,
//! commits to the whole row, then reveals it; `x_i' = x_i + Σ_{j<i}
//! (r_ij+r_ji) - Σ_{j>i} (r_ij+r_ji)` leaves `Σ x_i` unchanged while
//! rerandomizing every share. Identical in shape to
//! `cb_mpc_ecdsa_mp::refresh`, grounded on the same
//! `key_share_mp_t::refresh` (`examples/original_source/src/cbmpc/
//! protocol/ec_dkg.cpp`) the spec gives both protocol families.

use cb_mpc_core::commitment::{self, CommitmentValue, Opening};
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
#[serde(bound(
    serialize = "Point<E>: serde::Serialize, UcDlProof<E>: serde::Serialize, Scalar<E>: serde::Serialize",
    deserialize = "Point<E>: serde::Deserialize<'de>, UcDlProof<E>: serde::Deserialize<'de>, Scalar<E>: serde::Deserialize<'de>"
))]
struct Round2<E: Curve> {
    r_row: Vec<Scalar<E>>,
    r_points: Vec<Point<E>>,
    proofs: Vec<UcDlProof<E>>,
    opening: [u8; 32],
}

/// Refreshes an existing Schnorr-MP key share in place, returning a
/// share over a rerandomized additive secret-sharing of the same `Q`.
pub async fn refresh<E, D, R>(
    job: &JobMp<D>,
    key: EckeyMp<E>,
    rng: &mut R,
) -> Result<EckeyMp<E>, EddsaError<D::Error>>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    key.validate()?;
    let n = job.n_parties() as usize;
    let i = job.party_index() as usize;
    let sid = generate_sid_fixed_mp(job, rng).await?;

    let mut r_row: Vec<Scalar<E>> = (0..n).map(|_| Scalar::<E>::random(rng)).collect();
    r_row[i] = Scalar::<E>::from(0u64);
    let r_points: Vec<Point<E>> = r_row.iter().map(|r| Point::<E>::generator() * r).collect();
    let proofs: Vec<UcDlProof<E>> = (0..n)
        .map(|j| {
            if j == i {
                prove_uc_dl::<E, Sha256, _>(
                    sid.as_slice(),
                    (i * n + j) as u64,
                    &Point::<E>::zero(),
                    &SecretScalar::new(&mut Scalar::<E>::from(0u64)),
                    rng,
                )
            } else {
                let w = SecretScalar::new(&mut r_row[j].clone());
                prove_uc_dl::<E, Sha256, _>(sid.as_slice(), (i * n + j) as u64, &r_points[j], &w, rng)
            }
        })
        .collect::<Result<_, _>>()
        .map_err(|_| EddsaError::Crypto("failed to produce this party's own UC-DL proofs"))?;

    let committed = wire::encode(&(r_points.clone(), proofs.clone()));
    let (commitment, opening) = commitment::commit(job.pid(), None, Some(sid.as_slice()), &committed, rng);

    let received = job.plain_broadcast(wire::encode(&commitment.0)).await?;
    let mut commitments: Vec<Option<CommitmentValue>> = vec![None; n];
    commitments[i] = Some(commitment);
    for (j, bytes) in received {
        let arr: [u8; 32] = wire::decode(&bytes).map_err(JobError::Format)?;
        commitments[j as usize] = Some(CommitmentValue(arr));
    }

    let round2 = Round2::<E> {
        r_row: r_row.clone(),
        r_points: r_points.clone(),
        proofs: proofs.clone(),
        opening: opening.to_bytes(),
    };
    let received = job.plain_broadcast(wire::encode(&round2)).await?;

    let mut r_matrix: Vec<Vec<Scalar<E>>> = vec![vec![Scalar::<E>::from(0u64); n]; n];
    let mut r_point_matrix: Vec<Vec<Point<E>>> = vec![vec![Point::<E>::zero(); n]; n];
    r_matrix[i] = r_row.clone();
    r_point_matrix[i] = r_points.clone();

    for (j, bytes) in received {
        let j = j as usize;
        let r: Round2<E> = wire::decode(&bytes).map_err(JobError::Format)?;
        if r.r_row.len() != n || r.r_points.len() != n || r.proofs.len() != n {
            return Err(EddsaError::BadArg("refresh row has wrong width"));
        }

        let committed = wire::encode(&(r.r_points.clone(), r.proofs.clone()));
        let their_opening = Opening::from_bytes(r.opening);
        commitment::open(
            commitments[j].as_ref().expect("commitment collected in round 1"),
            &their_opening,
            job.pids()[j],
            None,
            Some(sid.as_slice()),
            &committed,
        )
        .map_err(|_| EddsaError::Crypto("refresh row commitment did not open"))?;

        for l in 0..n {
            if l == j {
                continue;
            }
            verify_uc_dl::<E, Sha256>(sid.as_slice(), (j * n + l) as u64, &r.r_points[l], &r.proofs[l])
                .map_err(|_| EddsaError::ProofFailed("uc_dl"))?;
        }
        if Point::<E>::generator() * r.r_row[i] != r.r_points[i] {
            return Err(EddsaError::Crypto("r_ji does not match its published point"));
        }

        r_matrix[j] = r.r_row;
        r_point_matrix[j] = r.r_points;
    }

    let mut x = key.x;
    for j in 0..n {
        if j == i {
            continue;
        }
        let delta_x = r_matrix[i][j] + r_matrix[j][i];
        let mut updated = if j < i {
            x.as_ref() + &delta_x
        } else {
            x.as_ref() - &delta_x
        };
        x = SecretScalar::new(&mut updated);
    }

    let mut public_shares = key.public_shares;
    for j in 0..n {
        for l in 0..n {
            if l == j {
                continue;
            }
            let r_delta = r_point_matrix[j][l] + r_point_matrix[l][j];
            if l < j {
                public_shares[j] = public_shares[j] + r_delta;
            } else {
                public_shares[j] = public_shares[j] - r_delta;
            }
        }
    }

    let refreshed = EckeyMp {
        party_index: i as u16,
        q: key.q,
        x,
        public_shares,
    };
    refreshed.validate()?;
    Ok(refreshed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_mpc_test_support::local_network_mp;
    use generic_ec::curves::Secp256k1;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    type E = Secp256k1;

    #[test]
    fn refresh_preserves_public_key() {
        futures::executor::block_on(async {
            let jobs = local_network_mp(4);
            let futs = jobs.iter().enumerate().map(|(idx, job)| {
                let mut rng = ChaCha20Rng::seed_from_u64(idx as u64);
                async move { crate::dkg::dkg::<E, _, _>(job, &mut rng).await.unwrap() }
            });
            let shares = futures::future::join_all(futs).await;
            let q_before = shares[0].q;

            let futs2 = jobs.iter().zip(shares.into_iter()).enumerate().map(|(idx, (job, share))| {
                let mut rng = ChaCha20Rng::seed_from_u64(100 + idx as u64);
                async move { refresh::<E, _, _>(job, share, &mut rng).await.unwrap() }
            });
            let refreshed = futures::future::join_all(futs2).await;
            for share in &refreshed {
                assert_eq!(share.q, q_before);
                assert!(share.validate().is_ok());
            }
        });
    }
}
