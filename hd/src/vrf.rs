//! VRF-Compute-2P (spec §4.10): given a hardened-derivation label, hash
//! it to a curve point `P`, have each party compute `Z_i = k_i·P` and
//! prove knowledge of `k_i` via a DH-proof relative to its own public
//! share, then combine `Z = Σ Z_i`. `Z` is deterministic in `k` and
//! `label` — the randomness-free "VRF" this workspace's `k`-DKG backs.
//!
//! One round, simultaneous broadcast (`JobMp::plain_broadcast` via
//! `Job2P::as_mp`, the same pattern `cb_mpc_eddsa::sign_mp` uses for its
//! own one-shot batched-proof round) rather than `Job2P`'s asymmetric
//! `p1_to_p2`/`p2_to_p1`, since both parties publish at once here.

use cb_mpc_core::error::JobError;
use cb_mpc_core::job2p::Job2P;
use cb_mpc_core::random_oracle::hash_to_curve;
use cb_mpc_core::sid::generate_sid_fixed_2p;
use cb_mpc_core::transport::Delivery;
use cb_mpc_core::wire;
use cb_mpc_key_share::eckey_mp::EckeyMp;
use cb_mpc_zk::dl::{prove_dh, verify_dh, DhProof};
use generic_ec::{hash_to_curve::FromHash, Curve, Point, Scalar, SecretScalar};
use rand_core::{CryptoRng, RngCore};
use sha2::Sha256;

use crate::error::HdError;

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(bound(
    serialize = "Point<E>: serde::Serialize, DhProof<E>: serde::Serialize",
    deserialize = "Point<E>: serde::Deserialize<'de>, DhProof<E>: serde::Deserialize<'de>"
))]
struct Round<E: Curve> {
    z: Point<E>,
    proof: DhProof<E>,
}

/// Computes `Z = k·HashToCurve(label)` for the VRF key `k` shared
/// between the two parties in `vrf`, proving each party's contribution
/// is consistent with its own public share recorded in `vrf`.
pub async fn vrf_compute_2p<E, D, R>(
    job: &Job2P<D>,
    vrf: &EckeyMp<E>,
    label: &[u8],
    rng: &mut R,
) -> Result<Point<E>, HdError<D::Error>>
where
    E: Curve,
    Scalar<E>: FromHash,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    vrf.validate().map_err(|_| HdError::BadArg("VRF key share failed its own consistency check"))?;
    let sid = generate_sid_fixed_2p(job, rng).await?;
    let p_point = hash_to_curve::<E>(sid.as_slice(), label)?;

    let my_index = vrf.party_index as usize;
    let peer_index = 1 - my_index;
    let my_k_point = vrf.public_shares[my_index];
    let peer_k_point = vrf.public_shares[peer_index];

    let k_i = SecretScalar::<E>::new(&mut vrf.x.as_ref().clone());
    let z_i = p_point * k_i.as_ref();
    let proof = prove_dh::<E, Sha256, _>(sid.as_slice(), 0, &p_point, &my_k_point, &z_i, &k_i, rng)
        .map_err(|_| HdError::ProofFailed("failed to produce this party's own DH proof"))?;

    let round = Round::<E> { z: z_i, proof };
    let received = job.as_mp().plain_broadcast(wire::encode(&round)).await?;
    let (_, bytes) = received
        .into_iter()
        .next()
        .ok_or(HdError::BadArg("expected exactly one peer in a 2-party VRF computation"))?;
    let r: Round<E> = wire::decode(&bytes).map_err(JobError::Format)?;

    verify_dh::<E, Sha256>(sid.as_slice(), 0, &p_point, &peer_k_point, &r.z, &r.proof)
        .map_err(|_| HdError::ProofFailed("peer's DH proof for its VRF share failed to verify"))?;

    Ok(z_i + r.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_mpc_test_support::local_network_2p;
    use generic_ec::curves::Secp256k1;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    type E = Secp256k1;

    #[test]
    fn vrf_compute_is_deterministic_in_label() {
        futures::executor::block_on(async {
            let (job1, job2) = local_network_2p();
            let mut rng1 = ChaCha20Rng::seed_from_u64(1);
            let mut rng2 = ChaCha20Rng::seed_from_u64(2);

            let (k1, k2) = futures::join!(
                cb_mpc_eddsa::dkg::<E, _, _>(job1.as_mp(), &mut rng1),
                cb_mpc_eddsa::dkg::<E, _, _>(job2.as_mp(), &mut rng2)
            );
            let (k1, k2) = (k1.unwrap(), k2.unwrap());

            let (z1a, z2a) = futures::join!(
                vrf_compute_2p::<E, _, _>(&job1, &k1, b"m/44'/0'", &mut rng1),
                vrf_compute_2p::<E, _, _>(&job2, &k2, b"m/44'/0'", &mut rng2)
            );
            let (z1a, z2a) = (z1a.unwrap(), z2a.unwrap());
            assert_eq!(z1a, z2a);

            let (z1b, z2b) = futures::join!(
                vrf_compute_2p::<E, _, _>(&job1, &k1, b"m/44'/1'", &mut rng1),
                vrf_compute_2p::<E, _, _>(&job2, &k2, b"m/44'/1'", &mut rng2)
            );
            let (z1b, _z2b) = (z1b.unwrap(), z2b.unwrap());
            assert_ne!(z1a, z1b);
        });
    }
}
