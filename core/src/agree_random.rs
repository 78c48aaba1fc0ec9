//! Agreement on random strings (spec §4.3).
//!
//! On honest termination all parties output identical (or, for the
//! pairwise variant, pairwise identical) strings of the requested length.
//! If any commitment opens incorrectly the protocol aborts with a crypto
//! error. `bitlen < 128` is rejected for the "weak" variants with
//! `E_BADARG` — it is an argument error, not a cryptographic failure (see
//! SPEC_FULL.md's note correcting the distilled spec's boundary-behavior
//! text, grounded in the original's `agree_random.cpp`).

use digest::Digest;
use rand_core::{CryptoRng, RngCore, SeedableRng};
use sha2::Sha256;
use thiserror::Error;

use crate::commitment;
use crate::error::JobError;
use crate::job2p::Job2P;
use crate::jobmp::JobMp;
use crate::transport::Delivery;
use crate::wire;

const MIN_WEAK_BITLEN: usize = 128;

#[derive(Debug, Error)]
pub enum AgreeRandomError<E> {
    #[error("bitlen must be at least {MIN_WEAK_BITLEN} bits for the weak variant")]
    BitlenTooSmall,
    #[error("commitment failed to open: a party deviated from the protocol")]
    InvalidCommitment,
    #[error(transparent)]
    Job(#[from] JobError<E>),
}

fn n_bytes(bitlen: usize) -> usize {
    (bitlen + 7) / 8
}

fn xor_into(out: &mut [u8], other: &[u8]) {
    for (o, b) in out.iter_mut().zip(other) {
        *o ^= b;
    }
}

/// Full commit-reveal-XOR agreement: neither party learns the other's
/// contribution before both have committed, so the output is unbiasable
/// by either party even if they deviate after seeing the commitment.
pub async fn agree_random<D: Delivery, R: RngCore + CryptoRng>(
    job: &Job2P<D>,
    bitlen: usize,
    rng: &mut R,
) -> Result<Vec<u8>, AgreeRandomError<D::Error>> {
    let len = n_bytes(bitlen);
    let mut mine = vec![0u8; len];
    rng.fill_bytes(&mut mine);

    let sender = job.my_pid();
    let (commitment, opening) = commitment::commit(sender, Some(job.peer_pid()), None, &mine, rng);

    // Both parties commit to their own contribution in the same round,
    // over the two one-directional channels run concurrently.
    let my_commitment = wire::encode(&commitment.0);
    let (from_p1, from_p2) = futures::join!(
        job.p1_to_p2(if job.is_p1() { Some(my_commitment.clone()) } else { None }),
        job.p2_to_p1(if job.is_p2() { Some(my_commitment) } else { None }),
    );
    let peer_commitment_bytes = if job.is_p1() {
        from_p2.map_err(JobError::from)?.expect("p1 receives p2's commitment")
    } else {
        from_p1.map_err(JobError::from)?.expect("p2 receives p1's commitment")
    };
    let peer_commitment = commitment::CommitmentValue(wire::decode(&peer_commitment_bytes).map_err(JobError::from)?);

    let my_reveal = wire::encode(&(mine.clone(), opening.as_parts()));
    let (from_p1, from_p2) = futures::join!(
        job.p1_to_p2(if job.is_p1() { Some(my_reveal.clone()) } else { None }),
        job.p2_to_p1(if job.is_p2() { Some(my_reveal) } else { None }),
    );
    let peer_reveal = if job.is_p1() {
        from_p2.map_err(JobError::from)?.expect("p1 receives p2's reveal")
    } else {
        from_p1.map_err(JobError::from)?.expect("p2 receives p1's reveal")
    };
    let (their_value, their_opening_raw): (Vec<u8>, [u8; 32]) = wire::decode(&peer_reveal).map_err(JobError::from)?;
    let their_opening = commitment::Opening::from_parts(their_opening_raw);
    commitment::open(&peer_commitment, &their_opening, job.peer_pid(), Some(job.my_pid()), None, &their_value)
        .map_err(|_| AgreeRandomError::InvalidCommitment)?;

    let mut out = mine;
    xor_into(&mut out, &their_value);
    Ok(out)
}

/// One round shorter than [`agree_random`]: the named party sends its
/// contribution in the clear first. Only safe when a subsequent
/// proof-of-knowledge (e.g. a DKG's Schnorr proof bound to the resulting
/// string) would catch a bias attack — see spec §4.3 contract.
pub async fn weak_agree_random_p1_first<D: Delivery, R: RngCore + CryptoRng>(
    job: &Job2P<D>,
    bitlen: usize,
    rng: &mut R,
) -> Result<Vec<u8>, AgreeRandomError<D::Error>> {
    if bitlen < MIN_WEAK_BITLEN {
        return Err(AgreeRandomError::BitlenTooSmall);
    }
    let len = n_bytes(bitlen);
    let mut mine = vec![0u8; len];
    rng.fill_bytes(&mut mine);

    let p1_payload = if job.is_p1() { Some(mine.clone()) } else { None };
    let from_p1 = job.p1_to_p2(p1_payload).await?;
    let mut out = mine;
    if job.is_p2() {
        let p1_value = from_p1.expect("p2 receives p1's contribution");
        xor_into(&mut out, &p1_value);
    }
    Ok(out)
}

pub async fn weak_agree_random_p2_first<D: Delivery, R: RngCore + CryptoRng>(
    job: &Job2P<D>,
    bitlen: usize,
    rng: &mut R,
) -> Result<Vec<u8>, AgreeRandomError<D::Error>> {
    if bitlen < MIN_WEAK_BITLEN {
        return Err(AgreeRandomError::BitlenTooSmall);
    }
    let len = n_bytes(bitlen);
    let mut mine = vec![0u8; len];
    rng.fill_bytes(&mut mine);

    let p2_payload = if job.is_p2() { Some(mine.clone()) } else { None };
    let from_p2 = job.p2_to_p1(p2_payload).await?;
    let mut out = mine;
    if job.is_p1() {
        let p2_value = from_p2.expect("p1 receives p2's contribution");
        xor_into(&mut out, &p2_value);
    }
    Ok(out)
}

/// n-party committed broadcast of `ρ_i`; output is `XOR ρ_i`.
pub async fn multi_agree_random<D: Delivery, R: RngCore + CryptoRng>(
    job: &JobMp<D>,
    bitlen: usize,
    rng: &mut R,
) -> Result<Vec<u8>, AgreeRandomError<D::Error>> {
    let n = job.n_parties();
    let len = n_bytes(bitlen);
    let mut mine = vec![0u8; len];
    rng.fill_bytes(&mut mine);
    let (commitment, opening) = commitment::commit(job.pid(), None, None, &mine, rng);

    let received = job.plain_broadcast(wire::encode(&commitment.0)).await?;
    let mut commitments = vec![None; n as usize];
    commitments[job.party_index() as usize] = Some(commitment);
    for (j, bytes) in received {
        let arr: [u8; 32] = wire::decode(&bytes).map_err(JobError::from)?;
        commitments[j as usize] = Some(commitment::CommitmentValue(arr));
    }

    let received = job
        .plain_broadcast(wire::encode(&(mine.clone(), opening.as_parts())))
        .await?;
    let mut out = mine;
    for (j, bytes) in received {
        let (their_value, their_opening_raw): (Vec<u8>, [u8; 32]) = wire::decode(&bytes).map_err(JobError::from)?;
        let their_opening = commitment::Opening::from_parts(their_opening_raw);
        commitment::open(
            commitments[j as usize].as_ref().expect("commitment collected in prior round"),
            &their_opening,
            job.pids()[j as usize],
            None,
            None,
            &their_value,
        )
        .map_err(|_| AgreeRandomError::InvalidCommitment)?;
        xor_into(&mut out, &their_value);
    }
    Ok(out)
}

/// Each party commits a `ρ_{i→j}` to every other party; the pairwise
/// result between `i` and `j` is `DRBG(ρ_{i→j} XOR ρ_{j→i})` stretched to
/// `bitlen`, giving every ordered pair of parties its own agreed string
/// without requiring a full n-way broadcast round per pair.
pub async fn multi_pairwise_agree_random<D: Delivery, R: RngCore + CryptoRng>(
    job: &JobMp<D>,
    bitlen: usize,
    rng: &mut R,
) -> Result<Vec<Vec<u8>>, AgreeRandomError<D::Error>> {
    let n = job.n_parties();
    let me = job.party_index();

    // ρ_{me→j} for every peer j, each committed independently so no peer
    // can bias its own pairwise string by choosing after seeing ours.
    let mut my_contribs = vec![[0u8; 32]; n as usize];
    let mut commitments = vec![None; n as usize];
    let mut openings = vec![None; n as usize];
    for j in 0..n {
        if j == me {
            continue;
        }
        let mut rho = [0u8; 32];
        rng.fill_bytes(&mut rho);
        let (c, o) = commitment::commit(job.pid(), Some(job.pids()[j as usize]), None, &rho, rng);
        my_contribs[j as usize] = rho;
        commitments[j as usize] = Some(c);
        openings[j as usize] = Some(o);
    }

    let mut peer_commitments = vec![None; n as usize];
    for j in 0..n {
        if j == me {
            continue;
        }
        let payload = wire::encode(&commitments[j as usize].as_ref().unwrap().0);
        job.send(j, payload).await?;
    }
    for j in 0..n {
        if j == me {
            continue;
        }
        let incoming = job.receive(j).await?;
        let arr: [u8; 32] = wire::decode(&incoming).map_err(JobError::from)?;
        peer_commitments[j as usize] = Some(commitment::CommitmentValue(arr));
    }

    let mut peer_contribs = vec![[0u8; 32]; n as usize];
    for j in 0..n {
        if j == me {
            continue;
        }
        let payload = wire::encode(&(my_contribs[j as usize], openings[j as usize].as_ref().unwrap().as_parts()));
        job.send(j, payload).await?;
    }
    for j in 0..n {
        if j == me {
            continue;
        }
        let incoming = job.receive(j).await?;
        let (their_value, their_opening_raw): ([u8; 32], [u8; 32]) = wire::decode(&incoming).map_err(JobError::from)?;
        let their_opening = commitment::Opening::from_parts(their_opening_raw);
        commitment::open(
            peer_commitments[j as usize].as_ref().unwrap(),
            &their_opening,
            job.pids()[j as usize],
            Some(job.pid()),
            None,
            &their_value,
        )
        .map_err(|_| AgreeRandomError::InvalidCommitment)?;
        peer_contribs[j as usize] = their_value;
    }

    let len = n_bytes(bitlen);
    let mut out = vec![Vec::new(); n as usize];
    for j in 0..n {
        if j == me {
            continue;
        }
        let mut seed_material = my_contribs[j as usize];
        xor_into(&mut seed_material, &peer_contribs[j as usize]);
        out[j as usize] = drbg_stretch::<Sha256>(&seed_material, len);
    }
    Ok(out)
}

fn drbg_stretch<D: Digest>(seed: &[u8], len: usize) -> Vec<u8> {
    let mut seed32 = [0u8; 32];
    let n = seed32.len().min(D::output_size());
    let digest = D::digest(seed);
    seed32[..n].copy_from_slice(&digest[..n]);
    let mut drbg = rand_chacha::ChaCha20Rng::from_seed(seed32);
    let mut out = vec![0u8; len];
    drbg.fill_bytes(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pid::Pid;
    use crate::test_support::LocalNetwork;
    use rand_core::SeedableRng;

    #[test]
    fn agree_random_matches_between_parties() {
        futures::executor::block_on(async {
            let net = LocalNetwork::new(2);
            let mut it = net.deliveries().into_iter();
            let pid1 = Pid::from_name("p1");
            let pid2 = Pid::from_name("p2");
            let job1 = Job2P::new(it.next().unwrap(), pid1, pid2);
            let job2 = Job2P::new(it.next().unwrap(), pid1, pid2);
            let mut r1 = rand_chacha::ChaCha20Rng::seed_from_u64(1);
            let mut r2 = rand_chacha::ChaCha20Rng::seed_from_u64(2);

            let (a, b) = futures::join!(
                agree_random(&job1, 256, &mut r1),
                agree_random(&job2, 256, &mut r2),
            );
            assert_eq!(a.unwrap(), b.unwrap());
        });
    }

    #[test]
    fn weak_variant_rejects_small_bitlen() {
        futures::executor::block_on(async {
            let net = LocalNetwork::new(2);
            let mut it = net.deliveries().into_iter();
            let pid1 = Pid::from_name("p1");
            let pid2 = Pid::from_name("p2");
            let job1 = Job2P::new(it.next().unwrap(), pid1, pid2);
            let mut r1 = rand_chacha::ChaCha20Rng::seed_from_u64(1);
            let err = weak_agree_random_p1_first(&job1, 64, &mut r1).await;
            assert!(matches!(err, Err(AgreeRandomError::BitlenTooSmall)));
        });
    }
}
