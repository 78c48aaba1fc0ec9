//! Session-ID agreement (spec §4.2).
//!
//! A session ID is a binary string of at least 128 bits agreed among the
//! participants; every ZK proof and commitment in the workspace is bound
//! to it. "Fixed" sessions hash in the ordered PIDs only; "dynamic"
//! sessions additionally absorb a caller-supplied PID list (used when the
//! same two long-term parties run several logically distinct protocol
//! instances and want them unlinkable at the transcript level).

use digest::Digest;
use rand_core::{CryptoRng, RngCore};
use sha2::Sha256;

use crate::commitment::{self, CommitmentValue, Opening};
use crate::error::JobError;
use crate::job2p::{Job2P, P1, P2};
use crate::jobmp::JobMp;
use crate::pid::Pid;
use crate::transport::Delivery;
use crate::wire;

pub const SID_BYTES: usize = 32;
const RHO_BYTES: usize = 16;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Sid(pub [u8; SID_BYTES]);

impl Sid {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

fn hash_sid(parts: &[&[u8]]) -> Sid {
    let mut h = Sha256::new();
    h.update(b"cb-mpc/sid/v1");
    for p in parts {
        h.update((p.len() as u64).to_be_bytes());
        h.update(p);
    }
    let digest = h.finalize();
    let mut out = [0u8; SID_BYTES];
    out.copy_from_slice(&digest);
    Sid(out)
}

/// Two-party fixed session ID: `ρ_1` is committed by P1, `ρ_2` sent by P2
/// in the clear, then `ρ_1` opened; `sid = H(ρ_1, ρ_2, pid_1, pid_2)`.
///
/// `initiator` only determines who commits first on the wire; the
/// resulting `sid` is identical regardless, since both `ρ_1` and `ρ_2`
/// are absorbed by role, not by send order.
pub async fn generate_sid_fixed_2p<D: Delivery, R: RngCore + CryptoRng>(
    job: &Job2P<D>,
    rng: &mut R,
) -> Result<Sid, JobError<D::Error>> {
    generate_sid_dynamic_2p(job, rng, &[]).await
}

/// As [`generate_sid_fixed_2p`] but additionally absorbs a caller-supplied
/// list of PIDs into the transcript, so two parties that agree on several
/// logically distinct sessions derive unlinkable `sid`s.
pub async fn generate_sid_dynamic_2p<D: Delivery, R: RngCore + CryptoRng>(
    job: &Job2P<D>,
    rng: &mut R,
    extra_pids: &[Pid],
) -> Result<Sid, JobError<D::Error>> {
    let mut rho1 = [0u8; RHO_BYTES];
    let mut rho2 = [0u8; RHO_BYTES];

    if job.is_p1() {
        rng.fill_bytes(&mut rho1);
    } else {
        rng.fill_bytes(&mut rho2);
    }

    let (commitment, opening): (Option<CommitmentValue>, Option<Opening>) = if job.is_p1() {
        let sender = job.my_pid();
        let (c, o) = commitment::commit(sender, None, None, &rho1, rng);
        (Some(c), Some(o))
    } else {
        (None, None)
    };

    // Round 1: P1 -> P2 commitment to rho_1; P2 -> P1 rho_2 in the clear.
    let commitment_payload = commitment.as_ref().map(|c| wire::encode(&c.0));
    let received = job.p1_to_p2(commitment_payload).await?;
    let commitment_from_p1 = if job.is_p2() {
        let bytes = received.expect("p2 must receive p1's commitment");
        let arr: [u8; 32] = wire::decode(&bytes).map_err(|e| JobError::Format(e))?;
        Some(CommitmentValue(arr))
    } else {
        None
    };

    let rho2_payload = if job.is_p2() { Some(rho2.to_vec()) } else { None };
    let received = job.p2_to_p1(rho2_payload).await?;
    if job.is_p1() {
        rho2 = received
            .expect("p1 must receive p2's rho")
            .try_into()
            .expect("rho2 must be 16 bytes");
    }

    // Round 2: P1 opens rho_1 to P2, sending the real commitment opening
    // alongside it (not just the committed value).
    let open_payload = opening
        .as_ref()
        .map(|o| wire::encode(&(rho1.to_vec(), o.to_bytes())));
    let received = job.p1_to_p2(open_payload).await?;
    if job.is_p2() {
        let bytes = received.expect("p2 must receive p1's opening");
        let (their_rho1, their_opening_bytes): (Vec<u8>, [u8; 32]) =
            wire::decode(&bytes).map_err(JobError::Format)?;
        rho1 = their_rho1.try_into().expect("rho1 must be 16 bytes");
        let commitment = commitment_from_p1.expect("p2 computed a commitment placeholder above");
        let opening = Opening::from_bytes(their_opening_bytes);
        commitment::open(&commitment, &opening, job.peer_pid(), None, None, &rho1)
            .map_err(|_| JobError::Format(crate::error::FormatError::TrailingBytes))?;
    }

    let (pid1, pid2) = if job.is_p1() {
        (job.my_pid(), job.peer_pid())
    } else {
        (job.peer_pid(), job.my_pid())
    };

    let mut parts: Vec<&[u8]> = vec![&rho1, &rho2, pid1.as_bytes(), pid2.as_bytes()];
    let extra_bytes: Vec<[u8; 16]> = extra_pids.iter().map(|p| *p.as_bytes()).collect();
    for b in &extra_bytes {
        parts.push(b);
    }
    Ok(hash_sid(&parts))
}

/// Multi-party fixed session ID: committed broadcast of every `ρ_i`, then
/// `sid = H(ρ_1, ..., ρ_n, pid_1, ..., pid_n)` in party-index order.
pub async fn generate_sid_fixed_mp<D: Delivery, R: RngCore + CryptoRng>(
    job: &JobMp<D>,
    rng: &mut R,
) -> Result<Sid, JobError<D::Error>> {
    let n = job.n_parties();
    let mut rho = [0u8; RHO_BYTES];
    rng.fill_bytes(&mut rho);
    let (commitment, opening) = commitment::commit(job.pid(), None, None, &rho, rng);

    let received = job.plain_broadcast(wire::encode(&commitment.0)).await?;
    let mut commitments = vec![None; n as usize];
    commitments[job.party_index() as usize] = Some(commitment);
    for (j, bytes) in received {
        let arr: [u8; 32] = wire::decode(&bytes).map_err(JobError::Format)?;
        commitments[j as usize] = Some(CommitmentValue(arr));
    }

    let received = job
        .plain_broadcast(wire::encode(&(rho.to_vec(), opening.to_bytes())))
        .await?;
    let mut rhos = vec![[0u8; RHO_BYTES]; n as usize];
    rhos[job.party_index() as usize] = rho;
    for (j, bytes) in received {
        let (their_rho, their_opening_bytes): (Vec<u8>, [u8; 32]) =
            wire::decode(&bytes).map_err(JobError::Format)?;
        let their_rho: [u8; RHO_BYTES] = their_rho.try_into().expect("rho must be 16 bytes");
        let their_opening = Opening::from_bytes(their_opening_bytes);
        commitment::open(
            commitments[j as usize].as_ref().expect("commitment collected in prior round"),
            &their_opening,
            job.pids()[j as usize],
            None,
            None,
            &their_rho,
        )
        .map_err(|_| JobError::Format(crate::error::FormatError::TrailingBytes))?;
        rhos[j as usize] = their_rho;
    }

    let mut parts: Vec<&[u8]> = rhos.iter().map(|r| r.as_slice()).collect();
    let pid_bytes: Vec<[u8; 16]> = job.pids().iter().map(|p| *p.as_bytes()).collect();
    for b in &pid_bytes {
        parts.push(b);
    }
    Ok(hash_sid(&parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::LocalNetwork;
    use rand_core::SeedableRng;

    #[test]
    fn fixed_2p_sid_agrees() {
        futures::executor::block_on(async {
            let net = LocalNetwork::new(2);
            let mut it = net.deliveries().into_iter();
            let pid1 = Pid::from_name("p1");
            let pid2 = Pid::from_name("p2");
            let job1 = Job2P::new(it.next().unwrap(), pid1, pid2);
            let job2 = Job2P::new(it.next().unwrap(), pid1, pid2);

            let mut r1 = rand_chacha::ChaCha20Rng::seed_from_u64(1);
            let mut r2 = rand_chacha::ChaCha20Rng::seed_from_u64(2);

            let (sid1, sid2) = futures::join!(
                generate_sid_fixed_2p(&job1, &mut r1),
                generate_sid_fixed_2p(&job2, &mut r2),
            );
            assert_eq!(sid1.unwrap(), sid2.unwrap());
        });
    }

    #[test]
    fn fixed_mp_sid_agrees() {
        futures::executor::block_on(async {
            let n = 4u16;
            let net = LocalNetwork::new(n);
            let pids: Vec<_> = (0..n).map(|i| Pid::from_name(&format!("p{i}"))).collect();
            let jobs: Vec<_> = net
                .deliveries()
                .into_iter()
                .map(|d| JobMp::new(d, pids.clone()))
                .collect();

            let futs = jobs.iter().enumerate().map(|(i, job)| {
                let mut rng = rand_chacha::ChaCha20Rng::seed_from_u64(i as u64);
                async move { generate_sid_fixed_mp(job, &mut rng).await.unwrap() }
            });
            let sids = futures::future::join_all(futs).await;
            for s in &sids[1..] {
                assert_eq!(*s, sids[0]);
            }
        });
    }
}
