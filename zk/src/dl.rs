//! Discrete-log proof family (spec §4.4 "Discrete-log family"), built
//! directly on `generic_ec_zkp::schnorr_pok` the way `cggmp21`'s own
//! key-refresh round uses it for its `sch_proof_y`/`sch_proofs_x`
//! witnesses — a non-interactive, Fiat-Shamir, UC-secure Schnorr proof of
//! knowledge with the challenge drawn from this crate's `Transcript`
//! instead of `schnorr_pok`'s own `Challenge` helper, so every proof in
//! the workspace binds to the same `sid`/`aux` domain-separation scheme.

use cb_mpc_core::random_oracle::Transcript;
use digest::Digest;
use generic_ec::{hash_to_curve::FromHash, Curve, Point, Scalar, SecretScalar};
use generic_ec_zkp::schnorr_pok;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DlProofError {
    #[error("proof does not verify")]
    Invalid,
    #[error(transparent)]
    RandomOracle(#[from] cb_mpc_core::random_oracle::RandomOracleError),
}

fn challenge<E: Curve, D: Digest + Clone>(
    tag: &str,
    sid: &[u8],
    aux: u64,
    statement_points: &[&Point<E>],
) -> Result<schnorr_pok::Challenge<E>, DlProofError>
where
    Scalar<E>: FromHash,
{
    let mut t = Transcript::<D>::new(tag).absorb_sid(sid).absorb_u64(aux);
    for p in statement_points {
        t = t.absorb_point(p);
    }
    Ok(schnorr_pok::Challenge { nonce: t.challenge_scalar::<E>()? })
}

/// `uc_dl`: knowledge of `w` with `Q = w·G`.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(bound(
    serialize = "schnorr_pok::Commit<E>: serde::Serialize, schnorr_pok::Proof<E>: serde::Serialize",
    deserialize = "schnorr_pok::Commit<E>: serde::Deserialize<'de>, schnorr_pok::Proof<E>: serde::Deserialize<'de>"
))]
pub struct UcDlProof<E: Curve> {
    commit: schnorr_pok::Commit<E>,
    proof: schnorr_pok::Proof<E>,
}

pub fn prove_uc_dl<E: Curve, D: Digest + Clone, R: rand_core::RngCore + rand_core::CryptoRng>(
    sid: &[u8],
    aux: u64,
    q: &Point<E>,
    w: &SecretScalar<E>,
    rng: &mut R,
) -> Result<UcDlProof<E>, DlProofError>
where
    Scalar<E>: FromHash,
{
    let (secret, commit) = schnorr_pok::prover_commits_ephemeral_secret::<E, _>(rng);
    let chal = challenge::<E, D>("cb-mpc/zk/uc_dl", sid, aux, &[&commit.0, q])?;
    let proof = schnorr_pok::prove(&secret, &chal, w);
    Ok(UcDlProof { commit, proof })
}

pub fn verify_uc_dl<E: Curve, D: Digest + Clone>(
    sid: &[u8],
    aux: u64,
    q: &Point<E>,
    proof: &UcDlProof<E>,
) -> Result<(), DlProofError>
where
    Scalar<E>: FromHash,
{
    let chal = challenge::<E, D>("cb-mpc/zk/uc_dl", sid, aux, &[&proof.commit.0, q])?;
    proof
        .proof
        .verify(&proof.commit, &chal, q)
        .map_err(|_| DlProofError::Invalid)
}

/// `uc_batch_dl`: the `AND` of `k` `uc_dl` statements under one shared
/// challenge (key refresh's `sch_proofs_x` vector proves exactly this —
/// one challenge reused across every `x_j` witness).
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(bound(
    serialize = "schnorr_pok::Proof<E>: serde::Serialize",
    deserialize = "schnorr_pok::Proof<E>: serde::Deserialize<'de>"
))]
pub struct UcBatchDlProof<E: Curve>(Vec<schnorr_pok::Proof<E>>);

pub fn prove_uc_batch_dl<E: Curve, D: Digest + Clone, R: rand_core::RngCore + rand_core::CryptoRng>(
    sid: &[u8],
    aux: u64,
    statements: &[(Point<E>, &SecretScalar<E>)],
    rng: &mut R,
) -> Result<(Vec<schnorr_pok::Commit<E>>, UcBatchDlProof<E>), DlProofError>
where
    Scalar<E>: FromHash,
{
    let (secrets, commits): (Vec<_>, Vec<_>) = statements
        .iter()
        .map(|_| schnorr_pok::prover_commits_ephemeral_secret::<E, _>(rng))
        .unzip();
    let points: Vec<&Point<E>> = commits.iter().map(|c| &c.0).chain(statements.iter().map(|(q, _)| q)).collect();
    let chal = challenge::<E, D>("cb-mpc/zk/uc_batch_dl", sid, aux, &points)?;
    let proofs = secrets
        .iter()
        .zip(statements.iter())
        .map(|(secret, (_, w))| schnorr_pok::prove(secret, &chal, w))
        .collect();
    Ok((commits, UcBatchDlProof(proofs)))
}

pub fn verify_uc_batch_dl<E: Curve, D: Digest + Clone>(
    sid: &[u8],
    aux: u64,
    statements: &[Point<E>],
    commits: &[schnorr_pok::Commit<E>],
    proof: &UcBatchDlProof<E>,
) -> Result<(), DlProofError>
where
    Scalar<E>: FromHash,
{
    if statements.len() != commits.len() || statements.len() != proof.0.len() {
        return Err(DlProofError::Invalid);
    }
    let points: Vec<&Point<E>> = commits.iter().map(|c| &c.0).chain(statements.iter()).collect();
    let chal = challenge::<E, D>("cb-mpc/zk/uc_batch_dl", sid, aux, &points)?;
    for ((commit, q), pf) in commits.iter().zip(statements.iter()).zip(proof.0.iter()) {
        pf.verify(commit, &chal, q).map_err(|_| DlProofError::Invalid)?;
    }
    Ok(())
}

/// `dh`: given `(G, Q, A, B)`, knowledge of `w` with `A = w·G ∧ B = w·Q`.
/// Used by the n-party signing protocol's round 8 to link a party's
/// ElGamal-key share `s_i` to both `E_i = s_i·G` and the decryption share
/// `W_i = s_i·Z.L`.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(bound(
    serialize = "Point<E>: serde::Serialize, Scalar<E>: serde::Serialize",
    deserialize = "Point<E>: serde::Deserialize<'de>, Scalar<E>: serde::Deserialize<'de>"
))]
pub struct DhProof<E: Curve> {
    a_commit: Point<E>,
    b_commit: Point<E>,
    z: Scalar<E>,
}

pub fn prove_dh<E: Curve, D: Digest + Clone, R: rand_core::RngCore + rand_core::CryptoRng>(
    sid: &[u8],
    aux: u64,
    q: &Point<E>,
    a: &Point<E>,
    b: &Point<E>,
    w: &SecretScalar<E>,
    rng: &mut R,
) -> Result<DhProof<E>, DlProofError>
where
    Scalar<E>: FromHash,
{
    let k = Scalar::<E>::random(rng);
    let a_commit = Point::generator() * k;
    let b_commit = *q * k;
    let c = challenge::<E, D>("cb-mpc/zk/dh", sid, aux, &[q, a, b, &a_commit, &b_commit])?.nonce;
    let z = k + c * w.as_ref();
    Ok(DhProof { a_commit, b_commit, z })
}

pub fn verify_dh<E: Curve, D: Digest + Clone>(
    sid: &[u8],
    aux: u64,
    q: &Point<E>,
    a: &Point<E>,
    b: &Point<E>,
    proof: &DhProof<E>,
) -> Result<(), DlProofError>
where
    Scalar<E>: FromHash,
{
    let c = challenge::<E, D>("cb-mpc/zk/dh", sid, aux, &[q, a, b, &proof.a_commit, &proof.b_commit])?.nonce;
    let lhs_a = Point::generator() * proof.z;
    let rhs_a = proof.a_commit + *a * c;
    let lhs_b = *q * proof.z;
    let rhs_b = proof.b_commit + *b * c;
    if lhs_a == rhs_a && lhs_b == rhs_b {
        Ok(())
    } else {
        Err(DlProofError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use generic_ec::curves::Secp256k1;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;
    use sha2::Sha256;

    type E = Secp256k1;

    #[test]
    fn uc_dl_round_trips() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let w = SecretScalar::<E>::random(&mut rng);
        let q = Point::generator() * &w;
        let proof = prove_uc_dl::<E, Sha256, _>(b"sid", 7, &q, &w, &mut rng).unwrap();
        verify_uc_dl::<E, Sha256>(b"sid", 7, &q, &proof).unwrap();
    }

    #[test]
    fn dh_round_trips() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let w = SecretScalar::<E>::random(&mut rng);
        let q = Point::generator() * Scalar::<E>::random(&mut rng);
        let a = Point::generator() * &w;
        let b = q * &w;
        let proof = prove_dh::<E, Sha256, _>(b"sid", 1, &q, &a, &b, &w, &mut rng).unwrap();
        verify_dh::<E, Sha256>(b"sid", 1, &q, &a, &b, &proof).unwrap();
    }
}
