//! 2-party ECDSA batch signing (spec §4.6 "ECDSA-2PC Sign", mirroring
//! `examples/original_source/src/cbmpc/protocol/ecdsa_2p.cpp`'s
//! `sign_batch_impl` exactly in round shape and arithmetic): four message
//! rounds producing one `(r, s)` pair per input message, each bound to the
//! same session and nonce-commitment transcript so the batch's messages
//! can't be mixed up across signatures.
//!
//! Round 1: P1 samples `k1_i`, commits to `(msgs, R1_i, batched-UC-DL)`.
//! Round 2: P2 samples `k2_i`, replies with `R2_i` and its own batched-UC-DL
//! proof. Round 3: P1 verifies, opens its commitment. Round 4: P2 verifies,
//! computes `r_i = x(k2_i·R1_i) mod q`, and sends the integer-commitment
//! ciphertext `c_i` (spec §4.4's unnamed ECDSA-signing proof) that lets P1
//! recover `s_i` without ever seeing `x_2`. The default variant additionally
//! verifies every signature against `Q` before returning; the
//! `_global_abort` variant skips the per-signature proof and instead
//! surfaces [`Ecdsa2pError::BitLeak`] if the cheaper arithmetic produces an
//! invalid signature, per spec §4.6's documented global-abort trade-off.

use cb_mpc_core::commitment::{self, CommitmentValue, Opening};
use cb_mpc_core::error::JobError;
use cb_mpc_core::job2p::Job2P;
use cb_mpc_core::security_level::SecurityLevel;
use cb_mpc_core::sid::generate_sid_fixed_2p;
use cb_mpc_core::transport::Delivery;
use cb_mpc_core::wire;
use cb_mpc_key_share::ecdsa2p_key::Ecdsa2pKey;
use cb_mpc_primitives::paillier::Ciphertext;
use cb_mpc_zk::dl::{prove_uc_batch_dl, verify_uc_batch_dl, UcBatchDlProof};
use cb_mpc_zk::integer_commit;
use generic_ec::coords::AlwaysHasAffineX;
use generic_ec::hash_to_curve::FromHash;
use generic_ec::{Curve, NonZero, Point, Scalar, SecretScalar};
use generic_ec_zkp::schnorr_pok;
use paillier_zk::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::Ecdsa2pError;

/// A single ECDSA signature, as the pair of curve-order scalars, low-`s`
/// canonicalized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature<E: Curve> {
    pub r: Scalar<E>,
    pub s: Scalar<E>,
}

impl<E: Curve> Signature<E> {
    /// DER `SEQUENCE { INTEGER r, INTEGER s }`, the wire form most ECDSA
    /// verifiers expect.
    pub fn to_der(&self) -> Vec<u8> {
        fn encode_integer(scalar_be: &[u8]) -> Vec<u8> {
            let mut bytes = scalar_be.to_vec();
            while bytes.len() > 1 && bytes[0] == 0 && bytes[1] < 0x80 {
                bytes.remove(0);
            }
            if bytes[0] & 0x80 != 0 {
                bytes.insert(0, 0);
            }
            let mut out = vec![0x02, bytes.len() as u8];
            out.extend_from_slice(&bytes);
            out
        }
        let r_int = encode_integer(self.r.to_be_bytes().as_bytes());
        let s_int = encode_integer(self.s.to_be_bytes().as_bytes());
        let mut body = Vec::with_capacity(r_int.len() + s_int.len());
        body.extend_from_slice(&r_int);
        body.extend_from_slice(&s_int);
        let mut out = vec![0x30, body.len() as u8];
        out.extend_from_slice(&body);
        out
    }
}

fn curve_order<E: Curve>() -> BigNumber {
    let neg_one = -Scalar::<E>::from(1);
    BigNumber::from_slice(neg_one.to_be_bytes().as_bytes()) + BigNumber::one()
}

fn scalar_to_bn<E: Curve>(x: &Scalar<E>) -> BigNumber {
    BigNumber::from_slice(x.to_be_bytes().as_bytes())
}

/// Converts an already curve-order-reduced `BigNumber` into a `Scalar<E>`
/// by Horner's method over its big-endian bytes, so the conversion only
/// relies on scalar addition/multiplication rather than a
/// bytes-to-scalar constructor this workspace's curve crate may or may
/// not expose for an arbitrary-width input.
fn bn_to_scalar<E: Curve>(x: &BigNumber) -> Scalar<E> {
    let base = Scalar::<E>::from(256u64);
    let mut acc = Scalar::<E>::from(0u64);
    for byte in x.to_bytes() {
        acc = acc * base + Scalar::<E>::from(byte as u64);
    }
    acc
}

/// `2^bits`, built from its byte representation rather than a shift
/// operator (mirrors `cb_mpc_zk::paillier`'s own private `pow2` helper).
pub(crate) fn pow2(bits: u32) -> BigNumber {
    let byte_len = (bits / 8 + 1) as usize;
    let mut bytes = vec![0u8; byte_len];
    bytes[0] = 1 << (bits % 8);
    BigNumber::from_slice(&bytes)
}

fn canonicalize_low_s<E: Curve>(s: Scalar<E>) -> Scalar<E> {
    let q = curve_order::<E>();
    let s_bn = scalar_to_bn::<E>(&s);
    let half = &q / BigNumber::from(2u64);
    if s_bn > half {
        bn_to_scalar::<E>(&(q - s_bn))
    } else {
        s
    }
}

/// `r = x(R) mod q`, spec §4.6's `r_i`. `R` is assumed not to be the point
/// at infinity (the nonce product of two independently sampled scalars is
/// infinity with negligible probability; a hit aborts the batch).
fn point_to_r<E: Curve>(point: &Point<E>) -> Result<Scalar<E>, &'static str>
where
    Point<E>: AlwaysHasAffineX<E>,
{
    let nz = NonZero::from_point(*point).ok_or("nonce product R is the point at infinity")?;
    Ok(nz.x().to_scalar())
}

fn verify_ecdsa<E: Curve>(q_pub: &Point<E>, message: &Scalar<E>, sig: &Signature<E>) -> bool
where
    Point<E>: AlwaysHasAffineX<E>,
{
    let Some(s_inv) = sig.s.invert() else { return false };
    let u1 = *message * s_inv;
    let u2 = sig.r * s_inv;
    let candidate = Point::<E>::generator() * u1 + *q_pub * u2;
    match point_to_r(&candidate) {
        Ok(r) => r == sig.r,
        Err(_) => false,
    }
}

#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
struct Round1 {
    commit: [u8; 32],
}

#[derive(Serialize, Deserialize)]
#[serde(bound(
    serialize = "Point<E>: Serialize, schnorr_pok::Commit<E>: Serialize, UcBatchDlProof<E>: Serialize",
    deserialize = "Point<E>: Deserialize<'de>, schnorr_pok::Commit<E>: Deserialize<'de>, UcBatchDlProof<E>: Deserialize<'de>"
))]
struct Round2<E: Curve> {
    r2: Vec<Point<E>>,
    commits: Vec<schnorr_pok::Commit<E>>,
    proof: UcBatchDlProof<E>,
}

#[derive(Serialize, Deserialize)]
#[serde(bound(
    serialize = "Point<E>: Serialize, schnorr_pok::Commit<E>: Serialize, UcBatchDlProof<E>: Serialize",
    deserialize = "Point<E>: Deserialize<'de>, schnorr_pok::Commit<E>: Deserialize<'de>, UcBatchDlProof<E>: Deserialize<'de>"
))]
struct Round3<E: Curve> {
    r1: Vec<Point<E>>,
    opening: [u8; 32],
    commits: Vec<schnorr_pok::Commit<E>>,
    proof: UcBatchDlProof<E>,
}

#[derive(Serialize, Deserialize)]
#[serde(bound(
    serialize = "Scalar<E>: Serialize, integer_commit::Proof<E>: Serialize",
    deserialize = "Scalar<E>: Deserialize<'de>, integer_commit::Proof<E>: Deserialize<'de>"
))]
struct Round4<E: Curve> {
    r: Vec<Scalar<E>>,
    c: Vec<Ciphertext>,
    proof: Option<Vec<integer_commit::Proof<E>>>,
}

#[allow(clippy::too_many_arguments)]
async fn sign_batch_impl<E, L, D, R>(
    job: &Job2P<D>,
    key: &Ecdsa2pKey<E>,
    messages: &[Scalar<E>],
    global_abort: bool,
    rng: &mut R,
) -> Result<Vec<Signature<E>>, Ecdsa2pError<D::Error>>
where
    E: Curve,
    Point<E>: AlwaysHasAffineX<E>,
    Scalar<E>: FromHash,
    L: SecurityLevel,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    if messages.is_empty() {
        return Err(Ecdsa2pError::BadArg);
    }
    let n = messages.len();
    let sid = generate_sid_fixed_2p(job, rng).await?;

    // Round 1: P1 samples nonces and commits to (messages, R1, batch proof).
    let k1: Option<Vec<SecretScalar<E>>> = job.is_p1().then(|| (0..n).map(|_| SecretScalar::<E>::random(rng)).collect());
    let r1: Option<Vec<Point<E>>> = k1.as_ref().map(|k1| k1.iter().map(|k| Point::generator() * k).collect());
    let batch1 = if job.is_p1() {
        let k1 = k1.as_ref().expect("p1 path");
        let r1 = r1.as_ref().expect("p1 path");
        let statements: Vec<(Point<E>, &SecretScalar<E>)> = r1.iter().zip(k1.iter()).map(|(p, k)| (*p, k)).collect();
        Some(prove_uc_batch_dl::<E, sha2::Sha256, _>(sid.as_slice(), 1, &statements, rng).map_err(|_| Ecdsa2pError::ProofFailed("uc_batch_dl"))?)
    } else {
        None
    };
    let (commit1, opening1) = if job.is_p1() {
        let r1 = r1.as_ref().expect("p1 path");
        let (commits, proof) = batch1.as_ref().expect("p1 path");
        let mut payload = Vec::new();
        for m in messages {
            payload.extend_from_slice(&wire::encode(m));
        }
        payload.extend_from_slice(&wire::encode(r1));
        payload.extend_from_slice(&wire::encode(commits));
        payload.extend_from_slice(&wire::encode(proof));
        let (c, o) = commitment::commit(job.my_pid(), None, Some(sid.as_slice()), &payload, rng);
        (Some(c), Some(o))
    } else {
        (None, None)
    };
    let round1 = commit1.map(|c| Round1 { commit: c.0 });
    let received = job.p1_to_p2(round1.as_ref().map(wire::encode)).await?;
    let commit1_at_p2: Option<[u8; 32]> = if job.is_p2() {
        let r: Round1 = wire::decode(&received.expect("p2 receives round1")).map_err(JobError::Format)?;
        Some(r.commit)
    } else {
        None
    };

    // Round 2: P2 samples nonces, replies with R2 and its own batch proof.
    let k2: Option<Vec<SecretScalar<E>>> = job.is_p2().then(|| (0..n).map(|_| SecretScalar::<E>::random(rng)).collect());
    let r2: Option<Vec<Point<E>>> = k2.as_ref().map(|k2| k2.iter().map(|k| Point::generator() * k).collect());
    let round2 = if job.is_p2() {
        let k2 = k2.as_ref().expect("p2 path");
        let r2 = r2.as_ref().expect("p2 path");
        let statements: Vec<(Point<E>, &SecretScalar<E>)> = r2.iter().zip(k2.iter()).map(|(p, k)| (*p, k)).collect();
        let (commits, proof) =
            prove_uc_batch_dl::<E, sha2::Sha256, _>(sid.as_slice(), 2, &statements, rng).map_err(|_| Ecdsa2pError::ProofFailed("uc_batch_dl"))?;
        Some(Round2::<E> { r2: r2.clone(), commits, proof })
    } else {
        None
    };
    let received = job.p2_to_p1(round2.as_ref().map(wire::encode)).await?;
    let r2_at_p1: Option<Vec<Point<E>>> = if job.is_p1() {
        let r: Round2<E> = wire::decode(&received.expect("p1 receives round2")).map_err(JobError::Format)?;
        verify_uc_batch_dl::<E, sha2::Sha256>(sid.as_slice(), 2, &r.r2, &r.commits, &r.proof)
            .map_err(|_| Ecdsa2pError::ProofFailed("uc_batch_dl"))?;
        Some(r.r2)
    } else {
        None
    };

    // Round 3: P1 opens its commitment and proves its own batch of nonces.
    let round3 = if job.is_p1() {
        let r1 = r1.clone().expect("p1 path");
        let (commits, proof) = batch1.expect("p1 path");
        Some(Round3::<E> {
            r1,
            opening: opening1.expect("p1 path").to_bytes(),
            commits,
            proof,
        })
    } else {
        None
    };
    let received = job.p1_to_p2(round3.as_ref().map(wire::encode)).await?;

    // Round 4: P2 verifies, computes r_i, and sends the integer commitments.
    let round4 = if job.is_p2() {
        let round3: Round3<E> = wire::decode(&received.expect("p2 receives round3")).map_err(JobError::Format)?;
        if round3.r1.len() != n {
            return Err(Ecdsa2pError::BadArg);
        }
        let mut payload = Vec::new();
        for m in messages {
            payload.extend_from_slice(&wire::encode(m));
        }
        payload.extend_from_slice(&wire::encode(&round3.r1));
        payload.extend_from_slice(&wire::encode(&round3.commits));
        payload.extend_from_slice(&wire::encode(&round3.proof));
        commitment::open(
            &CommitmentValue(commit1_at_p2.expect("p2 path")),
            &Opening::from_bytes(round3.opening),
            job.peer_pid(),
            None,
            Some(sid.as_slice()),
            &payload,
        )
        .map_err(|_| Ecdsa2pError::Crypto("nonce-batch commitment did not open"))?;
        verify_uc_batch_dl::<E, sha2::Sha256>(sid.as_slice(), 1, &round3.r1, &round3.commits, &round3.proof)
            .map_err(|_| Ecdsa2pError::ProofFailed("uc_batch_dl"))?;

        let k2 = k2.as_ref().expect("p2 path");
        let q = curve_order::<E>();
        let pedersen = cb_mpc_primitives::pedersen::global();
        let q_bn = curve_order::<E>();
        let c_key_blinded = key.paillier_public.add_plain(&key.c_key, &(&q_bn * pow2(L::SECURITY_BITS as u32)));

        let mut r_out = Vec::with_capacity(n);
        let mut c_out = Vec::with_capacity(n);
        let mut proofs = if global_abort { None } else { Some(Vec::with_capacity(n)) };
        for i in 0..n {
            let r_point = round3.r1[i] * k2[i].as_ref();
            let r_i = point_to_r(&r_point).map_err(|_| Ecdsa2pError::Crypto("nonce product R is the point at infinity"))?;
            let k2_inv = k2[i].as_ref().invert().ok_or(Ecdsa2pError::Crypto("sampled k2 was zero"))?;
            let rho = BigNumber::from_rng(&(&q * &q * pow2(2 * L::SECURITY_BITS as u32)), rng);
            let r_c = BigNumber::from_rng(key.paillier_public.n(), rng);

            let k2_inv_x2 = k2_inv * key.core.x.as_ref();
            // Every exponent/plaintext term below is built from the
            // canonical (curve-order-reduced, but not further reduced)
            // `BigNumber` representative of its scalar, multiplied as
            // plain integers rather than re-reduced through another
            // scalar-field multiplication — this is what keeps the
            // integer-commitment proof's Paillier equation exactly linear
            // in `(k2_inv, k2_inv_x2, rho)` (see `zk::integer_commit`).
            // Taking everything mod `q` at decryption time erases the
            // difference from the previously-reduced formulation.
            let k2_inv_bn = scalar_to_bn::<E>(&k2_inv);
            let k2_inv_x2_bn = scalar_to_bn::<E>(&k2_inv_x2);
            let m_bn = scalar_to_bn::<E>(&messages[i]);
            let r_bn = scalar_to_bn::<E>(&r_i);
            let plaintext = &k2_inv_bn * &m_bn + &k2_inv_x2_bn * &r_bn + &rho * &q;
            let c_tag = key
                .paillier_public
                .encrypt_with_randomizer(&plaintext, &r_c)
                .map_err(|_| Ecdsa2pError::Crypto("signing plaintext out of Paillier range"))?;
            let term1 = key.paillier_public.scalar_mul(&c_key_blinded, &(&k2_inv_bn * &r_bn));
            let c_i = key.paillier_public.add(&term1, &c_tag);

            if let Some(proofs) = proofs.as_mut() {
                let statement = integer_commit::Statement {
                    pk: &key.paillier_public,
                    pedersen,
                    c_key_blinded: &c_key_blinded,
                    c: &c_i,
                    q2: &(Point::generator() * key.core.x.as_ref()),
                    r2: &r2.as_ref().expect("p2 path")[i],
                    r: &r_i,
                    m: &messages[i],
                };
                let witness = integer_commit::Witness {
                    k2_inv,
                    x2: {
                        let mut x2 = key.core.x.as_ref().clone();
                        SecretScalar::new(&mut x2)
                    },
                    rho,
                    r_c,
                };
                proofs.push(integer_commit::prove::<E, sha2::Sha256, _>(sid.as_slice(), 3 + i as u64, &statement, &witness, rng));
            }

            r_out.push(r_i);
            c_out.push(c_i);
        }
        Some(Round4::<E> { r: r_out, c: c_out, proof: proofs })
    } else {
        None
    };
    let received = job.p2_to_p1(round4.as_ref().map(wire::encode)).await?;

    // P1 decrypts and assembles the final signatures.
    if job.is_p1() {
        let round4: Round4<E> = wire::decode(&received.expect("p1 receives round4")).map_err(JobError::Format)?;
        if round4.r.len() != n || round4.c.len() != n {
            return Err(Ecdsa2pError::BadArg);
        }
        let sk = key.paillier_secret.as_ref().ok_or(Ecdsa2pError::Crypto("P1 key share missing Paillier secret"))?;
        let k1 = k1.expect("p1 path");
        let q_bn = curve_order::<E>();
        let c_key_blinded = key.paillier_public.add_plain(&key.c_key, &(&q_bn * pow2(L::SECURITY_BITS as u32)));

        let mut sigs = Vec::with_capacity(n);
        for i in 0..n {
            if let Some(proofs) = &round4.proof {
                let statement = integer_commit::Statement {
                    pk: &key.paillier_public,
                    pedersen: cb_mpc_primitives::pedersen::global(),
                    c_key_blinded: &c_key_blinded,
                    c: &round4.c[i],
                    q2: &key.core.peer_public_share,
                    r2: &r2_at_p1.as_ref().expect("p1 path")[i],
                    r: &round4.r[i],
                    m: &messages[i],
                };
                integer_commit::verify::<E, sha2::Sha256>(sid.as_slice(), 3 + i as u64, &statement, &proofs[i])
                    .map_err(|_| Ecdsa2pError::ProofFailed("ecdsa_sign_2pc_integer_commit"))?;
            }
            let s_tag = sk.decrypt(&round4.c[i]).map_err(|_| Ecdsa2pError::Crypto("c_i not a valid ciphertext"))?;
            let s_tag_mod_q = s_tag % &curve_order::<E>();
            let s_tag_scalar = bn_to_scalar::<E>(&s_tag_mod_q);
            let k1_inv = k1[i].as_ref().invert().ok_or(Ecdsa2pError::Crypto("sampled k1 was zero"))?;
            let s = canonicalize_low_s(s_tag_scalar * k1_inv);
            let sig = Signature { r: round4.r[i], s };

            if !verify_ecdsa(&key.core.q, &messages[i], &sig) {
                return if global_abort {
                    Err(Ecdsa2pError::BitLeak)
                } else {
                    Err(Ecdsa2pError::Crypto("signature failed to verify against the aggregate public key"))
                };
            }
            sigs.push(sig);
        }
        Ok(sigs)
    } else {
        // P2's output is implicit: it never learns s or the final
        // signature, only that its own arithmetic contributed correctly.
        Ok(Vec::new())
    }
}

/// Default batch-signing entry point: every signature is accompanied by
/// the per-message integer-commitment proof and verified against `Q`
/// before being returned (spec §4.6 "Sign").
pub async fn sign_batch<E, L, D, R>(
    job: &Job2P<D>,
    key: &Ecdsa2pKey<E>,
    messages: &[Scalar<E>],
    rng: &mut R,
) -> Result<Vec<Signature<E>>, Ecdsa2pError<D::Error>>
where
    E: Curve,
    Point<E>: AlwaysHasAffineX<E>,
    Scalar<E>: FromHash,
    L: SecurityLevel,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    sign_batch_impl::<E, L, D, R>(job, key, messages, false, rng).await
}

/// Global-abort variant: skips the per-signature zero-knowledge proof for
/// lower latency, accepting that a cheating P2 can make the batch fail
/// verification — a failure this variant reports as
/// [`Ecdsa2pError::BitLeak`] (spec §4.6, §7 `E_ECDSA_2P_BIT_LEAK`) rather
/// than silently returning an invalid signature.
pub async fn sign_batch_with_global_abort<E, L, D, R>(
    job: &Job2P<D>,
    key: &Ecdsa2pKey<E>,
    messages: &[Scalar<E>],
    rng: &mut R,
) -> Result<Vec<Signature<E>>, Ecdsa2pError<D::Error>>
where
    E: Curve,
    Point<E>: AlwaysHasAffineX<E>,
    Scalar<E>: FromHash,
    L: SecurityLevel,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    sign_batch_impl::<E, L, D, R>(job, key, messages, true, rng).await
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
    fn batch_sign_produces_valid_signatures() {
        futures::executor::block_on(async {
            let mut rng1 = ChaCha20Rng::seed_from_u64(20);
            let mut rng2 = ChaCha20Rng::seed_from_u64(21);
            let (job1, job2) = local_network_2p();

            let (k1, k2) = futures::join!(
                crate::dkg::dkg::<E, DevLevel, _, _>(&job1, &mut rng1),
                crate::dkg::dkg::<E, DevLevel, _, _>(&job2, &mut rng2),
            );
            let (k1, k2) = (k1.unwrap(), k2.unwrap());
            let q = k1.public_key();

            let messages = vec![Scalar::<E>::from(42u64), Scalar::<E>::from(7u64)];
            let (s1, s2) = futures::join!(
                sign_batch::<E, DevLevel, _, _>(&job1, &k1, &messages, &mut rng1),
                sign_batch::<E, DevLevel, _, _>(&job2, &k2, &messages, &mut rng2),
            );
            let sigs = s1.unwrap();
            assert!(s2.unwrap().is_empty());
            assert_eq!(sigs.len(), 2);
            for (sig, m) in sigs.iter().zip(messages.iter()) {
                assert!(verify_ecdsa(&q, m, sig));
            }
        });
    }
}
