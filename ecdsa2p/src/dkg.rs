//! 2-party ECDSA key generation (spec §4.6
//! "ECDSA-2PC-Optimized-KeyGen-2P"): an EC-DKG for `Q = x_1 G + x_2 G`
//! interleaved with P1 generating a fresh Paillier keypair and encrypting
//! its own share as `c_key`, each bound with non-interactive proofs that
//! `N` is well-formed enough to sign with and that `c_key` really encrypts
//! the value behind `Q_1`.
//!
//! Three message rounds, matching `examples/original_source/src/cbmpc/
//! protocol/ecdsa_2p.cpp`'s `dkg()` exactly in shape (round 1: P1's
//! commitment to `Q_1` plus Paillier material; round 2: P2's `Q_2`; round
//! 3: P1 opens `Q_1` and proves it). Unlike the original's `paillier_gen`
//! sub-protocol (itself three *interactive* challenge-response rounds),
//! every proof here is a one-shot Fiat-Shamir NIZK, so the Paillier
//! material piggybacks on the EC-DKG's own three rounds instead of
//! needing its own round count. The original's `valid_paillier` check —
//! proving `N` is a Blum integer free of small factors, bound to a
//! ring-Pedersen commitment pair — is reproduced with `cb_mpc_zk::paillier`'s
//! re-export of the teacher crate's own `π_prm`/`π_mod`/`π_fac`
//! (`ring_pedersen_parameters`/`paillier_blum_modulus`/
//! `no_small_factor::non_interactive`): P1 generates `(s, t)` from the
//! same factorization as its Paillier modulus, proves the triple
//! well-formed with `π_prm`, and proves `N` modulus-valid and
//! small-factor-free with `π_mod`/`π_fac`; P2 verifies all three before
//! accepting the key. The hand-rolled `pdl`/`paillier_pedersen_equal`/
//! `range_pedersen` trio still carries the `c_key` binding to `Q_1`.

use cb_mpc_core::commitment::{self, CommitmentValue, Opening};
use cb_mpc_core::error::JobError;
use cb_mpc_core::job2p::Job2P;
use cb_mpc_core::security_level::SecurityLevel;
use cb_mpc_core::sid::generate_sid_fixed_2p;
use cb_mpc_core::transport::Delivery;
use cb_mpc_core::wire;
use cb_mpc_key_share::ecdsa2p_key::{Ecdsa2pKey, IncompleteEcdsa2pKey, Role};
use cb_mpc_primitives::paillier::{PaillierPublicKey, PaillierSecretKey};
use cb_mpc_primitives::pedersen::{self, Commitment as PedersenCommitment};
use cb_mpc_zk::paillier::{pi_fac, pi_mod, pi_prm, prove_paillier_pedersen_equal, prove_pdl, prove_range_pedersen};
use digest::Digest;
use generic_ec::{hash_to_curve::FromHash, Curve, Point, Scalar, SecretScalar};
use paillier_zk::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::Ecdsa2pError;
use crate::sign::pow2;

fn scalar_to_bignumber<E: Curve>(x: &Scalar<E>) -> BigNumber {
    BigNumber::from_slice(x.to_be_bytes().as_bytes())
}

/// Floor of the integer square root, by Newton's method. `π_fac` takes
/// `⌊√N⌋` as a public input bounding its small-factor search.
fn integer_sqrt(n: &BigNumber) -> BigNumber {
    if n <= &BigNumber::zero() {
        return BigNumber::zero();
    }
    let two = BigNumber::from(2u64);
    let mut x = pow2(n.bit_length() as u32 / 2 + 1);
    loop {
        let quotient = n.clone() / x.clone();
        let y = (x.clone() + quotient) / two.clone();
        if y >= x {
            return x;
        }
        x = y;
    }
}

fn sample_unit<R: RngCore + CryptoRng>(n: &BigNumber, rng: &mut R) -> BigNumber {
    loop {
        let candidate = BigNumber::from_rng(n, rng);
        if candidate.gcd(n) == BigNumber::one() {
            return candidate;
        }
    }
}

/// `π_fac`'s range parameters: `ℓ` bounds the expected bit length of a
/// safe-prime factor (half the modulus), `ε` is the proof's statistical
/// slack, `q` is the same `2^stat` cut-and-choose bound the rest of
/// `cb_mpc_zk::paillier` uses.
fn pi_fac_security<L: SecurityLevel>() -> pi_fac::SecurityParams {
    pi_fac::SecurityParams {
        l: (L::PAILLIER_MODULUS_BITS / 2) as u32,
        epsilon: L::SECURITY_BITS as u32,
        q: pow2(L::SECURITY_BITS as u32),
    }
}

/// P1's ring-Pedersen parameters, generated from the same factorization
/// as its Paillier modulus: `t = r^2 mod N`, `s = t^λ mod N` for a random
/// `λ < φ(N)`.
struct RingPedersen {
    s: BigNumber,
    t: BigNumber,
    lambda: BigNumber,
}

fn generate_ring_pedersen<R: RngCore + CryptoRng>(sk: &PaillierSecretKey, rng: &mut R) -> Result<RingPedersen, &'static str> {
    let n = sk.public.n();
    let phi_n = (sk.p() - 1) * (sk.q() - 1);
    let r = sample_unit(n, rng);
    let t = (&r * &r) % n;
    let lambda = BigNumber::from_rng(&phi_n, rng);
    let s = t.powmod(&lambda, n).map_err(|_| "ring-Pedersen parameter generation failed")?;
    Ok(RingPedersen { s, t, lambda })
}

struct P1Paillier {
    sk: PaillierSecretKey,
    r_key: BigNumber,
    c_key: cb_mpc_primitives::paillier::Ciphertext,
    rho: BigNumber,
    com_x1: PedersenCommitment,
    ring: RingPedersen,
}

#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
struct Round1 {
    commit_q1: [u8; 32],
    paillier_n: PaillierPublicKey,
    c_key: cb_mpc_primitives::paillier::Ciphertext,
    com_x1: PedersenCommitment,
    #[serde(with = "cb_mpc_primitives::serde_support")]
    ring_pedersen_s: BigNumber,
    #[serde(with = "cb_mpc_primitives::serde_support")]
    ring_pedersen_t: BigNumber,
    prm_proof: pi_prm::Proof<{ pi_prm::SECURITY }>,
}

#[derive(Serialize, Deserialize)]
#[serde(bound(
    serialize = "Point<E>: Serialize",
    deserialize = "Point<E>: Deserialize<'de>"
))]
struct Round2<E: Curve> {
    q2: Point<E>,
}

#[derive(Serialize, Deserialize)]
#[serde(bound(
    serialize = "Point<E>: Serialize, Scalar<E>: Serialize",
    deserialize = "Point<E>: Deserialize<'de>, Scalar<E>: Deserialize<'de>"
))]
struct Round3<E: Curve> {
    q1: Point<E>,
    opening: [u8; 16],
    pdl: cb_mpc_zk::paillier::PdlProof<E>,
    equal: cb_mpc_zk::paillier::PaillierPedersenEqualProof,
    range: cb_mpc_zk::paillier::RangePedersenProof,
    mod_proof: (pi_mod::Commitment, pi_mod::Proof<{ pi_prm::SECURITY }>),
    fac_proof: pi_fac::Proof,
}

/// Runs the 2-party DKG over `curve`, returning this party's complete key
/// share. `L` picks the Paillier modulus size and proof statistical
/// security (spec §9's `SecurityLevel` design note).
pub async fn dkg<E, L, D, R>(
    job: &Job2P<D>,
    rng: &mut R,
) -> Result<Ecdsa2pKey<E>, Ecdsa2pError<D::Error>>
where
    E: Curve,
    Scalar<E>: FromHash,
    L: SecurityLevel,
    D: Delivery,
    R: RngCore + CryptoRng,
{
    let sid = generate_sid_fixed_2p(job, rng).await?;
    let shared_state = Sha256::new_with_prefix(sid.as_slice());
    let role = if job.is_p1() { Role::P1 } else { Role::P2 };
    let x = SecretScalar::<E>::random(rng);
    let my_public_share = Point::<E>::generator() * &x;

    // Round 1: P1 commits to Q1 and publishes its fresh Paillier material.
    let (commitment_q1, opening_q1) = if job.is_p1() {
        let (c, o) = commitment::commit(job.my_pid(), None, Some(sid.as_slice()), &wire::encode(&my_public_share), rng);
        (Some(c), Some(o))
    } else {
        (None, None)
    };

    let p1_paillier = if job.is_p1() {
        let half_bits = L::PAILLIER_MODULUS_BITS / 2;
        let p = BigNumber::safe_prime_from_rng(half_bits, rng);
        let q = BigNumber::safe_prime_from_rng(half_bits, rng);
        let sk = PaillierSecretKey::from_primes(p, q, L::PAILLIER_MODULUS_BITS)
            .map_err(|_| Ecdsa2pError::Crypto("freshly generated Paillier modulus rejected"))?;
        let r_key = BigNumber::from_rng(sk.public.n(), rng);
        let c_key = sk
            .public
            .encrypt_with_randomizer(&scalar_to_bignumber(x.as_ref()), &r_key)
            .map_err(|_| Ecdsa2pError::Crypto("x1 out of Paillier plaintext range"))?;
        let pedersen_params = pedersen::global();
        let rho = BigNumber::from_rng(&pedersen_params.order, rng);
        let com_x1 = pedersen_params.commit(&scalar_to_bignumber(x.as_ref()), &rho);
        let ring = generate_ring_pedersen(&sk, rng)
            .map_err(|_| Ecdsa2pError::Crypto("ring-Pedersen parameter generation failed"))?;
        Some(P1Paillier {
            sk,
            r_key,
            c_key,
            rho,
            com_x1,
            ring,
        })
    } else {
        None
    };

    let round1 = if let Some(material) = p1_paillier.as_ref() {
        let prm_data = pi_prm::Data {
            N: material.sk.public.n(),
            s: &material.ring.s,
            t: &material.ring.t,
        };
        let phi_n = (material.sk.p() - 1) * (material.sk.q() - 1);
        let prm_proof = pi_prm::prove(shared_state.clone(), rng, prm_data, &phi_n, &material.ring.lambda)
            .map_err(|_| Ecdsa2pError::ProofFailed("pi_prm"))?;
        Some(Round1 {
            commit_q1: commitment_q1.as_ref().expect("p1 path").0,
            paillier_n: material.sk.public.clone(),
            c_key: material.c_key.clone(),
            com_x1: material.com_x1.clone(),
            ring_pedersen_s: material.ring.s.clone(),
            ring_pedersen_t: material.ring.t.clone(),
            prm_proof,
        })
    } else {
        None
    };
    let received = job.p1_to_p2(round1.as_ref().map(wire::encode)).await?;
    let round1_from_p1: Option<Round1> = if job.is_p2() {
        Some(wire::decode(&received.expect("p2 receives round1")).map_err(JobError::Format)?)
    } else {
        None
    };

    // Round 2: P2 -> P1, Q2.
    let round2 = if job.is_p2() {
        Some(Round2::<E> { q2: my_public_share })
    } else {
        None
    };
    let received = job.p2_to_p1(round2.as_ref().map(wire::encode)).await?;
    let q2: Option<Point<E>> = if job.is_p1() {
        let r: Round2<E> = wire::decode(&received.expect("p1 receives round2")).map_err(JobError::Format)?;
        Some(r.q2)
    } else {
        None
    };

    // Round 3: P1 -> P2, open Q1 and prove the Paillier material.
    let round3 = if job.is_p1() {
        let material = p1_paillier.as_ref().expect("p1 path");
        let sk = &material.sk;
        let r_key = &material.r_key;
        let rho = &material.rho;
        let pedersen_params = pedersen::global();
        let pdl = prove_pdl::<E, sha2::Sha256, _>(sid.as_slice(), 0, &sk.public, &x, r_key, rng)
            .map_err(|_| Ecdsa2pError::ProofFailed("pdl"))?;
        let equal = prove_paillier_pedersen_equal(
            sid.as_slice(),
            1,
            &sk.public,
            pedersen_params,
            &curve_order::<E>(),
            L::SECURITY_BITS as u32,
            &scalar_to_bignumber(x.as_ref()),
            r_key,
            rho,
            rng,
        );
        let range = prove_range_pedersen(
            sid.as_slice(),
            2,
            pedersen_params,
            &curve_order::<E>(),
            &scalar_to_bignumber(x.as_ref()),
            rho,
            rng,
        );
        let mod_proof = {
            let data = pi_mod::Data { n: sk.public.n().clone() };
            let pdata = pi_mod::PrivateData {
                p: sk.p().clone(),
                q: sk.q().clone(),
            };
            pi_mod::non_interactive::prove(shared_state.clone(), &data, &pdata, rng)
                .map_err(|_| Ecdsa2pError::ProofFailed("pi_mod"))?
        };
        let n_root = integer_sqrt(sk.public.n());
        let fac_security = pi_fac_security::<L>();
        let fac_aux = pi_fac::Aux {
            s: material.ring.s.clone(),
            t: material.ring.t.clone(),
            rsa_modulo: sk.public.n().clone(),
        };
        let fac_proof = pi_fac::prove(
            shared_state.clone(),
            &fac_aux,
            pi_fac::Data {
                n: sk.public.n(),
                n_root: &n_root,
            },
            pi_fac::PrivateData { p: sk.p(), q: sk.q() },
            &fac_security,
            rng,
        )
        .map_err(|_| Ecdsa2pError::ProofFailed("pi_fac"))?;
        Some(Round3 {
            q1: my_public_share,
            opening: opening_q1.as_ref().expect("p1 path").to_bytes(),
            pdl,
            equal,
            range,
            mod_proof,
            fac_proof,
        })
    } else {
        None
    };
    let received = job.p1_to_p2(round3.as_ref().map(wire::encode)).await?;

    let (q, paillier_public, paillier_secret, c_key, r_key) = if job.is_p1() {
        let q2 = q2.expect("p1 has q2 by round 3");
        let q = my_public_share + q2;
        let material = p1_paillier.expect("p1 path");
        (q, material.sk.public.clone(), Some(material.sk), material.c_key, Some(material.r_key))
    } else {
        let round1 = round1_from_p1.expect("p2 has round1");
        let round3: Round3<E> = wire::decode(&received.expect("p2 receives round3")).map_err(JobError::Format)?;

        let committed = wire::encode(&round3.q1);
        let opening = Opening::from_bytes(round3.opening);
        commitment::open(
            &CommitmentValue(round1.commit_q1),
            &opening,
            job.peer_pid(),
            None,
            Some(sid.as_slice()),
            &committed,
        )
        .map_err(|_| Ecdsa2pError::Crypto("Q1 commitment did not open"))?;

        let min_bits = L::PAILLIER_MODULUS_BITS;
        if round1.paillier_n.n().bit_length() < min_bits {
            return Err(Ecdsa2pError::Crypto("Paillier modulus too small"));
        }

        let prm_data = pi_prm::Data {
            N: round1.paillier_n.n(),
            s: &round1.ring_pedersen_s,
            t: &round1.ring_pedersen_t,
        };
        pi_prm::verify(shared_state.clone(), prm_data, &round1.prm_proof).map_err(|_| Ecdsa2pError::ProofFailed("pi_prm"))?;

        cb_mpc_zk::paillier::verify_pdl::<E, sha2::Sha256>(sid.as_slice(), 0, &round1.paillier_n, &round1.c_key, &round3.q1, &round3.pdl)
            .map_err(|_| Ecdsa2pError::ProofFailed("pdl"))?;
        cb_mpc_zk::paillier::verify_paillier_pedersen_equal(
            sid.as_slice(),
            1,
            &round1.paillier_n,
            pedersen::global(),
            &round1.c_key,
            &round1.com_x1,
            &round3.equal,
        )
        .map_err(|_| Ecdsa2pError::ProofFailed("paillier_pedersen_equal"))?;
        cb_mpc_zk::paillier::verify_range_pedersen(sid.as_slice(), 2, pedersen::global(), &round1.com_x1, &round3.range)
            .map_err(|_| Ecdsa2pError::ProofFailed("range_pedersen"))?;

        let mod_data = pi_mod::Data {
            n: round1.paillier_n.n().clone(),
        };
        let (ref mod_commitment, ref mod_pf) = round3.mod_proof;
        pi_mod::non_interactive::verify(shared_state.clone(), &mod_data, mod_commitment, mod_pf)
            .map_err(|_| Ecdsa2pError::ProofFailed("pi_mod"))?;

        let n_root = integer_sqrt(round1.paillier_n.n());
        let fac_security = pi_fac_security::<L>();
        pi_fac::verify(
            shared_state.clone(),
            &pi_fac::Aux {
                s: round1.ring_pedersen_s.clone(),
                t: round1.ring_pedersen_t.clone(),
                rsa_modulo: round1.paillier_n.n().clone(),
            },
            pi_fac::Data {
                n: round1.paillier_n.n(),
                n_root: &n_root,
            },
            &fac_security,
            &round3.fac_proof,
        )
        .map_err(|_| Ecdsa2pError::ProofFailed("pi_fac"))?;

        let q = round3.q1 + my_public_share;
        (q, round1.paillier_n, None, round1.c_key, None)
    };

    let key = Ecdsa2pKey {
        core: IncompleteEcdsa2pKey {
            role,
            q,
            x,
            peer_public_share: if job.is_p1() { q2.unwrap() } else { q - my_public_share },
        },
        paillier_public,
        paillier_secret,
        c_key,
        r_key,
    };
    key.validate()?;
    Ok(key)
}

fn curve_order<E: Curve>() -> BigNumber {
    // `q`, the curve's group order, as a `BigNumber` for the Paillier-side
    // proofs that bound a plaintext to `[0, q)`.
    let neg_one = -Scalar::<E>::from(1);
    BigNumber::from_slice(neg_one.to_be_bytes().as_bytes()) + BigNumber::one()
}
