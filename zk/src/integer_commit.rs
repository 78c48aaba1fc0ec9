//! ECDSA-2P signing's integer-commitment proof (spec §4.4, the unnamed
//! proof described right after the Paillier family): given
//! `(paillier, c_key, c, Q_2, R_2, m, r)`, proves knowledge of
//! `(k_2⁻¹, x_2, ρ, r_c)` with:
//! - `c` the homomorphic combination computed in spec §4.6's sign round 4
//!   (`c = (c_key_blinded)^{k_2⁻¹·r} · Enc(k_2⁻¹·m + (k_2⁻¹x_2)·r + ρ·q; r_c)`,
//!   every exponent/plaintext term built from the *canonical* (unreduced)
//!   `BigNumber` representative of the scalar it comes from, so the
//!   Paillier-side equation below is exactly linear in the witnesses),
//! - `R_2 = k_2·G, Q_2 = x_2·G`.
//!
//! Structured the same way as [`crate::paillier::prove_paillier_pedersen_equal`],
//! generalized to three jointly-committed values and a multi-base Paillier
//! equation: unknown-order Pedersen commitments witness `k_2⁻¹`,
//! `k_2⁻¹·x_2`, and `ρ`; a Schnorr-style response links `k_2⁻¹`/`x_2` to
//! `R_2`/`Q_2`; the same three exponent responses reopen the Pedersen
//! commitments *and* double as the exponents of the Paillier equation,
//! which is what binds the two domains together.

use cb_mpc_core::random_oracle::Transcript;
use cb_mpc_primitives::paillier::{Ciphertext, PaillierPublicKey};
use cb_mpc_primitives::pedersen::{Commitment as PedersenCommitment, PedersenParams};
use digest::Digest;
use generic_ec::{hash_to_curve::FromHash, Curve, Point, Scalar, SecretScalar};
use paillier_zk::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use thiserror::Error;

use crate::paillier::PaillierProofError;

#[derive(Debug, Error)]
pub enum SignIntegerCommitError {
    #[error(transparent)]
    Paillier(#[from] PaillierProofError),
    #[error("curve-side equation does not verify")]
    CurveInvalid,
    #[error("pedersen commitment opening does not verify")]
    PedersenInvalid,
    #[error("paillier ciphertext equation does not verify")]
    PaillierInvalid,
}

fn scalar_to_bignumber<E: Curve>(x: &Scalar<E>) -> BigNumber {
    BigNumber::from_slice(x.to_be_bytes().as_bytes())
}

/// As `ecdsa2p::sign::curve_order`/`ecdsa_mp::sign::curve_order`: the
/// curve order as a `BigNumber`, via `-1`'s canonical representative.
fn curve_order<E: Curve>() -> BigNumber {
    let neg_one = -Scalar::<E>::from(1);
    BigNumber::from_slice(neg_one.to_be_bytes().as_bytes()) + BigNumber::one()
}

/// The prover's full witness (spec §4.6 round 4, held only by P2).
pub struct Witness<E: Curve> {
    pub k2_inv: Scalar<E>,
    pub x2: SecretScalar<E>,
    pub rho: BigNumber,
    pub r_c: BigNumber,
}

pub struct Statement<'a, E: Curve> {
    pub pk: &'a PaillierPublicKey,
    pub pedersen: &'a PedersenParams,
    pub c_key_blinded: &'a Ciphertext,
    pub c: &'a Ciphertext,
    pub q2: &'a Point<E>,
    pub r2: &'a Point<E>,
    pub r: &'a Scalar<E>,
    pub m: &'a Scalar<E>,
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(bound(
    serialize = "Point<E>: serde::Serialize, Scalar<E>: serde::Serialize",
    deserialize = "Point<E>: serde::Deserialize<'de>, Scalar<E>: serde::Deserialize<'de>"
))]
pub struct Proof<E: Curve> {
    com_k2_inv: PedersenCommitment,
    com_k2_inv_x2: PedersenCommitment,
    com_rho: PedersenCommitment,
    t_k2_inv: PedersenCommitment,
    t_k2_inv_x2: PedersenCommitment,
    t_rho: PedersenCommitment,
    t_r2: Point<E>,
    t_q2: Point<E>,
    #[serde(with = "cb_mpc_primitives::serde_support")]
    t_paillier: BigNumber,
    #[serde(with = "cb_mpc_primitives::serde_support")]
    z_k2_inv: BigNumber,
    #[serde(with = "cb_mpc_primitives::serde_support")]
    z_k2_inv_x2: BigNumber,
    #[serde(with = "cb_mpc_primitives::serde_support")]
    z_rho: BigNumber,
    #[serde(with = "cb_mpc_primitives::serde_support")]
    z_r_k2_inv: BigNumber,
    #[serde(with = "cb_mpc_primitives::serde_support")]
    z_r_k2_inv_x2: BigNumber,
    #[serde(with = "cb_mpc_primitives::serde_support")]
    z_r_rho: BigNumber,
    #[serde(with = "cb_mpc_primitives::serde_support")]
    z_rc: BigNumber,
    z_k2: Scalar<E>,
    z_x2: Scalar<E>,
}

/// The three public Paillier bases the ciphertext equation is linear in:
/// `c = ab^{k2_inv} · g_r^{k2_inv_x2} · g_q^{rho} · r_c^N mod N^2`, with
/// `ab = c_key_blinded^r · g^m`, `g_r = g^r`, `g_q = g^q` and `g = N+1`.
struct PaillierBases {
    ab: Ciphertext,
    g_r: Ciphertext,
    g_q: Ciphertext,
}

fn paillier_bases<E: Curve>(statement: &Statement<'_, E>) -> PaillierBases {
    let pk = statement.pk;
    let one = BigNumber::one();
    let m_bn = scalar_to_bignumber(statement.m);
    let r_bn = scalar_to_bignumber(statement.r);
    let q_bn = curve_order::<E>();

    let a = pk.scalar_mul(statement.c_key_blinded, &r_bn);
    let b = pk
        .encrypt_with_randomizer(&m_bn, &one)
        .expect("message is reduced mod the curve order, well within the Paillier modulus");
    let g_r = pk
        .encrypt_with_randomizer(&r_bn, &one)
        .expect("r is reduced mod the curve order, well within the Paillier modulus");
    let g_q = pk
        .encrypt_with_randomizer(&q_bn, &one)
        .expect("the curve order is well within the Paillier modulus");
    PaillierBases {
        ab: pk.add(&a, &b),
        g_r,
        g_q,
    }
}

#[allow(clippy::too_many_arguments)]
pub fn prove<E: Curve, D: Digest + Clone, R: RngCore + CryptoRng>(
    sid: &[u8],
    aux: u64,
    statement: &Statement<'_, E>,
    witness: &Witness<E>,
    rng: &mut R,
) -> Proof<E>
where
    Scalar<E>: FromHash,
{
    let pk = statement.pk;
    let q = statement.pedersen.order.clone();
    let r_k2_inv = BigNumber::from_rng(&q, rng);
    let r_k2_inv_x2 = BigNumber::from_rng(&q, rng);
    let r_rho = BigNumber::from_rng(&q, rng);

    let bn_k2_inv = scalar_to_bignumber(&witness.k2_inv);
    let bn_k2_inv_x2 = scalar_to_bignumber(&(witness.k2_inv * witness.x2.as_ref()));
    let com_k2_inv = statement.pedersen.commit(&bn_k2_inv, &r_k2_inv);
    let com_k2_inv_x2 = statement.pedersen.commit(&bn_k2_inv_x2, &r_k2_inv_x2);
    let com_rho = statement.pedersen.commit(&witness.rho, &r_rho);

    let k_k2_inv = BigNumber::from_rng(&q, rng);
    let k_k2_inv_x2 = BigNumber::from_rng(&q, rng);
    let k_rho = BigNumber::from_rng(&q, rng);
    let s_k2_inv = BigNumber::from_rng(&q, rng);
    let s_k2_inv_x2 = BigNumber::from_rng(&q, rng);
    let s_rho = BigNumber::from_rng(&q, rng);
    let t_k2_inv = statement.pedersen.commit(&k_k2_inv, &s_k2_inv);
    let t_k2_inv_x2 = statement.pedersen.commit(&k_k2_inv_x2, &s_k2_inv_x2);
    let t_rho = statement.pedersen.commit(&k_rho, &s_rho);

    let k_rc = BigNumber::from_rng(pk.n(), rng);
    let bases = paillier_bases(statement);
    let t_paillier = pk.add(
        &pk.add(&pk.scalar_mul(&bases.ab, &k_k2_inv), &pk.scalar_mul(&bases.g_r, &k_k2_inv_x2)),
        &pk.add(
            &pk.scalar_mul(&bases.g_q, &k_rho),
            &pk.encrypt_with_randomizer(&BigNumber::zero(), &k_rc)
                .expect("k_rc is coprime to N with overwhelming probability"),
        ),
    );

    let k_k2 = Scalar::<E>::random(rng);
    let k_x2 = Scalar::<E>::random(rng);
    let t_r2 = Point::generator() * k_k2;
    let t_q2 = Point::generator() * k_x2;

    let chal = Transcript::<D>::new("cb-mpc/zk/ecdsa_sign_2pc_integer_commit")
        .absorb_sid(sid)
        .absorb_u64(aux)
        .absorb_point(statement.q2)
        .absorb_point(statement.r2)
        .absorb_point(&t_r2)
        .absorb_point(&t_q2)
        .absorb_bytes(&com_k2_inv.as_bignumber().to_bytes())
        .absorb_bytes(&com_k2_inv_x2.as_bignumber().to_bytes())
        .absorb_bytes(&com_rho.as_bignumber().to_bytes())
        .absorb_bytes(&t_k2_inv.as_bignumber().to_bytes())
        .absorb_bytes(&t_k2_inv_x2.as_bignumber().to_bytes())
        .absorb_bytes(&t_rho.as_bignumber().to_bytes())
        .absorb_bytes(&t_paillier.as_bignumber().to_bytes())
        .challenge_scalar::<E>()
        .expect("hash-to-curve tag is a fixed valid literal");
    let c_big = scalar_to_bignumber(&chal);

    Proof {
        com_k2_inv,
        com_k2_inv_x2,
        com_rho,
        t_k2_inv,
        t_k2_inv_x2,
        t_rho,
        t_r2,
        t_q2,
        t_paillier: t_paillier.as_bignumber().clone(),
        z_k2_inv: &k_k2_inv + &c_big * &bn_k2_inv,
        z_k2_inv_x2: &k_k2_inv_x2 + &c_big * &bn_k2_inv_x2,
        z_rho: &k_rho + &c_big * &witness.rho,
        z_r_k2_inv: &s_k2_inv + &c_big * &r_k2_inv,
        z_r_k2_inv_x2: &s_k2_inv_x2 + &c_big * &r_k2_inv_x2,
        z_r_rho: &s_rho + &c_big * &r_rho,
        z_rc: (&k_rc * &witness.r_c.powmod(&c_big, pk.n()).expect("r_c, c, N well-formed")) % pk.n(),
        z_k2: k_k2 + chal * (witness.k2_inv.invert().expect("k2 nonzero by construction")),
        z_x2: k_x2 + chal * witness.x2.as_ref(),
    }
}

pub fn verify<E: Curve, D: Digest + Clone>(
    sid: &[u8],
    aux: u64,
    statement: &Statement<'_, E>,
    proof: &Proof<E>,
) -> Result<(), SignIntegerCommitError>
where
    Scalar<E>: FromHash,
{
    let chal = Transcript::<D>::new("cb-mpc/zk/ecdsa_sign_2pc_integer_commit")
        .absorb_sid(sid)
        .absorb_u64(aux)
        .absorb_point(statement.q2)
        .absorb_point(statement.r2)
        .absorb_point(&proof.t_r2)
        .absorb_point(&proof.t_q2)
        .absorb_bytes(&proof.com_k2_inv.as_bignumber().to_bytes())
        .absorb_bytes(&proof.com_k2_inv_x2.as_bignumber().to_bytes())
        .absorb_bytes(&proof.com_rho.as_bignumber().to_bytes())
        .absorb_bytes(&proof.t_k2_inv.as_bignumber().to_bytes())
        .absorb_bytes(&proof.t_k2_inv_x2.as_bignumber().to_bytes())
        .absorb_bytes(&proof.t_rho.as_bignumber().to_bytes())
        .absorb_bytes(&proof.t_paillier.to_bytes())
        .challenge_scalar::<E>()
        .map_err(|_| SignIntegerCommitError::CurveInvalid)?;

    if Point::generator() * proof.z_k2 != proof.t_r2 + *statement.r2 * chal {
        return Err(SignIntegerCommitError::CurveInvalid);
    }
    if Point::generator() * proof.z_x2 != proof.t_q2 + *statement.q2 * chal {
        return Err(SignIntegerCommitError::CurveInvalid);
    }

    let c_big = scalar_to_bignumber(&chal);
    let pedersen = statement.pedersen;

    let reopen = |com: &PedersenCommitment, t: &PedersenCommitment, z: &BigNumber, z_r: &BigNumber| {
        pedersen.commit(z, z_r) == pedersen.add(t, &pedersen.scalar_mul(com, &c_big))
    };
    if !reopen(&proof.com_k2_inv, &proof.t_k2_inv, &proof.z_k2_inv, &proof.z_r_k2_inv) {
        return Err(SignIntegerCommitError::PedersenInvalid);
    }
    if !reopen(&proof.com_k2_inv_x2, &proof.t_k2_inv_x2, &proof.z_k2_inv_x2, &proof.z_r_k2_inv_x2) {
        return Err(SignIntegerCommitError::PedersenInvalid);
    }
    if !reopen(&proof.com_rho, &proof.t_rho, &proof.z_rho, &proof.z_r_rho) {
        return Err(SignIntegerCommitError::PedersenInvalid);
    }

    let pk = statement.pk;
    let bases = paillier_bases(statement);
    let lhs = pk.add(
        &pk.add(
            &pk.scalar_mul(&bases.ab, &proof.z_k2_inv),
            &pk.scalar_mul(&bases.g_r, &proof.z_k2_inv_x2),
        ),
        &pk.add(
            &pk.scalar_mul(&bases.g_q, &proof.z_rho),
            &pk.encrypt_with_randomizer(&BigNumber::zero(), &proof.z_rc)
                .map_err(|_| SignIntegerCommitError::PaillierInvalid)?,
        ),
    );
    let t_paillier = Ciphertext::from_bignumber(proof.t_paillier.clone());
    let rhs = pk.add(&t_paillier, &pk.scalar_mul(statement.c, &c_big));
    if lhs != rhs {
        return Err(SignIntegerCommitError::PaillierInvalid);
    }

    Ok(())
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
    fn full_relation_holds_for_honest_prover() {
        let mut rng = ChaCha20Rng::seed_from_u64(99);
        let p = BigNumber::safe_prime_from_rng(256, &mut rng);
        let pedersen = cb_mpc_primitives::pedersen::generate(p, BigNumber::from(4u64));

        let pk_sk = {
            let p = BigNumber::safe_prime_from_rng(512, &mut rng);
            let q = BigNumber::safe_prime_from_rng(512, &mut rng);
            cb_mpc_primitives::paillier::PaillierSecretKey::from_primes(p, q, 1024).unwrap()
        };
        let ctx = cb_mpc_core::ctx::CryptoCtx::default();
        let (c_key_blinded, _) = pk_sk.public.encrypt(&ctx, &BigNumber::from(7u64), &mut rng).unwrap();

        let k2 = Scalar::<E>::random(&mut rng);
        let k2_inv = k2.invert().unwrap();
        let x2 = SecretScalar::<E>::random(&mut rng);
        let q2 = Point::generator() * &x2;
        let r2 = Point::generator() * k2;
        let r = Scalar::<E>::random(&mut rng);
        let m = Scalar::<E>::random(&mut rng);

        let rho = BigNumber::from(3u64);
        let r_c = BigNumber::from(5u64);

        let bn_k2_inv = scalar_to_bignumber(&k2_inv);
        let bn_k2_inv_x2 = scalar_to_bignumber(&(k2_inv * x2.as_ref()));
        let m_bn = scalar_to_bignumber(&m);
        let r_bn = scalar_to_bignumber(&r);
        let plaintext = &bn_k2_inv * &m_bn + &bn_k2_inv_x2 * &r_bn + &rho * curve_order::<E>();
        let c_tag = pk_sk.public.encrypt_with_randomizer(&plaintext, &r_c).unwrap();
        let term1 = pk_sk.public.scalar_mul(&c_key_blinded, &(&bn_k2_inv * &r_bn));
        let c = pk_sk.public.add(&term1, &c_tag);

        let statement = Statement {
            pk: &pk_sk.public,
            pedersen: &pedersen,
            c_key_blinded: &c_key_blinded,
            c: &c,
            q2: &q2,
            r2: &r2,
            r: &r,
            m: &m,
        };
        let witness = Witness {
            k2_inv,
            x2,
            rho,
            r_c,
        };
        let proof = prove::<E, Sha256, _>(b"sid", 1, &statement, &witness, &mut rng);
        verify::<E, Sha256>(b"sid", 1, &statement, &proof).unwrap();
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(100);
        let p = BigNumber::safe_prime_from_rng(256, &mut rng);
        let pedersen = cb_mpc_primitives::pedersen::generate(p, BigNumber::from(4u64));

        let pk_sk = {
            let p = BigNumber::safe_prime_from_rng(512, &mut rng);
            let q = BigNumber::safe_prime_from_rng(512, &mut rng);
            cb_mpc_primitives::paillier::PaillierSecretKey::from_primes(p, q, 1024).unwrap()
        };
        let ctx = cb_mpc_core::ctx::CryptoCtx::default();
        let (c_key_blinded, _) = pk_sk.public.encrypt(&ctx, &BigNumber::from(7u64), &mut rng).unwrap();

        let k2 = Scalar::<E>::random(&mut rng);
        let k2_inv = k2.invert().unwrap();
        let x2 = SecretScalar::<E>::random(&mut rng);
        let q2 = Point::generator() * &x2;
        let r2 = Point::generator() * k2;
        let r = Scalar::<E>::random(&mut rng);
        let m = Scalar::<E>::random(&mut rng);

        let rho = BigNumber::from(3u64);
        let r_c = BigNumber::from(5u64);

        let bn_k2_inv = scalar_to_bignumber(&k2_inv);
        let bn_k2_inv_x2 = scalar_to_bignumber(&(k2_inv * x2.as_ref()));
        let m_bn = scalar_to_bignumber(&m);
        let r_bn = scalar_to_bignumber(&r);
        let plaintext = &bn_k2_inv * &m_bn + &bn_k2_inv_x2 * &r_bn + &rho * curve_order::<E>();
        let c_tag = pk_sk.public.encrypt_with_randomizer(&plaintext, &r_c).unwrap();
        let term1 = pk_sk.public.scalar_mul(&c_key_blinded, &(&bn_k2_inv * &r_bn));
        let c = pk_sk.public.add(&term1, &c_tag);
        // A malicious P2 submits an unrelated ciphertext instead.
        let (forged_c, _) = pk_sk.public.encrypt(&ctx, &BigNumber::from(999u64), &mut rng).unwrap();

        let statement = Statement {
            pk: &pk_sk.public,
            pedersen: &pedersen,
            c_key_blinded: &c_key_blinded,
            c: &c,
            q2: &q2,
            r2: &r2,
            r: &r,
            m: &m,
        };
        let witness = Witness {
            k2_inv,
            x2,
            rho,
            r_c,
        };
        let proof = prove::<E, Sha256, _>(b"sid", 1, &statement, &witness, &mut rng);

        let forged_statement = Statement { c: &forged_c, ..statement };
        assert!(matches!(
            verify::<E, Sha256>(b"sid", 1, &forged_statement, &proof),
            Err(SignIntegerCommitError::PaillierInvalid)
        ));
    }
}
