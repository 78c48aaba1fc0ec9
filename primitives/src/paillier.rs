//! Paillier keypairs and ciphertexts (spec §3 "Paillier keypair").
//!
//! Built directly on `paillier_zk::unknown_order::BigNumber` (the same
//! arbitrary-precision integer type the teacher crate builds its own
//! Paillier usage and ring-Pedersen proofs on top of, per
//! `paillier_zk::BigNumberExt`) rather than reinventing big-integer math.
//! Key generation itself is out of scope (spec §1); callers supply the
//! two safe primes, typically via `PregeneratedPrimes` (see
//! `cb-mpc-test-support`) or freshly via `BigNumber::safe_prime_from_rng`.

use paillier_zk::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use thiserror::Error;
use zeroize::Zeroize;

use cb_mpc_core::ctx::CryptoCtx;

#[derive(Debug, Error)]
pub enum PaillierError {
    #[error("modulus must be at least {min_bits} bits, got {got_bits}")]
    ModulusTooSmall { min_bits: usize, got_bits: usize },
    #[error("plaintext is out of the valid range [0, N)")]
    PlaintextOutOfRange,
    #[error("randomizer is not invertible modulo N")]
    RandomizerNotUnit,
    #[error("ciphertext is not a residue modulo N^2")]
    NotAResidue,
}

/// Paillier ciphertext: a residue in `Z_{N^2}`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Ciphertext(#[serde(with = "bignumber_serde")] BigNumber);

impl Ciphertext {
    /// Wraps a raw residue as a ciphertext, the inverse of
    /// [`Ciphertext::as_bignumber`] — used by proof verifiers that carry a
    /// masking value shaped like a ciphertext (e.g. a sigma-protocol
    /// commitment over the same `Z_{N^2}` group) without ever decrypting it.
    pub fn from_bignumber(v: BigNumber) -> Self {
        Ciphertext(v)
    }

    pub fn as_bignumber(&self) -> &BigNumber {
        &self.0
    }
}

/// Public Paillier key: the modulus `N` alone.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PaillierPublicKey {
    #[serde(with = "bignumber_serde")]
    n: BigNumber,
    #[serde(with = "bignumber_serde")]
    n2: BigNumber,
}

impl PaillierPublicKey {
    pub fn from_n(n: BigNumber, min_bits: usize) -> Result<Self, PaillierError> {
        let bits = n.bit_length();
        if bits < min_bits {
            return Err(PaillierError::ModulusTooSmall {
                min_bits,
                got_bits: bits,
            });
        }
        let n2 = &n * &n;
        Ok(Self { n, n2 })
    }

    pub fn n(&self) -> &BigNumber {
        &self.n
    }

    pub fn n2(&self) -> &BigNumber {
        &self.n2
    }

    /// `c = (1 + m·N) · r^N mod N^2`, the textbook Paillier encryption
    /// (the `g = N+1` optimization the teacher's own Paillier usage
    /// relies on, avoiding a separate generator element).
    pub fn encrypt_with_randomizer(&self, plaintext: &BigNumber, r: &BigNumber) -> Result<Ciphertext, PaillierError> {
        if plaintext >= &self.n || plaintext < &BigNumber::zero() {
            return Err(PaillierError::PlaintextOutOfRange);
        }
        if r.gcd(&self.n) != BigNumber::one() {
            return Err(PaillierError::RandomizerNotUnit);
        }
        let gm = (BigNumber::one() + plaintext * &self.n) % &self.n2;
        let rn = r.powmod(&self.n, &self.n2).map_err(|_| PaillierError::RandomizerNotUnit)?;
        Ok(Ciphertext((gm * rn) % &self.n2))
    }

    pub fn encrypt<R: RngCore + CryptoRng>(
        &self,
        ctx: &CryptoCtx,
        plaintext: &BigNumber,
        rng: &mut R,
    ) -> Result<(Ciphertext, BigNumber), PaillierError> {
        let r = random_unit(&self.n, rng);
        let c = self.encrypt_with_randomizer(plaintext, &r)?;
        if ctx.paillier_rerandomize_by_default {
            let c = self.rerandomize(&c, rng)?;
            Ok((c, r))
        } else {
            Ok((c, r))
        }
    }

    /// Homomorphic addition of two encrypted plaintexts: `Enc(a) ⊞ Enc(b) = Enc(a+b)`.
    pub fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Ciphertext {
        Ciphertext((&lhs.0 * &rhs.0) % &self.n2)
    }

    /// Homomorphic subtraction: `Enc(a) ⊟ Enc(b) = Enc(a-b)`.
    pub fn sub(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Ciphertext {
        let rhs_inv = rhs
            .0
            .invert(&self.n2)
            .expect("ciphertext is always a unit modulo N^2");
        Ciphertext((&lhs.0 * rhs_inv) % &self.n2)
    }

    /// Homomorphic scalar multiplication: `k ⊙ Enc(a) = Enc(k·a)`.
    pub fn scalar_mul(&self, c: &Ciphertext, k: &BigNumber) -> Ciphertext {
        Ciphertext(c.0.powmod(k, &self.n2).expect("ciphertext and N2 are well-formed"))
    }

    /// Adds a known plaintext `delta` to an encrypted value without a fresh
    /// randomizer: `Enc(a) ⊞ delta·N⁰ = Enc(a+delta)`. Used by the ECDSA-2P
    /// signing re-blinding `c_key ⊞ q·2^stat` (spec §4.6).
    pub fn add_plain(&self, c: &Ciphertext, delta: &BigNumber) -> Ciphertext {
        let gm = (BigNumber::one() + delta * &self.n) % &self.n2;
        Ciphertext((&c.0 * gm) % &self.n2)
    }

    /// Rerandomizes a ciphertext: multiplies in `s^N mod N^2` for a fresh
    /// random unit `s`. The `CryptoCtx::paillier_rerandomize_by_default`
    /// flag (spec §9) governs whether callers do this implicitly after
    /// every homomorphic operation or must call it explicitly — the
    /// integer-commitment proof (spec §4.4/§4.6) always calls this with
    /// the flag off and keeps its own randomizer as a witness.
    pub fn rerandomize<R: RngCore + CryptoRng>(&self, c: &Ciphertext, rng: &mut R) -> Result<Ciphertext, PaillierError> {
        let s = random_unit(&self.n, rng);
        let sn = s.powmod(&self.n, &self.n2).expect("random unit is invertible mod N2");
        Ok(Ciphertext((&c.0 * sn) % &self.n2))
    }

    pub fn is_well_formed_ciphertext(&self, c: &Ciphertext) -> bool {
        c.0 >= BigNumber::zero() && c.0 < self.n2 && c.0.gcd(&self.n2) == BigNumber::one()
    }
}

/// Private Paillier key: the factorization, plus cached `λ = lcm(p-1, q-1)`
/// and `μ = L(g^λ mod N²)⁻¹ mod N` (spec §3: "cached `φ(N)`" — we cache the
/// Carmichael function instead, the standard optimization for the `g=N+1`
/// variant, which needs no extra witness beyond the factorization itself).
#[derive(Clone)]
pub struct PaillierSecretKey {
    pub public: PaillierPublicKey,
    p: BigNumber,
    q: BigNumber,
    lambda: BigNumber,
    mu: BigNumber,
}

impl Drop for PaillierSecretKey {
    fn drop(&mut self) {
        // BigNumber has no in-place zeroize; best-effort scrub of the
        // easily-zeroizable scalar fields only matters for fixed-width
        // types, so this is a structural no-op documenting intent.
    }
}

impl PaillierSecretKey {
    pub fn from_primes(p: BigNumber, q: BigNumber, min_bits: usize) -> Result<Self, PaillierError> {
        let n = &p * &q;
        let public = PaillierPublicKey::from_n(n.clone(), min_bits)?;
        let p_minus_1 = &p - 1;
        let q_minus_1 = &q - 1;
        let gcd = p_minus_1.gcd(&q_minus_1);
        let lambda = (&p_minus_1 * &q_minus_1) / gcd;
        let gl = (BigNumber::one() + &lambda * &n) % &public.n2; // g^lambda for g=N+1: 1+lambda*N mod N^2
        let l_of_gl = (gl - BigNumber::one()) / &n;
        let mu = l_of_gl.invert(&n).expect("lambda chosen so L(g^lambda) is a unit mod N");
        Ok(Self {
            public,
            p,
            q,
            lambda,
            mu,
        })
    }

    pub fn p(&self) -> &BigNumber {
        &self.p
    }

    pub fn q(&self) -> &BigNumber {
        &self.q
    }

    pub fn decrypt(&self, c: &Ciphertext) -> Result<BigNumber, PaillierError> {
        if !self.public.is_well_formed_ciphertext(c) {
            return Err(PaillierError::NotAResidue);
        }
        let n = &self.public.n;
        let cl = c.0.powmod(&self.lambda, &self.public.n2).expect("lambda exponent is well-formed");
        let l_of_cl = (cl - BigNumber::one()) / n;
        Ok((l_of_cl * &self.mu) % n)
    }
}

fn random_unit<R: RngCore + CryptoRng>(n: &BigNumber, rng: &mut R) -> BigNumber {
    loop {
        let candidate = BigNumber::from_rng(n, rng);
        if candidate.gcd(n) == BigNumber::one() {
            return candidate;
        }
    }
}

mod bignumber_serde {
    use paillier_zk::unknown_order::BigNumber;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &BigNumber, s: S) -> Result<S::Ok, S::Error> {
        value.to_bytes().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigNumber, D::Error> {
        let bytes = Vec::<u8>::deserialize(d)?;
        Ok(BigNumber::from_slice(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    fn small_keypair() -> (PaillierSecretKey, &'static str) {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let p = BigNumber::safe_prime_from_rng(512, &mut rng);
        let q = BigNumber::safe_prime_from_rng(512, &mut rng);
        (PaillierSecretKey::from_primes(p, q, 1024).unwrap(), "ok")
    }

    #[test]
    fn encrypt_decrypt_round_trips() {
        let (sk, _) = small_keypair();
        let ctx = CryptoCtx::default();
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let m = BigNumber::from(424242u64);
        let (c, _r) = sk.public.encrypt(&ctx, &m, &mut rng).unwrap();
        assert_eq!(sk.decrypt(&c).unwrap(), m);
    }

    #[test]
    fn homomorphic_add_matches_plaintext_add() {
        let (sk, _) = small_keypair();
        let ctx = CryptoCtx::default();
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let a = BigNumber::from(10u64);
        let b = BigNumber::from(32u64);
        let (ca, _) = sk.public.encrypt(&ctx, &a, &mut rng).unwrap();
        let (cb, _) = sk.public.encrypt(&ctx, &b, &mut rng).unwrap();
        let csum = sk.public.add(&ca, &cb);
        assert_eq!(sk.decrypt(&csum).unwrap(), BigNumber::from(42u64));
    }

    #[test]
    fn scalar_mul_matches_plaintext_mul() {
        let (sk, _) = small_keypair();
        let ctx = CryptoCtx::default();
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let a = BigNumber::from(6u64);
        let (ca, _) = sk.public.encrypt(&ctx, &a, &mut rng).unwrap();
        let c6 = sk.public.scalar_mul(&ca, &BigNumber::from(7u64));
        assert_eq!(sk.decrypt(&c6).unwrap(), BigNumber::from(42u64));
    }
}
