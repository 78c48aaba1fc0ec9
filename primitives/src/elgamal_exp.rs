//! ElGamal commitment in the exponent (spec §3 `elg_com_t`, glossary).
//!
//! `(L, R) = (r·G, x·E + r·G')` commits to scalar `x` under a shared
//! commitment key `E` (and, for the two-generator variant, a second base
//! `G'`; this module fixes `G' = G`, matching the n-party ECDSA protocol's
//! usage where the single base point suffices — §4.7 never introduces a
//! distinct `G'`). Additively homomorphic and rerandomizable, which is
//! exactly what the n-party sign protocol's rounds 4–8 lean on.

use generic_ec::{Curve, Point, Scalar};
use rand_core::{CryptoRng, RngCore};

/// An ElGamal-in-the-exponent commitment `(L, R)` under key `E = s·G`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(bound = "")]
pub struct ElGamalCommitment<E: Curve> {
    pub l: Point<E>,
    pub r: Point<E>,
}

impl<E: Curve> ElGamalCommitment<E> {
    /// Commits to `x` under key `key_point = s·G`, with explicit
    /// randomizer `r`: `L = r·G`, `R = x·key_point + r·G`.
    pub fn commit(key_point: Point<E>, x: Scalar<E>, r: Scalar<E>) -> Self {
        Self {
            l: Point::generator() * r,
            r: key_point * x + Point::generator() * r,
        }
    }

    pub fn commit_fresh<R: RngCore + CryptoRng>(key_point: Point<E>, x: Scalar<E>, rng: &mut R) -> (Self, Scalar<E>) {
        let r = Scalar::random(rng);
        (Self::commit(key_point, x, r), r)
    }

    /// `(L1,R1) + (L2,R2) = (L1+L2, R1+R2)`, a commitment to `x1+x2` under
    /// randomizer `r1+r2` — the additive homomorphism spec §4.7 relies on
    /// when combining per-party contributions.
    pub fn add(&self, other: &Self) -> Self {
        Self {
            l: self.l + other.l,
            r: self.r + other.r,
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self {
            l: self.l - other.l,
            r: self.r - other.r,
        }
    }

    pub fn scalar_mul(&self, k: Scalar<E>) -> Self {
        Self {
            l: self.l * k,
            r: self.r * k,
        }
    }

    /// Rerandomizes with a fresh `delta`: `(L + delta·G, R + delta·G)`,
    /// keeping the committed value unchanged while blinding `r`.
    pub fn rerandomize<R: RngCore + CryptoRng>(&self, key_point: Point<E>, rng: &mut R) -> (Self, Scalar<E>) {
        let delta = Scalar::random(rng);
        let blinding = Self::commit(key_point, Scalar::zero(), delta);
        (self.add(&blinding), delta)
    }

    /// "Decrypts" a commitment to the point `x·key_point` given the
    /// decryption share `s·L` contributed by the key's holder (spec §4.7
    /// round 8: `Σ W_i = Z.R` reveals `x·key_point` without revealing `x`
    /// or `r` individually).
    pub fn decrypt_to_point(&self, s_times_l: Point<E>) -> Point<E> {
        self.r - s_times_l
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use generic_ec::Point;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn additive_homomorphism_and_decrypt() {
        type E = generic_ec::curves::Secp256k1;
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let s = Scalar::<E>::random(&mut rng);
        let key_point = Point::generator() * s;

        let x1 = Scalar::<E>::random(&mut rng);
        let x2 = Scalar::<E>::random(&mut rng);
        let (c1, _) = ElGamalCommitment::commit_fresh(key_point, x1, &mut rng);
        let (c2, _) = ElGamalCommitment::commit_fresh(key_point, x2, &mut rng);
        let sum = c1.add(&c2);

        let decrypted = sum.decrypt_to_point(sum.l * s);
        assert_eq!(decrypted, Point::generator() * (x1 + x2));
    }
}
