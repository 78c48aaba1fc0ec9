//! Lagrange interpolation at `x = 0`, plain and partial (spec §4.5
//! "Lagrange interpolation").
//!
//! Evaluation points `α_i` are derived from a party's *position* in an
//! ordered identifier list rather than its raw identity — `α_i = i + 1`,
//! `i = 0` reserved so the secret itself never collides with a share
//! point. `partial_interpolate` takes the full ordered list as a second
//! argument purely to keep `α_i` assignment stable across different
//! active subsets of that same list, so two calls over different
//! (possibly overlapping) subsets of the same full list produce
//! Lagrange-weighted terms that sum correctly when combined externally.

use generic_ec::{Curve, Scalar};

fn alpha<E: Curve>(position: usize) -> Scalar<E> {
    Scalar::<E>::from((position as u64) + 1)
}

fn position_of<T: PartialEq>(item: &T, full: &[T]) -> usize {
    full.iter().position(|x| x == item).expect("active id must be present in full id list")
}

/// Evaluates, at `x`, the unique degree-`(subset.len()-1)` polynomial
/// passing through `subset`'s `(id, share)` points, where each id's
/// evaluation point is derived from its position in `full_ids`.
pub fn partial_interpolate<E: Curve, T: PartialEq>(x: Scalar<E>, subset: &[(T, Scalar<E>)], full_ids: &[T]) -> Scalar<E> {
    let alphas: Vec<Scalar<E>> = subset.iter().map(|(id, _)| alpha::<E>(position_of(id, full_ids))).collect();
    let mut acc = Scalar::<E>::zero();
    for (i, (_, y_i)) in subset.iter().enumerate() {
        let alpha_i = alphas[i];
        let mut num = Scalar::<E>::from(1);
        let mut den = Scalar::<E>::from(1);
        for (j, alpha_j) in alphas.iter().enumerate() {
            if i == j {
                continue;
            }
            num = num * (x - *alpha_j);
            den = den * (alpha_i - *alpha_j);
        }
        let den_inv = den.invert().expect("distinct positions give distinct alphas, so den != 0");
        acc = acc + *y_i * num * den_inv;
    }
    acc
}

/// Full interpolation at `0`: every id in `ids` contributes, using its
/// own position for `α_i`.
pub fn interpolate_at_zero<E: Curve, T: PartialEq + Clone>(shares: &[(T, Scalar<E>)]) -> Scalar<E> {
    let ids: Vec<T> = shares.iter().map(|(id, _)| id.clone()).collect();
    partial_interpolate(Scalar::<E>::zero(), shares, &ids)
}

/// In-the-exponent variant: interpolates public points instead of
/// scalars, for DKG share verification (spec §4.5 "Reconstruction in
/// the exponent").
pub fn partial_interpolate_in_exponent<E: Curve, T: PartialEq>(
    x: Scalar<E>,
    subset: &[(T, generic_ec::Point<E>)],
    full_ids: &[T],
) -> generic_ec::Point<E> {
    let alphas: Vec<Scalar<E>> = subset.iter().map(|(id, _)| alpha::<E>(position_of(id, full_ids))).collect();
    let mut acc = generic_ec::Point::<E>::zero();
    for (i, (_, p_i)) in subset.iter().enumerate() {
        let alpha_i = alphas[i];
        let mut num = Scalar::<E>::from(1);
        let mut den = Scalar::<E>::from(1);
        for (j, alpha_j) in alphas.iter().enumerate() {
            if i == j {
                continue;
            }
            num = num * (x - *alpha_j);
            den = den * (alpha_i - *alpha_j);
        }
        let coeff = num * den.invert().expect("distinct positions give distinct alphas, so den != 0");
        acc = acc + *p_i * coeff;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use generic_ec::curves::Secp256k1;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    type E = Secp256k1;

    fn sample_poly(coeffs: &[Scalar<E>], x: Scalar<E>) -> Scalar<E> {
        let mut acc = Scalar::<E>::zero();
        let mut pow = Scalar::<E>::from(1);
        for c in coeffs {
            acc = acc + *c * pow;
            pow = pow * x;
        }
        acc
    }

    #[test]
    fn full_interpolation_recovers_constant_term() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let coeffs: Vec<Scalar<E>> = (0..3).map(|_| Scalar::<E>::random(&mut rng)).collect();
        let ids: Vec<u32> = vec![10, 20, 30];
        let shares: Vec<(u32, Scalar<E>)> = ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, sample_poly(&coeffs, alpha::<E>(i))))
            .collect();
        let recovered = interpolate_at_zero(&shares);
        assert_eq!(recovered, coeffs[0]);
    }

    #[test]
    fn partial_interpolation_over_subset_matches_full() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let coeffs: Vec<Scalar<E>> = (0..2).map(|_| Scalar::<E>::random(&mut rng)).collect();
        let full_ids: Vec<u32> = vec![1, 2, 3, 4];
        let all_shares: Vec<(u32, Scalar<E>)> = full_ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, sample_poly(&coeffs, alpha::<E>(i))))
            .collect();
        // Any 2 of the 4 points determine a degree-1 polynomial uniquely.
        let subset = vec![all_shares[1].clone(), all_shares[3].clone()];
        let recovered = partial_interpolate(Scalar::<E>::zero(), &subset, &full_ids);
        assert_eq!(recovered, coeffs[0]);
    }
}
