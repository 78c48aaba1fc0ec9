//! n-party ECDSA/Schnorr key share (spec §3 `eckey_mp`).
//!
//! Same validation shape as the teacher's `IncompleteKeyShare::validate`
//! (`public_shares[i] == G x_i`, `sum(public_shares) == shared_public_key`),
//! generalized to an arbitrary party count and reused, unmodified, by both
//! `cb-mpc-ecdsa-mp` and `cb-mpc-eddsa`'s n-party DKG outputs — the spec
//! gives ECDSA-MP and Schnorr-MP the identical key-share shape (§3).

use generic_ec::{Curve, Point, SecretScalar};
use thiserror::Error;

/// An n-party additive ECDSA/Schnorr key share: `Σ x_i = x`, `Σ Q_i = Q`.
#[derive(Clone)]
pub struct EckeyMp<E: Curve> {
    pub party_index: u16,
    pub q: Point<E>,
    pub x: SecretScalar<E>,
    /// `public_shares[i] == Q_i`, every party's public share, in party-index
    /// order (so each party can verify any other's share independently).
    pub public_shares: Vec<Point<E>>,
}

impl<E: Curve> EckeyMp<E> {
    pub fn n_parties(&self) -> u16 {
        self.public_shares.len() as u16
    }

    pub fn validate(&self) -> Result<(), InvalidKeyShare> {
        let n = self.public_shares.len();
        if self.party_index as usize >= n {
            return Err(ErrorReason::PartyIndexOutOfBounds.into());
        }
        let my_public_share = self.public_shares[self.party_index as usize];
        if my_public_share != Point::<E>::generator() * &self.x {
            return Err(ErrorReason::SecretShareDoesntMatchPublicShare.into());
        }
        let summed = self.public_shares.iter().fold(Point::<E>::zero(), |acc, p| acc + p);
        if summed != self.q {
            return Err(ErrorReason::SharesDontMatchPublicKey.into());
        }
        Ok(())
    }

    /// Verifies one peer's public share in isolation, without requiring the
    /// full vector to already sum correctly — used while a DKG round is
    /// still collecting shares from the rest of the group.
    pub fn verify_peer_share(&self, peer_index: u16, peer_public_share: Point<E>) -> Result<(), InvalidKeyShare> {
        if self.public_shares.get(peer_index as usize) != Some(&peer_public_share) {
            return Err(ErrorReason::SecretShareDoesntMatchPublicShare.into());
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct InvalidKeyShare(#[from] ErrorReason);

#[derive(Debug, Error)]
enum ErrorReason {
    #[error("party index out of bounds: i >= n")]
    PartyIndexOutOfBounds,
    #[error("party secret share doesn't match its public share: public_shares[i] != G x_i")]
    SecretShareDoesntMatchPublicShare,
    #[error("list of public shares doesn't sum to the claimed aggregate key")]
    SharesDontMatchPublicKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use generic_ec::{Scalar, curves::Secp256k1};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    type E = Secp256k1;

    #[test]
    fn validate_accepts_consistent_share_set() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let xs: Vec<SecretScalar<E>> = (0..4).map(|_| SecretScalar::<E>::random(&mut rng)).collect();
        let public_shares: Vec<Point<E>> = xs.iter().map(|x| Point::generator() * x.as_ref()).collect();
        let q = public_shares.iter().fold(Point::<E>::zero(), |acc, p| acc + p);

        for (i, x) in xs.into_iter().enumerate() {
            let share = EckeyMp {
                party_index: i as u16,
                q,
                x,
                public_shares: public_shares.clone(),
            };
            assert!(share.validate().is_ok());
        }
    }

    #[test]
    fn validate_rejects_mismatched_public_key() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let x0 = SecretScalar::<E>::random(&mut rng);
        let public_shares = vec![Point::generator() * x0.as_ref(), Point::generator() * Scalar::<E>::random(&mut rng)];
        let bogus_q = Point::generator() * Scalar::<E>::random(&mut rng);
        let share = EckeyMp {
            party_index: 0,
            q: bogus_q,
            x: x0,
            public_shares,
        };
        assert!(share.validate().is_err());
    }
}
