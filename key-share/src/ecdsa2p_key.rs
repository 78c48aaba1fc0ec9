//! The 2-party ECDSA key share (spec §3 `ecdsa2p_key`).
//!
//! Mirrors the teacher's `IncompleteKeyShare`/`KeyShare` split
//! (`examples/felicityin-cggmp21/src/key_share.rs`): [`IncompleteEcdsa2pKey`]
//! is the bare `x_i·G + x_2·G == Q` relation produced the moment both
//! parties agree on `Q`, [`Ecdsa2pKey`] additionally carries the Paillier
//! material signing needs. Unlike the teacher's n-party aux info (a
//! separate refresh round), this spec's 2P DKG (§4.6) already produces the
//! Paillier keypair in round 1 — refresh only rotates it — so both types are
//! populated by `cb-mpc-ecdsa2p::dkg`, and `IncompleteEcdsa2pKey` mainly
//! exists as the HD module's "root before the Paillier dance" shape (§4.10).

use generic_ec::{Curve, Point, SecretScalar};
use paillier_zk::unknown_order::BigNumber;
use thiserror::Error;

use cb_mpc_primitives::paillier::{Ciphertext, PaillierPublicKey, PaillierSecretKey};

#[derive(Clone, Copy, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub enum Role {
    P1,
    P2,
}

impl Role {
    pub fn other(self) -> Self {
        match self {
            Role::P1 => Role::P2,
            Role::P2 => Role::P1,
        }
    }

    pub fn is_p1(self) -> bool {
        matches!(self, Role::P1)
    }
}

/// Core relation produced by DKG before any Paillier material is attached:
/// `x_1·G + x_2·G == Q`.
#[derive(Clone)]
pub struct IncompleteEcdsa2pKey<E: Curve> {
    pub role: Role,
    pub q: Point<E>,
    pub x: SecretScalar<E>,
    /// The peer's public share, `x_peer·G`, kept so `validate` doesn't need
    /// a second round-trip to recompute `Q - x_i·G`.
    pub peer_public_share: Point<E>,
}

impl<E: Curve> IncompleteEcdsa2pKey<E> {
    pub fn validate(&self) -> Result<(), InvalidKeyShare> {
        let my_public_share = Point::<E>::generator() * &self.x;
        let reconstructed = match self.role {
            Role::P1 => my_public_share + self.peer_public_share,
            Role::P2 => self.peer_public_share + my_public_share,
        };
        if reconstructed != self.q {
            return Err(ErrorReason::SharesDontMatchPublicKey.into());
        }
        Ok(())
    }
}

/// Complete 2P ECDSA key share: the core relation plus the Paillier
/// material signing needs (spec §3).
#[derive(Clone)]
pub struct Ecdsa2pKey<E: Curve> {
    pub core: IncompleteEcdsa2pKey<E>,
    /// Public Paillier key, shared by both parties.
    pub paillier_public: PaillierPublicKey,
    /// P1's Paillier private key; `None` for P2.
    pub paillier_secret: Option<PaillierSecretKey>,
    /// `c_key = Enc(x_1)`, held by both parties.
    pub c_key: Ciphertext,
    /// The randomizer `c_key` was encrypted with, held only by P1. Kept
    /// around (rather than re-derived from the secret key, which would
    /// need an N-th-root extraction) so refresh's `two_paillier_equal`
    /// proof has the witness it needs without redoing the encryption.
    pub r_key: Option<BigNumber>,
}

impl<E: Curve> Drop for Ecdsa2pKey<E> {
    fn drop(&mut self) {
        // SecretScalar already zeroizes on drop via generic-ec; the
        // Paillier secret key's own Drop impl documents why BigNumber
        // scrubbing is a structural no-op.
    }
}

impl<E: Curve> Ecdsa2pKey<E> {
    pub fn role(&self) -> Role {
        self.core.role
    }

    pub fn public_key(&self) -> Point<E> {
        self.core.q
    }

    pub fn validate(&self) -> Result<(), InvalidKeyShare> {
        self.core.validate()?;
        if self.core.role.is_p1() {
            let sk = self
                .paillier_secret
                .as_ref()
                .ok_or(ErrorReason::MissingPaillierSecret)?;
            let decrypted = sk.decrypt(&self.c_key).map_err(|_| ErrorReason::CiphertextMismatch)?;
            let expected = scalar_to_bignumber(&self.core.x);
            if decrypted != expected {
                return Err(ErrorReason::CiphertextMismatch.into());
            }
        }
        Ok(())
    }
}

/// Converts a secret scalar to its canonical non-negative big-integer
/// representation, the shape every Paillier plaintext in this workspace
/// uses (spec §4.6's `c_key = Enc(x_1)`).
pub fn scalar_to_bignumber<E: Curve>(x: &SecretScalar<E>) -> BigNumber {
    BigNumber::from_slice(x.as_ref().to_be_bytes().as_bytes())
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct InvalidKeyShare(#[from] ErrorReason);

#[derive(Debug, Error)]
enum ErrorReason {
    #[error("public shares don't sum to the claimed aggregate key: x_1 G + x_2 G != Q")]
    SharesDontMatchPublicKey,
    #[error("P1 share is missing its Paillier secret key")]
    MissingPaillierSecret,
    #[error("Paillier decryption of c_key doesn't match the held share x_1")]
    CiphertextMismatch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use generic_ec::curves::Secp256k1;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    type E = Secp256k1;

    #[test]
    fn validate_accepts_consistent_share() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let x1 = SecretScalar::<E>::random(&mut rng);
        let x2 = SecretScalar::<E>::random(&mut rng);
        let q = Point::generator() * (x1.as_ref() + x2.as_ref());

        let share1 = IncompleteEcdsa2pKey {
            role: Role::P1,
            q,
            x: x1,
            peer_public_share: Point::generator() * x2.as_ref(),
        };
        assert!(share1.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inconsistent_share() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let x1 = SecretScalar::<E>::random(&mut rng);
        let bogus_q = Point::generator() * generic_ec::Scalar::<E>::random(&mut rng);
        let share1 = IncompleteEcdsa2pKey {
            role: Role::P1,
            q: bogus_q,
            x: x1,
            peer_public_share: Point::generator() * generic_ec::Scalar::<E>::random(&mut rng),
        };
        assert!(share1.validate().is_err());
    }
}
