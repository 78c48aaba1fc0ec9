//! Hardened and non-hardened child-key derivation (spec §4.10
//! "Hard-Derive-2P" / "Non-Hard-Derive"). Hardened derivation consumes
//! the VRF output `Z` from [`crate::vrf::vrf_compute_2p`] and is
//! asymmetric — only one party's share actually shifts, because the
//! ECDSA variant's Paillier ciphertext only survives the shift for the
//! share it wasn't encrypting. Non-hardened derivation is a pure
//! function of `(Q_derived, chain_code, path)` with no interaction at
//! all, and both shares shift identically.

use cb_mpc_key_share::ecdsa2p_key::{Ecdsa2pKey, Role};
use cb_mpc_key_share::eckey_mp::EckeyMp;
use generic_ec::{Curve, Point, Scalar, SecretScalar};

use crate::kdf::{expand, point_bytes, scalar_byte_len, scalar_from_be_bytes};

/// `H(Z)` split into a wide-reduced offset `δ` and a 32-byte chain code
/// (spec §4.10: `|q| + 16 bytes` of hash output feed the offset, the
/// next 32 the chain code).
pub struct HardDeriveOutput<E: Curve> {
    pub delta: Scalar<E>,
    pub chain_code: [u8; 32],
    pub q_derived: Point<E>,
}

pub fn hard_derive_output<E: Curve>(q: Point<E>, z: Point<E>) -> HardDeriveOutput<E> {
    let material = expand(&point_bytes(&z), b"cb-mpc/hd/hard-derive", scalar_byte_len::<E>() + 16 + 32);
    let (delta_bytes, rest) = material.split_at(scalar_byte_len::<E>() + 16);
    let delta = scalar_from_be_bytes::<E>(delta_bytes);
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(rest);
    HardDeriveOutput {
        delta,
        chain_code,
        q_derived: q + Point::<E>::generator() * delta,
    }
}

/// Applies a hardened-derivation offset to an ECDSA-2P share: only P2's
/// share shifts (P1's Paillier ciphertext `c_key = Enc(x_1)` is
/// preserved unmodified, since `x_1` itself doesn't change).
pub fn apply_hard_derive_ecdsa<E: Curve>(key: Ecdsa2pKey<E>, out: &HardDeriveOutput<E>) -> Ecdsa2pKey<E> {
    let mut key = key;
    key.core.q = out.q_derived;
    match key.core.role {
        Role::P1 => {
            key.core.peer_public_share = key.core.peer_public_share + Point::<E>::generator() * out.delta;
        }
        Role::P2 => {
            let mut shifted = key.core.x.as_ref() + &out.delta;
            key.core.x = SecretScalar::new(&mut shifted);
        }
    }
    key
}

/// Applies a hardened-derivation offset to an EdDSA-2P share: the
/// mirror image of the ECDSA rule — P1's share shifts, P2's doesn't
/// (spec §4.10).
pub fn apply_hard_derive_eddsa<E: Curve>(key: EckeyMp<E>, out: &HardDeriveOutput<E>) -> EckeyMp<E> {
    let mut key = key;
    key.q = out.q_derived;
    key.public_shares[0] = key.public_shares[0] + Point::<E>::generator() * out.delta;
    if key.party_index == 0 {
        let mut shifted = key.x.as_ref() + &out.delta;
        key.x = SecretScalar::new(&mut shifted);
    }
    key
}

/// Non-hardened derivation (spec §4.10): a public function of
/// `(q_derived, chain_code, path)`, computable by anyone, that both
/// parties apply unilaterally and symmetrically.
pub fn non_hard_derive_offset<E: Curve>(q_derived: Point<E>, chain_code: &[u8; 32], path: &[u8]) -> (Scalar<E>, Point<E>) {
    let mut info = point_bytes(&q_derived);
    info.extend_from_slice(path);
    let material = expand(chain_code, &info, scalar_byte_len::<E>() + 16);
    let delta = scalar_from_be_bytes::<E>(&material);
    (delta, q_derived + Point::<E>::generator() * delta)
}

pub fn apply_non_hard_derive_ecdsa<E: Curve>(key: Ecdsa2pKey<E>, delta: Scalar<E>, q_sub: Point<E>) -> Ecdsa2pKey<E> {
    let mut key = key;
    let mut shifted = key.core.x.as_ref() + &delta;
    key.core.x = SecretScalar::new(&mut shifted);
    key.core.q = q_sub;
    key.core.peer_public_share = key.core.peer_public_share + Point::<E>::generator() * delta;
    key
}

pub fn apply_non_hard_derive_eddsa<E: Curve>(key: EckeyMp<E>, delta: Scalar<E>, q_sub: Point<E>) -> EckeyMp<E> {
    let mut key = key;
    let mut shifted = key.x.as_ref() + &delta;
    key.x = SecretScalar::new(&mut shifted);
    key.q = q_sub;
    for share in key.public_shares.iter_mut() {
        *share = *share + Point::<E>::generator() * delta;
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_mpc_core::security_level::{DevLevel, SecurityLevel};
    use cb_mpc_key_share::ecdsa2p_key::{scalar_to_bignumber, IncompleteEcdsa2pKey};
    use cb_mpc_primitives::paillier::PaillierSecretKey;
    use cb_mpc_test_support::PregeneratedPrimes;
    use generic_ec::curves::{Ed25519, Secp256k1};
    use generic_ec::SecretScalar;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn hard_derive_ecdsa_preserves_sum_and_shifts_only_p2() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let x1 = SecretScalar::<Secp256k1>::random(&mut rng);
        let x2 = SecretScalar::<Secp256k1>::random(&mut rng);
        let q = Point::generator() * (x1.as_ref() + x2.as_ref());
        let z = Point::generator() * generic_ec::Scalar::<Secp256k1>::random(&mut rng);
        let out = hard_derive_output(q, z);

        let (p, qp) = PregeneratedPrimes::<DevLevel>::generate(&mut rng).split();
        let sk = PaillierSecretKey::from_primes(p, qp, DevLevel::PAILLIER_MODULUS_BITS).unwrap();
        let r_key = paillier_zk::unknown_order::BigNumber::from(7u64);
        let c_key = sk
            .public
            .encrypt_with_randomizer(&scalar_to_bignumber(&x1), &r_key)
            .unwrap();

        let key1 = Ecdsa2pKey {
            core: IncompleteEcdsa2pKey {
                role: Role::P1,
                q,
                x: x1.clone(),
                peer_public_share: Point::generator() * x2.as_ref(),
            },
            paillier_public: sk.public.clone(),
            paillier_secret: Some(sk),
            c_key: c_key.clone(),
            r_key: Some(r_key),
        };
        let key2 = Ecdsa2pKey {
            core: IncompleteEcdsa2pKey {
                role: Role::P2,
                q,
                x: x2.clone(),
                peer_public_share: Point::generator() * x1.as_ref(),
            },
            paillier_public: key1.paillier_public.clone(),
            paillier_secret: None,
            c_key,
            r_key: None,
        };

        let derived1 = apply_hard_derive_ecdsa(key1, &out);
        let derived2 = apply_hard_derive_ecdsa(key2, &out);

        assert_eq!(derived1.core.x.as_ref(), x1.as_ref());
        assert_ne!(derived2.core.x.as_ref(), x2.as_ref());

        let sum = Point::generator() * (derived1.core.x.as_ref() + derived2.core.x.as_ref());
        assert_eq!(sum, out.q_derived);
    }

    #[test]
    fn non_hard_derive_is_deterministic_and_path_sensitive() {
        let chain_code = [7u8; 32];
        let q = Point::generator() * generic_ec::Scalar::<Ed25519>::from(5u64);
        let (d1, q1) = non_hard_derive_offset::<Ed25519>(q, &chain_code, b"0");
        let (d2, q2) = non_hard_derive_offset::<Ed25519>(q, &chain_code, b"0");
        let (d3, q3) = non_hard_derive_offset::<Ed25519>(q, &chain_code, b"1");
        assert_eq!(d1, d2);
        assert_eq!(q1, q2);
        assert_ne!(d1, d3);
        assert_ne!(q1, q3);
    }
}
