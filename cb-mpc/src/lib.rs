//! Top-level facade (spec §6 "External interfaces", §7 "Error handling
//! design"): one `dkg`/`refresh`/`sign`/`sign_batch` surface per
//! protocol, each returning [`error::CryptoError`] instead of the
//! underlying crate's own error enum. Every module here is a thin
//! wrapper — the protocols themselves live in `cb-mpc-ecdsa2p`,
//! `cb-mpc-ecdsa-mp`, `cb-mpc-eddsa`, and `cb-mpc-hd`; this crate adds no
//! cryptography of its own.

pub mod ecdsa2p;
pub mod ecdsa_mp;
pub mod eddsa2p;
pub mod eddsa_mp;
pub mod error;
pub mod hd;

pub use error::CryptoError;

#[cfg(test)]
mod tests {
    use cb_mpc_core::security_level::DevLevel;
    use cb_mpc_eddsa::challenge::Ed25519Variant;
    use cb_mpc_test_support::local_network_2p;
    use generic_ec::curves::{Ed25519, Secp256k1};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn ecdsa_2p_dkg_refresh_sign_round_trip_through_the_facade() {
        futures::executor::block_on(async {
            let (job1, job2) = local_network_2p();
            let mut rng1 = ChaCha20Rng::seed_from_u64(101);
            let mut rng2 = ChaCha20Rng::seed_from_u64(102);

            let (k1, k2) = futures::join!(
                crate::ecdsa2p::dkg::<Secp256k1, DevLevel, _, _>(&job1, &mut rng1),
                crate::ecdsa2p::dkg::<Secp256k1, DevLevel, _, _>(&job2, &mut rng2)
            );
            let (k1, k2) = (k1.unwrap(), k2.unwrap());
            assert_eq!(k1.core.q, k2.core.q);

            let (k1, k2) = futures::join!(
                crate::ecdsa2p::refresh::<Secp256k1, DevLevel, _, _>(&job1, k1, &mut rng1),
                crate::ecdsa2p::refresh::<Secp256k1, DevLevel, _, _>(&job2, k2, &mut rng2)
            );
            let (k1, k2) = (k1.unwrap(), k2.unwrap());
            assert_eq!(k1.core.q, k2.core.q);

            use generic_ec::Scalar;
            let messages = vec![Scalar::<Secp256k1>::from(42u64)];
            let (s1, s2) = futures::join!(
                crate::ecdsa2p::sign_batch::<Secp256k1, DevLevel, _, _>(&job1, &k1, &messages, &mut rng1),
                crate::ecdsa2p::sign_batch::<Secp256k1, DevLevel, _, _>(&job2, &k2, &messages, &mut rng2)
            );
            let (s1, s2) = (s1.unwrap(), s2.unwrap());
            assert_eq!(s1, s2);
            assert!(!s1[0].is_empty());
        });
    }

    #[test]
    fn eddsa_2p_dkg_refresh_sign_round_trip_through_the_facade() {
        futures::executor::block_on(async {
            let (job1, job2) = local_network_2p();
            let mut rng1 = ChaCha20Rng::seed_from_u64(103);
            let mut rng2 = ChaCha20Rng::seed_from_u64(104);

            let (k1, k2) = futures::join!(
                crate::eddsa2p::dkg::<Ed25519, _, _>(&job1, &mut rng1),
                crate::eddsa2p::dkg::<Ed25519, _, _>(&job2, &mut rng2)
            );
            let (k1, k2) = (k1.unwrap(), k2.unwrap());
            assert_eq!(k1.q, k2.q);

            let (k1, k2) = futures::join!(
                crate::eddsa2p::refresh::<Ed25519, _, _>(&job1, k1, &mut rng1),
                crate::eddsa2p::refresh::<Ed25519, _, _>(&job2, k2, &mut rng2)
            );
            let (k1, k2) = (k1.unwrap(), k2.unwrap());
            assert_eq!(k1.q, k2.q);

            let (s1, s2) = futures::join!(
                crate::eddsa2p::sign::<Ed25519, Ed25519Variant, _, _>(&job1, &k1, b"hello", &mut rng1),
                crate::eddsa2p::sign::<Ed25519, Ed25519Variant, _, _>(&job2, &k2, b"hello", &mut rng2)
            );
            let (s1, _s2) = (s1.unwrap(), s2.unwrap());
            assert_eq!(s1.len(), 64);
        });
    }

    #[test]
    fn hd_dkg_and_hard_derive_round_trip_through_the_facade() {
        futures::executor::block_on(async {
            let (job1, job2) = local_network_2p();
            let mut rng1 = ChaCha20Rng::seed_from_u64(105);
            let mut rng2 = ChaCha20Rng::seed_from_u64(106);

            let (a, b) = futures::join!(
                crate::hd::dkg_ecdsa_2p::<Secp256k1, DevLevel, _, _>(&job1, &mut rng1),
                crate::hd::dkg_ecdsa_2p::<Secp256k1, DevLevel, _, _>(&job2, &mut rng2)
            );
            let (a, b) = (a.unwrap(), b.unwrap());

            let (c1, c2) = futures::join!(
                crate::hd::derive_hard_ecdsa_2p::<Secp256k1, _, _>(&job1, &a, b"m/44'/0'/0'", &mut rng1),
                crate::hd::derive_hard_ecdsa_2p::<Secp256k1, _, _>(&job2, &b, b"m/44'/0'/0'", &mut rng2)
            );
            let (c1, c2) = (c1.unwrap(), c2.unwrap());
            assert_eq!(c1.core.q, c2.core.q);
            assert_ne!(c1.core.q, a.x.core.q);
        });
    }
}
