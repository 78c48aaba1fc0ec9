//! Publicly-verifiable encryption (spec §4.11 "PVE"): backs up a secret
//! share to a recipient's Paillier public key so that anyone — not just
//! the recipient — can check the ciphertext decrypts to the declared
//! public point `X = x·G`, without learning `x`. Built directly on
//! [`cb_mpc_zk::paillier::{prove_pdl, verify_pdl}`], the same
//! "Paillier ciphertext consistent with an EC point" proof
//! `cb-mpc-ecdsa2p`'s DKG already uses for `c_key`'s own consistency —
//! PVE is just that proof aimed at an arbitrary recipient key instead of
//! the signing protocol's own Paillier key.
//!
//! [`encrypt_ac`]/[`decrypt_ac`] generalize this to an access-control
//! tree of recipients (spec §4.5): the dealer shares `x` down the tree
//! with [`cb_mpc_ac::tree::share`] and PVE-encrypts each leaf's share to
//! that leaf's own recipient key, so a satisfying quorum of recipients
//! can decrypt their shares and reconstruct via
//! [`cb_mpc_ac::tree::reconstruct`].

use std::collections::HashMap;

use cb_mpc_ac::tree::{self, AcError, Node};
use cb_mpc_core::pid::Pid;
use cb_mpc_primitives::paillier::{Ciphertext, PaillierPublicKey, PaillierSecretKey};
use cb_mpc_zk::paillier::{prove_pdl, verify_pdl, PaillierProofError, PdlProof};
use generic_ec::{hash_to_curve::FromHash, Curve, Point, Scalar, SecretScalar};
use paillier_zk::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use sha2::Sha256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PveError {
    #[error(transparent)]
    Proof(#[from] PaillierProofError),
    #[error(transparent)]
    Ac(#[from] AcError),
    #[error("decrypted plaintext does not match the declared public point")]
    Mismatch,
    #[error("no recipient key registered for a leaf in the access tree")]
    MissingRecipientKey(Pid),
}

/// A single PVE ciphertext: `x` encrypted under a recipient's Paillier
/// key, plus the proof that it decrypts to `declared_public = x·G`.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(bound(
    serialize = "Point<E>: serde::Serialize, PdlProof<E>: serde::Serialize",
    deserialize = "Point<E>: serde::Deserialize<'de>, PdlProof<E>: serde::Deserialize<'de>"
))]
pub struct PveCiphertext<E: Curve> {
    pub declared_public: Point<E>,
    pub ciphertext: Ciphertext,
    pub proof: PdlProof<E>,
}

fn bn_to_scalar<E: Curve>(x: &BigNumber) -> Scalar<E> {
    let base = Scalar::<E>::from(256u64);
    let mut acc = Scalar::<E>::from(0u64);
    for byte in x.to_bytes() {
        acc = acc * base + Scalar::<E>::from(byte as u64);
    }
    acc
}

/// `ec_pve_t`: encrypts `x` to a single recipient's Paillier public key.
pub fn encrypt<E, R>(
    recipient: &PaillierPublicKey,
    x: &SecretScalar<E>,
    sid: &[u8],
    rng: &mut R,
) -> Result<PveCiphertext<E>, PveError>
where
    E: Curve,
    Scalar<E>: FromHash,
    R: RngCore + CryptoRng,
{
    let declared_public = Point::<E>::generator() * x.as_ref();
    let r_key = loop {
        let candidate = BigNumber::from_rng(recipient.n(), rng);
        if candidate.gcd(recipient.n()) == BigNumber::one() {
            break candidate;
        }
    };
    let plaintext = cb_mpc_key_share::ecdsa2p_key::scalar_to_bignumber(x);
    let ciphertext = recipient
        .encrypt_with_randomizer(&plaintext, &r_key)
        .map_err(|_| PaillierProofError::Malformed("plaintext out of range for recipient modulus"))?;
    let proof = prove_pdl::<E, Sha256, _>(sid, 0, recipient, x, &r_key, rng)?;
    Ok(PveCiphertext { declared_public, ciphertext, proof })
}

/// Checks a [`PveCiphertext`] without needing the recipient's secret key.
pub fn verify<E>(recipient: &PaillierPublicKey, ct: &PveCiphertext<E>, sid: &[u8]) -> Result<(), PveError>
where
    E: Curve,
    Scalar<E>: FromHash,
{
    verify_pdl::<E, Sha256>(sid, 0, recipient, &ct.ciphertext, &ct.declared_public, &ct.proof)?;
    Ok(())
}

/// Recovers `x` — only the holder of `recipient`'s Paillier secret key
/// can call this; `verify` is what everyone else uses instead.
pub fn decrypt<E: Curve>(recipient: &PaillierSecretKey, ct: &PveCiphertext<E>) -> Result<SecretScalar<E>, PveError> {
    let plaintext = recipient
        .decrypt(&ct.ciphertext)
        .map_err(|_| PaillierProofError::Invalid)?;
    let mut x = bn_to_scalar::<E>(&plaintext);
    let recovered = SecretScalar::new(&mut x);
    if Point::<E>::generator() * recovered.as_ref() != ct.declared_public {
        return Err(PveError::Mismatch);
    }
    Ok(recovered)
}

/// `ec_pve_ac_t`: shares `x` over `node` and PVE-encrypts each leaf's
/// share to that leaf's entry in `recipient_keys`.
pub struct AcPveBundle<E: Curve> {
    pub node: Node,
    pub leaves: HashMap<Pid, PveCiphertext<E>>,
}

pub fn encrypt_ac<E, R>(
    node: &Node,
    recipient_keys: &HashMap<Pid, PaillierPublicKey>,
    x: Scalar<E>,
    sid: &[u8],
    rng: &mut R,
) -> Result<AcPveBundle<E>, PveError>
where
    E: Curve,
    Scalar<E>: FromHash,
    R: RngCore + CryptoRng,
{
    node.validate()?;
    let shares = tree::share(node, x, rng);
    let mut leaves = HashMap::new();
    for (pid, share) in shares.leaf_shares() {
        let recipient = recipient_keys.get(&pid).ok_or(PveError::MissingRecipientKey(pid))?;
        let mut share = share;
        let secret = SecretScalar::new(&mut share);
        leaves.insert(pid, encrypt::<E, R>(recipient, &secret, sid, rng)?);
    }
    Ok(AcPveBundle { node: node.clone(), leaves })
}

/// Each recipient in `decrypted` has already called [`decrypt`] on its
/// own leaf; reconstructs `x` if the set satisfies `bundle.node`.
pub fn reconstruct_ac<E: Curve>(
    bundle: &AcPveBundle<E>,
    decrypted: &HashMap<Pid, Scalar<E>>,
) -> Result<Scalar<E>, PveError> {
    Ok(tree::reconstruct(&bundle.node, decrypted)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_mpc_core::security_level::{DevLevel, SecurityLevel};
    use cb_mpc_primitives::paillier::PaillierSecretKey;
    use cb_mpc_test_support::PregeneratedPrimes;
    use generic_ec::curves::Secp256k1;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    type E = Secp256k1;

    fn keypair(rng: &mut ChaCha20Rng) -> PaillierSecretKey {
        let (p, q) = PregeneratedPrimes::<DevLevel>::generate(rng).split();
        PaillierSecretKey::from_primes(p, q, DevLevel::PAILLIER_MODULUS_BITS).unwrap()
    }

    #[test]
    fn single_recipient_round_trips_and_verifies() {
        let mut rng = ChaCha20Rng::seed_from_u64(20);
        let sk = keypair(&mut rng);
        let x = SecretScalar::<E>::random(&mut rng);

        let ct = encrypt::<E, _>(&sk.public, &x, b"sid", &mut rng).unwrap();
        verify::<E>(&sk.public, &ct, b"sid").unwrap();
        let recovered = decrypt::<E>(&sk, &ct).unwrap();
        assert_eq!(recovered.as_ref(), x.as_ref());
    }

    #[test]
    fn tampered_ciphertext_fails_verification() {
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let sk = keypair(&mut rng);
        let x = SecretScalar::<E>::random(&mut rng);
        let mut ct = encrypt::<E, _>(&sk.public, &x, b"sid", &mut rng).unwrap();
        ct.declared_public = ct.declared_public + Point::<E>::generator();
        assert!(verify::<E>(&sk.public, &ct, b"sid").is_err());
    }

    #[test]
    fn ac_threshold_bundle_reconstructs_from_a_quorum() {
        let mut rng = ChaCha20Rng::seed_from_u64(22);
        let pids: Vec<Pid> = (0..3).map(|i| Pid::from_name(&format!("pve-recipient-{i}"))).collect();
        let node = Node::Threshold(2, pids.iter().copied().map(Node::Leaf).collect());
        let keys: HashMap<Pid, PaillierSecretKey> = pids.iter().map(|p| (*p, keypair(&mut rng))).collect();
        let recipient_keys: HashMap<Pid, PaillierPublicKey> =
            keys.iter().map(|(p, sk)| (*p, sk.public.clone())).collect();

        let x = Scalar::<E>::random(&mut rng);
        let bundle = encrypt_ac::<E, _>(&node, &recipient_keys, x, b"sid", &mut rng).unwrap();

        for (pid, ct) in &bundle.leaves {
            verify::<E>(&recipient_keys[pid], ct, b"sid").unwrap();
        }

        let quorum = &pids[..2];
        let decrypted: HashMap<Pid, Scalar<E>> = quorum
            .iter()
            .map(|pid| (*pid, *decrypt::<E>(&keys[pid], &bundle.leaves[pid]).unwrap().as_ref()))
            .collect();

        let reconstructed = reconstruct_ac(&bundle, &decrypted).unwrap();
        assert_eq!(Point::<E>::generator() * reconstructed, Point::<E>::generator() * x);
    }
}
