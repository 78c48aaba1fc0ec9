//! AEAD and hash primitives assumed by spec §1 ("AEAD/hash primitives").
//!
//! A thin façade over `chacha20poly1305` (the AEAD construction used
//! elsewhere in the retrieved corpus for application-layer secret
//! wrapping) and `sha2`/`sha3`, giving the rest of the workspace one place
//! to reach for "encrypt this blob under a symmetric key" without every
//! call site picking its own nonce discipline.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use hmac::{Hmac, Mac};
use rand_core::{CryptoRng, RngCore};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroize;

#[derive(Debug, Error)]
pub enum AeadError {
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed: ciphertext or associated data does not authenticate")]
    Decrypt,
}

/// Encrypts `plaintext` under `key` with a fresh random 96-bit nonce,
/// binding `aad`. Returns `nonce || ciphertext`.
pub fn seal<R: RngCore + CryptoRng>(
    key: &[u8; 32],
    aad: &[u8],
    plaintext: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, AeadError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let mut nonce_bytes = [0u8; 12];
    rng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ct = cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|_| AeadError::Encrypt)?;
    let mut out = Vec::with_capacity(12 + ct.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ct);
    Ok(out)
}

pub fn open(key: &[u8; 32], aad: &[u8], sealed: &[u8]) -> Result<Vec<u8>, AeadError> {
    if sealed.len() < 12 {
        return Err(AeadError::Decrypt);
    }
    let (nonce_bytes, ct) = sealed.split_at(12);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), Payload { msg: ct, aad })
        .map_err(|_| AeadError::Decrypt)
}

type HmacSha256 = Hmac<Sha256>;

/// HMAC-based key derivation (HKDF-Extract-then-Expand's simpler cousin):
/// turns arbitrary input keying material into a 32-byte symmetric key,
/// domain-separated by `info`, without pulling in a dedicated HKDF crate
/// nobody else in the corpus depends on.
pub fn derive_key(ikm: &[u8], info: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(b"cb-mpc/kdf/v1").expect("hmac accepts any key length");
    mac.update(ikm);
    mac.update(info);
    let mut prk = [0u8; 32];
    prk.copy_from_slice(&mac.finalize().into_bytes());

    let mut mac = HmacSha256::new_from_slice(&prk).expect("hmac accepts any key length");
    prk.zeroize();
    mac.update(info);
    mac.update(&[1u8]);
    let okm = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&okm);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn seal_open_round_trips() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let key = [7u8; 32];
        let sealed = seal(&key, b"aad", b"hello world", &mut rng).unwrap();
        let opened = open(&key, b"aad", &sealed).unwrap();
        assert_eq!(opened, b"hello world");
    }

    #[test]
    fn wrong_aad_fails() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let key = [7u8; 32];
        let sealed = seal(&key, b"aad-a", b"hello", &mut rng).unwrap();
        assert!(open(&key, b"aad-b", &sealed).is_err());
    }

    #[test]
    fn derive_key_is_deterministic_and_info_sensitive() {
        let a = derive_key(b"shared-secret", b"ctx-a");
        let b = derive_key(b"shared-secret", b"ctx-a");
        let c = derive_key(b"shared-secret", b"ctx-b");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
