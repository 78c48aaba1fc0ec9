//! Verification-flag cache (spec §4.4: "maintains a *verification-flag
//! cache* that records which one-shot preconditions ... have already
//! been checked in the current session so proofs that stack on prior
//! proofs do not redundantly verify").
//!
//! Keyed on the statement a precondition was checked against (a
//! Paillier modulus, a ciphertext) rather than on the proof itself,
//! since several different proofs over the same modulus all rely on the
//! same "is this a valid Paillier key" precondition.

use std::collections::HashSet;

use paillier_zk::unknown_order::BigNumber;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Precondition {
    PaillierValidKey,
    PaillierNoSmallFactors,
    PaillierValidCiphertext,
    PlaintextInRange,
}

/// One cache per verifying party's session; not `Sync`, not meant to
/// cross a thread boundary — each job's verifier owns one.
#[derive(Default)]
pub struct VerifierCache {
    checked: HashSet<(Precondition, Vec<u8>)>,
}

impl VerifierCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_checked(&self, precondition: Precondition, modulus: &BigNumber) -> bool {
        self.checked.contains(&(precondition, modulus.to_bytes()))
    }

    pub fn record_checked(&mut self, precondition: Precondition, modulus: &BigNumber) {
        self.checked.insert((precondition, modulus.to_bytes()));
    }

    /// Runs `check` only if `precondition` hasn't already passed for
    /// `modulus` in this session; records success, propagates failure
    /// without caching it (a failed check isn't "precondition already
    /// verified" — the next caller should retry in case of a transient
    /// issue in `check`'s own inputs).
    pub fn check_once<E>(
        &mut self,
        precondition: Precondition,
        modulus: &BigNumber,
        check: impl FnOnce() -> Result<(), E>,
    ) -> Result<(), E> {
        if self.has_checked(precondition, modulus) {
            return Ok(());
        }
        check()?;
        self.record_checked(precondition, modulus);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_check_is_skipped() {
        let mut cache = VerifierCache::new();
        let n = BigNumber::from(17u64);
        let mut calls = 0;
        for _ in 0..3 {
            cache
                .check_once::<()>(Precondition::PaillierValidKey, &n, || {
                    calls += 1;
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn different_moduli_are_independent() {
        let mut cache = VerifierCache::new();
        let mut calls = 0;
        for n in [11u64, 13, 17] {
            cache
                .check_once::<()>(Precondition::PaillierValidKey, &BigNumber::from(n), || {
                    calls += 1;
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(calls, 3);
    }
}
