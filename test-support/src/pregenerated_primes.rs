//! Pregenerated Paillier safe primes for fast test runs, mirroring the
//! teacher's `cggmp21::key_refresh::PregeneratedPrimes` (`examples/
//! felicityin-cggmp21/cggmp21/src/key_refresh.rs`): sampling two 1024-bit
//! safe primes per `ReasonablySecure` key share is the dominant cost of
//! every DKG/refresh test, so a JSON-serialized cache of pre-sampled primes
//! lets a whole test binary reuse the same handful of moduli instead of
//! paying that cost per test.

use cb_mpc_core::security_level::SecurityLevel;
use paillier_zk::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PregeneratedPrimes<L> {
    p: BigNumber,
    q: BigNumber,
    #[serde(skip)]
    _level: PhantomData<L>,
}

impl<L: SecurityLevel> PregeneratedPrimes<L> {
    pub fn new(p: BigNumber, q: BigNumber) -> Self {
        Self { p, q, _level: PhantomData }
    }

    pub fn split(self) -> (BigNumber, BigNumber) {
        (self.p, self.q)
    }

    /// Samples a fresh pair of safe primes sized for `L`'s Paillier
    /// modulus. Slow — this is exactly the cost a cache sidesteps.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let half_bits = L::PAILLIER_MODULUS_BITS / 2;
        Self {
            p: BigNumber::safe_prime_from_rng(half_bits, rng),
            q: BigNumber::safe_prime_from_rng(half_bits, rng),
            _level: PhantomData,
        }
    }
}

/// A small named cache of pregenerated prime pairs, one slot per label
/// (e.g. `"p1"`, `"p2"`), serialized as a JSON fixture file. Tests that
/// `take(label)` an entry and find none present fall back to
/// `PregeneratedPrimes::generate`, so the cache is a pure speedup, never a
/// correctness dependency.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrimeCache {
    entries: std::collections::BTreeMap<String, (Vec<u8>, Vec<u8>)>,
}

impl PrimeCache {
    pub fn to_serialized(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_serialized(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn insert<L: SecurityLevel>(&mut self, label: impl Into<String>, primes: &PregeneratedPrimes<L>) {
        self.entries
            .insert(label.into(), (primes.p.to_bytes(), primes.q.to_bytes()));
    }

    pub fn take<L: SecurityLevel>(&mut self, label: &str) -> Option<PregeneratedPrimes<L>> {
        let (p, q) = self.entries.remove(label)?;
        Some(PregeneratedPrimes::new(BigNumber::from_slice(&p), BigNumber::from_slice(&q)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_mpc_core::security_level::DevLevel;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn cache_round_trips_through_json() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let primes = PregeneratedPrimes::<DevLevel>::generate(&mut rng);
        let mut cache = PrimeCache::default();
        cache.insert("p1", &primes);

        let json = cache.to_serialized().unwrap();
        let mut restored = PrimeCache::from_serialized(&json).unwrap();
        let restored_primes = restored.take::<DevLevel>("p1").unwrap();
        assert_eq!(restored_primes.split(), primes.split());
    }
}
