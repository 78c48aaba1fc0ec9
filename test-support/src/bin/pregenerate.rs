//! Pregenerates a batch of Paillier safe primes and prints the resulting
//! `PrimeCache` JSON to stdout, mirroring the teacher's
//! `tests/src/bin/precompute_shares.rs primes` subcommand. Redirect the
//! output to a fixture file and load it with `PrimeCache::from_serialized`
//! in a test's `#[ctor]`/lazy-static setup to skip the sampling cost.

use cb_mpc_core::security_level::ReasonablySecure;
use cb_mpc_test_support::{PregeneratedPrimes, PrimeCache};
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;

fn main() {
    let count: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(4);

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is after the epoch")
        .as_nanos() as u64;
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut cache = PrimeCache::default();
    for i in 0..count {
        let primes = PregeneratedPrimes::<ReasonablySecure>::generate(&mut rng);
        cache.insert(format!("p{i}"), &primes);
    }
    println!("{}", cache.to_serialized().expect("cache serializes"));
}
