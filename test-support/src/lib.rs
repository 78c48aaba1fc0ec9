//! Shared test fixtures for every protocol crate's `#[cfg(test)]` modules
//! and `tests/` integration suites: an in-process transport
//! ([`local_network`]) and a pregenerated-Paillier-primes cache
//! ([`pregenerated_primes`]) so DKG/refresh tests don't each pay for a
//! fresh 2048-bit safe-prime sample.

pub mod local_network;
pub mod pregenerated_primes;

pub use local_network::{local_network_2p, local_network_mp, ChannelClosed, LocalDelivery, LocalNetwork};
pub use pregenerated_primes::{PregeneratedPrimes, PrimeCache};
