//! MPC job/transport layer, commitments, session IDs, and random-agreement
//! protocols (spec §4.1–§4.3).
//!
//! This crate is the messaging fabric every protocol crate in the
//! workspace is built on: party-addressed `send`/`receive` with strict
//! round discipline (`jobmp`, `job2p`), the two-phase commitment primitive
//! and session-ID agreement protocols that bind every zero-knowledge proof
//! to a session (`commitment`, `sid`), the random-oracle/transcript façade
//! (`random_oracle`), and the four `agree_random` variants (§4.3). The
//! concrete transport is injected via the [`transport::Delivery`] trait;
//! nothing here assumes TCP, a websocket, or an in-process channel.

pub mod agree_random;
pub mod commitment;
pub mod ctx;
pub mod error;
pub mod job2p;
pub mod jobmp;
pub mod message;
pub mod party_set;
pub mod pid;
pub mod progress;
pub mod random_oracle;
pub mod security_level;
pub mod sid;
pub mod transport;
pub mod wire;

#[cfg(test)]
pub mod test_support;
