//! The transport trait the job layer is built on.
//!
//! The job/message layer (§4.1) is explicit that the concrete transport is
//! injected: "send bytes to party j / receive bytes from party j / receive
//! bytes from a set of parties". This module is that seam. Anything
//! implementing [`Delivery`] — a TCP multiplexer, an in-process channel set
//! for tests, a websocket relay owned by the embedding application — can
//! back a [`Job2P`](crate::job2p::Job2P) or [`JobMp`](crate::jobmp::JobMp).

use async_trait::async_trait;

use crate::pid::PartyIndex;

/// Party-addressed byte transport. Implementations never retry internally;
/// retry policy belongs to the caller (spec §4.1 failure semantics).
#[async_trait]
pub trait Delivery: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// This party's own index.
    fn party_index(&self) -> PartyIndex;

    /// Number of parties in the session.
    fn n_parties(&self) -> u16;

    /// Sends `payload` to party `to`.
    async fn send(&self, to: PartyIndex, payload: Vec<u8>) -> Result<(), Self::Error>;

    /// Receives the next payload sent to us by party `from`.
    ///
    /// Messages from distinct `(peer, session_id)` pairs are delivered in
    /// arrival order within a stream; a call here blocks until a message
    /// tagged for `from` in the currently active round arrives.
    async fn receive(&self, from: PartyIndex) -> Result<Vec<u8>, Self::Error>;

    /// Receives payloads from every party in `from`, in whatever order
    /// they arrive, returning them indexed by sender.
    async fn receive_many(&self, from: &[PartyIndex]) -> Result<Vec<(PartyIndex, Vec<u8>)>, Self::Error> {
        // Default: sequential receive. A real network transport overrides
        // this with a concurrent select over the pending senders.
        let mut out = Vec::with_capacity(from.len());
        for &p in from {
            out.push((p, self.receive(p).await?));
        }
        Ok(out)
    }

    /// True once the embedder has signalled cancellation; every outstanding
    /// `receive` must subsequently return an error and all protocol state
    /// must be dropped (spec §5 Cancellation).
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Wraps a session identifier into the logical stream the transport routes
/// by, so that sibling protocol instances can share one underlying
/// transport (spec §4.1 Concurrency / §5 Scheduling model).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct StreamId(pub [u8; 16]);

impl StreamId {
    pub fn from_sid(sid: &[u8]) -> Self {
        let mut bytes = [0u8; 16];
        let n = bytes.len().min(sid.len());
        bytes[..n].copy_from_slice(&sid[..n]);
        Self(bytes)
    }
}
