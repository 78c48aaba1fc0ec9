//! In-process transport for integration tests across every protocol crate.
//!
//! A public copy of `cb-mpc-core`'s own `#[cfg(test)]`-only fixture
//! (`core/src/test_support.rs`), reproducing `tests/utils/local_network`
//! from the C++ original: an in-memory, per-party mpsc channel mesh with no
//! simulated latency or drops, good enough to drive every round of a
//! protocol in one process.

use std::sync::Arc;

use async_trait::async_trait;
use cb_mpc_core::job2p::Job2P;
use cb_mpc_core::jobmp::JobMp;
use cb_mpc_core::pid::{Pid, PartyIndex};
use cb_mpc_core::transport::Delivery;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("local network channel closed")]
pub struct ChannelClosed;

struct Shared {
    n: u16,
    senders: Vec<mpsc::UnboundedSender<(PartyIndex, Vec<u8>)>>,
}

pub struct LocalDelivery {
    shared: Arc<Shared>,
    me: PartyIndex,
    receiver: futures::lock::Mutex<mpsc::UnboundedReceiver<(PartyIndex, Vec<u8>)>>,
}

pub struct LocalNetwork {
    shared: Arc<Shared>,
    receivers: Vec<Option<mpsc::UnboundedReceiver<(PartyIndex, Vec<u8>)>>>,
}

impl LocalNetwork {
    pub fn new(n: u16) -> Self {
        let mut senders = Vec::with_capacity(n as usize);
        let mut receivers = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let (tx, rx) = mpsc::unbounded();
            senders.push(tx);
            receivers.push(Some(rx));
        }
        Self {
            shared: Arc::new(Shared { n, senders }),
            receivers,
        }
    }

    pub fn deliveries(mut self) -> Vec<LocalDelivery> {
        (0..self.shared.n)
            .map(|i| LocalDelivery {
                shared: self.shared.clone(),
                me: i,
                receiver: futures::lock::Mutex::new(self.receivers[i as usize].take().unwrap()),
            })
            .collect()
    }
}

#[async_trait]
impl Delivery for LocalDelivery {
    type Error = ChannelClosed;

    fn party_index(&self) -> PartyIndex {
        self.me
    }

    fn n_parties(&self) -> u16 {
        self.shared.n
    }

    async fn send(&self, to: PartyIndex, payload: Vec<u8>) -> Result<(), Self::Error> {
        self.shared.senders[to as usize]
            .clone()
            .send((self.me, payload))
            .await
            .map_err(|_| ChannelClosed)
    }

    async fn receive(&self, from: PartyIndex) -> Result<Vec<u8>, Self::Error> {
        let mut rx = self.receiver.lock().await;
        loop {
            let (sender, payload) = rx.next().await.ok_or(ChannelClosed)?;
            if sender == from {
                return Ok(payload);
            }
        }
    }
}

/// Wires up a 2-party in-process network and wraps both ends in [`Job2P`],
/// the shape every 2-party protocol crate's tests consume directly.
pub fn local_network_2p() -> (Job2P<LocalDelivery>, Job2P<LocalDelivery>) {
    let net = LocalNetwork::new(2);
    let mut deliveries = net.deliveries().into_iter();
    let pid1 = Pid::from_name("p1");
    let pid2 = Pid::from_name("p2");
    let job1 = Job2P::new(deliveries.next().unwrap(), pid1, pid2);
    let job2 = Job2P::new(deliveries.next().unwrap(), pid1, pid2);
    (job1, job2)
}

/// Wires up an `n`-party in-process network with parties named `p0..pn`,
/// sorted by their `Pid` byte order as every n-party DKG assumes.
pub fn local_network_mp(n: u16) -> Vec<JobMp<LocalDelivery>> {
    let net = LocalNetwork::new(n);
    let pids: Vec<Pid> = (0..n).map(|i| Pid::from_name(&format!("p{i}"))).collect();
    net.deliveries()
        .into_iter()
        .map(|d| JobMp::new(d, pids.clone()))
        .collect()
}
