//! Multi-party job: party-addressed messaging with round discipline
//! (spec §4.1).
//!
//! `JobMp` owns no protocol state of its own — it is re-created fresh for
//! every protocol instance (spec §3 "Per-message protocol state" lifecycle)
//! and simply forwards to the injected [`Delivery`]. Higher layers
//! (`cb-mpc-ecdsa2p`, `cb-mpc-ecdsa-mp`, ...) own the round counter and
//! call `send`/`receive`/`group_message` in strict alternation.

use crate::error::{JobError, TransportError};
use crate::party_set::PartySet;
use crate::pid::{Pid, PartyIndex};
use crate::transport::Delivery;

pub struct JobMp<D: Delivery> {
    delivery: D,
    pids: Vec<Pid>,
}

impl<D: Delivery> JobMp<D> {
    pub fn new(delivery: D, pids: Vec<Pid>) -> Self {
        assert!(pids.len() >= 2, "at least 2 parties are required");
        assert!(
            pids.len() as u32 <= PartySet::MAX_PARTIES,
            "at most {} parties are supported by PartySet",
            PartySet::MAX_PARTIES
        );
        assert_eq!(pids.len(), delivery.n_parties() as usize);
        Self { delivery, pids }
    }

    pub fn n_parties(&self) -> u16 {
        self.delivery.n_parties()
    }

    pub fn party_index(&self) -> PartyIndex {
        self.delivery.party_index()
    }

    pub fn is_party_index(&self, i: PartyIndex) -> bool {
        self.party_index() == i
    }

    pub fn pid(&self) -> Pid {
        self.pids[self.party_index() as usize]
    }

    pub fn pids(&self) -> &[Pid] {
        &self.pids
    }

    pub fn all_parties(&self) -> PartySet {
        PartySet::all(self.n_parties())
    }

    pub fn peers(&self) -> PartySet {
        self.all_parties().without(self.party_index())
    }

    pub async fn send(&self, to: PartyIndex, payload: Vec<u8>) -> Result<(), JobError<D::Error>> {
        if self.delivery.is_cancelled() {
            return Err(TransportError::Cancelled.into());
        }
        self.delivery
            .send(to, payload)
            .await
            .map_err(TransportError::Send)
            .map_err(Into::into)
    }

    pub async fn receive(&self, from: PartyIndex) -> Result<Vec<u8>, JobError<D::Error>> {
        if self.delivery.is_cancelled() {
            return Err(TransportError::Cancelled.into());
        }
        self.delivery
            .receive(from)
            .await
            .map_err(TransportError::Receive)
            .map_err(Into::into)
    }

    /// If this party is `from`, sends; if this party is `to`, receives;
    /// otherwise a no-op (spec §4.1 `send_receive`).
    pub async fn send_receive(
        &self,
        from: PartyIndex,
        to: PartyIndex,
        payload: Option<Vec<u8>>,
    ) -> Result<Option<Vec<u8>>, JobError<D::Error>> {
        if self.is_party_index(from) {
            self.send(to, payload.expect("sender must supply a payload")).await?;
        }
        if self.is_party_index(to) {
            return Ok(Some(self.receive(from).await?));
        }
        Ok(None)
    }

    /// To every party in `to_set` (excluding self) send `payload`; from
    /// every party in `from_set` (excluding self) receive and return their
    /// payload, indexed by sender (spec §4.1 `group_message`).
    pub async fn group_message(
        &self,
        to_set: PartySet,
        from_set: PartySet,
        payload: Vec<u8>,
    ) -> Result<Vec<(PartyIndex, Vec<u8>)>, JobError<D::Error>> {
        let me = self.party_index();
        if to_set.has(me) {
            for j in to_set.iter(self.n_parties()) {
                if j != me {
                    self.send(j, payload.clone()).await?;
                }
            }
        }
        if from_set.has(me) {
            let senders: Vec<_> = from_set.iter(self.n_parties()).filter(|&j| j != me).collect();
            let received = self
                .delivery
                .receive_many(&senders)
                .await
                .map_err(TransportError::Receive)?;
            return Ok(received);
        }
        Ok(Vec::new())
    }

    /// Shorthand for `group_message(ALL, ALL, msg)`.
    pub async fn plain_broadcast(
        &self,
        payload: Vec<u8>,
    ) -> Result<Vec<(PartyIndex, Vec<u8>)>, JobError<D::Error>> {
        self.group_message(self.all_parties(), self.all_parties(), payload).await
    }

    /// Fan-in: every party sends `payload` to `to`; `to` receives from all.
    pub async fn send_message_all_to_one(
        &self,
        to: PartyIndex,
        payload: Vec<u8>,
    ) -> Result<Vec<(PartyIndex, Vec<u8>)>, JobError<D::Error>> {
        let me = self.party_index();
        if me != to {
            self.send(to, payload).await?;
            return Ok(Vec::new());
        }
        let senders: Vec<_> = self.peers().iter(self.n_parties()).collect();
        if self.delivery.is_cancelled() {
            return Err(TransportError::Cancelled.into());
        }
        self.delivery
            .receive_many(&senders)
            .await
            .map_err(TransportError::Receive)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::LocalNetwork;

    #[test]
    fn plain_broadcast_reaches_everyone() {
        futures::executor::block_on(async {
            let net = LocalNetwork::new(4);
            let pids: Vec<_> = (0..4).map(|i| Pid::from_name(&format!("p{i}"))).collect();
            let jobs: Vec<_> = net
                .deliveries()
                .into_iter()
                .map(|d| JobMp::new(d, pids.clone()))
                .collect();

            let futs = jobs.iter().enumerate().map(|(i, job)| {
                let payload = vec![i as u8];
                async move { job.plain_broadcast(payload).await.unwrap() }
            });
            let results = futures::future::join_all(futs).await;
            for (i, received) in results.iter().enumerate() {
                assert_eq!(received.len(), 3);
                for (j, payload) in received {
                    assert_ne!(*j, i as u16);
                    assert_eq!(payload, &vec![*j as u8]);
                }
            }
        });
    }
}
