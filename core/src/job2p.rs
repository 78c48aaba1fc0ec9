//! Two-party specialization of the job layer (spec §4.1 "2-party
//! specialization"): fixes the ordered PID vector at construction and
//! exposes `p1_to_p2`/`p2_to_p1` convenience wrappers plus `is_p1()`/
//! `is_p2()` predicates.

use crate::error::JobError;
use crate::jobmp::JobMp;
use crate::pid::Pid;
use crate::transport::Delivery;

pub const P1: u16 = 0;
pub const P2: u16 = 1;

pub struct Job2P<D: Delivery> {
    inner: JobMp<D>,
}

impl<D: Delivery> Job2P<D> {
    pub fn new(delivery: D, pid1: Pid, pid2: Pid) -> Self {
        assert_eq!(delivery.n_parties(), 2, "Job2P requires exactly 2 parties");
        Self {
            inner: JobMp::new(delivery, vec![pid1, pid2]),
        }
    }

    pub fn is_p1(&self) -> bool {
        self.inner.is_party_index(P1)
    }

    pub fn is_p2(&self) -> bool {
        self.inner.is_party_index(P2)
    }

    pub fn my_pid(&self) -> Pid {
        self.inner.pid()
    }

    pub fn peer_pid(&self) -> Pid {
        if self.is_p1() {
            self.inner.pids()[P2 as usize]
        } else {
            self.inner.pids()[P1 as usize]
        }
    }

    pub async fn p1_to_p2(&self, payload: Option<Vec<u8>>) -> Result<Option<Vec<u8>>, JobError<D::Error>> {
        self.inner.send_receive(P1, P2, payload).await
    }

    pub async fn p2_to_p1(&self, payload: Option<Vec<u8>>) -> Result<Option<Vec<u8>>, JobError<D::Error>> {
        self.inner.send_receive(P2, P1, payload).await
    }

    /// Escape hatch to the underlying multi-party job, for operations
    /// (`plain_broadcast`, `group_message`) that are identical for n=2.
    pub fn as_mp(&self) -> &JobMp<D> {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::LocalNetwork;

    #[test]
    fn p1_to_p2_roundtrip() {
        futures::executor::block_on(async {
            let net = LocalNetwork::new(2);
            let deliveries = net.deliveries();
            let pid1 = Pid::from_name("p1");
            let pid2 = Pid::from_name("p2");
            let mut iter = deliveries.into_iter();
            let job1 = Job2P::new(iter.next().unwrap(), pid1, pid2);
            let job2 = Job2P::new(iter.next().unwrap(), pid1, pid2);

            assert!(job1.is_p1() && !job1.is_p2());
            assert!(job2.is_p2() && !job2.is_p1());

            let (a, b) = futures::join!(
                job1.p1_to_p2(Some(vec![7, 8, 9])),
                job2.p1_to_p2(None),
            );
            assert!(a.unwrap().is_none());
            assert_eq!(b.unwrap().unwrap(), vec![7, 8, 9]);
        });
    }
}
