//! Party identifiers
//!
//! A [`Pid`] is the hash of a human-readable party name, reduced to a fixed
//! 128-bit value. Parties are totally ordered by their byte representation;
//! that order is used for session-ID derivation and for Lagrange
//! interpolation denominators throughout the workspace.

use std::fmt;

use digest::Digest;
use sha2::Sha256;

/// Opaque 128-bit party identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Pid([u8; 16]);

impl Pid {
    pub const SIZE: usize = 16;

    /// Derives a PID from a human-readable party name: `Pid = H(name)[..16]`.
    pub fn from_name(name: &str) -> Self {
        let digest = Sha256::digest(name.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl AsRef<[u8]> for Pid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pid({})", hex::encode(self.0))
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Index of a party within the ordered party list of one protocol instance.
///
/// Distinct from [`Pid`]: `PartyIndex` is positional (0-based, dense,
/// assigned at job construction) while `Pid` is a stable long-term handle
/// that survives across protocol instances and session renegotiation.
pub type PartyIndex = u16;

/// Sorts a party list by [`Pid`] byte order and returns the permutation that
/// recovers the caller's original index for each sorted position.
pub fn sort_by_pid(pids: &[Pid]) -> Vec<PartyIndex> {
    let mut order: Vec<PartyIndex> = (0..pids.len() as PartyIndex).collect();
    order.sort_by_key(|&i| pids[i as usize]);
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_pid() {
        assert_eq!(Pid::from_name("alice"), Pid::from_name("alice"));
        assert_ne!(Pid::from_name("alice"), Pid::from_name("bob"));
    }

    #[test]
    fn ordering_is_total_and_stable() {
        let pids = [Pid::from_name("carol"), Pid::from_name("alice"), Pid::from_name("bob")];
        let order = sort_by_pid(&pids);
        let sorted: Vec<_> = order.iter().map(|&i| pids[i as usize]).collect();
        let mut expected = pids.to_vec();
        expected.sort();
        assert_eq!(sorted, expected);
    }
}
