//! Message containers (spec §4.1).
//!
//! Two shapes, both generic over a payload type `T: Serialize + DeserializeOwned`:
//! a [`UniformMessage`] sends the same value to every other party, a
//! [`NonUniformMessage`] sends a distinct value to each. Both support
//! "packing" (serializing into the outbound per-party byte buffer) and
//! "unpacking" (deserializing the inbound per-party payload), which is what
//! [`crate::job2p::Job2P`]/[`crate::jobmp::JobMp`] call internally to honor
//! `group_message`'s bundling of several containers into one round.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::FormatError;
use crate::pid::PartyIndex;
use crate::wire;

/// Sends `msg` to every other party and collects what each of them sent us.
#[derive(Clone)]
pub struct UniformMessage<T> {
    pub msg: T,
    received: Vec<Option<T>>,
}

impl<T: Clone> UniformMessage<T> {
    pub fn new(msg: T, n_parties: u16) -> Self {
        Self {
            msg,
            received: vec![None; n_parties as usize],
        }
    }

    /// What party `j` sent us. Panics if `j` hasn't been unpacked yet;
    /// protocols only call this after the round's `receive` has completed.
    pub fn received(&self, j: PartyIndex) -> &T {
        self.received[j as usize]
            .as_ref()
            .expect("message from party not yet received this round")
    }

    /// All received values (not including our own `msg`), in party-index
    /// order, skipping `me`.
    pub fn all_received(&self, me: PartyIndex) -> Vec<&T> {
        self.received
            .iter()
            .enumerate()
            .filter(|&(j, _)| j as u16 != me)
            .map(|(_, v)| v.as_ref().expect("message not yet received"))
            .collect()
    }

    /// All values including our own, ordered by party index — the common
    /// shape needed to fold/sum contributions from every party at once.
    pub fn all_including_me(&self, me: PartyIndex) -> Vec<&T> {
        self.received
            .iter()
            .enumerate()
            .map(|(j, v)| {
                if j as u16 == me {
                    &self.msg
                } else {
                    v.as_ref().expect("message not yet received")
                }
            })
            .collect()
    }
}

impl<T: Serialize> UniformMessage<T> {
    pub fn pack(&self) -> Vec<u8> {
        wire::encode(&self.msg)
    }
}

impl<T: DeserializeOwned> UniformMessage<T> {
    pub fn unpack(&mut self, from: PartyIndex, bytes: &[u8]) -> Result<(), FormatError> {
        self.received[from as usize] = Some(wire::decode(bytes)?);
        Ok(())
    }
}

/// Sends a distinct `T_j` to each party `j`.
///
/// Supports in-place construction: the same slot vector is reused first as
/// "outbound `T_j`" and then, after the round boundary, as "inbound `T_j`"
/// via [`flip_to_receive`](Self::flip_to_receive) — mirroring the design
/// notes' `Vec<Option<T>>` model for a round where each party is
/// exclusively sender or receiver.
pub struct NonUniformMessage<T> {
    slots: Vec<Option<T>>,
}

impl<T> NonUniformMessage<T> {
    pub fn new(n_parties: u16) -> Self {
        Self {
            slots: (0..n_parties).map(|_| None).collect(),
        }
    }

    pub fn set_outbound(&mut self, to: PartyIndex, value: T) {
        self.slots[to as usize] = Some(value);
    }

    pub fn take_outbound(&mut self, to: PartyIndex) -> Option<T> {
        self.slots[to as usize].take()
    }

    /// Clears every slot, turning the container from "outbound" to
    /// "inbound" use without reallocating.
    pub fn flip_to_receive(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    pub fn received(&self, from: PartyIndex) -> &T {
        self.slots[from as usize]
            .as_ref()
            .expect("message from party not yet received this round")
    }
}

impl<T: Serialize> NonUniformMessage<T> {
    pub fn pack_for(&self, to: PartyIndex) -> Vec<u8> {
        wire::encode(
            self.slots[to as usize]
                .as_ref()
                .expect("no outbound value staged for this party"),
        )
    }
}

impl<T: DeserializeOwned> NonUniformMessage<T> {
    pub fn unpack_from(&mut self, from: PartyIndex, bytes: &[u8]) -> Result<(), FormatError> {
        self.slots[from as usize] = Some(wire::decode(bytes)?);
        Ok(())
    }
}

/// Bundles several already-packed per-party payloads into the single wire
/// message a `group_message` round sends, so mixed broadcast and pairwise
/// traffic for the same destination travels in one transport round.
pub fn tie_msgs(parts: &[Vec<u8>]) -> Vec<u8> {
    wire::bundle(parts)
}

pub fn untie_msgs(bytes: &[u8], count: usize) -> Result<Vec<Vec<u8>>, FormatError> {
    wire::unbundle(bytes, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_message_round_trip() {
        let mut a = UniformMessage::new(10u32, 3);
        let mut b = UniformMessage::new(20u32, 3);
        let packed_a = a.pack();
        b.unpack(0, &packed_a).unwrap();
        assert_eq!(*b.received(0), 10);
    }

    #[test]
    fn non_uniform_message_in_place_flip() {
        let mut msg: NonUniformMessage<u32> = NonUniformMessage::new(3);
        msg.set_outbound(1, 100);
        let packed = msg.pack_for(1);
        msg.flip_to_receive();
        msg.unpack_from(1, &packed).unwrap();
        assert_eq!(*msg.received(1), 100);
    }

    #[test]
    fn tie_and_untie() {
        let parts = vec![wire::encode(&1u8), wire::encode(&"x".to_string())];
        let tied = tie_msgs(&parts);
        let untied = untie_msgs(&tied, 2).unwrap();
        assert_eq!(parts, untied);
    }
}
