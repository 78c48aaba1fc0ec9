//! Shared `serde` support for `paillier_zk::unknown_order::BigNumber`,
//! reused by every wire message that carries a raw big integer (Paillier
//! ciphertexts, Pedersen commitments, ZK proof transcripts).

use paillier_zk::unknown_order::BigNumber;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<S: Serializer>(value: &BigNumber, s: S) -> Result<S::Ok, S::Error> {
    value.to_bytes().serialize(s)
}

pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigNumber, D::Error> {
    let bytes = Vec::<u8>::deserialize(d)?;
    Ok(BigNumber::from_slice(&bytes))
}
