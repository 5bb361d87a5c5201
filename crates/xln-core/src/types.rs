use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque 256-bit identifier for an entity (an autonomous signer or
/// consortium). Conventionally derived from a registration on an external
/// registry; treated here as an opaque input.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub [u8; 32]);

impl EntityId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        EntityId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_b58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    pub fn from_b58(s: &str) -> Result<Self, bs58::decode::Error> {
        let bytes = bs58::decode(s).into_vec()?;
        let mut arr = [0u8; 32];
        if bytes.len() == 32 {
            arr.copy_from_slice(&bytes);
        }
        Ok(EntityId(arr))
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.to_b58();
        write!(f, "EntityId({}…)", &s[..s.len().min(10)])
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

/// A signer authorized to participate in an entity's consensus quorum.
/// Distinct from `EntityId`: one entity may have many signers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SignerId(pub [u8; 32]);

impl SignerId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        SignerId(bytes)
    }

    pub fn to_b58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl fmt::Debug for SignerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.to_b58();
        write!(f, "SignerId({}…)", &s[..s.len().min(10)])
    }
}

impl fmt::Display for SignerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

/// Identifier of a fungible token tracked by an account's delta map.
pub type TokenId = u64;

/// Net signed position of an account for one token. Positive favors the
/// lexicographically-larger party (`R`); negative favors `L`.
pub type SignedDelta = i128;

/// A nonnegative amount of minor token units.
pub type Amount = u128;

/// Monotonic per-entity / per-account frame counter.
pub type Height = u64;

/// One iteration of the server's single-writer reducer loop.
pub type Tick = u64;

/// Monotonically increasing height reported by a trusted jurisdictional
/// (on-chain) event source, scoped per entity.
pub type JurisdictionHeight = u64;

/// BLAKE3 hash over a canonical serialization of a frame or snapshot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateHash(pub [u8; 32]);

impl StateHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        StateHash(bytes)
    }

    pub fn zero() -> Self {
        StateHash([0u8; 32])
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for StateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateHash({})", self.to_hex())
    }
}

impl fmt::Display for StateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Identifier of a single entity-level or account-level transaction,
/// derived by hashing its canonical body bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        TxId(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; 32];
        if bytes.len() == 32 {
            arr.copy_from_slice(&bytes);
        }
        Ok(TxId(arr))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({}…)", &self.to_hex()[..8])
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Canonically-ordered pair of counterparty entities identifying an
/// account. `left < right` lexicographically, regardless of which side
/// opened the account or which side a caller views the account from.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Debug)]
pub struct AccountKey {
    pub left: EntityId,
    pub right: EntityId,
}

impl AccountKey {
    /// Build a canonical key from two unordered counterparties.
    pub fn new(a: EntityId, b: EntityId) -> Self {
        if a <= b {
            AccountKey { left: a, right: b }
        } else {
            AccountKey { left: b, right: a }
        }
    }

    pub fn counterparty(&self, me: EntityId) -> Option<EntityId> {
        if me == self.left {
            Some(self.right)
        } else if me == self.right {
            Some(self.left)
        } else {
            None
        }
    }

    /// Which side `me` occupies in this canonical pair.
    pub fn side_of(&self, me: EntityId) -> Option<Side> {
        if me == self.left {
            Some(Side::Left)
        } else if me == self.right {
            Some(Side::Right)
        } else {
            None
        }
    }
}

/// Which of the two canonical positions in an `AccountKey` a perspective
/// occupies.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_key_is_order_independent() {
        let a = EntityId([1u8; 32]);
        let b = EntityId([2u8; 32]);
        assert_eq!(AccountKey::new(a, b), AccountKey::new(b, a));
        let key = AccountKey::new(b, a);
        assert_eq!(key.left, a);
        assert_eq!(key.right, b);
    }

    #[test]
    fn side_of_and_counterparty() {
        let a = EntityId([1u8; 32]);
        let b = EntityId([2u8; 32]);
        let key = AccountKey::new(a, b);
        assert_eq!(key.side_of(a), Some(Side::Left));
        assert_eq!(key.side_of(b), Some(Side::Right));
        assert_eq!(key.counterparty(a), Some(b));
        assert_eq!(key.counterparty(EntityId([9u8; 32])), None);
    }

    #[test]
    fn entity_id_b58_round_trip() {
        let id = EntityId([7u8; 32]);
        let s = id.to_b58();
        assert_eq!(EntityId::from_b58(&s).unwrap(), id);
    }
}
