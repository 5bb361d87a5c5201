use xln_core::{StateHash, TxId};

/// Compute the BLAKE3 hash of arbitrary bytes.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Derive a `TxId` from the canonical transaction body bytes.
pub fn tx_id_from_body(body_bytes: &[u8]) -> TxId {
    TxId::from_bytes(blake3_hash(body_bytes))
}

/// Derive a `StateHash` over a canonical state serialization. Callers are
/// responsible for producing `bytes` from a canonically-ordered
/// serialization (sorted map keys) so the hash is stable under reordering
/// of in-memory map entries.
pub fn state_hash(bytes: &[u8]) -> StateHash {
    StateHash::from_bytes(blake3_hash(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let a = blake3_hash(b"hello");
        let b = blake3_hash(b"hello");
        assert_eq!(a, b);
    }

    #[test]
    fn different_bytes_differ() {
        assert_ne!(blake3_hash(b"hello"), blake3_hash(b"world"));
    }
}
