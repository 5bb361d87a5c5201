use pqcrypto_dilithium::dilithium2;
use pqcrypto_traits::sign::{PublicKey as _, SecretKey as _};
use zeroize::Zeroizing;

use xln_core::SignerId;

use crate::hash::blake3_hash;

/// A signing identity. The secret key is held only in memory, wrapped so
/// it is zeroized on drop.
pub struct KeyPair {
    pub signer_id: SignerId,
    pub public_key: Vec<u8>,
    secret_key: Zeroizing<Vec<u8>>,
}

impl KeyPair {
    /// Generate a fresh Dilithium2 keypair. The `SignerId` is derived by
    /// hashing the public key.
    pub fn generate() -> Self {
        let (pk, sk) = dilithium2::keypair();
        let public_key = pk.as_bytes().to_vec();
        let signer_id = SignerId::from_bytes(blake3_hash(&public_key));
        KeyPair {
            signer_id,
            public_key,
            secret_key: Zeroizing::new(sk.as_bytes().to_vec()),
        }
    }

    /// Reconstruct a keypair from raw bytes (e.g. loaded from a key file).
    pub fn from_raw(public_key: Vec<u8>, secret_key: Vec<u8>) -> Self {
        let signer_id = SignerId::from_bytes(blake3_hash(&public_key));
        KeyPair {
            signer_id,
            public_key,
            secret_key: Zeroizing::new(secret_key),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        crate::dilithium::sign(message, &self.secret_key)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("signer_id", &self.signer_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
