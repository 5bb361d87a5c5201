pub mod dilithium;
pub mod hash;
pub mod keypair;

pub use dilithium::{verify_signature, Signer, SignatureError};
pub use hash::{blake3_hash, state_hash, tx_id_from_body};
pub use keypair::KeyPair;
