use pqcrypto_dilithium::dilithium2::{self, DetachedSignature, PublicKey, SecretKey};
use pqcrypto_traits::sign::{
    DetachedSignature as _, PublicKey as _, SecretKey as _,
};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed public key")]
    MalformedPublicKey,
    #[error("malformed signature")]
    MalformedSignature,
    #[error("signature verification failed")]
    VerificationFailed,
}

/// Sign `message` with a raw Dilithium2 secret key.
pub fn sign(message: &[u8], secret_key: &[u8]) -> Vec<u8> {
    let sk = SecretKey::from_bytes(secret_key).expect("valid secret key length");
    dilithium2::detached_sign(message, &sk).as_bytes().to_vec()
}

/// Verify a detached Dilithium2 signature against a raw public key.
pub fn verify_signature(
    message: &[u8],
    signature: &[u8],
    public_key: &[u8],
) -> Result<(), SignatureError> {
    let pk = PublicKey::from_bytes(public_key).map_err(|_| SignatureError::MalformedPublicKey)?;
    let sig =
        DetachedSignature::from_bytes(signature).map_err(|_| SignatureError::MalformedSignature)?;
    dilithium2::verify_detached_signature(&sig, message, &pk)
        .map_err(|_| SignatureError::VerificationFailed)
}

/// Stateless signer wrapping a secret key kept in memory only as long as
/// this struct lives; the key is zeroized on drop.
pub struct Signer {
    secret_key: Zeroizing<Vec<u8>>,
}

impl Signer {
    pub fn new(secret_key: Vec<u8>) -> Self {
        Signer {
            secret_key: Zeroizing::new(secret_key),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        sign(message, &self.secret_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqcrypto_dilithium::dilithium2::keypair;

    #[test]
    fn sign_verify_round_trip() {
        let (pk, sk) = keypair();
        let msg = b"entity frame body bytes";
        let sig = sign(msg, sk.as_bytes());
        assert!(verify_signature(msg, &sig, pk.as_bytes()).is_ok());
    }

    #[test]
    fn tampered_message_fails() {
        let (pk, sk) = keypair();
        let sig = sign(b"original", sk.as_bytes());
        assert!(verify_signature(b"tampered", &sig, pk.as_bytes()).is_err());
    }
}
