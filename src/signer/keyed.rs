use core::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::SignatureProvider;
use crate::errors::Result;
use crate::hash::{HashAlgorithm, HashEngine};

/// Hash-based signer: HMAC over a shared secret, or a plain digest.
///
/// A fresh [`HashEngine`] is built for every call, so one signer can be
/// shared between threads.
pub struct KeyedHashSigner {
    name: String,
    algorithm: HashAlgorithm,
    secret: Option<Zeroizing<Vec<u8>>>,
}

impl KeyedHashSigner {
    /// Signer named after the HMAC algorithm, e.g. `HMAC-SHA-256`.
    pub fn new(algorithm: HashAlgorithm, secret: &[u8]) -> Result<Self> {
        Self::with_name(&format!("HMAC-{}", algorithm), algorithm, secret)
    }

    /// HMAC signer with an explicit provider name such as `HS256`.
    pub fn with_name(name: &str, algorithm: HashAlgorithm, secret: &[u8]) -> Result<Self> {
        let signer = Self {
            name: name.to_owned(),
            algorithm,
            secret: Some(Zeroizing::new(secret.to_vec())),
        };
        // Reject unusable keys up front rather than on first use.
        signer.engine()?;
        Ok(signer)
    }

    /// Unkeyed signer: the signature is the plain digest of the data,
    /// named after the algorithm, e.g. `SHA-256`.
    pub fn unkeyed(algorithm: HashAlgorithm) -> Self {
        Self {
            name: algorithm.name().to_owned(),
            algorithm,
            secret: None,
        }
    }

    /// Digest under the HMAC (or plain hash).
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Whether signatures are HMACs rather than plain digests.
    pub fn is_keyed(&self) -> bool {
        self.secret.is_some()
    }

    fn engine(&self) -> Result<HashEngine> {
        match &self.secret {
            Some(secret) => HashEngine::new_keyed(self.algorithm, secret),
            None => Ok(HashEngine::new(self.algorithm)),
        }
    }
}

impl SignatureProvider for KeyedHashSigner {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_sign(&self) -> bool {
        true
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(self.engine()?.compute(data))
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match self.sign(data) {
            Ok(expected) => expected.ct_eq(signature).into(),
            Err(_) => false,
        }
    }
}

impl fmt::Debug for KeyedHashSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedHashSigner")
            .field("name", &self.name)
            .field("algorithm", &self.algorithm)
            .field("keyed", &self.is_keyed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_hs256_known_answer() {
        let signer = KeyedHashSigner::new(HashAlgorithm::Sha256, b"key").unwrap();
        assert_eq!(signer.name(), "HMAC-SHA-256");
        let signature = signer
            .sign(b"The quick brown fox jumps over the lazy dog")
            .unwrap();
        assert_eq!(
            signature,
            hex!("f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8")
        );
    }

    #[test]
    fn test_byte_flip_rejected() {
        let signer = KeyedHashSigner::new(HashAlgorithm::Sha3_256, b"k").unwrap();
        let mut signature = signer.sign(b"message").unwrap();
        assert!(signer.verify(b"message", &signature));
        signature[7] ^= 0x01;
        assert!(!signer.verify(b"message", &signature));
        assert!(!signer.verify(b"message", &signature[..16]));
    }

    #[test]
    fn test_debug_hides_secret() {
        let signer = KeyedHashSigner::new(HashAlgorithm::Sha1, b"topsecret").unwrap();
        assert!(!format!("{:?}", signer).contains("topsecret"));
    }

    #[test]
    fn test_unkeyed_digest() {
        let signer = KeyedHashSigner::unkeyed(HashAlgorithm::Sha256);
        assert_eq!(signer.name(), "SHA-256");
        assert!(signer.can_sign() && !signer.is_keyed());
        let mut signature = signer.sign(b"abc").unwrap();
        assert_eq!(
            signature,
            hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
        assert!(signer.verify(b"abc", &signature));
        signature[0] ^= 0x01;
        assert!(!signer.verify(b"abc", &signature));
    }

    #[test]
    fn test_empty_secret_stays_keyed() {
        let keyed = KeyedHashSigner::new(HashAlgorithm::Sha256, b"").unwrap();
        let plain = KeyedHashSigner::unkeyed(HashAlgorithm::Sha256);
        assert!(keyed.is_keyed());
        assert_ne!(keyed.sign(b"abc").unwrap(), plain.sign(b"abc").unwrap());
    }
}
