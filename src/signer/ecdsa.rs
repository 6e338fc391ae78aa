use core::fmt;

use signature::{Signer, Verifier};

use super::{KeyHandle, SignatureAlgorithm, SignatureProvider};
use crate::errors::{Error, Result};

fn invalid_key(e: signature::Error) -> Error {
    Error::InvalidKey(format!("ECDSA key: {}", e))
}

/// Private ECDSA key on one of the NIST curves.
pub enum EcdsaSigningKey {
    /// NIST P-256 (`ES256`).
    P256(p256::ecdsa::SigningKey),
    /// NIST P-384 (`ES384`).
    P384(p384::ecdsa::SigningKey),
    /// NIST P-521 (`ES512`).
    P521(p521::ecdsa::SigningKey),
}

/// Public ECDSA key on one of the NIST curves.
#[derive(Clone)]
pub enum EcdsaVerifyingKey {
    /// NIST P-256 (`ES256`).
    P256(p256::ecdsa::VerifyingKey),
    /// NIST P-384 (`ES384`).
    P384(p384::ecdsa::VerifyingKey),
    /// NIST P-521 (`ES512`).
    P521(p521::ecdsa::VerifyingKey),
}

impl EcdsaSigningKey {
    /// Parse a big-endian private scalar for the curve `algorithm` uses.
    pub fn from_slice(algorithm: SignatureAlgorithm, secret: &[u8]) -> Result<Self> {
        Ok(match algorithm {
            SignatureAlgorithm::Es256 => {
                Self::P256(p256::ecdsa::SigningKey::from_slice(secret).map_err(invalid_key)?)
            }
            SignatureAlgorithm::Es384 => {
                Self::P384(p384::ecdsa::SigningKey::from_slice(secret).map_err(invalid_key)?)
            }
            SignatureAlgorithm::Es512 => {
                Self::P521(p521::ecdsa::SigningKey::from_slice(secret).map_err(invalid_key)?)
            }
            other => return Err(Error::UnsupportedAlgorithm(other.name().to_owned())),
        })
    }

    /// Matching public key.
    pub fn verifying_key(&self) -> EcdsaVerifyingKey {
        match self {
            Self::P256(key) => EcdsaVerifyingKey::P256(key.verifying_key().clone()),
            Self::P384(key) => EcdsaVerifyingKey::P384(key.verifying_key().clone()),
            Self::P521(key) => EcdsaVerifyingKey::P521(p521::ecdsa::VerifyingKey::from(key)),
        }
    }

    fn algorithm(&self) -> SignatureAlgorithm {
        match self {
            Self::P256(_) => SignatureAlgorithm::Es256,
            Self::P384(_) => SignatureAlgorithm::Es384,
            Self::P521(_) => SignatureAlgorithm::Es512,
        }
    }

    /// Fixed-width `r || s`.
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(match self {
            Self::P256(key) => {
                let signature: p256::ecdsa::Signature = key.try_sign(data)?;
                signature.to_bytes().to_vec()
            }
            Self::P384(key) => {
                let signature: p384::ecdsa::Signature = key.try_sign(data)?;
                signature.to_bytes().to_vec()
            }
            Self::P521(key) => {
                let signature: p521::ecdsa::Signature = key.try_sign(data)?;
                signature.to_bytes().to_vec()
            }
        })
    }
}

impl fmt::Debug for EcdsaSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcdsaSigningKey({} {{ .. }})", self.algorithm())
    }
}

impl fmt::Debug for EcdsaVerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcdsaVerifyingKey({} {{ .. }})", self.algorithm())
    }
}

impl EcdsaVerifyingKey {
    /// Parse a SEC1 encoded point for the curve `algorithm` uses.
    pub fn from_sec1_bytes(algorithm: SignatureAlgorithm, bytes: &[u8]) -> Result<Self> {
        Ok(match algorithm {
            SignatureAlgorithm::Es256 => {
                Self::P256(p256::ecdsa::VerifyingKey::from_sec1_bytes(bytes).map_err(invalid_key)?)
            }
            SignatureAlgorithm::Es384 => {
                Self::P384(p384::ecdsa::VerifyingKey::from_sec1_bytes(bytes).map_err(invalid_key)?)
            }
            SignatureAlgorithm::Es512 => {
                Self::P521(p521::ecdsa::VerifyingKey::from_sec1_bytes(bytes).map_err(invalid_key)?)
            }
            other => return Err(Error::UnsupportedAlgorithm(other.name().to_owned())),
        })
    }

    fn algorithm(&self) -> SignatureAlgorithm {
        match self {
            Self::P256(_) => SignatureAlgorithm::Es256,
            Self::P384(_) => SignatureAlgorithm::Es384,
            Self::P521(_) => SignatureAlgorithm::Es512,
        }
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::P256(key) => p256::ecdsa::Signature::from_slice(signature)
                .map_or(false, |signature| key.verify(data, &signature).is_ok()),
            Self::P384(key) => p384::ecdsa::Signature::from_slice(signature)
                .map_or(false, |signature| key.verify(data, &signature).is_ok()),
            Self::P521(key) => p521::ecdsa::Signature::from_slice(signature)
                .map_or(false, |signature| key.verify(data, &signature).is_ok()),
        }
    }
}

/// ECDSA signer for `ES256` (P-256), `ES384` (P-384) and `ES512` (P-521).
///
/// Messages are hashed with the curve's SHA-2 digest and signatures use the
/// fixed-width `r || s` form. Like [`RsaSigner`](super::RsaSigner), the
/// signing key is either owned or borrowed through a [`KeyHandle`].
#[derive(Debug)]
pub struct EcdsaSigner<'k> {
    algorithm: SignatureAlgorithm,
    signing: Option<KeyHandle<'k, EcdsaSigningKey>>,
    verifying: EcdsaVerifyingKey,
}

impl<'k> EcdsaSigner<'k> {
    /// Signer over an owned or borrowed private key. The algorithm follows
    /// the key's curve.
    pub fn new(key: KeyHandle<'k, EcdsaSigningKey>) -> Self {
        Self {
            algorithm: key.algorithm(),
            verifying: key.verifying_key(),
            signing: Some(key),
        }
    }

    /// Verify-only signer.
    pub fn from_verifying_key(key: EcdsaVerifyingKey) -> Self {
        Self {
            algorithm: key.algorithm(),
            signing: None,
            verifying: key,
        }
    }

    /// `ES256`, `ES384` or `ES512`.
    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Public half used by [`verify`](SignatureProvider::verify).
    pub fn verifying_key(&self) -> &EcdsaVerifyingKey {
        &self.verifying
    }
}

impl SignatureProvider for EcdsaSigner<'_> {
    fn name(&self) -> &str {
        self.algorithm.name()
    }

    fn can_sign(&self) -> bool {
        self.signing.is_some()
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.signing
            .as_ref()
            .ok_or(Error::SigningNotSupported)?
            .sign(data)
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        self.verifying.verify(data, signature)
    }
}
