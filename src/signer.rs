//! Pluggable signature providers.
//!
//! Every provider implements [`SignatureProvider`]: a name such as `HS256`,
//! a [`can_sign`](SignatureProvider::can_sign) capability, and raw
//! `sign`/`verify` operations. The provided methods add the compact hex and
//! base64url encodings used for token-style transport.
//!
//! # Example
//!
//! ```
//! use cryptkit::{SignatureAlgorithm, SignatureProvider};
//!
//! let signer = SignatureAlgorithm::Hs256.keyed_signer(b"secret").unwrap();
//! let token = signer.sign_base64url(b"payload").unwrap();
//! assert!(signer.verify_base64url(b"payload", &token).unwrap());
//! ```

mod custom;
#[cfg(feature = "ecdsa")]
mod ecdsa;
mod keyed;
mod pkcs1v15;

pub use self::custom::{CustomSigner, SignFn, VerifyFn};
#[cfg(feature = "ecdsa")]
pub use self::ecdsa::{EcdsaSigner, EcdsaSigningKey, EcdsaVerifyingKey};
pub use self::keyed::KeyedHashSigner;
pub use self::pkcs1v15::RsaSigner;

use core::fmt;
use core::ops::Deref;
use core::str::FromStr;

use base64ct::{Base64UrlUnpadded, Encoding};

use crate::errors::{Error, Result};
use crate::hash::HashAlgorithm;

/// Common sign/verify contract.
pub trait SignatureProvider {
    /// Algorithm identifier, e.g. `RS256`.
    fn name(&self) -> &str;

    /// Whether [`sign`](Self::sign) can succeed. Verification is always
    /// available.
    fn can_sign(&self) -> bool;

    /// Sign `data`. Fails with [`Error::SigningNotSupported`] when
    /// [`can_sign`](Self::can_sign) is false.
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Check `signature` over `data`. A mismatch is `false`, never an error.
    fn verify(&self, data: &[u8], signature: &[u8]) -> bool;

    /// Sign and encode as lowercase hex.
    fn sign_hex(&self, data: &[u8]) -> Result<String> {
        Ok(hex::encode(self.sign(data)?))
    }

    /// Sign and encode as unpadded base64url.
    fn sign_base64url(&self, data: &[u8]) -> Result<String> {
        Ok(Base64UrlUnpadded::encode_string(&self.sign(data)?))
    }

    /// Verify a hex signature. Malformed hex is an error.
    fn verify_hex(&self, data: &[u8], signature: &str) -> Result<bool> {
        let signature = hex::decode(signature.trim())?;
        Ok(self.verify(data, &signature))
    }

    /// Verify an unpadded base64url signature. Malformed input is an error.
    fn verify_base64url(&self, data: &[u8], signature: &str) -> Result<bool> {
        let signature = Base64UrlUnpadded::decode_vec(signature.trim())?;
        Ok(self.verify(data, &signature))
    }
}

impl<P: SignatureProvider + ?Sized> SignatureProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn can_sign(&self) -> bool {
        (**self).can_sign()
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        (**self).sign(data)
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        (**self).verify(data, signature)
    }
}

/// A key a provider either owns or borrows from its caller.
///
/// Owned keys are dropped with the provider; borrowed ones are left alone.
pub enum KeyHandle<'k, K> {
    /// Moved into the provider.
    Owned(K),
    /// Lent by the caller, who must keep it alive.
    Borrowed(&'k K),
}

impl<K> KeyHandle<'_, K> {
    /// Whether the provider drops the key.
    pub fn is_owned(&self) -> bool {
        matches!(self, KeyHandle::Owned(_))
    }
}

impl<K> Deref for KeyHandle<'_, K> {
    type Target = K;

    fn deref(&self) -> &K {
        match self {
            KeyHandle::Owned(key) => key,
            KeyHandle::Borrowed(key) => key,
        }
    }
}

impl<K> fmt::Debug for KeyHandle<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyHandle::Owned(_) => f.write_str("KeyHandle::Owned(..)"),
            KeyHandle::Borrowed(_) => f.write_str("KeyHandle::Borrowed(..)"),
        }
    }
}

/// Kind of key a [`SignatureAlgorithm`] needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignatureFamily {
    /// Shared secret (HMAC).
    KeyedHash,
    /// RSASSA-PKCS1-v1_5.
    Rsa,
    /// ECDSA over a NIST curve.
    Ecdsa,
}

/// Named signature algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// HMAC with SHA-256.
    Hs256,
    /// HMAC with SHA-384.
    Hs384,
    /// HMAC with SHA-512.
    Hs512,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    Rs256,
    /// RSASSA-PKCS1-v1_5 with SHA-384.
    Rs384,
    /// RSASSA-PKCS1-v1_5 with SHA-512.
    Rs512,
    /// ECDSA on P-256 with SHA-256.
    Es256,
    /// ECDSA on P-384 with SHA-384.
    Es384,
    /// ECDSA on P-521 with SHA-512.
    Es512,
}

static ALGORITHMS: [(&str, SignatureAlgorithm, SignatureFamily, HashAlgorithm); 9] = [
    ("HS256", SignatureAlgorithm::Hs256, SignatureFamily::KeyedHash, HashAlgorithm::Sha256),
    ("HS384", SignatureAlgorithm::Hs384, SignatureFamily::KeyedHash, HashAlgorithm::Sha384),
    ("HS512", SignatureAlgorithm::Hs512, SignatureFamily::KeyedHash, HashAlgorithm::Sha512),
    ("RS256", SignatureAlgorithm::Rs256, SignatureFamily::Rsa, HashAlgorithm::Sha256),
    ("RS384", SignatureAlgorithm::Rs384, SignatureFamily::Rsa, HashAlgorithm::Sha384),
    ("RS512", SignatureAlgorithm::Rs512, SignatureFamily::Rsa, HashAlgorithm::Sha512),
    ("ES256", SignatureAlgorithm::Es256, SignatureFamily::Ecdsa, HashAlgorithm::Sha256),
    ("ES384", SignatureAlgorithm::Es384, SignatureFamily::Ecdsa, HashAlgorithm::Sha384),
    ("ES512", SignatureAlgorithm::Es512, SignatureFamily::Ecdsa, HashAlgorithm::Sha512),
];

impl SignatureAlgorithm {
    fn entry(self) -> &'static (&'static str, SignatureAlgorithm, SignatureFamily, HashAlgorithm) {
        &ALGORITHMS[self as usize]
    }

    /// Look up an algorithm by its short name, ignoring case.
    pub fn resolve(name: &str) -> Option<Self> {
        let name = name.trim();
        ALGORITHMS
            .iter()
            .find(|(candidate, ..)| candidate.eq_ignore_ascii_case(name))
            .map(|&(_, algorithm, ..)| algorithm)
    }

    /// Short name, e.g. `RS256`.
    pub fn name(self) -> &'static str {
        self.entry().0
    }

    /// Kind of key this algorithm signs with.
    pub fn family(self) -> SignatureFamily {
        self.entry().2
    }

    /// Digest applied to the message before signing.
    pub fn hash(self) -> HashAlgorithm {
        self.entry().3
    }

    /// HMAC signer for the `HS*` algorithms.
    pub fn keyed_signer(self, secret: &[u8]) -> Result<KeyedHashSigner> {
        if self.family() != SignatureFamily::KeyedHash {
            return Err(Error::UnsupportedAlgorithm(self.name().to_owned()));
        }
        KeyedHashSigner::with_name(self.name(), self.hash(), secret)
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::resolve(s).ok_or_else(|| Error::UnsupportedAlgorithm(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_table_order() {
        for (name, algorithm, family, hash) in ALGORITHMS {
            assert_eq!(algorithm.name(), name);
            assert_eq!(algorithm.family(), family);
            assert_eq!(algorithm.hash(), hash);
            assert_eq!(SignatureAlgorithm::resolve(&name.to_lowercase()), Some(algorithm));
        }
        assert!("PS256".parse::<SignatureAlgorithm>().is_err());
    }

    #[test]
    fn test_keyed_signer_requires_hmac_family() {
        assert!(SignatureAlgorithm::Hs384.keyed_signer(b"k").is_ok());
        assert!(matches!(
            SignatureAlgorithm::Rs256.keyed_signer(b"k"),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_key_handle_ownership() {
        let key = String::from("key");
        let borrowed = KeyHandle::Borrowed(&key);
        assert!(!borrowed.is_owned());
        assert_eq!(borrowed.len(), 3);
        drop(borrowed);
        // Still usable after the handle is gone.
        assert_eq!(key, "key");

        let owned: KeyHandle<'_, String> = KeyHandle::Owned(key);
        assert!(owned.is_owned());
        assert_eq!(&*owned, "key");
    }

    #[test]
    fn test_encoding_helpers() {
        let signer = SignatureAlgorithm::Hs256.keyed_signer(b"secret").unwrap();
        let hex = signer.sign_hex(b"data").unwrap();
        assert_eq!(hex, hex.to_lowercase());
        assert!(signer.verify_hex(b"data", &hex.to_uppercase()).unwrap());
        assert!(!signer.verify_hex(b"other", &hex).unwrap());
        assert!(matches!(signer.verify_hex(b"data", "abc"), Err(Error::Hex)));

        let b64 = signer.sign_base64url(b"data").unwrap();
        assert!(!b64.contains('=') && !b64.contains('+') && !b64.contains('/'));
        assert_eq!(Base64UrlUnpadded::decode_vec(&b64).unwrap(), hex::decode(&hex).unwrap());
        assert!(matches!(signer.verify_base64url(b"data", "***"), Err(Error::Base64)));

        let boxed: Box<dyn SignatureProvider> = Box::new(signer);
        assert_eq!(boxed.name(), "HS256");
        assert!(boxed.verify_base64url(b"data", &b64).unwrap());
    }
}
