use core::fmt;

use log::debug;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};

use super::{KeyHandle, SignatureAlgorithm, SignatureFamily, SignatureProvider};
use crate::errors::{Error, Result};
use crate::hash::{HashAlgorithm, HashEngine};
use crate::keccak::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};
use crate::key::RsaParameters;

/// `RSASSA-PKCS1-v1_5` padding for `hash`. Keccak digests have no
/// registered DigestInfo identifier and are refused.
fn padding_scheme(hash: HashAlgorithm) -> Result<Pkcs1v15Sign> {
    Ok(match hash {
        HashAlgorithm::Md5 => Pkcs1v15Sign::new::<md5::Md5>(),
        HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<sha1::Sha1>(),
        HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
        HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
        HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
        HashAlgorithm::Sha3_224 => Pkcs1v15Sign::new::<Sha3_224>(),
        HashAlgorithm::Sha3_256 => Pkcs1v15Sign::new::<Sha3_256>(),
        HashAlgorithm::Sha3_384 => Pkcs1v15Sign::new::<Sha3_384>(),
        HashAlgorithm::Sha3_512 => Pkcs1v15Sign::new::<Sha3_512>(),
        HashAlgorithm::Keccak224
        | HashAlgorithm::Keccak256
        | HashAlgorithm::Keccak384
        | HashAlgorithm::Keccak512 => {
            return Err(Error::UnsupportedAlgorithm(format!("RSA with {}", hash)))
        }
    })
}

/// RSA PKCS#1 v1.5 signer with a fixed hash.
///
/// The private key may be owned by the signer or borrowed from the caller
/// (see [`KeyHandle`]); without one the signer only verifies.
pub struct RsaSigner<'k> {
    name: String,
    hash: HashAlgorithm,
    private: Option<KeyHandle<'k, RsaPrivateKey>>,
    public: RsaPublicKey,
}

impl<'k> RsaSigner<'k> {
    fn build(
        algorithm: SignatureAlgorithm,
        private: Option<KeyHandle<'k, RsaPrivateKey>>,
        public: RsaPublicKey,
    ) -> Result<Self> {
        if algorithm.family() != SignatureFamily::Rsa {
            return Err(Error::UnsupportedAlgorithm(algorithm.name().to_owned()));
        }
        Ok(Self {
            name: algorithm.name().to_owned(),
            hash: algorithm.hash(),
            private,
            public,
        })
    }

    /// Signer over a private key handle; the public half is derived from it.
    pub fn new(algorithm: SignatureAlgorithm, key: KeyHandle<'k, RsaPrivateKey>) -> Result<Self> {
        let public = key.to_public_key();
        Self::build(algorithm, Some(key), public)
    }

    /// Verify-only signer.
    pub fn from_public_key(algorithm: SignatureAlgorithm, key: RsaPublicKey) -> Result<Self> {
        Self::build(algorithm, None, key)
    }

    /// Signer over decoded key parameters. Private parameters are checked
    /// for consistency before use.
    pub fn from_parameters(algorithm: SignatureAlgorithm, params: &RsaParameters) -> Result<Self> {
        if params.is_private() {
            let key = RsaPrivateKey::try_from(params)?;
            Self::new(algorithm, KeyHandle::Owned(key))
        } else {
            Self::from_public_key(algorithm, RsaPublicKey::try_from(params)?)
        }
    }

    /// Replace the message digest, renaming the signer `RSA-<hash>`.
    pub fn with_hash(mut self, hash: HashAlgorithm) -> Result<Self> {
        padding_scheme(hash)?;
        self.name = format!("RSA-{}", hash);
        self.hash = hash;
        Ok(self)
    }

    /// Digest signed under the PKCS#1 v1.5 padding.
    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    /// Key used for verification.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    fn digest(&self, data: &[u8]) -> Vec<u8> {
        HashEngine::new(self.hash).compute(data)
    }
}

impl SignatureProvider for RsaSigner<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_sign(&self) -> bool {
        self.private.is_some()
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let key = self.private.as_ref().ok_or(Error::SigningNotSupported)?;
        let hashed = self.digest(data);
        Ok(key.sign(padding_scheme(self.hash)?, &hashed)?)
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let scheme = match padding_scheme(self.hash) {
            Ok(scheme) => scheme,
            Err(_) => return false,
        };
        let hashed = self.digest(data);
        match self.public.verify(scheme, &hashed, signature) {
            Ok(()) => true,
            Err(e) => {
                debug!("{} signature rejected: {}", self.name, e);
                false
            }
        }
    }
}

impl fmt::Debug for RsaSigner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaSigner")
            .field("name", &self.name)
            .field("hash", &self.hash)
            .field("can_sign", &self.can_sign())
            .finish_non_exhaustive()
    }
}
