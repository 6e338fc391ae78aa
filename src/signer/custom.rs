use core::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::SignatureProvider;
use crate::errors::Result;

/// `(data, secret) -> signature`
pub type SignFn = Box<dyn Fn(&[u8], &[u8]) -> Vec<u8> + Send + Sync>;

/// `(data, signature, secret) -> valid`
pub type VerifyFn = Box<dyn Fn(&[u8], &[u8], &[u8]) -> bool + Send + Sync>;

/// Signer backed by caller-supplied functions over a shared secret.
///
/// Without a verify function, verification signs again and compares the
/// result in constant time.
pub struct CustomSigner {
    name: String,
    secret: Zeroizing<Vec<u8>>,
    sign: SignFn,
    verify: Option<VerifyFn>,
}

impl CustomSigner {
    /// Provider named `name` that signs with `sign(data, secret)`. Without
    /// a [verifier](Self::with_verifier), verification re-signs and
    /// compares in constant time.
    pub fn new<F>(name: impl Into<String>, secret: &[u8], sign: F) -> Self
    where
        F: Fn(&[u8], &[u8]) -> Vec<u8> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            secret: Zeroizing::new(secret.to_vec()),
            sign: Box::new(sign),
            verify: None,
        }
    }

    /// Use `verify` instead of re-signing.
    pub fn with_verifier<F>(mut self, verify: F) -> Self
    where
        F: Fn(&[u8], &[u8], &[u8]) -> bool + Send + Sync + 'static,
    {
        self.verify = Some(Box::new(verify));
        self
    }
}

impl SignatureProvider for CustomSigner {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_sign(&self) -> bool {
        true
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok((self.sign)(data, &self.secret))
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match &self.verify {
            Some(verify) => verify(data, signature, &self.secret),
            None => (self.sign)(data, &self.secret).ct_eq(signature).into(),
        }
    }
}

impl fmt::Debug for CustomSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomSigner")
            .field("name", &self.name)
            .field("custom_verify", &self.verify.is_some())
            .finish_non_exhaustive()
    }
}
