//! Canonical RSA key parameters shared by every key format.

use core::fmt;

use rsa::{
    traits::{PrivateKeyParts, PublicKeyParts},
    BigUint, RsaPrivateKey, RsaPublicKey,
};
use zeroize::Zeroize;

use crate::der::strip_leading_zeros;
use crate::errors::{Error, Result};

/// RSA key material as big-endian unsigned integers.
///
/// `modulus` and `exponent` are always present. The CRT private components
/// live in a single optional [`RsaPrivateParts`], so a parameter set is
/// either fully private or public-only. All values are stored without
/// leading zero bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaParameters {
    modulus: Vec<u8>,
    exponent: Vec<u8>,
    private: Option<RsaPrivateParts>,
}

/// Private exponent and CRT values of an RSA key.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPrivateParts {
    d: Vec<u8>,
    p: Vec<u8>,
    q: Vec<u8>,
    dp: Vec<u8>,
    dq: Vec<u8>,
    inverse_q: Vec<u8>,
}

fn normalized(bytes: &[u8]) -> Vec<u8> {
    strip_leading_zeros(bytes).to_vec()
}

impl RsaPrivateParts {
    /// Group the private components. Leading zero bytes are stripped.
    pub fn new(d: &[u8], p: &[u8], q: &[u8], dp: &[u8], dq: &[u8], inverse_q: &[u8]) -> Self {
        Self {
            d: normalized(d),
            p: normalized(p),
            q: normalized(q),
            dp: normalized(dp),
            dq: normalized(dq),
            inverse_q: normalized(inverse_q),
        }
    }

    /// Private exponent.
    pub fn d(&self) -> &[u8] {
        &self.d
    }

    /// First prime factor.
    pub fn p(&self) -> &[u8] {
        &self.p
    }

    /// Second prime factor.
    pub fn q(&self) -> &[u8] {
        &self.q
    }

    /// `d mod (p - 1)`
    pub fn dp(&self) -> &[u8] {
        &self.dp
    }

    /// `d mod (q - 1)`
    pub fn dq(&self) -> &[u8] {
        &self.dq
    }

    /// `q^-1 mod p`
    pub fn inverse_q(&self) -> &[u8] {
        &self.inverse_q
    }

    pub(crate) fn fields(&self) -> [&[u8]; 6] {
        [&self.d, &self.p, &self.q, &self.dp, &self.dq, &self.inverse_q]
    }
}

impl Zeroize for RsaPrivateParts {
    fn zeroize(&mut self) {
        self.d.zeroize();
        self.p.zeroize();
        self.q.zeroize();
        self.dp.zeroize();
        self.dq.zeroize();
        self.inverse_q.zeroize();
    }
}

impl Drop for RsaPrivateParts {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for RsaPrivateParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RsaPrivateParts { .. }")
    }
}

impl RsaParameters {
    /// Public-only parameter set.
    pub fn new_public(modulus: &[u8], exponent: &[u8]) -> Result<Self> {
        Self::from_parts(modulus, exponent, None)
    }

    /// Full private parameter set. Every private component must be
    /// non-zero.
    pub fn new_private(modulus: &[u8], exponent: &[u8], private: RsaPrivateParts) -> Result<Self> {
        Self::from_parts(modulus, exponent, Some(private))
    }

    pub(crate) fn from_parts(
        modulus: &[u8],
        exponent: &[u8],
        private: Option<RsaPrivateParts>,
    ) -> Result<Self> {
        let modulus = normalized(modulus);
        let exponent = normalized(exponent);
        if modulus.is_empty() {
            return Err(Error::Format("empty modulus"));
        }
        if exponent.is_empty() {
            return Err(Error::Format("empty exponent"));
        }
        if let Some(private) = &private {
            if private.fields().iter().any(|field| field.is_empty()) {
                return Err(Error::Format("zero private key component"));
            }
        }
        Ok(Self {
            modulus,
            exponent,
            private,
        })
    }

    /// Modulus `n`.
    pub fn modulus(&self) -> &[u8] {
        &self.modulus
    }

    /// Public exponent `e`.
    pub fn exponent(&self) -> &[u8] {
        &self.exponent
    }

    /// Private components, if this is a private key.
    pub fn private_parts(&self) -> Option<&RsaPrivateParts> {
        self.private.as_ref()
    }

    /// Whether the private components are present.
    pub fn is_private(&self) -> bool {
        self.private.is_some()
    }

    /// Copy of this parameter set without the private components.
    pub fn to_public(&self) -> Self {
        Self {
            modulus: self.modulus.clone(),
            exponent: self.exponent.clone(),
            private: None,
        }
    }

    /// Size of the modulus in bits.
    pub fn key_size(&self) -> usize {
        match self.modulus.first() {
            Some(&top) => (self.modulus.len() - 1) * 8 + (8 - top.leading_zeros() as usize),
            None => 0,
        }
    }
}

impl fmt::Debug for RsaParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaParameters")
            .field("key_size", &self.key_size())
            .field("exponent", &self.exponent)
            .field("private", &self.is_private())
            .finish()
    }
}

fn uint(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

impl TryFrom<&RsaParameters> for RsaPublicKey {
    type Error = Error;

    fn try_from(params: &RsaParameters) -> Result<Self> {
        Ok(RsaPublicKey::new(uint(params.modulus()), uint(params.exponent()))?)
    }
}

impl TryFrom<&RsaParameters> for RsaPrivateKey {
    type Error = Error;

    fn try_from(params: &RsaParameters) -> Result<Self> {
        let private = params.private_parts().ok_or(Error::MissingPrivateKey)?;
        let key = RsaPrivateKey::from_components(
            uint(params.modulus()),
            uint(params.exponent()),
            uint(private.d()),
            vec![uint(private.p()), uint(private.q())],
        )?;
        key.validate()?;
        Ok(key)
    }
}

impl From<&RsaPublicKey> for RsaParameters {
    fn from(key: &RsaPublicKey) -> Self {
        Self {
            modulus: key.n().to_bytes_be(),
            exponent: key.e().to_bytes_be(),
            private: None,
        }
    }
}

impl TryFrom<&RsaPrivateKey> for RsaParameters {
    type Error = Error;

    fn try_from(key: &RsaPrivateKey) -> Result<Self> {
        let primes = key.primes();
        if primes.len() != 2 {
            return Err(Error::InvalidKey(format!(
                "{} prime factors, only two-prime keys are supported",
                primes.len()
            )));
        }

        let precomputed;
        let key = if key.dp().is_some() && key.dq().is_some() && key.qinv().is_some() {
            key
        } else {
            let mut copy = key.clone();
            copy.precompute()?;
            precomputed = copy;
            &precomputed
        };

        let missing = || Error::InvalidKey("missing CRT values".into());
        let dp = key.dp().ok_or_else(missing)?.to_bytes_be();
        let dq = key.dq().ok_or_else(missing)?.to_bytes_be();
        let (_, inverse_q) = key.qinv().ok_or_else(missing)?.to_bytes_be();

        let private = RsaPrivateParts::new(
            &key.d().to_bytes_be(),
            &primes[0].to_bytes_be(),
            &primes[1].to_bytes_be(),
            &dp,
            &dq,
            &inverse_q,
        );
        RsaParameters::from_parts(
            &key.n().to_bytes_be(),
            &key.e().to_bytes_be(),
            Some(private),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_leading_zeros_are_normalized() {
        let params = RsaParameters::new_public(&hex!("00 00 c5 01"), &hex!("00 01 00 01")).unwrap();
        assert_eq!(params.modulus(), &hex!("c5 01"));
        assert_eq!(params.exponent(), &hex!("01 00 01"));
        assert_eq!(params.key_size(), 16);
        assert!(!params.is_private());
    }

    #[test]
    fn test_empty_modulus_rejected() {
        assert!(RsaParameters::new_public(&[0, 0], &[1, 0, 1]).is_err());
        assert!(RsaParameters::new_public(&[0xc5], &[]).is_err());
    }

    #[test]
    fn test_zero_private_component_rejected() {
        let private = RsaPrivateParts::new(&[7], &[3], &[5], &[0, 0], &[3], &[2]);
        assert!(matches!(
            RsaParameters::new_private(&[0x0f], &[0x03], private),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_to_public_drops_private_parts() {
        let private = RsaPrivateParts::new(&[7], &[3], &[5], &[1], &[3], &[2]);
        let params = RsaParameters::new_private(&[0x0f], &[0x03], private).unwrap();
        assert!(params.is_private());
        let public = params.to_public();
        assert!(public.private_parts().is_none());
        assert_eq!(public.modulus(), params.modulus());
    }

    #[test]
    fn test_debug_redacts_private_parts() {
        let private = RsaPrivateParts::new(&[0xaa], &[3], &[5], &[1], &[3], &[2]);
        let params = RsaParameters::new_private(&[0x0f], &[0x03], private).unwrap();
        let debug = format!("{:?} {:?}", params, params.private_parts().unwrap());
        assert!(!debug.contains("170"));
        assert!(debug.contains("private: true"));
    }

    #[test]
    fn test_public_key_conversion() {
        let n = hex!("c4 d3 a6 b5 e1 f2 90 81 7f 6e 5d 4c 3b 2a 19 f9");
        let params = RsaParameters::new_public(&n, &hex!("01 00 01")).unwrap();
        let key = RsaPublicKey::try_from(&params).unwrap();
        assert_eq!(RsaParameters::from(&key), params);
    }
}
