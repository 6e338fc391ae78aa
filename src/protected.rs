//! Secret text that is wiped from memory when dropped.

use core::fmt;

use zeroize::Zeroizing;

/// A string holding sensitive data such as a passphrase.
///
/// The buffer is zeroed on drop and `Debug` never prints the contents.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProtectedString(Zeroizing<String>);

impl ProtectedString {
    /// Take ownership of `secret`.
    pub fn new(secret: String) -> Self {
        Self(Zeroizing::new(secret))
    }

    /// Borrow the plaintext.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for ProtectedString {
    fn from(secret: String) -> Self {
        Self::new(secret)
    }
}

impl From<&str> for ProtectedString {
    fn from(secret: &str) -> Self {
        Self::new(secret.to_owned())
    }
}

impl fmt::Debug for ProtectedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProtectedString(***)")
    }
}
