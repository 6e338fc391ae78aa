//! Error types.

/// Alias for [`core::result::Result`] with the `cryptkit` error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Key text or DER structure did not match the expected layout.
    #[error("malformed key data: {0}")]
    Format(&'static str),

    /// XML document that is not well formed.
    #[error("malformed XML: {0}")]
    Xml(String),

    /// Key bytes ended before the structure was complete.
    #[error("truncated key data")]
    Truncated,

    /// Invalid base64 or base64url input.
    #[error("invalid base64 encoding")]
    Base64,

    /// Invalid hex input (odd length or non-hex digit).
    #[error("invalid hex encoding")]
    Hex,

    /// Hash or signature algorithm name that is not supported.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Private key material was required but only public parts exist.
    #[error("private key parameters are not available")]
    MissingPrivateKey,

    /// `sign` called on a provider that only holds a verification key.
    #[error("provider cannot sign: no private key")]
    SigningNotSupported,

    /// Key parameters rejected by the underlying primitive.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The underlying signature primitive failed.
    #[error("signature operation failed")]
    Signature,

    /// I/O failure while hashing a file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<base64ct::Error> for Error {
    fn from(_: base64ct::Error) -> Self {
        Error::Base64
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<hex::FromHexError> for Error {
    fn from(_: hex::FromHexError) -> Self {
        Error::Hex
    }
}

impl From<rsa::Error> for Error {
    fn from(err: rsa::Error) -> Self {
        match err {
            rsa::Error::Verification => Error::Signature,
            other => Error::InvalidKey(other.to_string()),
        }
    }
}

impl From<signature::Error> for Error {
    fn from(_: signature::Error) -> Self {
        Error::Signature
    }
}
