//! Hashing facade: algorithm names, plain and keyed engines, and the
//! compute/verify entry points used over text, bytes, files and secrets.

use core::fmt;
use core::str::FromStr;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use digest::{core_api::BlockSizeUser, Digest, DynDigest};
use hmac::{Mac, SimpleHmac};
use log::{trace, warn};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::errors::{Error, Result};
use crate::keccak::{Keccak224, Keccak256, Keccak384, Keccak512, Sha3_224, Sha3_256, Sha3_384, Sha3_512};
use crate::protected::ProtectedString;

/// Files are read in chunks of this many bytes.
const READ_CHUNK: usize = 8 * 1024;

/// Supported hash functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// MD5 (legacy interop only).
    Md5,
    /// SHA-1, also resolved from `SHA`.
    Sha1,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
    /// FIPS 202 SHA3-224.
    Sha3_224,
    /// FIPS 202 SHA3-256, also resolved from `SHA3`.
    Sha3_256,
    /// FIPS 202 SHA3-384.
    Sha3_384,
    /// FIPS 202 SHA3-512.
    Sha3_512,
    /// Keccak-224 with the original padding.
    Keccak224,
    /// Keccak-256 with the original padding, also resolved from `KECCAK`.
    Keccak256,
    /// Keccak-384 with the original padding.
    Keccak384,
    /// Keccak-512 with the original padding.
    Keccak512,
}

/// Normalized name → algorithm. Names are compared after removing `-` and
/// `_` and upper-casing.
const NAMES: &[(&str, HashAlgorithm)] = &[
    ("MD5", HashAlgorithm::Md5),
    ("SHA", HashAlgorithm::Sha1),
    ("SHA1", HashAlgorithm::Sha1),
    ("SHA256", HashAlgorithm::Sha256),
    ("SHA384", HashAlgorithm::Sha384),
    ("SHA512", HashAlgorithm::Sha512),
    ("SHA3", HashAlgorithm::Sha3_512),
    ("SHA3224", HashAlgorithm::Sha3_224),
    ("SHA3256", HashAlgorithm::Sha3_256),
    ("SHA3384", HashAlgorithm::Sha3_384),
    ("SHA3512", HashAlgorithm::Sha3_512),
    ("KECCAK", HashAlgorithm::Keccak512),
    ("KECCAK224", HashAlgorithm::Keccak224),
    ("KECCAK256", HashAlgorithm::Keccak256),
    ("KECCAK384", HashAlgorithm::Keccak384),
    ("KECCAK512", HashAlgorithm::Keccak512),
];

impl HashAlgorithm {
    /// Every supported algorithm.
    pub const ALL: [HashAlgorithm; 13] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
        HashAlgorithm::Sha3_224,
        HashAlgorithm::Sha3_256,
        HashAlgorithm::Sha3_384,
        HashAlgorithm::Sha3_512,
        HashAlgorithm::Keccak224,
        HashAlgorithm::Keccak256,
        HashAlgorithm::Keccak384,
        HashAlgorithm::Keccak512,
    ];

    /// Look up an algorithm by name, ignoring case, `-` and `_`.
    ///
    /// `SHA` means SHA-1, and the bare `SHA3` and `KECCAK` names mean the
    /// 512-bit variants.
    pub fn resolve(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|&c| c != '-' && c != '_')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let found = NAMES
            .iter()
            .find(|(candidate, _)| *candidate == normalized)
            .map(|&(_, algorithm)| algorithm);
        trace!("resolved hash name {:?} to {:?}", name, found);
        found
    }

    /// Canonical display name.
    pub const fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
            HashAlgorithm::Sha3_224 => "SHA3-224",
            HashAlgorithm::Sha3_256 => "SHA3-256",
            HashAlgorithm::Sha3_384 => "SHA3-384",
            HashAlgorithm::Sha3_512 => "SHA3-512",
            HashAlgorithm::Keccak224 => "Keccak-224",
            HashAlgorithm::Keccak256 => "Keccak-256",
            HashAlgorithm::Keccak384 => "Keccak-384",
            HashAlgorithm::Keccak512 => "Keccak-512",
        }
    }

    /// Digest size in bytes.
    pub const fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha3_224 | HashAlgorithm::Keccak224 => 28,
            HashAlgorithm::Sha256 | HashAlgorithm::Sha3_256 | HashAlgorithm::Keccak256 => 32,
            HashAlgorithm::Sha384 | HashAlgorithm::Sha3_384 | HashAlgorithm::Keccak384 => 48,
            HashAlgorithm::Sha512 | HashAlgorithm::Sha3_512 | HashAlgorithm::Keccak512 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::resolve(s).ok_or_else(|| Error::UnsupportedAlgorithm(s.to_owned()))
    }
}

/// Run `$f::<D>($args)` with `D` the digest type implementing `$alg`.
macro_rules! with_digest {
    ($alg:expr, $f:ident ( $($arg:expr),* )) => {
        match $alg {
            HashAlgorithm::Md5 => $f::<md5::Md5>($($arg),*),
            HashAlgorithm::Sha1 => $f::<sha1::Sha1>($($arg),*),
            HashAlgorithm::Sha256 => $f::<sha2::Sha256>($($arg),*),
            HashAlgorithm::Sha384 => $f::<sha2::Sha384>($($arg),*),
            HashAlgorithm::Sha512 => $f::<sha2::Sha512>($($arg),*),
            HashAlgorithm::Sha3_224 => $f::<Sha3_224>($($arg),*),
            HashAlgorithm::Sha3_256 => $f::<Sha3_256>($($arg),*),
            HashAlgorithm::Sha3_384 => $f::<Sha3_384>($($arg),*),
            HashAlgorithm::Sha3_512 => $f::<Sha3_512>($($arg),*),
            HashAlgorithm::Keccak224 => $f::<Keccak224>($($arg),*),
            HashAlgorithm::Keccak256 => $f::<Keccak256>($($arg),*),
            HashAlgorithm::Keccak384 => $f::<Keccak384>($($arg),*),
            HashAlgorithm::Keccak512 => $f::<Keccak512>($($arg),*),
        }
    };
}

/// Text-to-bytes conversion applied before hashing strings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8, the default.
    #[default]
    Utf8,
    /// UTF-16 little endian, no byte order mark.
    Utf16Le,
    /// UTF-16 big endian, no byte order mark.
    Utf16Be,
    /// 7-bit ASCII; other characters become `?`.
    Ascii,
}

impl TextEncoding {
    /// Bytes of `text` in this encoding.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            TextEncoding::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            TextEncoding::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
        }
    }
}

/// Object-safe view of an HMAC instance.
trait KeyedDigest: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize_reset(&mut self) -> Vec<u8>;
    fn reset(&mut self);
}

/// HMAC state plus the freshly keyed state it returns to after each output.
struct Keyed<D: Digest + BlockSizeUser> {
    initial: SimpleHmac<D>,
    current: SimpleHmac<D>,
}

impl<D> KeyedDigest for Keyed<D>
where
    D: Digest + BlockSizeUser + Clone + Send,
{
    fn update(&mut self, data: &[u8]) {
        Mac::update(&mut self.current, data);
    }

    fn finalize_reset(&mut self) -> Vec<u8> {
        let mac = core::mem::replace(&mut self.current, self.initial.clone());
        mac.finalize().into_bytes().to_vec()
    }

    fn reset(&mut self) {
        self.current = self.initial.clone();
    }
}

fn plain_digest<D>() -> Box<dyn DynDigest + Send>
where
    D: DynDigest + Default + Send + 'static,
{
    Box::new(D::default())
}

fn keyed_digest<D>(key: &[u8]) -> Result<Box<dyn KeyedDigest>>
where
    D: Digest + BlockSizeUser + Clone + Send + 'static,
{
    let initial = <SimpleHmac<D> as Mac>::new_from_slice(key)
        .map_err(|_| Error::InvalidKey("HMAC key length".into()))?;
    Ok(Box::new(Keyed {
        current: initial.clone(),
        initial,
    }))
}

enum Engine {
    Plain(Box<dyn DynDigest + Send>),
    Keyed(Box<dyn KeyedDigest>),
}

/// A resettable hashing engine, either a plain digest or an HMAC.
///
/// ```
/// use cryptkit::{HashAlgorithm, HashEngine};
///
/// let mut engine = HashEngine::new(HashAlgorithm::Sha3_256);
/// assert_eq!(
///     engine.compute_hex(b"abc"),
///     "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
/// );
/// ```
pub struct HashEngine {
    algorithm: HashAlgorithm,
    engine: Engine,
}

impl HashEngine {
    /// Plain digest engine.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            engine: Engine::Plain(with_digest!(algorithm, plain_digest())),
        }
    }

    /// Resolve `name` (see [`HashAlgorithm::resolve`]) to a plain engine.
    pub fn from_name(name: &str) -> Option<Self> {
        HashAlgorithm::resolve(name).map(Self::new)
    }

    /// HMAC engine keyed with `key`.
    pub fn new_keyed(algorithm: HashAlgorithm, key: &[u8]) -> Result<Self> {
        Ok(Self {
            algorithm,
            engine: Engine::Keyed(with_digest!(algorithm, keyed_digest(key))?),
        })
    }

    /// Underlying hash function.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Whether this engine computes an HMAC.
    pub fn is_keyed(&self) -> bool {
        matches!(self.engine, Engine::Keyed(_))
    }

    /// Digest size in bytes.
    pub fn output_len(&self) -> usize {
        self.algorithm.output_len()
    }

    /// Absorb more input.
    pub fn update(&mut self, data: &[u8]) {
        match &mut self.engine {
            Engine::Plain(digest) => digest.update(data),
            Engine::Keyed(mac) => mac.update(data),
        }
    }

    /// Return the digest of everything fed so far and reset the engine.
    pub fn finalize_reset(&mut self) -> Vec<u8> {
        match &mut self.engine {
            Engine::Plain(digest) => digest.finalize_reset().into_vec(),
            Engine::Keyed(mac) => mac.finalize_reset(),
        }
    }

    /// Discard buffered input.
    pub fn reset(&mut self) {
        match &mut self.engine {
            Engine::Plain(digest) => digest.reset(),
            Engine::Keyed(mac) => mac.reset(),
        }
    }

    /// Digest of `data` as a single message.
    pub fn compute(&mut self, data: &[u8]) -> Vec<u8> {
        self.reset();
        self.update(data);
        self.finalize_reset()
    }

    /// Lowercase hex digest of `data`.
    pub fn compute_hex(&mut self, data: &[u8]) -> String {
        hex::encode(self.compute(data))
    }

    /// Digest of `text` after converting it with `encoding`.
    pub fn compute_str(&mut self, text: &str, encoding: TextEncoding) -> Vec<u8> {
        self.compute(&encoding.encode(text))
    }

    /// Digest of a secret. The plaintext bytes only live in a buffer that is
    /// wiped once hashed.
    pub fn compute_protected(&mut self, secret: &ProtectedString, encoding: TextEncoding) -> Vec<u8> {
        let bytes = Zeroizing::new(encoding.encode(secret.expose_secret()));
        self.compute(&bytes)
    }

    /// Digest of everything `reader` yields. The engine is reset if reading
    /// fails.
    pub fn compute_reader<R: Read>(&mut self, mut reader: R) -> Result<Vec<u8>> {
        self.reset();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.reset();
                    return Err(e.into());
                }
            };
            self.update(&buf[..n]);
        }
        Ok(self.finalize_reset())
    }

    /// Digest of a file's contents, streamed.
    pub fn compute_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let file = File::open(path)?;
        self.compute_reader(file)
    }

    /// Compare the digest of `data` with `expected` in constant time.
    pub fn verify(&mut self, data: &[u8], expected: &[u8]) -> bool {
        let actual = self.compute(data);
        actual.ct_eq(expected).into()
    }

    /// Compare with a hex digest, case-insensitively. Malformed hex never
    /// matches.
    pub fn verify_hex(&mut self, data: &[u8], expected: &str) -> bool {
        match hex::decode(expected.trim()) {
            Ok(expected) => self.verify(data, &expected),
            Err(_) => false,
        }
    }
}

impl fmt::Debug for HashEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashEngine")
            .field("algorithm", &self.algorithm)
            .field("keyed", &self.is_keyed())
            .finish()
    }
}

/// Something to hash.
#[derive(Clone, Copy, Debug)]
pub enum HashInput<'a> {
    /// UTF-8 text.
    Text(&'a str),
    /// Text converted with the given encoding.
    EncodedText(&'a str, TextEncoding),
    /// Raw bytes.
    Bytes(&'a [u8]),
    /// Contents of the file at this path.
    File(&'a Path),
    /// Secret text converted with the given encoding.
    Protected(&'a ProtectedString, TextEncoding),
}

impl HashEngine {
    /// Digest of any [`HashInput`].
    pub fn compute_input(&mut self, input: HashInput<'_>) -> Result<Vec<u8>> {
        Ok(match input {
            HashInput::Text(text) => self.compute_str(text, TextEncoding::Utf8),
            HashInput::EncodedText(text, encoding) => self.compute_str(text, encoding),
            HashInput::Bytes(bytes) => self.compute(bytes),
            HashInput::File(path) => self.compute_file(path)?,
            HashInput::Protected(secret, encoding) => self.compute_protected(secret, encoding),
        })
    }
}

/// Hash `input`, or `Ok(None)` when no engine is given.
pub fn compute_hash(engine: Option<&mut HashEngine>, input: HashInput<'_>) -> Result<Option<Vec<u8>>> {
    match engine {
        Some(engine) => engine.compute_input(input).map(Some),
        None => Ok(None),
    }
}

/// Lowercase hex form of [`compute_hash`].
pub fn compute_hash_string(
    engine: Option<&mut HashEngine>,
    input: HashInput<'_>,
) -> Result<Option<String>> {
    Ok(compute_hash(engine, input)?.map(hex::encode))
}

/// Check `input` against a hex digest. Without an engine nothing can be
/// verified and the result is `false`.
pub fn verify_hash(
    engine: Option<&mut HashEngine>,
    input: HashInput<'_>,
    expected_hex: &str,
) -> Result<bool> {
    let Some(engine) = engine else {
        warn!("hash verification requested without a hash engine");
        return Ok(false);
    };
    let expected = match hex::decode(expected_hex.trim()) {
        Ok(expected) => expected,
        Err(_) => return Ok(false),
    };
    let actual = engine.compute_input(input)?;
    Ok(actual.ct_eq(&expected).into())
}
