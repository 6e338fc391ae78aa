//! OpenSSH `ssh-rsa` public key lines.
//!
//! The base64 blob is three length-prefixed fields: the algorithm name, the
//! public exponent and the modulus (RFC 4253 §6.6).

use base64ct::{Base64, Encoding};

use crate::der::strip_leading_zeros;
use crate::errors::{Error, Result};
use crate::key::RsaParameters;

const SSH_RSA: &[u8] = b"ssh-rsa";

struct SshReader<'a> {
    data: &'a [u8],
}

impl<'a> SshReader<'a> {
    fn read_string(&mut self) -> Result<&'a [u8]> {
        if self.data.len() < 4 {
            return Err(Error::Truncated);
        }
        let (len, rest) = self.data.split_at(4);
        let len = u32::from_be_bytes([len[0], len[1], len[2], len[3]]) as usize;
        if len > rest.len() {
            return Err(Error::Truncated);
        }
        let (value, rest) = rest.split_at(len);
        self.data = rest;
        Ok(value)
    }
}

fn write_string(out: &mut Vec<u8>, value: &[u8]) {
    out.extend_from_slice(&(value.len() as u32).to_be_bytes());
    out.extend_from_slice(value);
}

/// `mpint`: positive values with the high bit set get a leading zero byte.
fn write_mpint(out: &mut Vec<u8>, magnitude: &[u8]) {
    let magnitude = strip_leading_zeros(magnitude);
    if magnitude.first().map_or(false, |&b| b & 0x80 != 0) {
        out.extend_from_slice(&(magnitude.len() as u32 + 1).to_be_bytes());
        out.push(0);
        out.extend_from_slice(magnitude);
    } else {
        write_string(out, magnitude);
    }
}

impl RsaParameters {
    /// Parse an `ssh-rsa AAAA... [comment]` line. The key type is taken from
    /// the embedded blob, not the leading token.
    pub fn from_ssh_public_key(line: &str) -> Result<Self> {
        let blob = line
            .split_ascii_whitespace()
            .nth(1)
            .ok_or(Error::Format("missing SSH key blob"))?;
        let blob = Base64::decode_vec(blob)?;

        let mut reader = SshReader { data: &blob };
        let algorithm = reader.read_string()?;
        if algorithm != SSH_RSA {
            return Err(Error::UnsupportedAlgorithm(
                String::from_utf8_lossy(algorithm).into_owned(),
            ));
        }
        let exponent = reader.read_string()?;
        let modulus = reader.read_string()?;
        RsaParameters::new_public(modulus, exponent)
    }

    /// Render as a single `ssh-rsa` line with an optional trailing comment.
    pub fn to_ssh_public_key(&self, comment: Option<&str>) -> String {
        let mut blob = Vec::with_capacity(self.modulus().len() + self.exponent().len() + 24);
        write_string(&mut blob, SSH_RSA);
        write_mpint(&mut blob, self.exponent());
        write_mpint(&mut blob, self.modulus());

        let mut line = format!("ssh-rsa {}", Base64::encode_string(&blob));
        if let Some(comment) = comment.map(str::trim).filter(|c| !c.is_empty()) {
            line.push(' ');
            line.push_str(comment);
        }
        line
    }
}
