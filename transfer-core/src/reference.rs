//! Transfer reference generation
//!
//! References correlate provider webhooks back to transfers: providers only
//! echo the metadata they were given at payment creation, so the reference
//! is the sole lookup key available to webhook handlers and must be unique
//! under concurrent submission. Timestamp-derived codes collide; these are
//! drawn from 48 bits of RNG entropy with a mod-97 check.

use crate::error::{Error, Result};
use rand::RngCore;
use std::fmt;

const PREFIX: &str = "KP-";
const TOKEN_LEN: usize = 12;

/// Unique human-readable transfer code (`KP-XXXXXXXXXXXX-CC`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferReference(String);

impl TransferReference {
    /// Generate a fresh reference
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_LEN / 2];
        rand::thread_rng().fill_bytes(&mut bytes);

        let token: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
        let check = checksum(&token);
        Self(format!("{PREFIX}{token}-{check:02}"))
    }

    /// Validate shape and check digits of an incoming reference
    pub fn parse(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| Error::InvalidReference(s.to_string()))?;

        let (token, check) = rest
            .split_once('-')
            .ok_or_else(|| Error::InvalidReference(s.to_string()))?;

        if token.len() != TOKEN_LEN || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidReference(s.to_string()));
        }

        let expected: u8 = check
            .parse()
            .map_err(|_| Error::InvalidReference(s.to_string()))?;
        if check.len() != 2 || expected != checksum(token) {
            return Err(Error::InvalidReference(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }

    /// The reference as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransferReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<TransferReference> for String {
    fn from(r: TransferReference) -> Self {
        r.0
    }
}

/// ISO 7064 style mod-97 check over the token bytes
fn checksum(token: &str) -> u8 {
    let acc = token
        .bytes()
        .fold(0u32, |acc, b| (acc * 256 + u32::from(b)) % 97);
    acc as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_reference_parses() {
        let r = TransferReference::generate();
        let parsed = TransferReference::parse(r.as_str()).unwrap();
        assert_eq!(parsed, r);
    }

    #[test]
    fn test_shape() {
        let r = TransferReference::generate();
        let s = r.as_str();
        assert!(s.starts_with("KP-"));
        // KP- + 12 hex + - + 2 digits
        assert_eq!(s.len(), 3 + 12 + 1 + 2);
    }

    #[test]
    fn test_no_collision_in_burst() {
        // Timestamp schemes collide under concurrent submission; entropy
        // must not within any realistic burst.
        let refs: HashSet<String> = (0..10_000)
            .map(|_| TransferReference::generate().into())
            .collect();
        assert_eq!(refs.len(), 10_000);
    }

    #[test]
    fn test_rejects_tampered_reference() {
        let r = TransferReference::generate();
        let mut s = r.as_str().to_string();
        // Flip one token character
        let flipped = if s.as_bytes()[3] == b'A' { "B" } else { "A" };
        s.replace_range(3..4, flipped);
        assert!(TransferReference::parse(&s).is_err());
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "",
            "KP-",
            "KP-123",
            "XX-AAAAAAAAAAAA-00",
            "KP-ZZZZZZZZZZZZ-00",
            "KP-AAAAAAAAAAAA-999",
        ] {
            assert!(TransferReference::parse(bad).is_err(), "{bad}");
        }
    }
}
