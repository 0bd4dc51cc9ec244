//! Participant addresses
//!
//! Addresses compare case-insensitively, so they are stored lowercase.
//! User-entered receivers go through [`Address::parse_checked`], which also
//! enforces the EIP-55 mixed-case checksum when one is present.

use crate::error::{Result, ShareError};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Participant identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Normalise an identifier coming from a trusted source
    ///
    /// Only requires a non-empty token without whitespace.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(ShareError::InvalidAddress(raw.as_ref().to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Validate a user-entered address: `0x` plus 40 hex digits, and a
    /// correct checksum if the digits are mixed case
    pub fn parse_checked(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix("0x")
            .ok_or_else(|| ShareError::InvalidAddress(raw.to_string()))?;

        if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ShareError::InvalidAddress(raw.to_string()));
        }

        let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && checksum_body(&body.to_ascii_lowercase()) != body {
            return Err(ShareError::InvalidAddress(format!("{} (checksum mismatch)", raw)));
        }

        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// EIP-55 rendering, or the stored form for non-hex identifiers
    pub fn to_checksum(&self) -> String {
        match self.0.strip_prefix("0x") {
            Some(body) if body.len() == 40 && body.chars().all(|c| c.is_ascii_hexdigit()) => {
                format!("0x{}", checksum_body(body))
            }
            _ => self.0.clone(),
        }
    }

    /// `0x1234...abcd`
    pub fn short(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 10 {
            return self.0.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

fn checksum_body(lower_body: &str) -> String {
    let hash = hex::encode(Keccak256::digest(lower_body.as_bytes()));
    lower_body
        .chars()
        .zip(hash.chars())
        .map(|(c, h)| {
            if c.is_ascii_alphabetic() && h.to_digit(16).unwrap_or(0) >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

impl TryFrom<String> for Address {
    type Error = ShareError;

    fn try_from(value: String) -> Result<Self> {
        Address::new(value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: [&str; 4] = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn test_checksummed_addresses_are_accepted() {
        for raw in CHECKSUMMED {
            let address = Address::parse_checked(raw).unwrap();
            assert_eq!(address.as_str(), raw.to_ascii_lowercase());
            assert_eq!(address.to_checksum(), raw);
        }
    }

    #[test]
    fn test_bad_checksum_is_rejected() {
        let err = Address::parse_checked("0x5aaEb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_single_case_skips_checksum() {
        assert!(Address::parse_checked("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_ok());
        assert!(Address::parse_checked("0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED").is_ok());
    }

    #[test]
    fn test_syntax_errors() {
        assert!(Address::parse_checked("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_err());
        assert!(Address::parse_checked("0x5aaeb6053f").is_err());
        assert!(Address::parse_checked("0xzzaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_err());
    }

    #[test]
    fn test_equality_ignores_case() {
        let a = Address::new("0xABCDEF0000000000000000000000000000000001").unwrap();
        let b = Address::new("0xabcdef0000000000000000000000000000000001").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.short(), "0xabcd...0001");
    }

    #[test]
    fn test_short_form_of_non_ascii_identifier() {
        let odd = Address::new("aééééééééééé").unwrap();
        assert_eq!(odd.short(), "aééééé...éééé");
        assert_eq!(Address::new("0xé").unwrap().short(), "0xé");
    }
}
