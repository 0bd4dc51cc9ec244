//! Timestamp normalisation
//!
//! Ledger sources disagree on how seconds-since-epoch are encoded. Every
//! representation is reduced to a `u64` before a record leaves the adapter.
//!
//! String rules: a `0x` prefix or exactly 64 characters means hex; a string
//! of decimal digits means decimal; any other string of hex digits is read
//! as hex, which is how contract reads render values without a prefix.

use crate::error::{Result, ShareError};
use medshare_client::RawTimestamp;

const FIXED_WIDTH_HEX: usize = 64;

/// Reduce any wire representation to seconds since epoch
pub fn normalize(raw: &RawTimestamp) -> Result<u64> {
    match raw {
        RawTimestamp::Integer(value) => Ok(*value),
        RawTimestamp::Text(text) => parse_text(text),
        RawTimestamp::BigNumber { hex } => parse_hex(strip_hex_prefix(hex.trim()).unwrap_or(hex.trim())),
    }
}

/// Parse a textual timestamp
pub fn parse_text(text: &str) -> Result<u64> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ShareError::InvalidTimestamp("empty timestamp".into()));
    }

    if let Some(body) = strip_hex_prefix(text) {
        return parse_hex(body);
    }
    if text.len() == FIXED_WIDTH_HEX {
        return parse_hex(text);
    }
    if text.chars().all(|c| c.is_ascii_digit()) {
        return text
            .parse::<u64>()
            .map_err(|e| ShareError::InvalidTimestamp(format!("{}: {}", text, e)));
    }
    parse_hex(text)
}

fn strip_hex_prefix(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}

fn parse_hex(body: &str) -> Result<u64> {
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ShareError::InvalidTimestamp(format!("not hex: {:?}", body)));
    }

    let significant = body.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(0);
    }
    if significant.len() > 16 {
        return Err(ShareError::InvalidTimestamp(format!(
            "value 0x{} does not fit in 64 bits",
            significant
        )));
    }

    u64::from_str_radix(significant, 16).map_err(|e| ShareError::InvalidTimestamp(e.to_string()))
}
