use once_cell::sync::Lazy;
use predicate_core::is_placeholder;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};

// 510(k) numbers: "K" followed by six digits
static K_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^k\s?(\d{6})$").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClearanceNumber {
    pub raw: String,
    pub normalized: String,
}

impl ClearanceNumber {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let caps = K_NUMBER
            .captures(input)
            .ok_or_else(|| MatchError::InvalidClearanceNumber(input.to_string()))?;

        Ok(Self {
            raw: input.to_string(),
            normalized: format!("K{}", &caps[1]),
        })
    }

    pub fn is_clearance_number(input: &str) -> bool {
        K_NUMBER.is_match(input.trim())
    }
}

impl std::fmt::Display for ClearanceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.normalized)
    }
}

/// Canonical clearance key for a raw identifier from a response body.
///
/// K numbers are upper-cased; other identifiers (De Novo, PMA) are kept as
/// trimmed text. Placeholders yield `None`.
pub fn clearance_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if is_placeholder(trimmed) {
        return None;
    }
    match ClearanceNumber::parse(trimmed) {
        Ok(number) => Some(number.normalized),
        Err(_) => Some(trimmed.to_string()),
    }
}
