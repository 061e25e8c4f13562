// SPDX-License-Identifier: MIT

//! Field validators
//!
//! Pure format checks for individual field values. Each validator returns
//! the normalized value on success. An empty or whitespace-only value is
//! always [`FieldError::Missing`], never [`FieldError::InvalidFormat`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static GST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}[A-Z]{5}\d{4}[A-Z]\d[A-Z]\d$").expect("valid GST regex"));
static PAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{5}\d{4}[A-Z]$").expect("valid PAN regex"));
static IFSC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{4}0\d{6}$").expect("valid IFSC regex"));

/// Minimum and maximum length of free-text fields such as names
const TEXT_MIN: usize = 2;
const TEXT_MAX: usize = 100;

/// Why a value was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("is missing")]
    Missing,

    #[error("has an invalid format (expected {expected})")]
    InvalidFormat { expected: &'static str },
}

/// The format a field must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text such as a person, company or bank name
    Text,
    Email,
    Phone,
    Gst,
    Pan,
    Aadhar,
    Ifsc,
    AccountNumber,
}

impl FieldKind {
    /// Short description of the accepted format
    pub fn expected(&self) -> &'static str {
        match self {
            FieldKind::Text => "2 to 100 characters",
            FieldKind::Email => "an address like name@example.com",
            FieldKind::Phone => "7 to 15 digits",
            FieldKind::Gst => "15 characters like 29ABCDE1234F1Z5",
            FieldKind::Pan => "10 characters like ABCDE1234F",
            FieldKind::Aadhar => "12 digits",
            FieldKind::Ifsc => "11 characters like SBIN0001234",
            FieldKind::AccountNumber => "9 to 18 digits",
        }
    }

    /// Validate `value` and return its normalized form
    pub fn validate(&self, value: &str) -> Result<String, FieldError> {
        match self {
            FieldKind::Text => validate_text(value),
            FieldKind::Email => validate_email(value),
            FieldKind::Phone => validate_phone(value),
            FieldKind::Gst => validate_gst(value),
            FieldKind::Pan => validate_pan(value),
            FieldKind::Aadhar => validate_aadhar(value),
            FieldKind::Ifsc => validate_ifsc(value),
            FieldKind::AccountNumber => validate_account_number(value),
        }
    }
}

fn present(value: &str) -> Result<&str, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FieldError::Missing)
    } else {
        Ok(trimmed)
    }
}

fn invalid(kind: FieldKind) -> FieldError {
    FieldError::InvalidFormat {
        expected: kind.expected(),
    }
}

pub fn validate_text(value: &str) -> Result<String, FieldError> {
    let v = present(value)?;
    let len = v.chars().count();
    if !(TEXT_MIN..=TEXT_MAX).contains(&len) {
        return Err(invalid(FieldKind::Text));
    }
    Ok(v.to_string())
}

/// `local@domain` with a non-empty local part and a dotted domain.
pub fn validate_email(value: &str) -> Result<String, FieldError> {
    let v = present(value)?;
    let err = || invalid(FieldKind::Email);

    if v.chars().any(char::is_whitespace) {
        return Err(err());
    }
    let (local, domain) = v.split_once('@').ok_or_else(err)?;
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(err());
    }
    if domain.split('.').any(|label| label.is_empty()) {
        return Err(err());
    }
    Ok(v.to_lowercase())
}

/// Digits with optional separators and a leading `+`; 7 to 15 digits.
pub fn validate_phone(value: &str) -> Result<String, FieldError> {
    let v = present(value)?;
    let err = || invalid(FieldKind::Phone);

    let body = v.strip_prefix('+').unwrap_or(v);
    let mut digits = 0usize;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return Err(err()),
        }
    }
    if !(7..=15).contains(&digits) {
        return Err(err());
    }
    Ok(v.to_string())
}

pub fn validate_gst(value: &str) -> Result<String, FieldError> {
    let v = present(value)?.to_uppercase();
    if GST_RE.is_match(&v) {
        Ok(v)
    } else {
        Err(invalid(FieldKind::Gst))
    }
}

pub fn validate_pan(value: &str) -> Result<String, FieldError> {
    let v = present(value)?.to_uppercase();
    if PAN_RE.is_match(&v) {
        Ok(v)
    } else {
        Err(invalid(FieldKind::Pan))
    }
}

/// Exactly 12 digits. Spaces between digit groups are accepted and dropped.
pub fn validate_aadhar(value: &str) -> Result<String, FieldError> {
    let v: String = present(value)?
        .chars()
        .filter(|c| *c != ' ')
        .collect();
    if v.len() == 12 && v.chars().all(|c| c.is_ascii_digit()) {
        Ok(v)
    } else {
        Err(invalid(FieldKind::Aadhar))
    }
}

pub fn validate_ifsc(value: &str) -> Result<String, FieldError> {
    let v = present(value)?.to_uppercase();
    if IFSC_RE.is_match(&v) {
        Ok(v)
    } else {
        Err(invalid(FieldKind::Ifsc))
    }
}

/// 9 to 18 digits. Spaces between digit groups are accepted and dropped.
pub fn validate_account_number(value: &str) -> Result<String, FieldError> {
    let v: String = present(value)?
        .chars()
        .filter(|c| *c != ' ')
        .collect();
    if (9..=18).contains(&v.len()) && v.chars().all(|c| c.is_ascii_digit()) {
        Ok(v)
    } else {
        Err(invalid(FieldKind::AccountNumber))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_invalid(r: Result<String, FieldError>) -> bool {
        matches!(r, Err(FieldError::InvalidFormat { .. }))
    }

    #[test]
    fn test_empty_is_missing_for_every_kind() {
        for kind in [
            FieldKind::Text,
            FieldKind::Email,
            FieldKind::Phone,
            FieldKind::Gst,
            FieldKind::Pan,
            FieldKind::Aadhar,
            FieldKind::Ifsc,
            FieldKind::AccountNumber,
        ] {
            assert_eq!(kind.validate(""), Err(FieldError::Missing));
            assert_eq!(kind.validate("   "), Err(FieldError::Missing));
        }
    }

    #[test]
    fn test_email() {
        assert_eq!(
            validate_email(" John@Example.com ").unwrap(),
            "john@example.com"
        );
        assert!(is_invalid(validate_email("@example.com")));
        assert!(is_invalid(validate_email("john@localhost")));
        assert!(is_invalid(validate_email("john@@example.com")));
        assert!(is_invalid(validate_email("john doe@example.com")));
        assert!(is_invalid(validate_email("john@example.")));
    }

    #[test]
    fn test_phone() {
        assert_eq!(validate_phone("5551234").unwrap(), "5551234");
        assert!(validate_phone("+91 98765-43210").is_ok());
        assert!(validate_phone("(555) 123.4567").is_ok());
        assert!(is_invalid(validate_phone("123456")));
        assert!(is_invalid(validate_phone("1234567890123456")));
        assert!(is_invalid(validate_phone("555-CALL-NOW")));
        assert!(is_invalid(validate_phone("++5551234")));
    }

    #[test]
    fn test_gst() {
        assert_eq!(validate_gst("29abcde1234f1z5").unwrap(), "29ABCDE1234F1Z5");
        assert!(is_invalid(validate_gst("29ABCDE1234F1Z")));
        assert!(is_invalid(validate_gst("2XABCDE1234F1Z5")));
        assert!(is_invalid(validate_gst("29ABCDE1234F1ZZ")));
    }

    #[test]
    fn test_pan() {
        assert_eq!(validate_pan("abcde1234f").unwrap(), "ABCDE1234F");
        assert!(is_invalid(validate_pan("PANABC")));
        assert!(is_invalid(validate_pan("ABCD12345F")));
    }

    #[test]
    fn test_aadhar() {
        assert_eq!(validate_aadhar("1234 5678 9012").unwrap(), "123456789012");
        assert!(is_invalid(validate_aadhar("12345678901")));
        assert!(is_invalid(validate_aadhar("12345678901A")));
    }

    #[test]
    fn test_ifsc() {
        assert_eq!(validate_ifsc("sbin0001234").unwrap(), "SBIN0001234");
        assert!(is_invalid(validate_ifsc("SBIN1001234")));
        assert!(is_invalid(validate_ifsc("SBIN000123A")));
    }

    #[test]
    fn test_account_number() {
        assert!(validate_account_number("123456789").is_ok());
        assert!(validate_account_number("123456789012345678").is_ok());
        assert!(is_invalid(validate_account_number("12345678")));
        assert!(is_invalid(validate_account_number("1234567890123456789")));
        assert_eq!(
            validate_account_number("1234 5678 9012").unwrap(),
            "123456789012"
        );
        assert!(is_invalid(validate_account_number("1234 5678")));
        assert!(is_invalid(validate_account_number("1234-5678-9012")));
    }

    #[test]
    fn test_text() {
        assert_eq!(validate_text("  Tech Corp ").unwrap(), "Tech Corp");
        assert!(is_invalid(validate_text("J")));
        assert!(is_invalid(validate_text(&"x".repeat(101))));
    }

    #[test]
    fn test_error_messages_distinguish_kinds() {
        assert_eq!(FieldError::Missing.to_string(), "is missing");
        assert!(validate_pan("PANABC")
            .unwrap_err()
            .to_string()
            .starts_with("has an invalid format"));
    }
}
