//! JSON representation of modular-cipher output
//!
//! Ciphertext travels as a JSON array of non-negative integers, e.g.
//! `[183,95]`. Decoding is strict: anything other than an array whose
//! elements are all non-negative integers is rejected.

use serde_json::Value;

use crate::error::{CryptifyError, ErrorCategory, ErrorKind, Result};

/// Serializes ciphertext values as a compact JSON array.
pub fn encode(values: &[u64]) -> String {
    Value::from(values.to_vec()).to_string()
}

/// Parses a JSON array of non-negative integers.
///
/// An empty array is accepted here; callers decide whether that is an error.
pub fn decode(json: &str) -> Result<Vec<u64>> {
    let value: Value = serde_json::from_str(json.trim()).map_err(|e| {
        CryptifyError::with_source(
            ErrorCategory::User,
            ErrorKind::InvalidCiphertext,
            "ciphertext is not valid JSON",
            e,
        )
    })?;

    let Value::Array(items) = value else {
        return Err(CryptifyError::user(
            ErrorKind::InvalidCiphertext,
            "ciphertext must be a JSON array of integers",
        ));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_u64().ok_or_else(|| {
                CryptifyError::user(
                    ErrorKind::InvalidCiphertext,
                    format!("element {i} ({item}) is not a non-negative integer"),
                )
            })
        })
        .collect()
}
