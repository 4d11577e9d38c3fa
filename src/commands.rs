//! Cipher operations as invoked by the command-line front-end
//!
//! Each call builds a fresh cipher from the supplied key material, so a
//! failure never depends on state left behind by an earlier run.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::codec;
use crate::digraph::{DigraphCipher, Direction};
use crate::error::{CryptifyError, ErrorCategory, ErrorKind, Result};
use crate::file_ops;
use crate::modular::ModularCipher;
use crate::settings::KeyMaterial;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Playfair,
    Rsa,
}

/// Encrypts or decrypts `input` with the cipher selected by `method`.
///
/// RSA ciphertext is read and written as a JSON array of integers.
pub fn process(
    method: Method,
    direction: Direction,
    material: &KeyMaterial,
    input: &str,
) -> Result<String> {
    debug!(?method, ?direction, "processing input");
    match method {
        Method::Playfair => {
            let cipher = digraph_cipher(material)?;
            cipher.transform(input, direction)
        }
        Method::Rsa => {
            let cipher = ModularCipher::from_strs(&material.p, &material.q)?;
            match direction {
                Direction::Encrypt => Ok(codec::encode(&cipher.encrypt(input)?)),
                Direction::Decrypt => cipher.decrypt_json(input),
            }
        }
    }
}

/// Reads input from `input_path` (or stdin), processes it and writes the
/// result to `output_path` (or stdout).
///
/// Nothing is written unless processing succeeded.
pub fn process_file(
    method: Method,
    direction: Direction,
    material: &KeyMaterial,
    input_path: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<()> {
    let input = file_ops::read_input(input_path)?;
    let verb = match direction {
        Direction::Encrypt => "encryption failed",
        Direction::Decrypt => "decryption failed",
    };
    let output = process(method, direction, material, &input).map_err(|e| e.with_context(verb))?;
    file_ops::write_output(output_path, &output)?;
    info!(?method, ?direction, "wrote result");
    Ok(())
}

/// Renders the Playfair key matrix as five rows of space-separated letters.
pub fn matrix(material: &KeyMaterial) -> Result<String> {
    let cipher = digraph_cipher(material)?;
    let rows: Vec<String> = cipher
        .matrix_snapshot()
        .iter()
        .map(|row| {
            row.iter()
                .map(char::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    Ok(rows.join("\n"))
}

/// Pretty-printed JSON of every value in the RSA keypair.
pub fn key_report(material: &KeyMaterial) -> Result<String> {
    let cipher = ModularCipher::from_strs(&material.p, &material.q)?;
    to_pretty_json(&cipher.key_info())
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        CryptifyError::with_source(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            "failed to serialize key report",
            e,
        )
    })
}

fn digraph_cipher(material: &KeyMaterial) -> Result<DigraphCipher> {
    let key = material.key.as_deref().ok_or_else(|| {
        CryptifyError::user(ErrorKind::InvalidKey, "a Playfair key is required")
    })?;
    DigraphCipher::new(key)
}
