//! Cryptify - text encryption with the Playfair digraph cipher and textbook RSA
//!
//! Neither cipher is secure; both exist to show how the classical schemes work.

#![forbid(unsafe_code)]

pub mod arith;
pub mod codec;
pub mod commands;
pub mod digraph;
pub mod error;
pub mod file_ops;
pub mod modular;
pub mod settings;

pub use digraph::{DigraphCipher, Direction};
pub use error::{CryptifyError, ErrorCategory, ErrorKind, Result};
pub use modular::{KeyInfo, ModularCipher, PrivateKey, PublicKey};
