use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// Use of Internal is never a guarantee the error is not caused by the
    /// user - merely that it cannot be confidently determined by the code.
    Internal,

    /// The user provided invalid key material or input text.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The Playfair key contains no letters after normalization.
    InvalidKey,
    /// The text to transform is empty, whitespace-only, or has no usable letters.
    EmptyInput,
    /// RSA primes are not integers, not greater than 1, not prime, or equal.
    InvalidPrime,
    /// No public exponent exists for the modulus (phi too small).
    KeyDerivation,
    /// A character's code point is not smaller than the modulus.
    PlaintextTooLarge,
    /// Ciphertext is not a well-formed sequence of non-negative integers,
    /// or does not decrypt to valid characters.
    InvalidCiphertext,
    /// The settings file is not valid JSON or has fields of the wrong type.
    InvalidSettings,
    /// A condition the code assumes can never happen did happen.
    InternalInvariant,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct CryptifyError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Specific condition tag for consumers that need to branch their behavior.
    pub kind: ErrorKind,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl CryptifyError {
    /// Creates a new error tagged with a category and kind.
    pub fn new(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind,
            source: None,
            msg: msg.into(),
        }
    }

    /// Shorthand for the common case of invalid user input.
    pub fn user(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self::new(ErrorCategory::User, kind, msg)
    }

    /// Creates a new error that retains the originating source error.
    pub fn with_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind,
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }

    /// Renders the message followed by every source in the chain, separated by ": ".
    pub fn chain_message(&self) -> String {
        let mut out = self.msg.clone();
        let mut next = StdError::source(self);
        while let Some(err) = next {
            out.push_str(": ");
            out.push_str(&err.to_string());
            next = err.source();
        }
        out
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CryptifyError>;
