//! Textbook RSA over single characters
//!
//! A keypair is derived from two distinct primes `p` and `q`:
//! - modulus `n = p * q` and totient `phi = (p - 1) * (q - 1)`
//! - public exponent `e`: the smallest value in `[2, phi)` coprime with `phi`
//! - private exponent `d`: the inverse of `e` modulo `phi`
//!
//! Each character is encrypted independently as `m^e mod n`, where `m` is its
//! Unicode code point. There is no padding; this is a teaching cipher.

use std::fmt;

use serde::Serialize;
use tracing::debug;
use zeroize::Zeroize;

use crate::arith::{gcd, is_prime, mod_inverse, mod_pow};
use crate::codec;
use crate::error::{CryptifyError, ErrorCategory, ErrorKind, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PublicKey {
    pub e: u64,
    pub n: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrivateKey {
    pub d: u64,
    pub n: u64,
}

/// Every value involved in the keypair, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    pub p: u64,
    pub q: u64,
    pub n: u64,
    pub phi: u64,
    pub e: u64,
    pub d: u64,
}

/// Private values are wiped when the cipher is dropped and never shown by `Debug`.
#[derive(Clone)]
pub struct ModularCipher {
    p: u64,
    q: u64,
    n: u64,
    phi: u64,
    e: u64,
    d: u64,
}

impl ModularCipher {
    /// Derives the keypair for primes `p` and `q`.
    pub fn new(p: u64, q: u64) -> Result<Self> {
        check_prime("p", p)?;
        check_prime("q", q)?;
        if p == q {
            return Err(CryptifyError::user(
                ErrorKind::InvalidPrime,
                format!("p and q must be different values (both are {p})"),
            ));
        }
        let n = p.checked_mul(q).ok_or_else(|| {
            CryptifyError::user(
                ErrorKind::InvalidPrime,
                format!("product of {p} and {q} does not fit in 64 bits"),
            )
        })?;
        let phi = (p - 1) * (q - 1);

        let e = (2..phi).find(|&e| gcd(e, phi) == 1).ok_or_else(|| {
            CryptifyError::user(
                ErrorKind::KeyDerivation,
                format!("no public exponent exists for phi = {phi}"),
            )
        })?;
        // gcd(e, phi) == 1, so the inverse exists
        let d = mod_inverse(e, phi).ok_or_else(|| {
            CryptifyError::new(
                ErrorCategory::Internal,
                ErrorKind::KeyDerivation,
                format!("{e} has no inverse modulo {phi}"),
            )
        })?;

        debug!(n, e, "derived modular keypair");
        Ok(Self { p, q, n, phi, e, d })
    }

    /// Parses `p` and `q` as decimal integers, then derives the keypair.
    pub fn from_strs(p: &str, q: &str) -> Result<Self> {
        Self::new(parse_prime("p", p)?, parse_prime("q", q)?)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            e: self.e,
            n: self.n,
        }
    }

    pub fn private_key(&self) -> PrivateKey {
        PrivateKey {
            d: self.d,
            n: self.n,
        }
    }

    pub fn key_info(&self) -> KeyInfo {
        KeyInfo {
            p: self.p,
            q: self.q,
            n: self.n,
            phi: self.phi,
            e: self.e,
            d: self.d,
        }
    }

    /// Encrypts each character of `text` to `m^e mod n`.
    pub fn encrypt(&self, text: &str) -> Result<Vec<u64>> {
        if text.trim().is_empty() {
            return Err(CryptifyError::user(
                ErrorKind::EmptyInput,
                "input text cannot be empty",
            ));
        }
        let values = text
            .chars()
            .enumerate()
            .map(|(i, ch)| {
                let m = u64::from(u32::from(ch));
                if m >= self.n {
                    return Err(CryptifyError::user(
                        ErrorKind::PlaintextTooLarge,
                        format!(
                            "character {ch:?} at position {i} has code point {m}, \
                             which is not below the modulus {}",
                            self.n
                        ),
                    ));
                }
                Ok(mod_pow(m, self.e, self.n))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(chars = values.len(), "encrypted text");
        Ok(values)
    }

    /// Decrypts each value with `c^d mod n` and maps the result back to a character.
    pub fn decrypt(&self, values: &[u64]) -> Result<String> {
        if values.is_empty() {
            return Err(CryptifyError::user(
                ErrorKind::EmptyInput,
                "ciphertext cannot be empty",
            ));
        }
        let text = values
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let m = mod_pow(c, self.d, self.n);
                u32::try_from(m)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        CryptifyError::user(
                            ErrorKind::InvalidCiphertext,
                            format!(
                                "value {c} at position {i} decrypts to {m}, \
                                 which is not a valid character"
                            ),
                        )
                    })
            })
            .collect::<Result<String>>()?;
        debug!(chars = values.len(), "decrypted text");
        Ok(text)
    }

    /// Parses a JSON array of integers and decrypts it.
    pub fn decrypt_json(&self, json: &str) -> Result<String> {
        if json.trim().is_empty() {
            return Err(CryptifyError::user(
                ErrorKind::EmptyInput,
                "ciphertext cannot be empty",
            ));
        }
        let values = codec::decode(json)?;
        self.decrypt(&values)
    }
}

impl fmt::Debug for ModularCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModularCipher")
            .field("n", &self.n)
            .field("e", &self.e)
            .finish_non_exhaustive()
    }
}

impl Drop for ModularCipher {
    fn drop(&mut self) {
        self.p.zeroize();
        self.q.zeroize();
        self.phi.zeroize();
        self.d.zeroize();
    }
}

fn check_prime(name: &str, value: u64) -> Result<()> {
    if value <= 1 {
        return Err(CryptifyError::user(
            ErrorKind::InvalidPrime,
            format!("{name} must be greater than 1 (got {value})"),
        ));
    }
    if !is_prime(value) {
        return Err(CryptifyError::user(
            ErrorKind::InvalidPrime,
            format!("{name} must be a prime number ({value} is not prime)"),
        ));
    }
    Ok(())
}

fn parse_prime(name: &str, text: &str) -> Result<u64> {
    let trimmed = text.trim();
    if trimmed.starts_with('-') {
        return Err(CryptifyError::user(
            ErrorKind::InvalidPrime,
            format!("{name} must be greater than 1 (got {trimmed})"),
        ));
    }
    trimmed.parse::<u64>().map_err(|e| {
        CryptifyError::with_source(
            ErrorCategory::User,
            ErrorKind::InvalidPrime,
            format!("{name} must be a valid integer (got {trimmed:?})"),
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_cipher() -> ModularCipher {
        ModularCipher::new(17, 11).unwrap()
    }

    #[test]
    fn test_key_derivation_17_11() {
        let info = default_cipher().key_info();
        assert_eq!(info.n, 187);
        assert_eq!(info.phi, 160);
        assert_eq!(info.e, 3);
        assert_eq!(info.d, 107);
        assert_eq!(info.e * info.d % info.phi, 1);
    }

    #[test]
    fn test_public_and_private_key() {
        let cipher = default_cipher();
        assert_eq!(cipher.public_key(), PublicKey { e: 3, n: 187 });
        assert_eq!(cipher.private_key(), PrivateKey { d: 107, n: 187 });
    }

    #[test]
    fn test_e_is_smallest_coprime() {
        // phi = 4 * 10 = 40; 2 shares a factor, 3 does not
        let info = ModularCipher::new(5, 11).unwrap().key_info();
        assert_eq!(info.phi, 40);
        assert_eq!(info.e, 3);
        // phi = 6 * 12 = 72; 2, 3, 4 share factors, 5 does not
        let info = ModularCipher::new(7, 13).unwrap().key_info();
        assert_eq!(info.phi, 72);
        assert_eq!(info.e, 5);
        assert_eq!(info.e * info.d % info.phi, 1);
    }

    #[test]
    fn test_encrypt_known_values() {
        let cipher = default_cipher();
        assert_eq!(cipher.encrypt("A").unwrap(), vec![109]);
        assert_eq!(cipher.encrypt("Hi").unwrap(), vec![183, 95]);
    }

    #[test]
    fn test_roundtrip() {
        let cipher = default_cipher();
        for text in ["Hello, World!", " leading space", "a", "~!@#$%^&*()_+"] {
            let ct = cipher.encrypt(text).unwrap();
            assert_eq!(ct.len(), text.chars().count());
            assert_eq!(cipher.decrypt(&ct).unwrap(), text);
        }
    }

    #[test]
    fn test_roundtrip_many_prime_pairs() {
        let text = "The quick brown fox jumps over the lazy dog.";
        for (p, q) in [(2, 131), (13, 29), (101, 103), (251, 257), (65_521, 65_537)] {
            let cipher = ModularCipher::new(p, q).unwrap();
            let ct = cipher.encrypt(text).unwrap();
            assert_eq!(cipher.decrypt(&ct).unwrap(), text, "p={p} q={q}");
        }
    }

    #[test]
    fn test_roundtrip_unicode_with_large_modulus() {
        let cipher = ModularCipher::new(65_521, 65_537).unwrap();
        let text = "héllo wörld € 😀";
        let ct = cipher.encrypt(text).unwrap();
        assert_eq!(cipher.decrypt(&ct).unwrap(), text);
    }

    #[test]
    fn test_non_prime_rejected() {
        let err = ModularCipher::new(4, 11).expect_err("expected invalid prime");
        assert_eq!(err.kind, ErrorKind::InvalidPrime);
        let err = ModularCipher::new(11, 15).expect_err("expected invalid prime");
        assert_eq!(err.kind, ErrorKind::InvalidPrime);
    }

    #[test]
    fn test_equal_primes_rejected() {
        let err = ModularCipher::new(11, 11).expect_err("expected invalid prime");
        assert_eq!(err.kind, ErrorKind::InvalidPrime);
    }

    #[test]
    fn test_small_values_rejected() {
        for (p, q) in [(0, 11), (1, 11), (11, 1)] {
            let err = ModularCipher::new(p, q).expect_err("expected invalid prime");
            assert_eq!(err.kind, ErrorKind::InvalidPrime);
        }
    }

    #[test]
    fn test_modulus_overflow_rejected() {
        let big = 4_294_967_311; // smallest prime above 2^32
        let err = ModularCipher::new(big, 4_294_967_357).expect_err("expected overflow");
        assert_eq!(err.kind, ErrorKind::InvalidPrime);
    }

    #[test]
    fn test_degenerate_modulus() {
        // phi = 1 * 2 = 2, no e in [2, 2)
        let err = ModularCipher::new(2, 3).expect_err("expected key derivation failure");
        assert_eq!(err.kind, ErrorKind::KeyDerivation);
    }

    #[test]
    fn test_from_strs() {
        let cipher = ModularCipher::from_strs(" 17 ", "11").unwrap();
        assert_eq!(cipher.public_key().n, 187);
        for (p, q) in [("abc", "11"), ("17", "11.5"), ("-17", "11"), ("", "11")] {
            let err = ModularCipher::from_strs(p, q).expect_err("expected invalid prime");
            assert_eq!(err.kind, ErrorKind::InvalidPrime, "p={p:?} q={q:?}");
        }
    }

    #[test]
    fn test_encrypt_empty() {
        let cipher = default_cipher();
        for text in ["", "  \n\t"] {
            let err = cipher.encrypt(text).expect_err("expected empty input");
            assert_eq!(err.kind, ErrorKind::EmptyInput);
        }
    }

    #[test]
    fn test_plaintext_too_large() {
        let cipher = default_cipher();
        let err = cipher.encrypt("café").expect_err("expected too large");
        assert_eq!(err.kind, ErrorKind::PlaintextTooLarge);
        assert!(err.message().contains("position 3"));
    }

    #[test]
    fn test_decrypt_empty() {
        let err = default_cipher().decrypt(&[]).expect_err("expected empty input");
        assert_eq!(err.kind, ErrorKind::EmptyInput);
    }

    #[test]
    fn test_decrypt_reduces_values_above_modulus() {
        let cipher = default_cipher();
        // 296 = 109 + 187, the encryption of 'A' shifted by one modulus
        assert_eq!(cipher.decrypt(&[109 + 187]).unwrap(), "A");
        assert_eq!(cipher.decrypt(&[187]).unwrap(), "\0");
    }

    #[test]
    fn test_debug_hides_private_values() {
        let rendered = format!("{:?}", default_cipher());
        assert!(rendered.contains("n: 187"), "{rendered}");
        assert!(rendered.contains("e: 3"), "{rendered}");
        assert!(!rendered.contains("107"), "{rendered}");
        assert!(!rendered.contains("phi"), "{rendered}");
        assert!(!rendered.contains("p:"), "{rendered}");
    }

    #[test]
    fn test_decrypt_to_surrogate_rejected() {
        // Encrypting 0xD800 directly yields a value that decrypts to a surrogate.
        let cipher = ModularCipher::new(65_521, 65_537).unwrap();
        let info = cipher.key_info();
        let c = mod_pow(0xD800, info.e, info.n);
        let err = cipher.decrypt(&[c]).expect_err("expected invalid ciphertext");
        assert_eq!(err.kind, ErrorKind::InvalidCiphertext);
    }

    #[test]
    fn test_decrypt_json() {
        let cipher = default_cipher();
        assert_eq!(cipher.decrypt_json("[183, 95]").unwrap(), "Hi");
        let err = cipher
            .decrypt_json("[183, -95]")
            .expect_err("expected invalid ciphertext");
        assert_eq!(err.kind, ErrorKind::InvalidCiphertext);
        for json in ["[]", "", "  \n"] {
            let err = cipher.decrypt_json(json).expect_err("expected empty input");
            assert_eq!(err.kind, ErrorKind::EmptyInput, "input {json:?}");
        }
    }
}
