//! Playfair digraph cipher over a 5x5 key matrix
//!
//! The matrix holds the 25-letter alphabet (A-Z with J folded into I).
//! Key letters, in order of first appearance, occupy the first cells and the
//! rest of the alphabet follows in alphabetical order.
//!
//! Text is normalized the same way as the key, then split into digraphs:
//! - a pair of identical letters is broken up by a filler letter
//! - an unpaired final letter is padded with `X`, even when it is `X` itself
//!
//! Each digraph is then substituted by one of three rules:
//! - same row: shift along the row (right to encrypt, left to decrypt)
//! - same column: shift along the column (down to encrypt, up to decrypt)
//! - otherwise: swap columns, keeping each letter's row

use crate::error::{CryptifyError, ErrorKind, Result};
use tracing::debug;

/// Side length of the key matrix
const SIZE: usize = 5;

/// The 25-letter alphabet, J omitted
const ALPHABET: &[u8; 25] = b"ABCDEFGHIKLMNOPQRSTUVWXYZ";

/// Letter used to split doubled letters and pad odd-length text
const FILLER: u8 = b'X';

/// Filler used to split a doubled [`FILLER`]
const ALT_FILLER: u8 = b'Q';

/// Whether a transform runs the substitution forward or backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    /// Row/column step, expressed as a non-negative offset modulo [`SIZE`].
    fn shift(self) -> usize {
        match self {
            Direction::Encrypt => 1,
            Direction::Decrypt => SIZE - 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigraphCipher {
    key: String,
    matrix: [[u8; SIZE]; SIZE],
    /// (row, col) of each letter, indexed by `letter - b'A'`. J shares I's slot.
    positions: [(u8, u8); 26],
}

impl DigraphCipher {
    /// Builds the key matrix from `raw_key`.
    ///
    /// Fails with [`ErrorKind::InvalidKey`] if the key contains no letters.
    pub fn new(raw_key: &str) -> Result<Self> {
        let key = dedup(normalize(raw_key));
        if key.is_empty() {
            return Err(CryptifyError::user(
                ErrorKind::InvalidKey,
                "key must contain at least one letter",
            ));
        }

        let cells = dedup(key.iter().chain(ALPHABET.iter()).copied().collect());
        let mut matrix = [[0u8; SIZE]; SIZE];
        let mut positions = [(0u8, 0u8); 26];
        for (i, &letter) in cells.iter().enumerate() {
            let (row, col) = (i / SIZE, i % SIZE);
            matrix[row][col] = letter;
            positions[usize::from(letter - b'A')] = (row as u8, col as u8);
        }
        positions[usize::from(b'J' - b'A')] = positions[usize::from(b'I' - b'A')];

        // normalize() only yields ASCII uppercase letters
        let key = key.iter().map(|&b| char::from(b)).collect::<String>();
        debug!(key_len = key.len(), "built digraph key matrix");

        Ok(Self {
            key,
            matrix,
            positions,
        })
    }

    /// The normalized, deduplicated key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// A copy of the key matrix.
    pub fn matrix_snapshot(&self) -> [[char; SIZE]; SIZE] {
        self.matrix.map(|row| row.map(char::from))
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        self.transform(plaintext, Direction::Encrypt)
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
        self.transform(ciphertext, Direction::Decrypt)
    }

    /// Normalizes `text`, splits it into digraphs and substitutes each pair.
    ///
    /// Fails with [`ErrorKind::EmptyInput`] if `text` contains no letters.
    pub fn transform(&self, text: &str, direction: Direction) -> Result<String> {
        let letters = normalize(text);
        if letters.is_empty() {
            return Err(CryptifyError::user(
                ErrorKind::EmptyInput,
                "input contains no letters",
            ));
        }

        let stream = digraph_stream(&letters);
        let shift = direction.shift();
        let mut out = String::with_capacity(stream.len());
        for pair in stream.chunks_exact(2) {
            let (a, b) = self.substitute(pair[0], pair[1], shift);
            out.push(char::from(a));
            out.push(char::from(b));
        }
        debug!(
            ?direction,
            letters = letters.len(),
            output = out.len(),
            "transformed digraphs"
        );
        Ok(out)
    }

    fn position(&self, letter: u8) -> (usize, usize) {
        let (row, col) = self.positions[usize::from(letter - b'A')];
        (usize::from(row), usize::from(col))
    }

    fn substitute(&self, a: u8, b: u8, shift: usize) -> (u8, u8) {
        let (ra, ca) = self.position(a);
        let (rb, cb) = self.position(b);
        if ra == rb {
            (
                self.matrix[ra][(ca + shift) % SIZE],
                self.matrix[rb][(cb + shift) % SIZE],
            )
        } else if ca == cb {
            (
                self.matrix[(ra + shift) % SIZE][ca],
                self.matrix[(rb + shift) % SIZE][cb],
            )
        } else {
            (self.matrix[ra][cb], self.matrix[rb][ca])
        }
    }
}

/// Uppercases, drops everything that is not an ASCII letter and folds J into I.
fn normalize(text: &str) -> Vec<u8> {
    text.bytes()
        .filter(u8::is_ascii_alphabetic)
        .map(|b| match b.to_ascii_uppercase() {
            b'J' => b'I',
            upper => upper,
        })
        .collect()
}

/// Keeps the first occurrence of each letter.
fn dedup(letters: Vec<u8>) -> Vec<u8> {
    let mut seen = [false; 26];
    letters
        .into_iter()
        .filter(|&b| !std::mem::replace(&mut seen[usize::from(b - b'A')], true))
        .collect()
}

fn split_filler_for(letter: u8) -> u8 {
    if letter == FILLER { ALT_FILLER } else { FILLER }
}

/// Rewrites `letters` into an even-length stream in which no digraph taken
/// from the input consists of two identical letters. Only the final pad can
/// produce `XX`.
fn digraph_stream(letters: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(letters.len() + letters.len() / 2 + 1);
    let mut rest = letters.iter().copied().peekable();
    while let Some(first) = rest.next() {
        out.push(first);
        match rest.peek() {
            Some(&second) if second != first => {
                out.push(second);
                rest.next();
            }
            // Identical follower stays queued and starts the next pair.
            Some(_) => out.push(split_filler_for(first)),
            None => out.push(FILLER),
        }
    }
    out
}
