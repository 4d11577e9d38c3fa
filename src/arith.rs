//! Integer routines backing the modular cipher
//!
//! Everything here works on `u64` values with `u128` intermediates, so
//! `base * base` during squaring can never overflow for any 64-bit modulus.

use rand::Rng;
use rand::seq::SliceRandom;

/// Smallest modulus for which every byte-sized code point can be encrypted.
pub const MIN_PRACTICAL_MODULUS: u64 = 256;

/// Primes offered as suggestions for `p` and `q`.
pub const COMMON_PRIMES: [u64; 66] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191,
    193, 197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293,
    307, 311, 313, 317,
];

/// Number of entries returned by [`suggest_primes`].
const SUGGESTION_COUNT: usize = 10;

/// Deterministic trial division up to the square root of `n`.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let n = n as u128;
    let mut i: u128 = 3;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// Greatest common divisor (Euclid).
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Inverse of `a` modulo `m` via the extended Euclidean algorithm.
///
/// Returns `None` when `gcd(a, m) != 1` or `m < 2`.
pub fn mod_inverse(a: u64, m: u64) -> Option<u64> {
    if m < 2 {
        return None;
    }
    let (mut old_r, mut r) = (i128::from(a % m), i128::from(m));
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_s, s) = (s, old_s - q * s);
    }
    if old_r != 1 {
        return None;
    }
    let inv = old_s.rem_euclid(i128::from(m));
    u64::try_from(inv).ok()
}

/// Computes `base^exp mod modulus` by square-and-multiply.
pub fn mod_pow(base: u64, mut exp: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let m = u128::from(modulus);
    let mut base = u128::from(base) % m;
    let mut result: u128 = 1;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * base % m;
        }
        base = base * base % m;
        exp >>= 1;
    }
    // result < modulus, which is a u64
    result as u64
}

/// First [`SUGGESTION_COUNT`] common primes that are not in `exclude`.
pub fn suggest_primes(exclude: &[u64]) -> Vec<u64> {
    COMMON_PRIMES
        .iter()
        .copied()
        .filter(|p| !exclude.contains(p))
        .take(SUGGESTION_COUNT)
        .collect()
}

/// Picks two distinct common primes whose product is at least
/// [`MIN_PRACTICAL_MODULUS`].
pub fn random_prime_pair<R: Rng + ?Sized>(rng: &mut R) -> (u64, u64) {
    loop {
        let mut picked = COMMON_PRIMES.choose_multiple(rng, 2).copied();
        if let (Some(p), Some(q)) = (picked.next(), picked.next()) {
            if p * q >= MIN_PRACTICAL_MODULUS {
                return (p, q);
            }
        }
    }
}
