//! Short code encoding and request id generation.
//!
//! Short codes are the base62 rendering of the ordinal the mapping store
//! assigns to each new mapping, so two distinct ordinals never share a code.

use rand::Rng;

/// Symbols of the positional numeral system, in ascending digit value.
const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

const BASE: u64 = ALPHABET.len() as u64;

/// Encodes an ordinal as a base62 short code, most significant symbol first.
///
/// `encode(0)` is `"0"`. Codes never collide for different inputs and their
/// length never decreases as the input grows.
///
/// # Examples
///
/// ```
/// use relay_shortener::utils::code_generator::encode;
///
/// assert_eq!(encode(0), "0");
/// assert_eq!(encode(61), "Z");
/// assert_eq!(encode(62), "10");
/// ```
pub fn encode(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    // u64::MAX needs 11 base62 symbols.
    let mut buf = [0u8; 11];
    let mut pos = buf.len();
    while n > 0 {
        pos -= 1;
        buf[pos] = ALPHABET[(n % BASE) as usize];
        n /= BASE;
    }

    buf[pos..].iter().map(|&b| b as char).collect()
}

/// Decodes a short code back to its ordinal.
///
/// Returns `None` for empty input, symbols outside the alphabet, or values
/// that overflow `u64`.
pub fn decode(code: &str) -> Option<u64> {
    if code.is_empty() {
        return None;
    }

    code.bytes().try_fold(0u64, |acc, b| {
        let digit = symbol_value(b)?;
        acc.checked_mul(BASE)?.checked_add(digit)
    })
}

fn symbol_value(b: u8) -> Option<u64> {
    match b {
        b'0'..=b'9' => Some((b - b'0') as u64),
        b'a'..=b'z' => Some((b - b'a') as u64 + 10),
        b'A'..=b'Z' => Some((b - b'A') as u64 + 36),
        _ => None,
    }
}

/// Generates a random request id used to correlate a request with the
/// events it publishes.
pub fn generate_request_id() -> String {
    let value: u64 = rand::rng().random();
    encode(value)
}
