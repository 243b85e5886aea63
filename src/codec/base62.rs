//! Positional base62 encoding over `0-9a-zA-Z`.

/// Symbol order: digits, then lowercase, then uppercase. Index 0 is `'0'`.
pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

const BASE: u64 = 62;

/// Length of `encode(u64::MAX)`; no valid key is longer.
pub const MAX_KEY_LEN: usize = 11;

/// Encode an id as a big-endian base62 string.
///
/// ```
/// use shortener::codec::encode;
/// assert_eq!(encode(0), "0");
/// assert_eq!(encode(61), "Z");
/// assert_eq!(encode(62), "10");
/// ```
pub fn encode(mut id: u64) -> String {
    if id == 0 {
        return (ALPHABET[0] as char).to_string();
    }

    let mut buf = [0u8; MAX_KEY_LEN];
    let mut pos = MAX_KEY_LEN;
    while id > 0 {
        pos -= 1;
        buf[pos] = ALPHABET[(id % BASE) as usize];
        id /= BASE;
    }

    // 仅包含 ASCII 字母数字
    buf[pos..].iter().map(|&b| b as char).collect()
}

/// Decode a canonical base62 key back into its id.
///
/// Returns `None` for empty input, symbols outside the alphabet, leading
/// zeros (only `"0"` itself may start with `'0'`) and values above `u64::MAX`.
pub fn decode(key: &str) -> Option<u64> {
    let bytes = key.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_KEY_LEN {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == ALPHABET[0] {
        return None;
    }

    bytes.iter().try_fold(0u64, |acc, &b| {
        let digit = symbol_value(b)?;
        acc.checked_mul(BASE)?.checked_add(digit)
    })
}

/// Whether `key` could have been produced by [`encode`].
///
/// Used by the redirect path to reject garbage before it reaches the cache.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[inline]
fn symbol_value(b: u8) -> Option<u64> {
    match b {
        b'0'..=b'9' => Some((b - b'0') as u64),
        b'a'..=b'z' => Some((b - b'a') as u64 + 10),
        b'A'..=b'Z' => Some((b - b'A') as u64 + 36),
        _ => None,
    }
}
