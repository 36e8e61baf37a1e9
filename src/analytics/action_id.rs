//! Stable identifiers for tracked actions
//!
//! The id is a 32-bit `h * 31 + unit` string hash over UTF-16 code units,
//! rendered as the absolute value in base 36. Ids from earlier recordings of
//! the same page must keep matching, so the arithmetic is fixed: wrapping `i32`
//! multiplication and addition, then `abs` widened to `i64` so `i32::MIN` maps
//! to 2147483648.

/// Version tag prefixed to every hashed action descriptor
pub const ACTION_ID_VERSION: &str = "v1";

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Hashes `input` into a short base-36 identifier
pub fn hash_base36(input: &str) -> String {
    let mut h: i32 = 0;
    for unit in input.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    to_base36(i64::from(h).unsigned_abs())
}

/// Builds the action id for a sequence of descriptor parts
///
/// Parts are joined with `|` after the version tag; missing parts should be
/// passed as empty strings so positions stay aligned.
pub fn action_id<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut descriptor = String::from(ACTION_ID_VERSION);
    for part in parts {
        descriptor.push('|');
        descriptor.push_str(part);
    }
    hash_base36(&descriptor)
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36_DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
