//! Input format checks run before any network call.

use std::sync::LazyLock;

use regex::Regex;

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1[3-9]\d{9}$").expect("phone pattern is valid"));
static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{6}$").expect("code pattern is valid"));

/// Mainland mobile number: 11 digits, starting with `1` then `3`-`9`.
pub fn is_valid_phone(s: &str) -> bool {
    s.is_ascii() && PHONE.is_match(s)
}

/// Six ASCII decimal digits.
pub fn is_valid_code(s: &str) -> bool {
    s.is_ascii() && CODE.is_match(s)
}
