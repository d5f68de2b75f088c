//! Shared validation helpers for the network adapters.

/// Every byte in `0x20..=0x7E`.  WiFi credentials must pass this.
pub(crate) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// RFC 1123 label: 1-32 chars of `[A-Za-z0-9-]`, no leading or trailing hyphen.
pub(crate) fn is_valid_hostname(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 32
        && !s.starts_with('-')
        && !s.ends_with('-')
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}
