//! Sender domain extraction from raw address headers.

use once_cell::sync::Lazy;
use regex::Regex;

/// Domain reported for an empty address header.
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// Domain reported when a non-empty header yields no usable `@host`.
pub const MALFORMED_DOMAIN: &str = "malformed";

/// First angle-bracketed address, or first bare `local@host` token.
static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([^>]+)>|([^\s<>]+@[^\s<>]+)").expect("address pattern is valid")
});

/// Host part following the `@`.
static HOST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([a-zA-Z0-9.-]+)").expect("host pattern is valid"));

/// Extract the lower-cased sender domain from an address header.
///
/// # Examples
/// - `"Name <user@Example.COM>"` → `"example.com"`
/// - `"user@host.org"` → `"host.org"`
/// - `""` → `"unknown"`
/// - `"not an address"` / `"user@"` / `"<user>"` → `"malformed"`
///
/// Only the first address-like token of a multi-address header is considered.
pub fn extract_domain(raw: &str) -> String {
    if raw.is_empty() {
        return UNKNOWN_DOMAIN.to_string();
    }

    let Some(caps) = ADDRESS_RE.captures(raw) else {
        return MALFORMED_DOMAIN.to_string();
    };
    let address = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str())
        .unwrap_or_default();

    HOST_RE
        .captures(address)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_else(|| MALFORMED_DOMAIN.to_string())
}

/// Wrap a header message-id in angle brackets unless it already starts with one.
///
/// An empty id stays empty.
pub fn normalize_message_id(raw: &str) -> String {
    if raw.is_empty() || raw.starts_with('<') {
        raw.to_string()
    } else {
        format!("<{raw}>")
    }
}
