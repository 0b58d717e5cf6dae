//! Phone number checks for SMS and WhatsApp dispatch.
//!
//! Providers reject anything that is not E.164, so numbers are normalized
//! and shape-checked before a message create request is ever issued.

use std::sync::LazyLock;

use regex::Regex;

/// E.164: a `+`, a non-zero leading digit, at most 15 digits total.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{1,14}$").expect("valid phone pattern"));

/// Strip the separators people type into phone fields.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect()
}

/// Whether a normalized number has a plausible E.164 shape.
pub fn is_plausible_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}
