//! Derived identifier and contact fields for directory users.
//!
//! Every function here is pure: the same inputs always produce the same
//! output, and no input is an error. Malformed email addresses are replaced
//! by a synthetic address built from the user's mobile number (or user ID)
//! and a fixed fallback domain, so directory consumers that require a valid
//! `mail` attribute always get one when the source field was non-empty.

use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of trailing mobile characters appended to a username.
const MOBILE_SUFFIX_LEN: usize = 4;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$";

/// An email address as it should appear in the exported record, together
/// with its local part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEmail {
    pub address: String,
    pub nickname: String,
}

/// Build a username from a transliterated name and a mobile number.
///
/// Mobiles shorter than four bytes leave `base` untouched. Otherwise the
/// last four raw bytes are appended as-is, formatting characters included.
pub fn derive_username(base: &str, mobile: &str) -> String {
    if mobile.len() < MOBILE_SUFFIX_LEN {
        return base.to_string();
    }
    let mut start = mobile.len() - MOBILE_SUFFIX_LEN;
    // Degraded input can put a multi-byte character across the cut.
    while !mobile.is_char_boundary(start) {
        start -= 1;
    }
    format!("{}{}", base, &mobile[start..])
}

/// Full-string check against the accepted address shape: an ASCII local
/// part, one `@`, and a domain ending in an alphabetic TLD of two or more
/// letters.
pub fn validate_email(candidate: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"))
        .is_match(candidate)
}

/// Keep only ASCII digits and `+` from a mobile number, in order.
pub fn local_part_from_mobile(mobile: &str) -> String {
    mobile
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Strip characters outside `[A-Za-z0-9._-]` from the local part of an
/// address.
///
/// Input without `@`, with an empty domain, or whose local part is left
/// empty after cleaning is returned unchanged.
pub fn sanitize_email(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@') else {
        return email.to_string();
    };
    let cleaned: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if cleaned.is_empty() || domain.is_empty() {
        return email.to_string();
    }
    format!("{}@{}", cleaned, domain)
}

/// Decide what goes into an exported email field.
///
/// Returns `None` for an empty source value so the field is omitted. A valid
/// address passes through; anything else becomes
/// `<mobile digits or user_id>@<fallback_domain>`.
pub fn resolve_email_field(
    raw: &str,
    mobile: &str,
    user_id: &str,
    fallback_domain: &str,
) -> Option<ResolvedEmail> {
    if raw.is_empty() {
        return None;
    }

    if validate_email(raw) {
        let nickname = raw.split_once('@').map_or(raw, |(local, _)| local);
        return Some(ResolvedEmail {
            address: raw.to_string(),
            nickname: nickname.to_string(),
        });
    }

    let mut local = local_part_from_mobile(mobile);
    if local.is_empty() {
        local = user_id.to_string();
    }
    let address = format!("{}@{}", local, fallback_domain);
    debug!(user_id, "replacing malformed email");

    Some(ResolvedEmail {
        address,
        nickname: local,
    })
}
