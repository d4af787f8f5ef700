//! Email normalization for scraped and copy-pasted input.
//!
//! Addresses arrive wrapped in angle brackets, followed by sentence
//! punctuation, or with stray characters from spreadsheet exports. The
//! sanitizer reduces them to a canonical lower-cased address or rejects them.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LEADING_JUNK: Regex = Regex::new(r"^[<>\s]+").unwrap();
    static ref TRAILING_JUNK: Regex = Regex::new(r"[.,>\s]+$").unwrap();
    static ref DISALLOWED: Regex = Regex::new(r"[^A-Za-z0-9_@.+\-]").unwrap();
    static ref EMAIL_SHAPE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Returns the canonical form of `raw`, or `None` if it is not an address.
pub fn sanitize_email(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    let without_leading = LEADING_JUNK.replace(&lowered, "");
    let without_trailing = TRAILING_JUNK.replace(&without_leading, "");
    let stripped = DISALLOWED.replace_all(&without_trailing, "");
    // Removing disallowed characters can expose new trailing punctuation.
    let cleaned = TRAILING_JUNK.replace(&stripped, "").into_owned();

    if !EMAIL_SHAPE.is_match(&cleaned) {
        return None;
    }

    if looks_like_phone_number(&cleaned) {
        return None;
    }

    Some(cleaned)
}

/// Phone numbers pasted into the email column survive the shape check when
/// they carry an `@` and a dot. Ignoring separators, they are all digits.
///
/// `.`, `-` and `+` count as separators alongside `@`, so a digits-only
/// address such as `555-123@4567.89` is rejected even though it has the
/// shape of an email.
fn looks_like_phone_number(candidate: &str) -> bool {
    let mut digits = candidate
        .chars()
        .filter(|c| !matches!(c, '@' | '.' | '-' | '+'))
        .peekable();

    digits.peek().is_some() && digits.all(|c| c.is_ascii_digit())
}
