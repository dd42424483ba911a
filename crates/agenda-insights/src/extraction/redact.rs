//! Best-effort PII redaction
//!
//! Runs before extracted text leaves the trust boundary toward the
//! completion model. This is a surface-reduction measure, not a
//! compliance guarantee: only the three pattern families below are
//! scrubbed.

use regex::Regex;
use std::sync::LazyLock;

/// Sentinel substituted for email addresses.
pub const EMAIL_SENTINEL: &str = "[REDACTED_EMAIL]";
/// Sentinel substituted for phone-number-like digit groupings.
pub const PHONE_SENTINEL: &str = "[REDACTED_PHONE]";
/// Sentinel substituted for SSN-like groupings.
pub const SSN_SENTINEL: &str = "[REDACTED_SSN]";

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}").unwrap());

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+?1[\s\-\.]?)?(\(?\d{3}\)?[\s\-\.]?)\d{3}[\s\-\.]?\d{4}").unwrap()
});

static SSN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());

/// Replace email, phone and SSN patterns with fixed sentinels.
///
/// Total over any input, including empty. The sentinels contain no digits
/// or `@`, so applying this twice changes nothing.
pub fn redact_pii(text: &str) -> String {
    let redacted = EMAIL_PATTERN.replace_all(text, EMAIL_SENTINEL);
    let redacted = PHONE_PATTERN.replace_all(&redacted, PHONE_SENTINEL);
    let redacted = SSN_PATTERN.replace_all(&redacted, SSN_SENTINEL);
    redacted.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_email() {
        let out = redact_pii("Contact john.doe@example.com for details");
        assert!(out.contains(EMAIL_SENTINEL));
        assert!(!out.contains("john.doe@example.com"));
    }

    #[test]
    fn test_redacts_email_mixed_case() {
        let out = redact_pii("Send to John.Doe@Example.COM today");
        assert!(out.contains(EMAIL_SENTINEL));
        assert!(!out.contains("Example.COM"));
    }

    #[test]
    fn test_redacts_phone_variants() {
        for phone in [
            "555-123-4567",
            "(555) 123-4567",
            "555.123.4567",
            "5551234567",
            "+1 555-123-4567",
        ] {
            let out = redact_pii(&format!("Call {} now", phone));
            assert!(out.contains(PHONE_SENTINEL), "missed: {}", phone);
            assert!(!out.contains(phone), "leaked: {}", phone);
        }
    }

    #[test]
    fn test_redacts_ssn() {
        let out = redact_pii("SSN 123-45-6789 on file");
        assert!(out.contains(SSN_SENTINEL));
        assert!(!out.contains("123-45-6789"));
    }

    #[test]
    fn test_leaves_amounts_and_dates_alone() {
        let text = "Contract for $45,000 awarded on 2025-05-01";
        assert_eq!(redact_pii(text), text);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(redact_pii(""), "");
    }

    #[test]
    fn test_idempotent() {
        let text = "John Doe, john.doe@example.com, 555-123-4567, SSN 123-45-6789";
        let once = redact_pii(text);
        let twice = redact_pii(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_redacts_all_three_in_one_pass() {
        let out = redact_pii("John Doe, john.doe@example.com, 555-123-4567, SSN 123-45-6789");
        assert!(out.contains(EMAIL_SENTINEL));
        assert!(out.contains(PHONE_SENTINEL));
        assert!(out.contains(SSN_SENTINEL));
        assert!(!out.contains("john.doe"));
        assert!(!out.contains("123-4567"));
        assert!(!out.contains("123-45-6789"));
    }
}
