//! Document text extraction and PII redaction

pub mod pdf;
pub mod redact;

pub use pdf::extract_text;
pub use redact::redact_pii;
