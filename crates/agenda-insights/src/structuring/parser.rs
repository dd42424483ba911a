//! Tolerant recovery of project records from model responses
//!
//! The model is instructed to answer with a bare JSON array, but may wrap
//! it in prose. Recovery is two-tier: accept a trimmed response that is
//! already an array verbatim, otherwise take the single greedy `[ ... ]`
//! span (first `[` to last `]`, spanning newlines). Anything more
//! ambiguous than one level of wrapping fails closed.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::types::{Category, ProjectRecord, RawProjectData};

static ARRAY_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

/// Parse a raw model response into validated project records.
///
/// `Err` signals total stage failure; `Ok(vec![])` is a successful parse
/// that found no records, which the orchestrator treats separately.
pub fn parse_model_response(response: &str) -> Result<Vec<ProjectRecord>> {
    let candidate = match extract_array_span(response) {
        Some(span) => span,
        None => {
            // The raw response goes to the internal log sink only; the
            // error message stays short.
            tracing::debug!("No JSON array in model response: {}", response);
            return Err(Error::parse("response contains no JSON array"));
        }
    };

    let raw: Vec<RawProjectData> = serde_json::from_str(candidate).map_err(|e| {
        tracing::debug!("Model response candidate did not deserialize: {}", candidate);
        Error::parse(format!("response array did not deserialize: {}", e))
    })?;

    raw.into_iter().map(validate_record).collect()
}

/// Locate the candidate JSON array text within a response.
fn extract_array_span(response: &str) -> Option<&str> {
    let trimmed = response.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        return Some(trimmed);
    }
    ARRAY_SPAN.find(trimmed).map(|m| m.as_str())
}

/// Strict schema validation on one deserialized record.
///
/// Missing fields have already taken their zero values; present fields
/// must be well-formed: non-negative amount, ISO date, categories from
/// the closed vocabulary. Any violation fails the whole stage.
fn validate_record(raw: RawProjectData) -> Result<ProjectRecord> {
    if raw.amount < 0.0 {
        return Err(Error::parse(format!(
            "negative amount {} for project '{}'",
            raw.amount, raw.project_name
        )));
    }

    let date = NaiveDate::parse_from_str(raw.date.trim(), "%Y-%m-%d").map_err(|_| {
        Error::parse(format!(
            "invalid date '{}' for project '{}'",
            raw.date, raw.project_name
        ))
    })?;

    let categories = raw
        .category
        .iter()
        .map(|name| {
            Category::parse(name)
                .ok_or_else(|| Error::parse(format!("unknown category '{}'", name)))
        })
        .collect::<Result<Vec<Category>>>()?;

    Ok(ProjectRecord {
        date,
        consultant: raw.consultant.trim().to_string(),
        amount: raw.amount,
        project_name: raw.project_name.trim().to_string(),
        categories,
        region: String::new(),
        discipline: String::new(),
    })
}
