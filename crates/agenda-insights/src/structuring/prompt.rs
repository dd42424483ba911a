//! Extraction prompt construction
//!
//! The prompt is fixed apart from the embedded document text. Its
//! precision is part of the stage contract: the parser downstream assumes
//! the model attempts to comply with the JSON-array-only instruction but
//! tolerates one level of surrounding prose.

use crate::types::Category;

const EXTRACTION_INSTRUCTIONS: &str = r#"You are a helpful assistant that extracts structured civil/transportation project data from city council documents.

Extract ONLY projects that involve professional engineering design or review services and appear UNDER the CONSENT AGENDA or CONSENT RESOLUTION sections ONLY.
Do NOT extract projects under REGULAR AGENDA or REGULAR AGENDA ITEMS.

Include items that mention professional engineering services, design services, review services, authorizations to execute amendments/agreements, or resolutions/ordinances for engineering services.

Exclude items that mention construction/change orders, materials testing, geotechnical services, landscape architecture, real estate/leasing, purchase orders/bids, procurement of materials/equipment, or non-engineering vendors.

For each qualifying project, extract:
- date (YYYY-MM-DD)
- consultant (company name)
- amount (numeric value only; if absent, use 0)
- project_name (official title)
- category (array of one or more allowed values)
"#;

const OUTPUT_FORMAT: &str = r#"Respond in this JSON array format ONLY:
[
  {
    "date": "YYYY-MM-DD",
    "consultant": "Consultant Name",
    "amount": 123456.78,
    "project_name": "Project Title",
    "category": ["Roadway", "Traffic"]
  }
]
"#;

/// Build the full extraction prompt around the (already redacted)
/// document text.
pub fn build_extraction_prompt(document_text: &str) -> String {
    let categories = Category::ALL
        .iter()
        .map(|c| format!("'{}'", c))
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt =
        String::with_capacity(EXTRACTION_INSTRUCTIONS.len() + document_text.len() + 1024);
    prompt.push_str(EXTRACTION_INSTRUCTIONS);
    prompt.push_str("\nAllowed categories:\n[");
    prompt.push_str(&categories);
    prompt.push_str("]\n\n");
    prompt.push_str(OUTPUT_FORMAT);
    prompt.push_str("\nHere is the text:\n");
    prompt.push_str(document_text);
    prompt
}
