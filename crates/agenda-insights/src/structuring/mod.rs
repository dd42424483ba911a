//! Structured extraction of project records from agenda text

pub mod parser;
pub mod prompt;

pub use parser::parse_model_response;
pub use prompt::build_extraction_prompt;

use std::sync::Arc;

use crate::error::Result;
use crate::providers::CompletionModel;
use crate::types::ProjectRecord;

/// Turns redacted agenda text into validated project records by prompting
/// a completion model and parsing its response.
pub struct StructuredExtractor {
    model: Arc<dyn CompletionModel>,
    max_tokens: u32,
}

impl StructuredExtractor {
    pub fn new(model: Arc<dyn CompletionModel>, max_tokens: u32) -> Self {
        Self { model, max_tokens }
    }

    /// Extract all consent-agenda project records from the document text.
    ///
    /// The call is total over document content: any text is accepted, and
    /// a well-formed response with no qualifying projects yields an empty
    /// list. Model transport and parse failures surface as errors.
    pub async fn extract(&self, document_text: &str) -> Result<Vec<ProjectRecord>> {
        let prompt = build_extraction_prompt(document_text);
        tracing::debug!(
            model = self.model.name(),
            prompt_chars = prompt.len(),
            "Requesting structured extraction"
        );

        let response = self.model.complete(&prompt, self.max_tokens).await?;
        let records = parse_model_response(&response)?;

        tracing::info!(
            model = self.model.name(),
            records = records.len(),
            "Structured extraction complete"
        );
        Ok(records)
    }
}
