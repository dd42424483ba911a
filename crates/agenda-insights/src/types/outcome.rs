//! Terminal pipeline result types

use serde::{Deserialize, Serialize};

use super::project::ProjectRecord;

/// Pipeline stages, in execution order. A run moves strictly forward
/// through these; the first failing stage terminates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Locate,
    Stream,
    ExtractText,
    Redact,
    StructuredExtract,
    Enrich,
    Persist,
}

impl Stage {
    /// Short name used in logs and result payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Locate => "locate",
            Stage::Stream => "stream",
            Stage::ExtractText => "extract_text",
            Stage::Redact => "redact",
            Stage::StructuredExtract => "structured_extract",
            Stage::Enrich => "enrich",
            Stage::Persist => "persist",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of one pipeline run. Constructed once by the
/// orchestrator and immutable afterwards; failure messages are short and
/// never carry payload text or underlying error chains.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Completed {
        /// City the agenda belongs to, derived from the document name
        city: String,
        /// Bare document name; never an internal URL
        file_reference: String,
        /// Rows actually committed by the persist stage
        rows_committed: usize,
        /// The persisted records
        records: Vec<ProjectRecord>,
        message: String,
    },
    Failed {
        /// Stage the run terminated in
        stage: Stage,
        message: String,
    },
}

impl PipelineOutcome {
    /// Build a completed outcome with a summary message.
    pub fn completed(
        city: impl Into<String>,
        file_reference: impl Into<String>,
        records: Vec<ProjectRecord>,
        rows_committed: usize,
    ) -> Self {
        let message = format!("Persisted {} project record(s)", rows_committed);
        Self::Completed {
            city: city.into(),
            file_reference: file_reference.into(),
            rows_committed,
            records,
            message,
        }
    }

    /// Build a failed outcome for the given stage.
    pub fn failed(stage: Stage, message: impl Into<String>) -> Self {
        Self::Failed {
            stage,
            message: message.into(),
        }
    }

    /// Whether the run completed all stages.
    pub fn success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// The human-readable summary message.
    pub fn message(&self) -> &str {
        match self {
            Self::Completed { message, .. } => message,
            Self::Failed { message, .. } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_outcome() {
        let outcome = PipelineOutcome::completed("Allen", "Allen_2025-05-01.pdf", vec![], 1);
        assert!(outcome.success());
        assert!(outcome.message().contains('1'));
    }

    #[test]
    fn test_failed_outcome() {
        let outcome = PipelineOutcome::failed(Stage::Locate, "no documents matched");
        assert!(!outcome.success());
        assert_eq!(outcome.message(), "no documents matched");
    }

    #[test]
    fn test_failed_serializes_stage_name() {
        let outcome = PipelineOutcome::failed(Stage::StructuredExtract, "bad response");
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"structured_extract\""));
        assert!(json.contains("\"failed\""));
    }
}
