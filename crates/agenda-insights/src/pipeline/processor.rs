//! Pipeline orchestrator for one agenda document
//!
//! Stages run strictly in order: locate, stream, extract text, redact,
//! structured extract, enrich, persist. The first failing stage ends the
//! run with a failed outcome naming that stage; later stages never
//! execute and nothing is rolled back. Outcome messages are short fixed
//! strings; upstream error detail goes to the log sink only, and log
//! lines carry identifiers and counts only, never document text.
//!
//! Concurrent runs for the same document are not coordinated here; they
//! race independently, and the storage identity index keeps the winner's
//! rows from being duplicated by the loser.

use regex::Regex;
use std::sync::{Arc, LazyLock};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::enrich::apply_location_metadata;
use crate::error::{Error, Result};
use crate::extraction::{extract_text, redact_pii};
use crate::providers::DocumentSource;
use crate::storage::InsightsDb;
use crate::structuring::StructuredExtractor;
use crate::types::{PipelineOutcome, ProjectRecord, Stage};

static CITY_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([^_]+)_").unwrap());

/// Runs agenda documents through the full pipeline
pub struct AgendaProcessor {
    source: Arc<dyn DocumentSource>,
    extractor: StructuredExtractor,
    db: Arc<InsightsDb>,
    config: Arc<AppConfig>,
}

impl AgendaProcessor {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        extractor: StructuredExtractor,
        db: Arc<InsightsDb>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            source,
            extractor,
            db,
            config,
        }
    }

    /// Process one document end to end.
    ///
    /// Total over its inputs: every failure is folded into a failed
    /// outcome, so the caller always gets a terminal result.
    pub async fn process_document(&self, location_id: &str, item_id: &str) -> PipelineOutcome {
        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, location_id, item_id, "Pipeline run started");

        // Locate
        let location = match self.config.location(location_id) {
            Some(location) => location.clone(),
            None => {
                return fail_run(
                    run_id,
                    Stage::Locate,
                    format!("unknown location '{}'", location_id),
                );
            }
        };

        let documents = match self
            .source
            .list_documents(&location.site_path, &location.library, item_id)
            .await
        {
            Ok(documents) => documents,
            Err(e) => return fail_run_from(run_id, Stage::Locate, &e, "document lookup failed"),
        };

        // The list item carries one agenda file; process the first entry.
        let Some(document) = documents.into_iter().next() else {
            return fail_run(
                run_id,
                Stage::Locate,
                format!("no documents attached to item '{}'", item_id),
            );
        };

        let file_reference = document.name.clone();
        let city = city_from_name(&file_reference);
        tracing::info!(%run_id, file = %file_reference, city = %city, "Document located");

        // Stream
        let data = match self
            .source
            .open_stream(&document.drive_id, &document.item_id)
            .await
        {
            Ok(data) => data,
            Err(e) => return fail_run_from(run_id, Stage::Stream, &e, "document download failed"),
        };
        if data.is_empty() {
            return fail_run(
                run_id,
                Stage::Stream,
                format!("empty content stream for '{}'", file_reference),
            );
        }

        // ExtractText
        let text = extract_text(&data);
        if text.trim().is_empty() {
            return fail_run(
                run_id,
                Stage::ExtractText,
                format!("no text extracted from '{}'", file_reference),
            );
        }
        tracing::info!(%run_id, chars = text.len(), "Text extracted");

        // Redact
        let redacted = redact_pii(&text);

        // StructuredExtract
        let mut records = match self.extractor.extract(&redacted).await {
            Ok(records) => records,
            Err(e) => {
                return fail_run_from(
                    run_id,
                    Stage::StructuredExtract,
                    &e,
                    "failed to extract project data from the model",
                )
            }
        };
        if records.is_empty() {
            return fail_run(run_id, Stage::StructuredExtract, "no project records extracted");
        }

        // Enrich
        apply_location_metadata(&mut records, &location.region, &location.discipline);

        // Persist
        let committed = match self.persist(&city, &file_reference, &records) {
            Ok(committed) => committed,
            // The shortfall message carries counts only, safe to surface.
            Err(e @ Error::PartialPersistence { .. }) => {
                return fail_run(run_id, Stage::Persist, e.to_string())
            }
            Err(e) => {
                return fail_run_from(run_id, Stage::Persist, &e, "failed to persist project records")
            }
        };

        tracing::info!(%run_id, rows = committed, "Pipeline run completed");
        PipelineOutcome::completed(city, file_reference, records, committed)
    }

    /// Insert the records, requiring every one to commit.
    fn persist(&self, city: &str, file_reference: &str, records: &[ProjectRecord]) -> Result<usize> {
        let submitted = records.len();
        let committed = self.db.insert_records(city, file_reference, records)?;
        if committed != submitted {
            return Err(Error::PartialPersistence {
                committed,
                submitted,
            });
        }
        Ok(committed)
    }
}

fn fail_run(run_id: Uuid, stage: Stage, message: impl Into<String>) -> PipelineOutcome {
    let message = message.into();
    tracing::error!(%run_id, stage = %stage, "Pipeline run failed: {}", message);
    PipelineOutcome::failed(stage, message)
}

/// Fold an upstream error into a failed outcome. The error detail goes to
/// the log only; the outcome carries the short fixed message.
fn fail_run_from(run_id: Uuid, stage: Stage, error: &Error, message: &'static str) -> PipelineOutcome {
    tracing::error!(%run_id, stage = %stage, error = %error, "Pipeline run failed: {}", message);
    PipelineOutcome::failed(stage, message)
}

/// Derive the city from a document name like `Allen_2025-05-01.pdf`.
/// Falls back to the file stem when there is no underscore prefix.
fn city_from_name(name: &str) -> String {
    if let Some(captures) = CITY_PREFIX.captures(name) {
        return captures[1].to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocationConfig;
    use crate::extraction::pdf::tests::build_pdf;
    use crate::providers::{CompletionModel, SourceDocument};
    use async_trait::async_trait;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockSource {
        documents: Vec<SourceDocument>,
        content: Bytes,
        found: bool,
        list_calls: AtomicUsize,
        stream_calls: AtomicUsize,
    }

    impl MockSource {
        fn serving(name: &str, content: Vec<u8>) -> Self {
            Self {
                documents: vec![SourceDocument {
                    name: name.to_string(),
                    drive_id: "drive-1".to_string(),
                    item_id: "file-1".to_string(),
                }],
                content: Bytes::from(content),
                found: true,
                list_calls: AtomicUsize::new(0),
                stream_calls: AtomicUsize::new(0),
            }
        }

        fn missing() -> Self {
            Self {
                documents: Vec::new(),
                content: Bytes::new(),
                found: false,
                list_calls: AtomicUsize::new(0),
                stream_calls: AtomicUsize::new(0),
            }
        }

        fn empty_listing() -> Self {
            Self {
                documents: Vec::new(),
                content: Bytes::new(),
                found: true,
                list_calls: AtomicUsize::new(0),
                stream_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DocumentSource for MockSource {
        async fn list_documents(
            &self,
            _site_path: &str,
            _library_name: &str,
            item_id: &str,
        ) -> Result<Vec<SourceDocument>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if !self.found {
                return Err(Error::not_found(format!("item {} not found", item_id)));
            }
            Ok(self.documents.clone())
        }

        async fn open_stream(&self, _drive_id: &str, _item_id: &str) -> Result<Bytes> {
            self.stream_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.content.clone())
        }

        fn name(&self) -> &str {
            "mock-source"
        }
    }

    struct MockModel {
        response: String,
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl MockModel {
        fn replying(response: &str) -> Self {
            Self {
                response: response.to_string(),
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl CompletionModel for MockModel {
        async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().push(prompt.to_string());
            Ok(self.response.clone())
        }

        fn name(&self) -> &str {
            "mock-model"
        }

        fn model(&self) -> &str {
            "mock"
        }
    }

    struct FailingModel {
        message: &'static str,
    }

    #[async_trait]
    impl CompletionModel for FailingModel {
        async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            Err(Error::model(self.message))
        }

        fn name(&self) -> &str {
            "failing-model"
        }

        fn model(&self) -> &str {
            "failing"
        }
    }

    fn test_config() -> Arc<AppConfig> {
        let mut config = AppConfig::default();
        config.locations.insert(
            "allen".to_string(),
            LocationConfig {
                site_path: "/sites/AllenClerk".to_string(),
                library: "Agendas".to_string(),
                region: "North Texas".to_string(),
                discipline: "Civil".to_string(),
            },
        );
        Arc::new(config)
    }

    fn build_processor(
        source: Arc<MockSource>,
        model: Arc<dyn CompletionModel>,
        db: Arc<InsightsDb>,
    ) -> AgendaProcessor {
        AgendaProcessor::new(source, StructuredExtractor::new(model, 2000), db, test_config())
    }

    fn failed_stage(outcome: &PipelineOutcome) -> Stage {
        match outcome {
            PipelineOutcome::Failed { stage, .. } => *stage,
            PipelineOutcome::Completed { .. } => panic!("expected failed outcome"),
        }
    }

    fn sample_response() -> &'static str {
        r#"[{"date":"2025-05-01","consultant":"Acme Engineering","amount":45000,"project_name":"Main St Design","category":["Roadway"]}]"#
    }

    #[tokio::test]
    async fn test_happy_path_persists_enriched_records() {
        let pdf = build_pdf(&[
            "CONSENT AGENDA Item 5: Award design contract for Main St to Acme Engineering for $45,000. Contact jane.doe@allen.gov or 555-123-4567.",
        ]);
        let source = Arc::new(MockSource::serving("Allen_2025-05-01.pdf", pdf));
        let model = Arc::new(MockModel::replying(&format!(
            "Sure! Here you go: {} Let me know if you need anything else.",
            sample_response()
        )));
        let db = Arc::new(InsightsDb::in_memory().unwrap());
        let processor = build_processor(source.clone(), model.clone(), db.clone());

        let outcome = processor.process_document("allen", "42").await;

        match outcome {
            PipelineOutcome::Completed {
                city,
                file_reference,
                rows_committed,
                records,
                ..
            } => {
                assert_eq!(city, "Allen");
                assert_eq!(file_reference, "Allen_2025-05-01.pdf");
                assert_eq!(rows_committed, 1);
                assert_eq!(records[0].region, "North Texas");
                assert_eq!(records[0].discipline, "Civil");
            }
            PipelineOutcome::Failed { stage, message } => {
                panic!("run failed at {}: {}", stage, message)
            }
        }

        let rows = db.recent_insights(10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].city, "Allen");
        assert_eq!(rows[0].project_name, "Main St Design");
        assert_eq!(rows[0].region, "North Texas");
        assert_eq!(source.stream_calls.load(Ordering::SeqCst), 1);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prompt_carries_sentinels_not_raw_pii() {
        let pdf = build_pdf(&[
            "Contact jane.doe@allen.gov or 555-123-4567. SSN on file: 123-45-6789. Budget $45,000 awarded on 2025-05-01.",
        ]);
        let source = Arc::new(MockSource::serving("Allen_2025-05-01.pdf", pdf));
        let model = Arc::new(MockModel::replying(sample_response()));
        let db = Arc::new(InsightsDb::in_memory().unwrap());
        let processor = build_processor(source, model.clone(), db);

        processor.process_document("allen", "42").await;

        let prompt = model.last_prompt();
        assert!(prompt.contains("[REDACTED_EMAIL]"));
        assert!(prompt.contains("[REDACTED_PHONE]"));
        assert!(prompt.contains("[REDACTED_SSN]"));
        assert!(!prompt.contains("jane.doe@allen.gov"));
        assert!(!prompt.contains("555-123-4567"));
        assert!(!prompt.contains("123-45-6789"));
        // Non-PII content survives redaction
        assert!(prompt.contains("$45,000"));
        assert!(prompt.contains("2025-05-01"));
    }

    #[tokio::test]
    async fn test_unknown_location_fails_at_locate() {
        let source = Arc::new(MockSource::serving("Allen_2025-05-01.pdf", build_pdf(&["x"])));
        let model = Arc::new(MockModel::replying(sample_response()));
        let db = Arc::new(InsightsDb::in_memory().unwrap());
        let processor = build_processor(source.clone(), model.clone(), db);

        let outcome = processor.process_document("frisco", "42").await;

        assert_eq!(failed_stage(&outcome), Stage::Locate);
        assert_eq!(source.list_calls.load(Ordering::SeqCst), 0);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_item_short_circuits_downstream_stages() {
        let source = Arc::new(MockSource::missing());
        let model = Arc::new(MockModel::replying(sample_response()));
        let db = Arc::new(InsightsDb::in_memory().unwrap());
        let processor = build_processor(source.clone(), model.clone(), db.clone());

        let outcome = processor.process_document("allen", "42").await;

        assert_eq!(failed_stage(&outcome), Stage::Locate);
        assert_eq!(source.stream_calls.load(Ordering::SeqCst), 0);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert!(db.recent_insights(10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_document_list_fails_at_locate() {
        let source = Arc::new(MockSource::empty_listing());
        let model = Arc::new(MockModel::replying(sample_response()));
        let db = Arc::new(InsightsDb::in_memory().unwrap());
        let processor = build_processor(source.clone(), model.clone(), db.clone());

        let outcome = processor.process_document("allen", "42").await;

        assert_eq!(failed_stage(&outcome), Stage::Locate);
        assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.stream_calls.load(Ordering::SeqCst), 0);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert!(db.recent_insights(10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_stream_fails_at_stream() {
        let source = Arc::new(MockSource::serving("Allen_2025-05-01.pdf", Vec::new()));
        let model = Arc::new(MockModel::replying(sample_response()));
        let db = Arc::new(InsightsDb::in_memory().unwrap());
        let processor = build_processor(source, model.clone(), db);

        let outcome = processor.process_document("allen", "42").await;

        assert_eq!(failed_stage(&outcome), Stage::Stream);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreadable_document_fails_at_extract_text() {
        let source = Arc::new(MockSource::serving(
            "Allen_2025-05-01.pdf",
            b"not a pdf at all".to_vec(),
        ));
        let model = Arc::new(MockModel::replying(sample_response()));
        let db = Arc::new(InsightsDb::in_memory().unwrap());
        let processor = build_processor(source, model.clone(), db);

        let outcome = processor.process_document("allen", "42").await;

        assert_eq!(failed_stage(&outcome), Stage::ExtractText);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_model_failure_fails_at_structured_extract() {
        let source = Arc::new(MockSource::serving("Allen_2025-05-01.pdf", build_pdf(&["agenda text"])));
        let model = Arc::new(FailingModel {
            message: "completion backend unavailable",
        });
        let db = Arc::new(InsightsDb::in_memory().unwrap());
        let processor = build_processor(source, model, db.clone());

        let outcome = processor.process_document("allen", "42").await;

        assert_eq!(failed_stage(&outcome), Stage::StructuredExtract);
        assert!(db.recent_insights(10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_outcome_omits_upstream_error_detail() {
        let source = Arc::new(MockSource::serving("Allen_2025-05-01.pdf", build_pdf(&["agenda text"])));
        let model = Arc::new(FailingModel {
            message: "Completion failed (429): {\"error\":{\"message\":\"quota exhausted on deployment gpt-4o\"}}",
        });
        let db = Arc::new(InsightsDb::in_memory().unwrap());
        let processor = build_processor(source, model, db);

        let outcome = processor.process_document("allen", "42").await;

        assert_eq!(failed_stage(&outcome), Stage::StructuredExtract);
        assert_eq!(outcome.message(), "failed to extract project data from the model");
        assert!(!outcome.message().contains("429"));
        assert!(!outcome.message().contains("quota exhausted"));
    }

    #[tokio::test]
    async fn test_prose_only_response_fails_at_structured_extract() {
        let source = Arc::new(MockSource::serving("Allen_2025-05-01.pdf", build_pdf(&["agenda text"])));
        let model = Arc::new(MockModel::replying("No qualifying projects were found."));
        let db = Arc::new(InsightsDb::in_memory().unwrap());
        let processor = build_processor(source, model, db);

        let outcome = processor.process_document("allen", "42").await;

        assert_eq!(failed_stage(&outcome), Stage::StructuredExtract);
    }

    #[tokio::test]
    async fn test_empty_record_list_fails_at_structured_extract() {
        let source = Arc::new(MockSource::serving("Allen_2025-05-01.pdf", build_pdf(&["agenda text"])));
        let model = Arc::new(MockModel::replying("[]"));
        let db = Arc::new(InsightsDb::in_memory().unwrap());
        let processor = build_processor(source, model, db);

        let outcome = processor.process_document("allen", "42").await;

        assert_eq!(failed_stage(&outcome), Stage::StructuredExtract);
        assert_eq!(outcome.message(), "no project records extracted");
    }

    #[tokio::test]
    async fn test_duplicate_records_fail_at_persist_keeping_committed_rows() {
        let duplicated = format!("[{0},{0}]", sample_response().trim_matches(['[', ']']));
        let source = Arc::new(MockSource::serving("Allen_2025-05-01.pdf", build_pdf(&["agenda text"])));
        let model = Arc::new(MockModel::replying(&duplicated));
        let db = Arc::new(InsightsDb::in_memory().unwrap());
        let processor = build_processor(source, model, db.clone());

        let outcome = processor.process_document("allen", "42").await;

        assert_eq!(failed_stage(&outcome), Stage::Persist);
        assert!(outcome.message().contains("1 of 2"));
        // The first row stays committed, nothing is rolled back
        assert_eq!(db.recent_insights(10).unwrap().len(), 1);
    }

    #[test]
    fn test_city_from_name() {
        assert_eq!(city_from_name("Allen_2025-05-01.pdf"), "Allen");
        assert_eq!(city_from_name("North_Richland_Hills.pdf"), "North");
        assert_eq!(city_from_name("agenda.pdf"), "agenda");
        assert_eq!(city_from_name("agenda"), "agenda");
    }
}
