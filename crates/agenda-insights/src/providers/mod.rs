//! Provider abstractions for document sources and completion models
//!
//! This module provides trait-based abstractions so the pipeline can run
//! against Microsoft Graph and Azure OpenAI in production and against
//! in-process fakes in tests.

pub mod azure_openai;
pub mod document_source;
pub mod graph;
pub mod llm;

pub use azure_openai::AzureOpenAiClient;
pub use document_source::{DocumentSource, SourceDocument};
pub use graph::{GraphAuth, GraphDocumentSource};
pub use llm::CompletionModel;
