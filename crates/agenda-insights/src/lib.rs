//! agenda-insights: structured extraction pipeline for city council agendas
//!
//! This crate turns municipal agenda PDFs hosted in SharePoint document
//! libraries into structured, queryable project records. Documents are
//! located and downloaded through Microsoft Graph, their text is extracted
//! and scrubbed of personal information, a completion model pulls out
//! consent-agenda project data, and validated records land in SQLite.

pub mod config;
pub mod enrich;
pub mod error;
pub mod extraction;
pub mod pipeline;
pub mod providers;
pub mod server;
pub mod storage;
pub mod structuring;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use pipeline::AgendaProcessor;
pub use types::{Category, PipelineOutcome, ProjectRecord, Stage};
