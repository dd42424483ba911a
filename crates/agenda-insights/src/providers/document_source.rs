//! Document source trait for locating and downloading agenda files

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// A document located in a source library
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Original filename, e.g. `Allen_2025-05-01.pdf`
    pub name: String,
    /// Drive that holds the file content
    pub drive_id: String,
    /// Item id of the file within the drive
    pub item_id: String,
}

/// Trait for document hosting backends
///
/// Implementations:
/// - `GraphDocumentSource`: SharePoint document libraries via Microsoft Graph
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// List the documents attached to a library list item
    async fn list_documents(
        &self,
        site_path: &str,
        library_name: &str,
        item_id: &str,
    ) -> Result<Vec<SourceDocument>>;

    /// Download the full content of one document
    async fn open_stream(&self, drive_id: &str, item_id: &str) -> Result<Bytes>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
