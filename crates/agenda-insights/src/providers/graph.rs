//! Microsoft Graph document source
//!
//! Handles Azure AD client-credentials authentication and the Graph REST
//! calls that locate SharePoint library items and download file content.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::providers::document_source::{DocumentSource, SourceDocument};

const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";
const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Azure AD authentication manager for Microsoft Graph
pub struct GraphAuth {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    client: reqwest::Client,
    /// Cached access token
    token: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl GraphAuth {
    /// Create from app registration credentials
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            tenant_id: config.tenant_id.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            client,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Get a valid access token (refreshing if needed)
    pub async fn get_token(&self) -> Result<String> {
        // Check if cached token is still valid
        {
            let token = self.token.read().await;
            if let Some(ref cached) = *token {
                // Token valid for at least 60 more seconds
                if cached.expires_at > Instant::now() + Duration::from_secs(60) {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let (new_token, expires_in) = self.request_token().await?;

        {
            let mut token = self.token.write().await;
            *token = Some(CachedToken {
                access_token: new_token.clone(),
                expires_at: Instant::now() + Duration::from_secs(expires_in),
            });
        }

        Ok(new_token)
    }

    /// Run the client-credentials grant against the tenant token endpoint
    async fn request_token(&self) -> Result<(String, u64)> {
        let token_url = format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            self.tenant_id
        );

        let response = self
            .client
            .post(&token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
            ])
            .send()
            .await
            .map_err(|e| Error::config(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::config(format!(
                "Token request failed ({}): {}",
                status, body
            )));
        }

        #[derive(serde::Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: u64,
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::config(format!("Failed to parse token response: {}", e)))?;

        Ok((token_response.access_token, token_response.expires_in))
    }
}

/// SharePoint document source backed by Microsoft Graph
pub struct GraphDocumentSource {
    auth: Arc<GraphAuth>,
    client: reqwest::Client,
    tenant_domain: String,
    /// Resolved site ids, keyed by server-relative site path
    site_ids: RwLock<HashMap<String, String>>,
}

impl GraphDocumentSource {
    pub fn new(auth: Arc<GraphAuth>, config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            auth,
            client,
            tenant_domain: config.tenant_domain.clone(),
            site_ids: RwLock::new(HashMap::new()),
        })
    }

    /// Resolve a server-relative site path (e.g. `/sites/CityAgendas`) to
    /// a Graph site id, caching the result.
    async fn site_id(&self, site_path: &str) -> Result<String> {
        {
            let cache = self.site_ids.read().await;
            if let Some(id) = cache.get(site_path) {
                return Ok(id.clone());
            }
        }

        let token = self.auth.get_token().await?;
        let url = format!("{}/sites/{}:{}", GRAPH_BASE, self.tenant_domain, site_path);

        let response = self.client.get(&url).bearer_auth(token).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::not_found(format!("site not found: {}", site_path)));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::internal(format!(
                "Site lookup failed ({}): {}",
                status, body
            )));
        }

        #[derive(serde::Deserialize)]
        struct SiteResponse {
            id: String,
        }

        let site: SiteResponse = response
            .json()
            .await
            .map_err(|e| Error::internal(format!("Failed to parse site response: {}", e)))?;

        let mut cache = self.site_ids.write().await;
        cache.insert(site_path.to_string(), site.id.clone());
        Ok(site.id)
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveItemResponse {
    id: String,
    name: String,
    parent_reference: ParentReference,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParentReference {
    drive_id: String,
}

#[async_trait]
impl DocumentSource for GraphDocumentSource {
    async fn list_documents(
        &self,
        site_path: &str,
        library_name: &str,
        item_id: &str,
    ) -> Result<Vec<SourceDocument>> {
        let site_id = self.site_id(site_path).await?;
        let token = self.auth.get_token().await?;

        let url = format!(
            "{}/sites/{}/lists/{}/items/{}/driveItem",
            GRAPH_BASE, site_id, library_name, item_id
        );
        tracing::debug!(library = library_name, item_id, "Querying list item driveItem");

        let response = self.client.get(&url).bearer_auth(token).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::not_found(format!(
                "item {} not found in library {}",
                item_id, library_name
            )));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::internal(format!(
                "List item query failed ({}): {}",
                status, body
            )));
        }

        let item: DriveItemResponse = response
            .json()
            .await
            .map_err(|e| Error::internal(format!("Failed to parse driveItem response: {}", e)))?;

        Ok(vec![SourceDocument {
            name: item.name,
            drive_id: item.parent_reference.drive_id,
            item_id: item.id,
        }])
    }

    async fn open_stream(&self, drive_id: &str, item_id: &str) -> Result<Bytes> {
        let token = self.auth.get_token().await?;

        // The /content endpoint answers with a redirect to a download URL;
        // reqwest follows it by default.
        let url = format!("{}/drives/{}/items/{}/content", GRAPH_BASE, drive_id, item_id);
        tracing::debug!(item_id, "Downloading document content");

        let response = self.client.get(&url).bearer_auth(token).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::not_found(format!(
                "document content not found for item {}",
                item_id
            )));
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::stream_unavailable(format!(
                "content download failed with status {}",
                status
            )));
        }

        let data = response.bytes().await?;
        tracing::debug!(item_id, bytes = data.len(), "Document content downloaded");
        Ok(data)
    }

    fn name(&self) -> &str {
        "microsoft-graph"
    }
}
