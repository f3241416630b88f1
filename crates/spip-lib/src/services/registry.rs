// Registry Client
// Fetches package metadata and download statistics from the JSON index

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::models::metadata::{DownloadStatsDocument, PackageMetadata, RegistryDocument};
use crate::models::UNKNOWN_DOWNLOADS;

/// Source of package metadata
///
/// The engine only talks to the registry through this trait, so tests and
/// alternative indexes can stand in for the HTTP client.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch metadata, keeping the reason for a failure
    async fn fetch_metadata_detailed(&self, name: &str) -> RegistryResult<PackageMetadata>;

    /// Trailing-month downloads, or `UNKNOWN_DOWNLOADS` on any failure
    async fn fetch_download_count(&self, name: &str) -> i64;

    /// Fetch metadata; not-found and transport failures both become `None`
    async fn fetch_metadata(&self, name: &str) -> Option<PackageMetadata> {
        match self.fetch_metadata_detailed(name).await {
            Ok(meta) => Some(meta),
            Err(RegistryError::NotFound(_)) => {
                log::debug!("no metadata for {}: not found", name);
                None
            }
            Err(e) => {
                log::info!("no metadata for {}: {} ({})", name, e, e.code());
                None
            }
        }
    }
}

/// HTTP client for a PyPI-style JSON index
pub struct RegistryClient {
    config: RegistryConfig,
    client: Client,
}

impl RegistryClient {
    pub fn new(config: RegistryConfig) -> RegistryResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RegistryError::InvalidConfig(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Client for the default public index
    pub fn with_defaults() -> RegistryResult<Self> {
        Self::new(RegistryConfig::default())
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn metadata_url(&self, name: &str) -> String {
        format!(
            "{}/{}/json",
            self.config.index_url.trim_end_matches('/'),
            urlencoding::encode(name)
        )
    }

    fn stats_url(&self, name: &str) -> String {
        format!(
            "{}/{}/recent",
            self.config.stats_url.trim_end_matches('/'),
            urlencoding::encode(name)
        )
    }

    async fn download_count(&self, name: &str) -> RegistryResult<i64> {
        let response = self.client.get(self.stats_url(name)).send().await?;
        if !response.status().is_success() {
            return Err(RegistryError::Http(response.status().as_u16()));
        }
        let body = response.text().await?;
        let stats: DownloadStatsDocument = serde_json::from_str(&body)?;
        // A missing field reads as zero downloads, a negative one as garbage
        match stats.data.last_month.unwrap_or(0) {
            n if n >= 0 => Ok(n),
            n => Err(RegistryError::Parse(format!("negative download count {}", n))),
        }
    }
}

#[async_trait]
impl MetadataSource for RegistryClient {
    async fn fetch_metadata_detailed(&self, name: &str) -> RegistryResult<PackageMetadata> {
        let url = self.metadata_url(name);
        log::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(name.to_string()));
        }
        if !status.is_success() {
            return Err(RegistryError::Http(status.as_u16()));
        }

        let body = response.text().await?;
        let doc: RegistryDocument = serde_json::from_str(&body)?;
        Ok(PackageMetadata::from_document(name, doc))
    }

    async fn fetch_download_count(&self, name: &str) -> i64 {
        match self.download_count(name).await {
            Ok(count) => count,
            Err(e) => {
                log::warn!("download stats unavailable for {}: {}", name, e);
                UNKNOWN_DOWNLOADS
            }
        }
    }
}
