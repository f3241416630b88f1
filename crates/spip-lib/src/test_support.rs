// In-memory registry and fixtures shared by engine tests

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use crate::error::{RegistryError, RegistryResult};
use crate::models::metadata::{PackageMetadata, ReleaseFile};
use crate::models::UNKNOWN_DOWNLOADS;
use crate::services::registry::MetadataSource;

pub(crate) fn hashed_file(filename: &str) -> ReleaseFile {
    ReleaseFile {
        filename: filename.to_string(),
        url: Some(format!("https://files.example/{}", filename)),
        sha256: Some(format!("{:0>64}", filename.len())),
        upload_time: Some(Utc::now() - Duration::days(400)),
    }
}

pub(crate) fn unhashed_file(filename: &str) -> ReleaseFile {
    ReleaseFile {
        sha256: None,
        ..hashed_file(filename)
    }
}

/// Package with one hashed sdist uploaded 400 days ago
pub(crate) fn package(name: &str, version: &str, requires: &[&str]) -> PackageMetadata {
    let mut releases = BTreeMap::new();
    releases.insert(
        version.to_string(),
        vec![hashed_file(&format!("{}-{}.tar.gz", name, version))],
    );
    PackageMetadata {
        name: name.to_string(),
        version: Some(version.to_string()),
        author: Some("Test Author".to_string()),
        maintainer_email: Some("author@example.org".to_string()),
        home_page: Some(format!("https://example.org/{}", name)),
        requires_dist: requires.iter().map(|s| s.to_string()).collect(),
        releases,
    }
}

/// Move every upload of `meta` to `days` ago
pub(crate) fn aged(mut meta: PackageMetadata, days: i64) -> PackageMetadata {
    let when = Utc::now() - Duration::days(days);
    for file in meta.releases.values_mut().flatten() {
        file.upload_time = Some(when);
    }
    meta
}

/// Registry double that records every metadata request
#[derive(Default)]
pub(crate) struct StaticRegistry {
    packages: HashMap<String, PackageMetadata>,
    downloads: HashMap<String, i64>,
    unreachable: HashSet<String>,
    fetches: Mutex<Vec<String>>,
}

impl StaticRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_package(mut self, meta: PackageMetadata) -> Self {
        self.packages.insert(meta.name.to_lowercase(), meta);
        self
    }

    pub(crate) fn with_downloads(mut self, name: &str, count: i64) -> Self {
        self.downloads.insert(name.to_lowercase(), count);
        self
    }

    pub(crate) fn with_unreachable(mut self, name: &str) -> Self {
        self.unreachable.insert(name.to_lowercase());
        self
    }

    /// Metadata requests made for exactly `name`
    pub(crate) fn fetch_count(&self, name: &str) -> usize {
        self.fetches
            .lock()
            .map(|f| f.iter().filter(|n| n.as_str() == name).count())
            .unwrap_or(0)
    }

    pub(crate) fn total_fetches(&self) -> usize {
        self.fetches.lock().map(|f| f.len()).unwrap_or(0)
    }
}

#[async_trait]
impl MetadataSource for StaticRegistry {
    async fn fetch_metadata_detailed(&self, name: &str) -> RegistryResult<PackageMetadata> {
        if let Ok(mut fetches) = self.fetches.lock() {
            fetches.push(name.to_string());
        }
        let key = name.to_lowercase();
        if self.unreachable.contains(&key) {
            return Err(RegistryError::Unreachable("connection refused".to_string()));
        }
        self.packages
            .get(&key)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    async fn fetch_download_count(&self, name: &str) -> i64 {
        self.downloads
            .get(&name.to_lowercase())
            .copied()
            .unwrap_or(UNKNOWN_DOWNLOADS)
    }
}
