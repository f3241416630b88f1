// Registry Metadata Models
// Wire shape of the JSON metadata endpoint and the normalized PackageMetadata

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::dependency::DistributionFile;

// ============================================================================
// Wire format
// ============================================================================

/// `GET {index}/{name}/json` response body
#[derive(Debug, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub info: RegistryInfo,
    #[serde(default)]
    pub releases: BTreeMap<String, Vec<RegistryFile>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegistryInfo {
    pub version: Option<String>,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub maintainer_email: Option<String>,
    pub home_page: Option<String>,
    pub project_url: Option<String>,
    pub requires_dist: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct RegistryFile {
    pub upload_time: Option<String>,
    pub filename: Option<String>,
    pub url: Option<String>,
    /// Kept loose: some mirrors publish `null` or a list here
    #[serde(default)]
    pub digests: Option<serde_json::Value>,
}

impl RegistryFile {
    fn sha256(&self) -> Option<String> {
        self.digests
            .as_ref()
            .and_then(|d| d.get("sha256"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// `GET {stats}/{name}/recent` response body
///
/// A missing `data` object or `last_month` field reads as zero downloads;
/// only a body that is not a JSON object of this shape is unknown.
#[derive(Debug, Deserialize)]
pub struct DownloadStatsDocument {
    #[serde(default)]
    pub data: DownloadStatsData,
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadStatsData {
    pub last_month: Option<i64>,
}

// ============================================================================
// Normalized metadata
// ============================================================================

/// One uploaded file of one release
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseFile {
    pub filename: String,
    pub url: Option<String>,
    pub sha256: Option<String>,
    pub upload_time: Option<DateTime<Utc>>,
}

impl ReleaseFile {
    pub fn to_distribution_file(&self) -> DistributionFile {
        DistributionFile {
            filename: self.filename.clone(),
            sha256: self.sha256.clone(),
            url: self.url.clone(),
        }
    }
}

/// Everything the engine needs to know about one package
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    pub name: String,
    pub version: Option<String>,
    pub author: Option<String>,
    pub maintainer_email: Option<String>,
    pub home_page: Option<String>,
    /// Raw requirement strings declared by the current version
    pub requires_dist: Vec<String>,
    /// version -> files
    pub releases: BTreeMap<String, Vec<ReleaseFile>>,
}

impl PackageMetadata {
    pub fn from_document(name: &str, doc: RegistryDocument) -> Self {
        let info = doc.info;
        let releases = doc
            .releases
            .into_iter()
            .map(|(version, files)| {
                let files = files
                    .iter()
                    .map(|f| ReleaseFile {
                        filename: f.filename.clone().unwrap_or_default(),
                        url: f.url.clone(),
                        sha256: f.sha256(),
                        upload_time: f.upload_time.as_deref().and_then(parse_upload_time),
                    })
                    .collect();
                (version, files)
            })
            .collect();

        Self {
            name: name.to_string(),
            version: non_empty(info.version),
            author: info.author,
            maintainer_email: non_empty(info.maintainer_email).or_else(|| non_empty(info.author_email)),
            home_page: non_empty(info.home_page).or_else(|| non_empty(info.project_url)),
            requires_dist: info.requires_dist.unwrap_or_default(),
            releases,
        }
    }

    /// Files published for the current version
    pub fn current_files(&self) -> &[ReleaseFile] {
        self.version
            .as_ref()
            .and_then(|v| self.releases.get(v))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Earliest upload across every version
    pub fn first_release(&self) -> Option<DateTime<Utc>> {
        self.releases
            .values()
            .flatten()
            .filter_map(|f| f.upload_time)
            .min()
    }

    /// Latest upload of the current version
    pub fn version_release(&self) -> Option<DateTime<Utc>> {
        self.current_files().iter().filter_map(|f| f.upload_time).max()
    }

    /// Whole days between the first release and `now`; 0 when nothing is dated
    pub fn age_days_at(&self, now: DateTime<Utc>) -> i64 {
        self.first_release()
            .map(|first| (now - first).num_days())
            .unwrap_or(0)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Parse an upload timestamp; offset-less values are taken as UTC
pub fn parse_upload_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_document() -> RegistryDocument {
        serde_json::from_value(serde_json::json!({
            "info": {
                "version": "2.0.0",
                "author": "Jane Doe",
                "maintainer_email": "",
                "author_email": "jane@example.org",
                "home_page": null,
                "project_url": "https://example.org/demo",
                "requires_dist": ["idna (>=2.5)", "chardet; python_version < '3'"]
            },
            "releases": {
                "1.0.0": [
                    { "upload_time": "2020-01-02T03:04:05", "filename": "demo-1.0.0.tar.gz",
                      "url": "https://files/demo-1.0.0.tar.gz", "digests": { "sha256": "aa" } }
                ],
                "2.0.0": [
                    { "upload_time": "2021-06-01T00:00:00Z", "filename": "demo-2.0.0.tar.gz",
                      "url": "https://files/demo-2.0.0.tar.gz", "digests": { "md5": "bb" } },
                    { "upload_time": "2021-06-03T10:00:00", "filename": "demo-2.0.0-py3-none-any.whl",
                      "url": "https://files/demo-2.0.0-py3-none-any.whl", "digests": null }
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_from_document_falls_back_on_empty_fields() {
        let meta = PackageMetadata::from_document("demo", sample_document());
        assert_eq!(meta.version.as_deref(), Some("2.0.0"));
        assert_eq!(meta.maintainer_email.as_deref(), Some("jane@example.org"));
        assert_eq!(meta.home_page.as_deref(), Some("https://example.org/demo"));
        assert_eq!(meta.requires_dist.len(), 2);
    }

    #[test]
    fn test_current_files_and_digests() {
        let meta = PackageMetadata::from_document("demo", sample_document());
        let files = meta.current_files();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.sha256.is_none()));
        assert_eq!(meta.releases["1.0.0"][0].sha256.as_deref(), Some("aa"));
    }

    #[test]
    fn test_release_dates_use_all_versions_for_first_release() {
        let meta = PackageMetadata::from_document("demo", sample_document());
        assert_eq!(
            meta.first_release(),
            Some(Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap())
        );
        assert_eq!(
            meta.version_release(),
            Some(Utc.with_ymd_and_hms(2021, 6, 3, 10, 0, 0).unwrap())
        );
        let now = Utc.with_ymd_and_hms(2020, 1, 12, 3, 4, 5).unwrap();
        assert_eq!(meta.age_days_at(now), 10);
    }

    #[test]
    fn test_age_is_zero_without_dated_files() {
        let meta = PackageMetadata::default();
        assert_eq!(meta.age_days_at(Utc::now()), 0);
    }

    #[test]
    fn test_parse_upload_time_variants() {
        let expected = Utc.with_ymd_and_hms(2023, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_upload_time("2023-05-01T12:30:00"), Some(expected));
        assert_eq!(parse_upload_time("2023-05-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_upload_time("2023-05-01T14:30:00+02:00"), Some(expected));
        assert_eq!(parse_upload_time("2023-05-01T12:30:00.000000"), Some(expected));
        assert!(parse_upload_time("2023-05-01").is_some());
        assert_eq!(parse_upload_time("yesterday"), None);
    }

    #[test]
    fn test_stats_document_defaults_missing_fields() {
        let empty: DownloadStatsDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.data.last_month, None);
        let no_count: DownloadStatsDocument = serde_json::from_str(r#"{"data":{}}"#).unwrap();
        assert_eq!(no_count.data.last_month, None);
        let counted: DownloadStatsDocument =
            serde_json::from_str(r#"{"data":{"last_month":42}}"#).unwrap();
        assert_eq!(counted.data.last_month, Some(42));
        assert!(serde_json::from_str::<DownloadStatsDocument>("[]").is_err());
    }
}
