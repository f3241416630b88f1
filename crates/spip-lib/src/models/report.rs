// Security Report Models
// Result of one package analysis, consumed by the presentation layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dependency::DependencyNode;

/// Download count value meaning "stats endpoint gave no answer"
pub const UNKNOWN_DOWNLOADS: i64 = -1;

/// Maximum risk score
pub const MAX_RISK_SCORE: u8 = 100;

/// Risk band of a final score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=20 => Self::Low,
            21..=50 => Self::Medium,
            _ => Self::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// A popular package whose name resembles the analyzed one
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimilarPackage {
    pub name: String,
    /// Gestalt similarity in [0, 1]
    pub similarity: f64,
}

impl SimilarPackage {
    pub fn percent(&self) -> f64 {
        self.similarity * 100.0
    }
}

/// Outcome of one `analyze` call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityReport {
    pub package: String,
    pub exists: bool,
    pub version: String,
    pub author: Option<String>,
    pub maintainer_email: Option<String>,
    pub home_page: Option<String>,
    /// Trailing-month downloads, or `UNKNOWN_DOWNLOADS`
    pub downloads_last_month: i64,
    pub first_release_date: Option<DateTime<Utc>>,
    pub version_release_date: Option<DateTime<Utc>>,
    pub age_days: i64,
    pub similar_packages: Vec<SimilarPackage>,
    pub vulnerabilities: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub risk_score: u8,
    pub dependency_tree: Option<DependencyNode>,
}

impl SecurityReport {
    /// Empty report for `package`; every signal at its default
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            exists: false,
            version: String::new(),
            author: None,
            maintainer_email: None,
            home_page: None,
            downloads_last_month: UNKNOWN_DOWNLOADS,
            first_release_date: None,
            version_release_date: None,
            age_days: 0,
            similar_packages: Vec::new(),
            vulnerabilities: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            risk_score: 0,
            dependency_tree: None,
        }
    }

    /// Terminal report for a package the registry could not provide
    pub fn not_found(package: impl Into<String>, error: impl Into<String>) -> Self {
        let mut report = Self::new(package);
        report.errors.push(error.into());
        report.risk_score = MAX_RISK_SCORE;
        report
    }

    /// Download count if the stats endpoint answered
    pub fn known_downloads(&self) -> Option<u64> {
        u64::try_from(self.downloads_last_month).ok()
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }

    /// Whether an installer may proceed without asking the user
    pub fn allows_unattended_install(&self) -> bool {
        self.exists && self.risk_level() != RiskLevel::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(20), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(21), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(51), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::High);
    }

    #[test]
    fn test_risk_level_str_round_trip() {
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            assert_eq!(RiskLevel::from_str(level.as_str()), Some(level));
        }
        assert_eq!(RiskLevel::from_str("critical"), None);
    }

    #[test]
    fn test_not_found_report() {
        let report = SecurityReport::not_found("nope", "Package 'nope' not found on registry");
        assert!(!report.exists);
        assert_eq!(report.risk_score, 100);
        assert_eq!(report.errors.len(), 1);
        assert!(report.warnings.is_empty());
        assert!(report.dependency_tree.is_none());
        assert!(!report.allows_unattended_install());
    }

    #[test]
    fn test_known_downloads_hides_sentinel() {
        let mut report = SecurityReport::new("demo");
        assert_eq!(report.known_downloads(), None);
        report.downloads_last_month = 0;
        assert_eq!(report.known_downloads(), Some(0));
    }

    #[test]
    fn test_unattended_install_gate() {
        let mut report = SecurityReport::new("demo");
        report.exists = true;
        report.risk_score = 50;
        assert!(report.allows_unattended_install());
        report.risk_score = 51;
        assert!(!report.allows_unattended_install());
    }
}
