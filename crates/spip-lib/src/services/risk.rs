// Risk Scorer
// Additive, bounded scoring of a filled-in security report

use serde::{Deserialize, Serialize};

use crate::config::{AnalysisOptions, DEFAULT_MIN_AGE_DAYS, DEFAULT_MIN_DOWNLOADS};
use crate::models::{SecurityReport, MAX_RISK_SCORE};
use crate::utils::format::thousands;

const LOW_DOWNLOADS_POINTS: u32 = 25;
const NEW_PACKAGE_POINTS: u32 = 30;
const TYPOSQUAT_POINTS: u32 = 20;
const VULNERABILITY_POINTS: u32 = 40;
const NO_AUTHOR_POINTS: u32 = 10;
const MISSING_HASH_POINTS: u32 = 10;

/// Score and the warnings that produced it, in rule order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub score: u8,
    pub warnings: Vec<String>,
}

/// Risk Scorer
#[derive(Debug, Clone, Copy)]
pub struct RiskScorer {
    min_downloads: i64,
    min_age_days: i64,
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DOWNLOADS, DEFAULT_MIN_AGE_DAYS)
    }
}

impl RiskScorer {
    pub fn new(min_downloads: i64, min_age_days: i64) -> Self {
        Self {
            min_downloads,
            min_age_days,
        }
    }

    pub fn from_options(options: &AnalysisOptions) -> Self {
        Self::new(options.min_downloads, options.min_age_days)
    }

    pub fn score(&self, report: &SecurityReport) -> RiskAssessment {
        if !report.exists {
            return RiskAssessment {
                score: MAX_RISK_SCORE,
                warnings: Vec::new(),
            };
        }

        let mut points: u32 = 0;
        let mut warnings = Vec::new();

        // -1 means the stats endpoint never answered
        if report.known_downloads().is_some() && report.downloads_last_month < self.min_downloads {
            points += LOW_DOWNLOADS_POINTS;
            warnings.push(format!(
                "Low download count: {} (threshold: {})",
                thousands(report.downloads_last_month),
                thousands(self.min_downloads)
            ));
        }

        if report.age_days < self.min_age_days {
            points += NEW_PACKAGE_POINTS;
            warnings.push(format!(
                "Package is only {} days old (threshold: {})",
                report.age_days, self.min_age_days
            ));
        }

        if let Some(top) = report.similar_packages.first() {
            points += TYPOSQUAT_POINTS;
            warnings.push(format!(
                "Similar to popular package '{}' ({:.0}% match)",
                top.name,
                top.percent()
            ));
        }

        if !report.vulnerabilities.is_empty() {
            points += VULNERABILITY_POINTS;
            warnings.push(format!(
                "Found {} known vulnerabilities",
                report.vulnerabilities.len()
            ));
        }

        let author_missing = matches!(report.author.as_deref(), None | Some("") | Some("unknown"));
        if author_missing {
            points += NO_AUTHOR_POINTS;
            warnings.push("No author information available".to_string());
        }

        if let Some(tree) = &report.dependency_tree {
            let missing = tree.stats().missing_hashes;
            if missing > 0 {
                points += MISSING_HASH_POINTS;
                warnings.push(format!(
                    "{} distribution files missing SHA256 digests",
                    missing
                ));
            }
        }

        RiskAssessment {
            score: points.min(MAX_RISK_SCORE as u32) as u8,
            warnings,
        }
    }
}
