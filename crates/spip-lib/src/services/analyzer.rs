// Package Analyzer
// Runs every check for one package and fuses the results into a report

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use super::dependency_tree::DependencyTreeBuilder;
use super::registry::{MetadataSource, RegistryClient};
use super::risk::RiskScorer;
use super::typosquat::TyposquatDetector;
use super::vulnerability::{PipAuditScanner, VulnerabilityScanner};
use crate::config::{AnalysisOptions, RegistryConfig, ScannerConfig};
use crate::error::{RegistryResult, ScanError};
use crate::models::SecurityReport;

/// Entry point of the analysis engine
pub struct PackageAnalyzer {
    source: Arc<dyn MetadataSource>,
    scanner: Arc<dyn VulnerabilityScanner>,
    detector: TyposquatDetector,
}

impl PackageAnalyzer {
    pub fn new(source: Arc<dyn MetadataSource>, scanner: Arc<dyn VulnerabilityScanner>) -> Self {
        Self {
            source,
            scanner,
            detector: TyposquatDetector::default(),
        }
    }

    /// Analyzer backed by the HTTP registry client and `pip-audit`
    pub fn from_config(registry: RegistryConfig, scanner: ScannerConfig) -> RegistryResult<Self> {
        let client = RegistryClient::new(registry)?;
        Ok(Self::new(
            Arc::new(client),
            Arc::new(PipAuditScanner::new(scanner)),
        ))
    }

    /// Analyzer for the public index, honoring `SPIP_*` overrides
    pub fn with_defaults() -> RegistryResult<Self> {
        Self::from_config(RegistryConfig::from_env()?, ScannerConfig::default())
    }

    /// Replace the popular-name corpus used for typosquat checks
    pub fn with_detector(mut self, detector: TyposquatDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Analyze `name`
    ///
    /// Never fails: a package the registry cannot provide yields a report
    /// with `exists == false` and the maximal score, and every other failure
    /// only leaves its signal unknown.
    pub async fn analyze(&self, name: &str, options: &AnalysisOptions) -> SecurityReport {
        let started = Instant::now();

        let meta = match self.source.fetch_metadata_detailed(name).await {
            Ok(meta) => meta,
            Err(e) => {
                log::info!("{} unavailable ({}): {}", name, e.code(), e);
                return SecurityReport::not_found(name, e.to_string());
            }
        };

        let mut report = SecurityReport::new(name);
        report.exists = true;
        report.version = meta
            .version
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        report.author = meta.author.clone();
        report.maintainer_email = meta.maintainer_email.clone();
        report.home_page = meta.home_page.clone();
        report.first_release_date = meta.first_release();
        report.version_release_date = meta.version_release();
        report.age_days = meta.age_days_at(Utc::now());

        report.downloads_last_month = self.source.fetch_download_count(name).await;
        report.similar_packages = self.detector.check(name, options.typosquat_threshold);
        report.vulnerabilities = self.scan(name).await;

        if options.build_dependency_tree {
            let builder = DependencyTreeBuilder::new(Arc::clone(&self.source))
                .max_depth(options.max_depth)
                .progress(options.progress.clone());
            report.dependency_tree = Some(builder.build(name).await);
        }

        let assessment = RiskScorer::from_options(options).score(&report);
        report.risk_score = assessment.score;
        report.warnings = assessment.warnings;

        log::info!(
            "analyzed {} {}: score={} ({}) warnings={} elapsed={:.1}s",
            name,
            report.version,
            report.risk_score,
            report.risk_level().as_str(),
            report.warnings.len(),
            started.elapsed().as_secs_f64()
        );
        report
    }

    async fn scan(&self, name: &str) -> Vec<String> {
        match self.scanner.scan(name).await {
            Ok(findings) => findings,
            Err(ScanError::ToolUnavailable(tool)) => {
                log::debug!("vulnerability scan skipped: {} not installed", tool);
                Vec::new()
            }
            Err(e) => {
                log::warn!("vulnerability scan of {} failed ({}): {}", name, e.code(), e);
                Vec::new()
            }
        }
    }
}
