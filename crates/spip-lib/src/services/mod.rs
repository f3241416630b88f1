// Services
// Registry access, typosquat detection, dependency trees, scanning and scoring

pub mod analyzer;
pub mod dependency_tree;
pub mod progress;
pub mod registry;
pub mod risk;
pub mod typosquat;
pub mod vulnerability;

pub use analyzer::PackageAnalyzer;
pub use dependency_tree::{parse_requirement_name, DependencyTreeBuilder};
pub use progress::{BuildProgress, ProgressCallback};
pub use registry::{MetadataSource, RegistryClient};
pub use risk::{RiskAssessment, RiskScorer};
pub use typosquat::{find_similar, gestalt_ratio, TyposquatDetector, POPULAR_PACKAGES};
pub use vulnerability::{extract_findings, NoopScanner, PipAuditScanner, VulnerabilityScanner};
