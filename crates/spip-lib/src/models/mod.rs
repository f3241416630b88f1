// Data Models
// Registry metadata, dependency tree snapshots and analysis reports

pub mod dependency;
pub mod metadata;
pub mod report;

pub use dependency::{DependencyNode, DistributionFile, TreeStats};
pub use metadata::{PackageMetadata, ReleaseFile};
pub use report::{RiskLevel, SecurityReport, SimilarPackage, MAX_RISK_SCORE, UNKNOWN_DOWNLOADS};
