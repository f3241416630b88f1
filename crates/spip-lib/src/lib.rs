// spip shared library
// Security analysis engine for Python packages: registry metadata, typosquat
// detection, dependency trees, vulnerability scanning and risk scoring

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use config::{AnalysisOptions, RegistryConfig, ScannerConfig};
pub use error::{ConfigError, RegistryError, ScanError};
pub use models::{DependencyNode, RiskLevel, SecurityReport, SimilarPackage};
pub use services::PackageAnalyzer;
