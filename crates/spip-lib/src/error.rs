// Error Types
// Registry, scanner and configuration failures for the analysis engine

use thiserror::Error;

/// Registry Error
///
/// Every variant is absorbed by the engine and turned into an unknown signal;
/// only `NotFound` for the root package ends an analysis early.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The registry answered 404 for this package
    #[error("Package '{0}' not found on registry")]
    NotFound(String),

    /// Connection could not be established
    #[error("Registry unreachable: {0}")]
    Unreachable(String),

    /// Request timed out
    #[error("Registry request timed out")]
    Timeout,

    /// Non-success status other than 404
    #[error("Registry returned HTTP {0}")]
    Http(u16),

    /// Response body was not the expected JSON shape
    #[error("Registry response parse error: {0}")]
    Parse(String),

    /// Any other transport failure
    #[error("Registry request failed: {0}")]
    Request(String),

    /// Invalid client configuration
    #[error("Invalid registry configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RegistryError::Timeout
        } else if err.is_connect() {
            RegistryError::Unreachable(err.to_string())
        } else if err.is_decode() {
            RegistryError::Parse(err.to_string())
        } else {
            RegistryError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Parse(err.to_string())
    }
}

impl RegistryError {
    /// Stable code for logs and serialized reports
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::NotFound(_) => "REGISTRY_NOT_FOUND",
            RegistryError::Unreachable(_) => "REGISTRY_UNREACHABLE",
            RegistryError::Timeout => "REGISTRY_TIMEOUT",
            RegistryError::Http(_) => "REGISTRY_HTTP_ERROR",
            RegistryError::Parse(_) => "REGISTRY_PARSE_ERROR",
            RegistryError::Request(_) => "REGISTRY_REQUEST_ERROR",
            RegistryError::InvalidConfig(_) => "REGISTRY_INVALID_CONFIG",
        }
    }

    /// True when the registry positively reported the package as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound(_))
    }
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Vulnerability Scanner Error
#[derive(Error, Debug)]
pub enum ScanError {
    /// The external tool is not installed
    #[error("Vulnerability scanner not available: {0}")]
    ToolUnavailable(String),

    /// The tool did not finish in time
    #[error("Vulnerability scan timed out after {0}s")]
    Timeout(u64),

    /// Process could not be started
    #[error("Failed to start vulnerability scanner: {0}")]
    Spawn(String),

    /// IO error while talking to the process
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Io(err.to_string())
    }
}

impl ScanError {
    pub fn code(&self) -> &'static str {
        match self {
            ScanError::ToolUnavailable(_) => "SCAN_TOOL_UNAVAILABLE",
            ScanError::Timeout(_) => "SCAN_TIMEOUT",
            ScanError::Spawn(_) => "SCAN_SPAWN_FAILED",
            ScanError::Io(_) => "SCAN_IO_ERROR",
        }
    }
}

/// Result type for vulnerability scans
pub type ScanResult<T> = Result<T, ScanError>;

/// Configuration loading error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::InvalidUrl { .. } => "CONFIG_INVALID_URL",
            ConfigError::InvalidValue(_, _) => "CONFIG_INVALID_VALUE",
            ConfigError::Io(_) => "CONFIG_IO_ERROR",
        }
    }
}

impl From<ConfigError> for RegistryError {
    fn from(err: ConfigError) -> Self {
        RegistryError::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct_from_transport_failures() {
        assert!(RegistryError::NotFound("leftpad".to_string()).is_not_found());
        assert!(!RegistryError::Timeout.is_not_found());
        assert!(!RegistryError::Unreachable("dns".to_string()).is_not_found());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RegistryError::NotFound("leftpad".to_string()).to_string(),
            "Package 'leftpad' not found on registry"
        );
        assert_eq!(RegistryError::Http(503).to_string(), "Registry returned HTTP 503");
        assert_eq!(ScanError::Timeout(60).code(), "SCAN_TIMEOUT");
    }

    #[test]
    fn test_config_error_converts_to_registry_error() {
        let err: RegistryError = ConfigError::InvalidValue("timeout", "0".to_string()).into();
        assert_eq!(err.code(), "REGISTRY_INVALID_CONFIG");
    }
}
