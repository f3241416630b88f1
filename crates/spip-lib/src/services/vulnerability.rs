// Vulnerability Scanner
// Delegates to an external audit tool and keeps its findings verbatim

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;

use crate::config::ScannerConfig;
use crate::error::{ScanError, ScanResult};
use crate::utils::tool_locator;

/// Source of vulnerability findings for a package
#[async_trait]
pub trait VulnerabilityScanner: Send + Sync {
    /// Opaque finding lines for `package`
    async fn scan(&self, package: &str) -> ScanResult<Vec<String>>;
}

/// Scanner that never reports anything
pub struct NoopScanner;

#[async_trait]
impl VulnerabilityScanner for NoopScanner {
    async fn scan(&self, _package: &str) -> ScanResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Runs `pip-audit` (or a compatible tool) with the package name on stdin
pub struct PipAuditScanner {
    config: ScannerConfig,
}

impl PipAuditScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }
}

impl Default for PipAuditScanner {
    fn default() -> Self {
        Self::new(ScannerConfig::default())
    }
}

#[async_trait]
impl VulnerabilityScanner for PipAuditScanner {
    async fn scan(&self, package: &str) -> ScanResult<Vec<String>> {
        let tool_path = tool_locator::find_tool(&self.config.tool)
            .ok_or_else(|| ScanError::ToolUnavailable(self.config.tool.clone()))?;

        let mut cmd = tool_locator::create_async_command(&tool_path);
        cmd.args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScanError::ToolUnavailable(self.config.tool.clone()),
            _ => ScanError::Spawn(e.to_string()),
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            // the tool may exit without reading stdin
            if let Err(e) = stdin.write_all(format!("{}\n", package).as_bytes()).await {
                log::debug!("scanner stdin closed early: {}", e);
            }
        }

        let output = tokio::time::timeout(self.config.timeout(), child.wait_with_output())
            .await
            .map_err(|_| ScanError::Timeout(self.config.timeout_secs))??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(extract_findings(package, &stdout, output.status.success()))
    }
}

/// Lines of a failed audit run that mention both the package and a vulnerability
///
/// A successful exit, or output that never says "vulnerability", yields nothing.
pub fn extract_findings(package: &str, stdout: &str, success: bool) -> Vec<String> {
    if success || !stdout.to_lowercase().contains("vulnerability") {
        return Vec::new();
    }
    let package = package.to_lowercase();
    stdout
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.contains(&package) && lower.contains("vulnerability")
        })
        .map(|line| line.trim().to_string())
        .collect()
}
