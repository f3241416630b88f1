// Dependency Tree Models
// Snapshot of a package's transitive requirements with per-file digests

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A distribution file attached to an expanded node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DistributionFile {
    pub filename: String,
    pub sha256: Option<String>,
    pub url: Option<String>,
}

impl DistributionFile {
    pub fn has_digest(&self) -> bool {
        self.sha256.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// One position in the dependency tree
///
/// `Unresolved` means a fetch was attempted and returned nothing.
/// `Truncated` means no fetch was attempted: the name was already claimed
/// elsewhere in this build, or the position lies past the depth limit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DependencyNode {
    Expanded {
        version: String,
        files: Vec<DistributionFile>,
        dependencies: BTreeMap<String, DependencyNode>,
    },
    Unresolved,
    Truncated,
}

impl DependencyNode {
    pub fn expanded(version: impl Into<String>, files: Vec<DistributionFile>) -> Self {
        DependencyNode::Expanded {
            version: version.into(),
            files,
            dependencies: BTreeMap::new(),
        }
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, DependencyNode::Expanded { .. })
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, DependencyNode::Unresolved)
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, DependencyNode::Truncated)
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            DependencyNode::Expanded { version, .. } => Some(version),
            _ => None,
        }
    }

    pub fn files(&self) -> &[DistributionFile] {
        match self {
            DependencyNode::Expanded { files, .. } => files,
            _ => &[],
        }
    }

    pub fn dependencies(&self) -> Option<&BTreeMap<String, DependencyNode>> {
        match self {
            DependencyNode::Expanded { dependencies, .. } => Some(dependencies),
            _ => None,
        }
    }

    /// Child lookup by name
    pub fn child(&self, name: &str) -> Option<&DependencyNode> {
        self.dependencies().and_then(|deps| deps.get(name))
    }

    /// Aggregate counts over this node and everything below it
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        self.accumulate(&mut stats);
        stats
    }

    fn accumulate(&self, stats: &mut TreeStats) {
        match self {
            DependencyNode::Expanded {
                files,
                dependencies,
                ..
            } => {
                stats.expanded += 1;
                stats.files += files.len();
                stats.missing_hashes += files.iter().filter(|f| !f.has_digest()).count();
                for child in dependencies.values() {
                    child.accumulate(stats);
                }
            }
            DependencyNode::Unresolved => stats.unresolved += 1,
            DependencyNode::Truncated => stats.truncated += 1,
        }
    }
}

/// Summary of a dependency tree
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    pub expanded: usize,
    pub unresolved: usize,
    pub truncated: usize,
    pub files: usize,
    pub missing_hashes: usize,
}
