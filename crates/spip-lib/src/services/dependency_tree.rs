// Dependency Tree Builder
// Depth-first expansion of declared requirements into a bounded tree

use futures::future::{BoxFuture, FutureExt};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use super::progress::{BuildProgress, ProgressCallback, ProgressThrottle};
use super::registry::MetadataSource;
use crate::config::DEFAULT_MAX_DEPTH;
use crate::models::DependencyNode;

/// Leading distribution name of a requirement string
static REQUIREMENT_NAME: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_.+-]+)").ok());

/// Extract the bare package name from a requirement string
///
/// `"urllib3[socks] (>=1.21.1); extra == 'socks'"` yields `urllib3`.
/// Returns `None` when nothing name-like leads the string.
pub fn parse_requirement_name(requirement: &str) -> Option<String> {
    let specifier = requirement.split(';').next().unwrap_or_default().trim();
    if specifier.is_empty() {
        return None;
    }
    REQUIREMENT_NAME
        .as_ref()?
        .captures(specifier)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Builds dependency trees from a metadata source
pub struct DependencyTreeBuilder {
    source: Arc<dyn MetadataSource>,
    max_depth: usize,
    progress: Option<ProgressCallback>,
}

impl DependencyTreeBuilder {
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            max_depth: DEFAULT_MAX_DEPTH,
            progress: None,
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Expand `root` and everything it requires, down to `max_depth`
    ///
    /// Every name is fetched at most once per call. The first path to reach
    /// a name expands it; every later occurrence, whether a cycle or a second
    /// route through a diamond, becomes `DependencyNode::Truncated`.
    pub async fn build(&self, root: &str) -> DependencyNode {
        let started = Instant::now();
        let mut state = BuildState::new(self.progress.clone());
        let tree = self.expand(root.to_string(), 0, &mut state).await;
        log::info!(
            "dependency tree for {} done: scanned={} unique={} elapsed={:.1}s",
            root,
            state.scanned,
            state.seen.len(),
            started.elapsed().as_secs_f64()
        );
        tree
    }

    fn expand<'a>(
        &'a self,
        name: String,
        depth: usize,
        state: &'a mut BuildState,
    ) -> BoxFuture<'a, DependencyNode> {
        async move {
            if depth > self.max_depth || !state.claim(&name) {
                return DependencyNode::Truncated;
            }
            state.report(&name, depth);

            log::debug!("fetching metadata for {} (depth={})", name, depth);
            let Some(meta) = self.source.fetch_metadata(&name).await else {
                return DependencyNode::Unresolved;
            };

            let files = meta
                .current_files()
                .iter()
                .map(|f| f.to_distribution_file())
                .collect();

            let mut dependencies = BTreeMap::new();
            for requirement in &meta.requires_dist {
                let Some(dep_name) = parse_requirement_name(requirement) else {
                    log::debug!("dropping unparseable requirement {:?} of {}", requirement, name);
                    continue;
                };
                let child = self.expand(dep_name.clone(), depth + 1, state).await;
                // a name listed twice keeps its last entry, usually `Truncated`
                dependencies.insert(dep_name, child);
            }

            DependencyNode::Expanded {
                version: meta.version.unwrap_or_else(|| "unknown".to_string()),
                files,
                dependencies,
            }
        }
        .boxed()
    }
}

/// Mutable state owned by one `build` call
struct BuildState {
    /// Case-folded names already claimed for expansion
    seen: HashSet<String>,
    scanned: usize,
    throttle: Option<ProgressThrottle>,
}

impl BuildState {
    fn new(progress: Option<ProgressCallback>) -> Self {
        Self {
            seen: HashSet::new(),
            scanned: 0,
            throttle: progress.map(ProgressThrottle::new),
        }
    }

    /// Claim `name`; false if an earlier branch already did
    fn claim(&mut self, name: &str) -> bool {
        self.seen.insert(name.to_lowercase())
    }

    fn report(&mut self, name: &str, depth: usize) {
        self.scanned += 1;
        if let Some(throttle) = self.throttle.as_mut() {
            throttle.offer(&BuildProgress {
                scanned: self.scanned,
                current: name.to_string(),
                depth,
                unique: self.seen.len(),
            });
        }
    }
}
