// Typosquatting Detection
// Scores a package name against popular names with gestalt pattern matching

use rayon::prelude::*;
use std::cmp::Ordering;
use std::path::Path;

use crate::error::ConfigError;
use crate::models::SimilarPackage;

// ============================================================================
// Constants
// ============================================================================

/// Popular PyPI packages for typosquatting detection
/// This is a subset; a full list can be loaded with `TyposquatDetector::from_corpus_file`
pub const POPULAR_PACKAGES: &[&str] = &[
    // HTTP
    "requests", "httpx", "aiohttp",
    // Data
    "numpy", "pandas", "scipy", "matplotlib", "scikit-learn", "pillow",
    // Web frameworks
    "django", "flask", "fastapi", "uvicorn",
    // ML
    "tensorflow", "pytorch", "transformers", "langchain", "openai", "anthropic", "chromadb",
    // Scraping
    "beautifulsoup4", "selenium",
    // Cloud and storage
    "boto3", "sqlalchemy", "celery", "redis", "psycopg2", "pymongo",
    // Security and config
    "cryptography", "pyyaml",
    // CLI
    "click",
    // Tooling
    "pytest", "black", "flake8", "mypy", "setuptools", "wheel", "pip",
];

// ============================================================================
// Similarity
// ============================================================================

/// Ratcliff/Obershelp similarity: `2 * matched / (len(a) + len(b))`
///
/// Matched characters come from the longest common block, then recursively
/// from the unmatched text on its left and on its right.
pub fn gestalt_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matching_characters(&a, &b);
    2.0 * matched as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, alo, ahi, b, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }
    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`
///
/// Returns `(i, j, len)`; among equally long blocks the one starting
/// earliest in `a`, then earliest in `b`, wins.
fn longest_match(
    a: &[char],
    alo: usize,
    ahi: usize,
    b: &[char],
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
    // curr[j - blo + 1] = length of the common run ending at a[i], b[j]
    let mut prev = vec![0usize; bhi - blo + 1];
    let mut curr = vec![0usize; bhi - blo + 1];
    for i in alo..ahi {
        for j in blo..bhi {
            let slot = j - blo + 1;
            curr[slot] = if a[i] == b[j] { prev[slot - 1] + 1 } else { 0 };
            if curr[slot] > best_len {
                best_len = curr[slot];
                best_i = i + 1 - best_len;
                best_j = j + 1 - best_len;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    (best_i, best_j, best_len)
}

// ============================================================================
// Detector
// ============================================================================

/// Popular-name corpus that package names are checked against
#[derive(Debug, Clone)]
pub struct TyposquatDetector {
    corpus: Vec<String>,
}

impl Default for TyposquatDetector {
    fn default() -> Self {
        Self::new(POPULAR_PACKAGES.iter().map(|s| s.to_string()).collect())
    }
}

impl TyposquatDetector {
    pub fn new(corpus: Vec<String>) -> Self {
        Self { corpus }
    }

    /// Load a corpus file: one name per line, `#` starts a comment
    pub fn from_corpus_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let corpus = content
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default().trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self::new(corpus))
    }

    pub fn corpus(&self) -> &[String] {
        &self.corpus
    }

    /// Corpus names at least `threshold` similar to `name`
    pub fn check(&self, name: &str, threshold: f64) -> Vec<SimilarPackage> {
        find_similar(name, &self.corpus, threshold)
    }
}

/// Score `name` against `corpus`
///
/// Results are sorted by descending similarity; equal scores keep corpus
/// order. A corpus entry equal to `name` ignoring case is skipped.
pub fn find_similar<S>(name: &str, corpus: &[S], threshold: f64) -> Vec<SimilarPackage>
where
    S: AsRef<str> + Sync,
{
    let needle = name.to_lowercase();
    let mut similar: Vec<SimilarPackage> = corpus
        .par_iter()
        .filter_map(|candidate| {
            let candidate = candidate.as_ref();
            let folded = candidate.to_lowercase();
            if folded == needle {
                return None;
            }
            let similarity = gestalt_ratio(&needle, &folded);
            (similarity >= threshold).then(|| SimilarPackage {
                name: candidate.to_string(),
                similarity,
            })
        })
        .collect();

    // stable sort keeps corpus order for ties
    similar.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    similar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TYPOSQUAT_THRESHOLD;
    use std::io::Write;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_gestalt_ratio_known_values() {
        // "requ" + "sts" = 7 matched, 15 total
        assert!(close(gestalt_ratio("requsts", "requests"), 14.0 / 15.0));
        assert!(close(gestalt_ratio("abcd", "bcde"), 0.75));
        assert!(close(gestalt_ratio("numpy", "numpy"), 1.0));
        assert!(close(gestalt_ratio("abc", "xyz"), 0.0));
        assert!(close(gestalt_ratio("", ""), 1.0));
    }

    #[test]
    fn test_gestalt_ratio_favors_contiguous_runs() {
        // single transposition keeps long runs on both sides
        assert!(gestalt_ratio("reqeusts", "requests") >= 0.85);
        // doubled character
        assert!(gestalt_ratio("requestss", "requests") >= 0.9);
    }

    #[test]
    fn test_find_similar_requsts() {
        let result = find_similar("requsts", &["requests"], 0.85);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "requests");
        assert!(result[0].similarity >= 0.85);
    }

    #[test]
    fn test_find_similar_excludes_exact_name_case_insensitively() {
        assert!(find_similar("Requests", &["requests"], 0.0).is_empty());
        assert!(find_similar("requests", &["REQUESTS"], 0.5).is_empty());
    }

    #[test]
    fn test_find_similar_orders_descending_with_corpus_tie_order() {
        // "boto" scores 8/9 against both "botox" and "boto3"
        let corpus = ["botox", "django", "boto3"];
        let result = find_similar("boto", &corpus, 0.5);
        let names: Vec<&str> = result.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["botox", "boto3"]);
        assert!(close(result[0].similarity, result[1].similarity));

        let result = find_similar("numpyy", &["nump", "numpy"], 0.5);
        assert_eq!(result[0].name, "numpy");
        assert!(result[0].similarity > result[1].similarity);
    }

    #[test]
    fn test_find_similar_threshold_is_inclusive() {
        let exact = gestalt_ratio("requsts", "requests");
        assert_eq!(find_similar("requsts", &["requests"], exact).len(), 1);
        assert!(find_similar("requsts", &["requests"], exact + 1e-6).is_empty());
    }

    #[test]
    fn test_default_detector_catches_common_typos() {
        let detector = TyposquatDetector::default();
        let result = detector.check("reqeusts", DEFAULT_TYPOSQUAT_THRESHOLD);
        assert_eq!(result.first().map(|s| s.name.as_str()), Some("requests"));
        assert!(detector
            .check("requests", DEFAULT_TYPOSQUAT_THRESHOLD)
            .iter()
            .all(|s| s.name != "requests"));
        assert!(detector.check("zzzzqqq", DEFAULT_TYPOSQUAT_THRESHOLD).is_empty());
    }

    #[test]
    fn test_from_corpus_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# top packages").unwrap();
        writeln!(file, "requests").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  numpy   # arrays").unwrap();
        let detector = TyposquatDetector::from_corpus_file(file.path()).unwrap();
        assert_eq!(detector.corpus(), &["requests".to_string(), "numpy".to_string()]);
        assert_eq!(detector.check("numpyy", 0.85)[0].name, "numpy");
    }

    #[test]
    fn test_from_corpus_file_missing() {
        let result = TyposquatDetector::from_corpus_file("/nonexistent/corpus.txt");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
