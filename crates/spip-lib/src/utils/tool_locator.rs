// External tool lookup
// Finds scanner binaries that may live outside the inherited PATH (pip --user, Homebrew)

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Cache for resolved tool paths; misses are not cached
static TOOL_PATH_CACHE: Lazy<RwLock<HashMap<String, PathBuf>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Home directory, preferring `HOME` over platform lookups
pub fn get_home_dir() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return Some(PathBuf::from(home));
        }
    }
    dirs::home_dir()
}

/// Directories searched after PATH
fn get_fallback_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = get_home_dir() {
        // pip install --user
        paths.push(home.join(".local/bin"));
        // pipx
        paths.push(home.join(".local/pipx/bin"));
    }
    // active virtualenv
    if let Ok(venv) = std::env::var("VIRTUAL_ENV") {
        paths.push(PathBuf::from(venv).join("bin"));
    }
    paths.extend([
        // Homebrew (Apple Silicon)
        PathBuf::from("/opt/homebrew/bin"),
        // Homebrew (Intel) and manual installs
        PathBuf::from("/usr/local/bin"),
        // System
        PathBuf::from("/usr/bin"),
        PathBuf::from("/bin"),
    ]);
    paths
}

fn path_entries() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|raw| std::env::split_paths(&raw).collect())
        .unwrap_or_default()
}

/// Find a tool by name, or confirm an explicit path exists
pub fn find_tool(tool: &str) -> Option<PathBuf> {
    if let Ok(cache) = TOOL_PATH_CACHE.read() {
        if let Some(cached) = cache.get(tool) {
            return Some(cached.clone());
        }
    }

    let found = find_tool_uncached(tool)?;

    if let Ok(mut cache) = TOOL_PATH_CACHE.write() {
        cache.insert(tool.to_string(), found.clone());
    }

    Some(found)
}

fn find_tool_uncached(tool: &str) -> Option<PathBuf> {
    let as_path = Path::new(tool);
    if as_path.components().count() > 1 || as_path.is_absolute() {
        return is_executable(as_path).then(|| as_path.to_path_buf());
    }

    path_entries()
        .into_iter()
        .chain(get_fallback_paths())
        .map(|dir| dir.join(tool))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Clear the tool path cache (useful after environment changes)
pub fn clear_cache() {
    if let Ok(mut cache) = TOOL_PATH_CACHE.write() {
        cache.clear();
    }
}

/// Async command for `tool_path` with a predictable locale
pub fn create_async_command(tool_path: &Path) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(tool_path);

    if let Some(home) = get_home_dir() {
        cmd.env("HOME", home);
    }

    // Plain, parseable output
    cmd.env("LANG", "en_US.UTF-8");
    cmd.env("LC_ALL", "en_US.UTF-8");
    cmd.env("NO_COLOR", "1");
    cmd.env("PIP_DISABLE_PIP_VERSION_CHECK", "1");

    cmd
}
