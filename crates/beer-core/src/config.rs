//! Environment and workspace lookup helpers.

use std::path::{Path, PathBuf};

/// Read `key`, treating an unset or empty variable as absent.
pub fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Walk up from `start` to the first directory that holds a `contracts/` tree.
///
/// Falls back to `start` itself when no ancestor has one.
pub fn workspace_root_from(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|p| p.join("contracts").is_dir())
        .unwrap_or(start)
        .to_path_buf()
}

/// Workspace root as seen from the calling crate's manifest directory.
///
/// Pass `env!("CARGO_MANIFEST_DIR")` from the caller so the lookup starts in
/// the right crate.
pub fn workspace_root(manifest_dir: &str) -> PathBuf {
    workspace_root_from(Path::new(manifest_dir))
}
