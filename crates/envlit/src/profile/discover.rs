//! Profile discovery on disk.

use std::path::{Path, PathBuf};

/// Directory profiles live in, under the invocation directory.
pub const PROFILE_DIR: &str = ".envlit";

/// Base name used when no profile is named.
pub const DEFAULT_PROFILE: &str = "default";

/// Finds the profile file for a given profile name.
///
/// Looks for `.envlit/<profile>.yaml` then `.envlit/<profile>.yml` under
/// `search_dir`; the base name is `default` when `profile` is `None`.
#[must_use]
pub fn find_profile(profile: Option<&str>, search_dir: &Path) -> Option<PathBuf> {
    let dir = search_dir.join(PROFILE_DIR);
    if !dir.is_dir() {
        return None;
    }

    let base = profile.unwrap_or(DEFAULT_PROFILE);

    for ext in ["yaml", "yml"] {
        let candidate = dir.join(format!("{base}.{ext}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    None
}
