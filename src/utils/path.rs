//! Path utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`absolutize`]: lexical absolute form (no symlink resolution)
//! - [`relative_to`]: relative path between two locations
//! - [`to_slash`]: display form with forward slashes

use std::path::{Component, Path, PathBuf};

/// Make a path absolute and squash `.` / `..` components lexically.
///
/// Symlinks are intentionally not resolved: imports are written relative
/// to the paths the caller handed in, and resolving links would move the
/// relative anchors.
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Compute the path of `target` relative to the directory `base`.
///
/// Both sides are absolutized first, so mixed relative/absolute callers
/// get consistent results.
pub fn relative_to(base: &Path, target: &Path) -> PathBuf {
    let base = absolutize(base);
    let target = absolutize(target);

    let base_parts: Vec<Component> = base.components().collect();
    let target_parts: Vec<Component> = target.components().collect();

    let common = base_parts
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base_parts.len() {
        out.push("..");
    }
    for part in &target_parts[common..] {
        out.push(part);
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Display a path with forward slashes regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
