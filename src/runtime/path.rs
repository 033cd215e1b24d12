//! Path utility functions for normalization and relative paths.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component);
                }
            }
            _ => {
                result.push(component);
            }
        }
    }
    result
}

/// Calculate the relative path from a directory to a target path.
///
/// For example, if `from_dir` is `/project/tools` and `to_path` is
/// `/project/sat_modules/owner/repo-master/cosmos/launcher.rb`, this returns
/// `../sat_modules/owner/repo-master/cosmos/launcher.rb`.
///
/// Returns `None` if a relative path cannot be computed (e.g., different drive letters on Windows).
pub fn relative_path_from_dir(from_dir: &Path, to_path: &Path) -> Option<PathBuf> {
    let result = pathdiff::diff_paths(normalize_path(to_path), normalize_path(from_dir))?;

    if result.is_absolute() {
        return None;
    }

    Some(result)
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_slash_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
