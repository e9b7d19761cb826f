//! Path resolution against the session's working directory
//!
//! Every path a command receives goes through [`resolve_path`] before it
//! touches the filesystem, so filesystem implementations only ever see
//! absolute paths without `.` or `..` segments.

use std::path::{Component, Path, PathBuf};

/// The single home directory (`~`).
pub const HOME_DIR: &str = "/home/user";

/// Resolve a user-supplied path relative to the current working directory.
///
/// - empty input resolves to `cwd`
/// - `~` and `~/...` resolve under [`HOME_DIR`]
/// - absolute input is kept but still normalized
/// - `..` never climbs above `/`
///
/// # Example
///
/// ```
/// use std::path::{Path, PathBuf};
/// use termquest::resolve_path;
///
/// assert_eq!(resolve_path(Path::new("/a/b"), ".."), PathBuf::from("/a"));
/// assert_eq!(resolve_path(Path::new("/"), ".."), PathBuf::from("/"));
/// assert_eq!(resolve_path(Path::new("/tmp"), "~/x"), PathBuf::from("/home/user/x"));
/// ```
pub fn resolve_path(cwd: &Path, input: &str) -> PathBuf {
    let input = input.trim();
    if input.is_empty() {
        return normalize_path(cwd);
    }

    let joined = if input == "~" {
        PathBuf::from(HOME_DIR)
    } else if let Some(rest) = input.strip_prefix("~/") {
        Path::new(HOME_DIR).join(rest)
    } else if input.starts_with('/') {
        PathBuf::from(input)
    } else {
        cwd.join(input)
    };

    normalize_path(&joined)
}

/// Normalize a path by resolving `.` and `..` components.
///
/// Relative input is treated as rooted at `/`. The result has no trailing
/// slash except for the root itself.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut stack: Vec<&std::ffi::OsStr> = Vec::new();

    for component in path.components() {
        match component {
            Component::Normal(name) => stack.push(name),
            Component::ParentDir => {
                stack.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }

    let mut result = PathBuf::from("/");
    for name in stack {
        result.push(name);
    }
    result
}

/// Render a path for display in prompts and messages.
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
