//! Property-based tests for path resolution

use std::path::{Component, Path};

use proptest::prelude::*;
use termquest::{normalize_path, resolve_path};

mod strategies {
    use proptest::prelude::*;

    /// A path segment, including the `.` and `..` specials.
    pub fn segment() -> impl Strategy<Value = String> {
        prop_oneof![
            3 => prop::string::string_regex("[a-zA-Z0-9_.-]{1,12}").unwrap(),
            1 => Just("..".to_string()),
            1 => Just(".".to_string()),
        ]
    }

    /// Relative or absolute input as a user would type it.
    pub fn user_path() -> impl Strategy<Value = String> {
        (
            prop_oneof![Just(""), Just("/"), Just("~/")],
            prop::collection::vec(segment(), 0..8),
        )
            .prop_map(|(prefix, segments)| format!("{prefix}{}", segments.join("/")))
    }
}

fn is_clean(path: &Path) -> bool {
    path.is_absolute()
        && path
            .components()
            .all(|c| matches!(c, Component::RootDir | Component::Normal(_)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Resolved paths are absolute with no `.` or `..` left
    #[test]
    fn resolved_paths_are_clean(cwd in strategies::user_path(), input in strategies::user_path()) {
        let cwd = normalize_path(Path::new(&cwd));
        let resolved = resolve_path(&cwd, &input);
        prop_assert!(is_clean(&resolved), "{} + {} -> {}", cwd.display(), input, resolved.display());
    }

    /// Normalizing twice changes nothing
    #[test]
    fn normalize_is_idempotent(input in strategies::user_path()) {
        let once = normalize_path(Path::new(&input));
        let twice = normalize_path(&once);
        prop_assert_eq!(once, twice);
    }

    /// `..` after a plain segment cancels it
    #[test]
    fn parent_cancels_child(cwd in strategies::user_path(), name in "[a-z]{1,8}") {
        let cwd = normalize_path(Path::new(&cwd));
        let there_and_back = resolve_path(&cwd, &format!("{name}/.."));
        prop_assert_eq!(there_and_back, cwd);
    }
}
