//! Property tests for the path resolver.

use form_model::{Path, is_descendant_of, normalize, parent_of, rewrite_row_index};
use proptest::prelude::*;

/// Strategy for canonical paths: names alternate with optional row indices.
fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(("[a-z][a-z0-9_]{0,6}", prop::option::of(0usize..20)), 1..5).prop_map(
        |parts| {
            let mut segments = Vec::new();
            for (name, index) in parts {
                segments.push(name);
                if let Some(index) = index {
                    segments.push(index.to_string());
                }
            }
            segments.join(".")
        },
    )
}

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in path_strategy()) {
        let once = normalize(&raw).unwrap();
        let twice = normalize(once.as_str()).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.as_str(), raw.as_str());
    }

    #[test]
    fn bracket_form_matches_dotted_form(raw in path_strategy()) {
        let dotted = normalize(&raw).unwrap();
        let bracketed: String = raw
            .split('.')
            .map(|segment| {
                if segment.bytes().all(|b| b.is_ascii_digit()) {
                    format!("[{segment}]")
                } else {
                    format!(".{segment}")
                }
            })
            .collect::<String>()
            .trim_start_matches('.')
            .to_string();
        prop_assert_eq!(normalize(&bracketed).unwrap(), dotted);
    }

    #[test]
    fn every_path_descends_from_its_parent(raw in path_strategy()) {
        let path = normalize(&raw).unwrap();
        let parent = parent_of(&path).unwrap();
        prop_assert!(is_descendant_of(&path, &parent));
        prop_assert_eq!(parent.depth() + 1, path.depth());
    }

    #[test]
    fn rewrite_is_reversible(raw in path_strategy(), new_index in 0usize..50) {
        let path = normalize(&raw).unwrap();
        // Pick the deepest row index of the path, if any, as the group to rewrite.
        let segments: Vec<&str> = path.as_str().split('.').collect();
        let Some(position) = segments.iter().rposition(|s| s.bytes().all(|b| b.is_ascii_digit())) else {
            prop_assert_eq!(rewrite_row_index(&path, &path, 0, new_index), path.clone());
            return Ok(());
        };
        let group = Path::new(&segments[..position].join(".")).unwrap();
        let old_index: usize = segments[position].parse().unwrap();

        let moved = rewrite_row_index(&path, &group, old_index, new_index);
        prop_assert_eq!(moved.depth(), path.depth());
        prop_assert_eq!(moved.shape(), path.shape());
        prop_assert_eq!(rewrite_row_index(&moved, &group, new_index, old_index), path);
    }
}
