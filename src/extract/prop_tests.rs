use proptest::prelude::*;

use super::*;

proptest! {
    #[test]
    fn sanitize_name_is_idempotent(s in "\\PC{0,64}") {
        let once = sanitize_name(&s);
        let twice = sanitize_name(&once);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn sanitize_name_has_no_separator_runs_or_edges(s in "\\PC{0,64}") {
        let out = sanitize_name(&s);
        prop_assert!(!out.contains("__"), "separator run in {:?}", out);
        prop_assert!(!out.starts_with('_'), "leading underscore in {:?}", out);
        prop_assert!(!out.ends_with('_'), "trailing underscore in {:?}", out);
    }

    #[test]
    fn extract_urls_returns_substrings_of_the_input(s in "\\PC{0,128}") {
        for url in extract_urls(&s) {
            prop_assert!(s.contains(&url), "{:?} not found in input", url);
        }
    }

    #[test]
    fn parse_work_path_round_trips(
        username in "[a-z][a-z0-9_]{0,12}",
        id in 1u64..10_000_000,
    ) {
        let parsed = parse_work_path(&format!("/@{username}/works/{id}")).unwrap();
        prop_assert_eq!(parsed.username, username);
        prop_assert_eq!(parsed.post_id, id);
    }
}
