//! Sink rotation
//!
//! Pure selection logic: given the current default sink, an ordered candidate
//! list and the set of sink names that really exist, pick the next sink.
//!
//! The candidate list is walked exactly as given. Duplicates are kept and
//! names that don't resolve still take part in the walk: one that ends up
//! chosen as the next sink is an error, not something to skip past.

use std::collections::HashSet;

use tracing::warn;

use crate::error::{Result, SwitchError};

/// Result of a rotation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Name of the sink to switch to
    pub target: String,
    /// Candidate names seen during the scan that matched no known sink
    pub unresolved: Vec<String>,
}

/// Split a comma-separated sink list into names
///
/// Entries are whitespace-trimmed and empty entries dropped. Order and
/// duplicates are preserved.
#[must_use]
pub fn parse_sink_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Pick the sink that follows `current` in `candidates`
///
/// Falls back to the first candidate when `current` is absent, not in the
/// list, or the last entry. Unknown names met before the target are logged
/// and reported in [`Selection::unresolved`]; an unknown target is an error.
///
/// # Errors
/// Returns [`SwitchError::NoSinks`] if `candidates` is empty and
/// [`SwitchError::UnknownSink`] if the chosen name is not in `known`.
pub fn select_next_sink(
    current: Option<&str>,
    candidates: &[String],
    known: &HashSet<&str>,
) -> Result<Selection> {
    let first = candidates.first().ok_or(SwitchError::NoSinks)?;

    let mut unresolved = Vec::new();
    let mut found_current = false;
    let mut target = None;

    for name in candidates {
        if !known.contains(name.as_str()) {
            warn!("can't find sink name '{}'", name);
            unresolved.push(name.clone());
        }

        if current == Some(name.as_str()) {
            found_current = true;
            continue;
        }

        if found_current {
            target = Some(name);
            break;
        }
    }

    let target = target.unwrap_or(first);
    if !known.contains(target.as_str()) {
        return Err(SwitchError::UnknownSink(target.clone()));
    }

    Ok(Selection {
        target: target.clone(),
        unresolved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn known<'a>(list: &[&'a str]) -> HashSet<&'a str> {
        list.iter().copied().collect()
    }

    #[rstest]
    #[case(Some("A"), "B")]
    #[case(Some("B"), "C")]
    #[case(Some("C"), "A")]
    #[case(None, "A")]
    #[case(Some("Z"), "A")]
    fn test_rotation_order(#[case] current: Option<&str>, #[case] expected: &str) {
        let candidates = names(&["A", "B", "C"]);
        let selection =
            select_next_sink(current, &candidates, &known(&["A", "B", "C", "Z"])).unwrap();
        assert_eq!(selection.target, expected);
        assert!(selection.unresolved.is_empty());
    }

    #[rstest]
    #[case(None)]
    #[case(Some("A"))]
    #[case(Some("B"))]
    fn test_single_candidate_always_selected(#[case] current: Option<&str>) {
        let candidates = names(&["A"]);
        let selection = select_next_sink(current, &candidates, &known(&["A", "B"])).unwrap();
        assert_eq!(selection.target, "A");
    }

    #[test]
    fn test_unknown_name_before_current_is_reported() {
        let candidates = names(&["ghost", "A", "B"]);
        let selection = select_next_sink(Some("A"), &candidates, &known(&["A", "B"])).unwrap();
        assert_eq!(
            selection,
            Selection {
                target: "B".to_string(),
                unresolved: vec!["ghost".to_string()],
            }
        );
    }

    #[test]
    fn test_unknown_name_right_after_current_is_fatal() {
        let candidates = names(&["A", "ghost", "B"]);
        let err = select_next_sink(Some("A"), &candidates, &known(&["A", "B"])).unwrap_err();
        assert!(matches!(err, SwitchError::UnknownSink(ref n) if n == "ghost"));
    }

    #[test]
    fn test_unknown_successor_is_fatal() {
        let candidates = names(&["A", "ghost", "B"]);
        let err = select_next_sink(Some("B"), &names(&["B", "ghost"]), &known(&["A", "B"]))
            .unwrap_err();
        assert!(matches!(err, SwitchError::UnknownSink(ref n) if n == "ghost"));

        // Wrap-around lands on a real sink even with a ghost in the middle
        let selection = select_next_sink(Some("B"), &candidates, &known(&["A", "B"])).unwrap();
        assert_eq!(selection.target, "A");
    }

    #[test]
    fn test_only_unknown_candidate_fails() {
        let err = select_next_sink(None, &names(&["X"]), &known(&["A"])).unwrap_err();
        assert!(matches!(err, SwitchError::UnknownSink(ref n) if n == "X"));
    }

    #[test]
    fn test_empty_candidates_fail_with_no_sinks() {
        let err = select_next_sink(None, &[], &known(&[])).unwrap_err();
        assert!(matches!(err, SwitchError::NoSinks));
    }

    #[test]
    fn test_duplicates_walk_raw_sequence() {
        // Current matches the first "A"; the next entry is "B"
        let candidates = names(&["A", "B", "A", "C"]);
        let selection = select_next_sink(Some("A"), &candidates, &known(&["A", "B", "C"])).unwrap();
        assert_eq!(selection.target, "B");

        // From "B" the successor is the duplicate "A", not "C"
        let selection = select_next_sink(Some("B"), &candidates, &known(&["A", "B", "C"])).unwrap();
        assert_eq!(selection.target, "A");
    }

    #[test]
    fn test_scan_stops_at_target() {
        // Names after the target are not inspected
        let candidates = names(&["A", "B", "ghost"]);
        let selection = select_next_sink(Some("A"), &candidates, &known(&["A", "B"])).unwrap();
        assert!(selection.unresolved.is_empty());
    }

    #[test]
    fn test_parse_sink_list_trims_and_drops_empty() {
        assert_eq!(
            parse_sink_list(" Speakers, Headphones ,,  ,Bluetooth Device"),
            names(&["Speakers", "Headphones", "Bluetooth Device"])
        );
    }

    #[test]
    fn test_parse_sink_list_empty_input() {
        assert!(parse_sink_list("").is_empty());
        assert!(parse_sink_list(" , ,").is_empty());
    }

    #[test]
    fn test_parse_sink_list_keeps_duplicates() {
        assert_eq!(parse_sink_list("A,B,A"), names(&["A", "B", "A"]));
    }
}
