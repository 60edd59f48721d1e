//! Numbered-answer extraction from free-form reviewer comments.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Lines shaped like `1. some answer text`, leading whitespace allowed.
    static ref ANSWER_RE: Regex = Regex::new(r"(?m)^\s*(\d+)\.\s*(.+)").unwrap();
}

/// Parses an ordered list of numbered answers out of a comment body.
///
/// Matches are sorted ascending by their number; the sort is stable, so
/// duplicate numbers keep their original scan order and are all retained.
/// Returns an empty vector when no line matches.
pub fn parse_numbered_answers(body: &str) -> Vec<String> {
    let mut numbered: Vec<(u64, String)> = ANSWER_RE
        .captures_iter(body)
        .map(|cap| {
            let number = cap[1].parse::<u64>().unwrap_or(u64::MAX);
            (number, cap[2].trim().to_string())
        })
        .collect();

    numbered.sort_by_key(|(n, _)| *n);
    numbered.into_iter().map(|(_, text)| text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_by_number_not_appearance() {
        let body = "2. second\n1. first\n3. third";
        assert_eq!(parse_numbered_answers(body), vec!["first", "second", "third"]);
    }

    #[test]
    fn no_numbered_lines_yields_empty() {
        assert!(parse_numbered_answers("just some prose\nno numbers here").is_empty());
    }

    #[test]
    fn duplicates_are_retained_in_scan_order() {
        let body = "1. first take\n2. middle\n1. second take";
        assert_eq!(
            parse_numbered_answers(body),
            vec!["first take", "second take", "middle"]
        );
    }

    #[test]
    fn indented_lines_and_trailing_whitespace_are_handled() {
        let body = "  1.   padded answer   \nnot a match\n 2. next";
        assert_eq!(parse_numbered_answers(body), vec!["padded answer", "next"]);
    }

    #[test]
    fn surrounding_prose_is_ignored() {
        let body = "Here are my answers:\n\n1. because the cache is shared\n\nThanks!";
        assert_eq!(
            parse_numbered_answers(body),
            vec!["because the cache is shared"]
        );
    }
}
