//! Incremental parser for `path:line:text` engine output

use super::filter::ResultFilter;
use super::types::{FileResult, MatchRange, MatchRecord, SearchPattern};
use regex::Regex;
use std::sync::LazyLock;

static OUTPUT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:[A-Za-z]:)?[^:]*):(\d+):(.*)$").expect("output line regex is valid")
});

/// Groups engine output lines into per-file results
///
/// Matches for a file are held back until a line for another file arrives or
/// the stream ends.
pub struct OutputParser {
    pattern: Regex,
    filter: ResultFilter,
    pending: Option<FileResult>,
}

impl OutputParser {
    pub fn new(pattern: &SearchPattern, filter: ResultFilter) -> Self {
        Self {
            pattern: pattern.regex().clone(),
            filter,
            pending: None,
        }
    }

    /// Feed one stdout line; returns the previous file's result when the path changes
    pub fn push_line(&mut self, line: &str) -> Option<FileResult> {
        let caps = OUTPUT_LINE.captures(line)?;
        let file_path = caps.get(1)?.as_str();
        let line_number: u64 = caps.get(2)?.as_str().parse().ok()?;
        let text = caps.get(3)?.as_str();

        if file_path.is_empty() || self.filter.is_excluded(file_path) {
            return None;
        }

        let row = line_number.saturating_sub(1);
        let records: Vec<MatchRecord> = self
            .pattern
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| MatchRecord {
                line_text: text.to_string(),
                match_text: m.as_str().to_string(),
                range: MatchRange {
                    row,
                    start_column: m.start(),
                    end_column: m.end(),
                },
            })
            .collect();
        if records.is_empty() {
            return None;
        }

        let flushed = match &self.pending {
            Some(pending) if pending.file_path != file_path => self.pending.take(),
            _ => None,
        };
        self.pending
            .get_or_insert_with(|| FileResult::new(file_path))
            .matches
            .extend(records);
        flushed
    }

    /// End of stream: hand over whatever is pending
    pub fn finish(&mut self) -> Option<FileResult> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser(pattern: &str) -> OutputParser {
        OutputParser::new(
            &SearchPattern::new(pattern, false).unwrap(),
            ResultFilter::none(),
        )
    }

    #[test]
    fn test_groups_by_file() {
        let mut parser = parser("foo");
        assert_eq!(parser.push_line("a.txt:3:foo bar"), None);
        assert_eq!(parser.push_line("a.txt:5:foo"), None);

        let a = parser.push_line("b.txt:1:foo").unwrap();
        assert_eq!(a.file_path, "a.txt");
        assert_eq!(a.matches.len(), 2);
        assert_eq!(a.matches[0].range, MatchRange { row: 2, start_column: 0, end_column: 3 });
        assert_eq!(a.matches[1].range.row, 4);

        let b = parser.finish().unwrap();
        assert_eq!(b.file_path, "b.txt");
        assert_eq!(b.matches.len(), 1);
        assert_eq!(b.matches[0].range.row, 0);
        assert!(parser.finish().is_none());
    }

    #[test]
    fn test_every_occurrence_left_to_right() {
        let mut parser = parser("o+");
        parser.push_line("src/x.rs:10:foo boo zoooo");
        let result = parser.finish().unwrap();
        let found: Vec<(&str, usize, usize)> = result
            .matches
            .iter()
            .map(|m| (m.match_text.as_str(), m.range.start_column, m.range.end_column))
            .collect();
        assert_eq!(found, vec![("oo", 1, 3), ("oo", 5, 7), ("oooo", 9, 13)]);
        assert!(result.matches.iter().all(|m| m.line_text == "foo boo zoooo"));
    }

    #[test]
    fn test_drive_letter_paths_and_colons_in_text() {
        let mut parser = parser("key");
        parser.push_line(r"C:\work\a.toml:7:key: value");
        let result = parser.finish().unwrap();
        assert_eq!(result.file_path, r"C:\work\a.toml");
        assert_eq!(result.matches[0].line_text, "key: value");
        assert_eq!(result.matches[0].range.row, 6);
    }

    #[test]
    fn test_malformed_and_matchless_lines_are_ignored() {
        let mut parser = parser("foo");
        assert_eq!(parser.push_line("Binary file a.bin matches"), None);
        assert_eq!(parser.push_line("a.txt:x:foo"), None);
        assert_eq!(parser.push_line("a.txt:1:bar"), None);
        assert!(parser.finish().is_none());
    }

    #[test]
    fn test_byte_columns() {
        let mut parser = parser("b");
        parser.push_line("u.txt:1:éb");
        let result = parser.finish().unwrap();
        assert_eq!(result.matches[0].range.start_column, 2);
    }
}
