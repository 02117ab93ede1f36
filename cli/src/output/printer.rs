//! Search result formatting

use codesearch_core::{FileResult, MatchRecord, SearchEvent, SearchFailureKind, SearchSummary};
use colored::Colorize;

/// Prints search events as colored text or JSON lines
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    json: bool,
}

impl Printer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Results go to stdout, errors to stderr
    pub fn print_event(&self, event: &SearchEvent) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("failed to encode result: {}", e),
            }
            return;
        }

        match event {
            SearchEvent::File(file) => print!("{}", format_file(file)),
            SearchEvent::Error(failure) => {
                let label = match failure.kind {
                    SearchFailureKind::Stderr => "engine".yellow(),
                    _ => "error".red().bold(),
                };
                eprintln!("{}: {}", label, failure.message);
            }
        }
    }

    pub fn print_summary(&self, summary: &SearchSummary) {
        if self.json {
            return;
        }
        eprintln!(
            "{} {} in {} {} ({:?})",
            summary.matches,
            plural(summary.matches, "match", "matches"),
            summary.files,
            plural(summary.files, "file", "files"),
            summary.status,
        );
    }
}

/// One file block: path header, then each matching line once with its
/// occurrences highlighted
pub fn format_file(file: &FileResult) -> String {
    let mut out = format!("{}\n", file.file_path.magenta().bold());
    for line in group_by_row(&file.matches) {
        let first = line[0];
        out.push_str(&format!(
            "{}:{}",
            (first.range.row + 1).to_string().green(),
            highlight(&first.line_text, &line)
        ));
        out.push('\n');
    }
    out.push('\n');
    out
}

fn group_by_row(matches: &[MatchRecord]) -> Vec<Vec<&MatchRecord>> {
    let mut lines: Vec<Vec<&MatchRecord>> = Vec::new();
    for record in matches {
        match lines.last_mut() {
            Some(line) if line[0].range.row == record.range.row => line.push(record),
            _ => lines.push(vec![record]),
        }
    }
    lines
}

fn highlight(text: &str, records: &[&MatchRecord]) -> String {
    let mut out = String::with_capacity(text.len() + records.len() * 16);
    let mut cursor = 0;
    for record in records {
        let (start, end) = (record.range.start_column, record.range.end_column);
        if start < cursor
            || end > text.len()
            || !text.is_char_boundary(start)
            || !text.is_char_boundary(end)
        {
            continue;
        }
        out.push_str(&text[cursor..start]);
        out.push_str(&text[start..end].red().bold().to_string());
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesearch_core::MatchRange;

    fn record(row: u64, line: &str, start: usize, end: usize) -> MatchRecord {
        MatchRecord {
            line_text: line.to_string(),
            match_text: line[start..end].to_string(),
            range: MatchRange {
                row,
                start_column: start,
                end_column: end,
            },
        }
    }

    #[test]
    fn test_format_file_groups_lines() {
        colored::control::set_override(false);
        let file = FileResult {
            file_path: "src/a.rs".to_string(),
            matches: vec![
                record(2, "foo bar foo", 0, 3),
                record(2, "foo bar foo", 8, 11),
                record(4, "foo", 0, 3),
            ],
        };
        assert_eq!(format_file(&file), "src/a.rs\n3:foo bar foo\n5:foo\n\n");
    }

    #[test]
    fn test_highlight_skips_bad_ranges() {
        colored::control::set_override(false);
        let bad = record(0, "abc", 0, 1);
        let mut out_of_range = bad.clone();
        out_of_range.range.end_column = 10;
        assert_eq!(highlight("abc", &[&out_of_range]), "abc");
    }
}
