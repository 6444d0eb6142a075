//! Candidate name heuristics. Resumes put the name in the header, so the rules
//! start strict on the first lines and loosen as they widen the search.

use regex::Regex;

const HEADER_LINES: usize = 5;
const MIDDLE_INITIAL_LINES: usize = 10;
const LOOSE_SEARCH_CHARS: usize = 500;

pub struct NameRules {
    header: Regex,
    middle_initial: Regex,
    loose: Regex,
    digit_run: Regex,
}

impl NameRules {
    pub fn new() -> Self {
        Self {
            header: Regex::new(r"^[A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,3}$")
                .expect("valid header name pattern"),
            middle_initial: Regex::new(r"^[A-Z][a-z]+\s+[A-Z]\.?\s+[A-Z][a-z]+$")
                .expect("valid middle initial pattern"),
            loose: Regex::new(
                r"[A-Z][a-z]+(?:\s+[A-Z]\.?\s+[A-Z][a-z]+)|[A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,2}",
            )
            .expect("valid loose name pattern"),
            digit_run: Regex::new(r"[0-9]{3,}").expect("valid digit run pattern"),
        }
    }

    pub fn extract(&self, text: &str) -> Option<String> {
        let lines = content_lines(text);
        self.from_header(&lines)
            .or_else(|| self.from_middle_initial(&lines))
            .or_else(|| self.from_leading_text(text))
    }

    fn from_header(&self, lines: &[&str]) -> Option<String> {
        lines
            .iter()
            .take(HEADER_LINES)
            .find(|line| {
                self.header.is_match(line)
                    && !line.contains('@')
                    && !line.contains("http")
                    && !self.digit_run.is_match(line)
            })
            .map(|line| line.to_string())
    }

    fn from_middle_initial(&self, lines: &[&str]) -> Option<String> {
        lines
            .iter()
            .take(MIDDLE_INITIAL_LINES)
            .find(|line| self.middle_initial.is_match(line))
            .map(|line| line.to_string())
    }

    /// Only the first unanchored match is considered.
    fn from_leading_text(&self, text: &str) -> Option<String> {
        let end = text
            .char_indices()
            .nth(LOOSE_SEARCH_CHARS)
            .map_or(text.len(), |(index, _)| index);
        let found = self.loose.find(&text[..end])?.as_str();
        if found.contains('@') || self.digit_run.is_match(found) {
            return None;
        }
        Some(found.to_string())
    }
}

/// Trimmed lines with blank and whitespace-only lines dropped.
fn content_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

impl Default for NameRules {
    fn default() -> Self {
        Self::new()
    }
}
