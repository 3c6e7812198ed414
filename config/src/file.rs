//! Line model of a configuration file
//!
//! The file is kept as the ordered list of its physical lines so that
//! comments, blank lines and anything the store does not understand survive
//! a rewrite untouched. Only assignment lines are ever replaced, removed or
//! appended.

use crate::value::ConfigValue;
use indexmap::IndexSet;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Check whether a name can be used as a configuration key
pub fn is_valid_key(key: &str) -> bool {
    static KEY_REGEX: OnceLock<Regex> = OnceLock::new();
    KEY_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid key regex"))
        .is_match(key)
}

/// A single physical line.
///
/// Every variant keeps the line's original text without its `\n`, so a
/// trailing `\r` survives a rewrite. Classification and values ignore
/// carriage returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Empty or whitespace-only line
    Blank(String),
    /// Line starting with `#`
    Comment(String),
    /// `KEY=VALUE` with the raw, still quoted value
    Assignment {
        key: String,
        value: String,
        text: String,
    },
    /// Anything else, kept verbatim
    Other(String),
}

impl Line {
    /// Classify one line of a file, given without its `\n`
    pub fn parse(text: &str) -> Self {
        let body = text.replace('\r', "");
        if body.trim().is_empty() {
            return Line::Blank(text.to_string());
        }
        if body.trim_start().starts_with('#') {
            return Line::Comment(text.to_string());
        }

        match body.split_once('=') {
            Some((key, value)) if is_valid_key(key) => Line::Assignment {
                key: key.to_string(),
                value: value.to_string(),
                text: text.to_string(),
            },
            _ => Line::Other(text.to_string()),
        }
    }

    /// An assignment line as written by the store, with a `\r` before the
    /// line break when `crlf` is set
    pub fn assignment(key: &str, value: &ConfigValue, crlf: bool) -> Self {
        let value = value.encode();
        let text = format!("{}={}{}", key, value, if crlf { "\r" } else { "" });
        Line::Assignment {
            key: key.to_string(),
            value,
            text,
        }
    }

    /// The key assigned by this line, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            Line::Assignment { key, .. } => Some(key),
            _ => None,
        }
    }

    /// The line exactly as it is written to the file
    pub fn text(&self) -> &str {
        match self {
            Line::Blank(text)
            | Line::Comment(text)
            | Line::Other(text)
            | Line::Assignment { text, .. } => text,
        }
    }

    fn ends_with_cr(&self) -> bool {
        self.text().ends_with('\r')
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text().trim_end_matches('\r'))
    }
}

/// What [`ConfigFile::set`] did to the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// The last assignment of the key was rewritten in place; `removed`
    /// earlier duplicates were dropped.
    Replaced { line: usize, removed: usize },
    /// No assignment existed and one was appended after a blank line.
    Appended,
}

/// An ordered sequence of configuration lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    lines: Vec<Line>,
    /// Whether the last line is terminated
    trailing_newline: bool,
}

impl ConfigFile {
    /// Split file content into lines; rendering an unmodified file gives the
    /// content back byte for byte
    pub fn parse(content: &str) -> Self {
        if content.is_empty() {
            return Self::default();
        }

        let trailing_newline = content.ends_with('\n');
        let body = content.strip_suffix('\n').unwrap_or(content);
        let lines = body.split('\n').map(Line::parse).collect();
        Self {
            lines,
            trailing_newline,
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Keys assigned anywhere in the file, in order of first appearance
    pub fn assignable_keys(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter_map(Line::key)
            .map(str::to_string)
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Raw value of the last assignment of `key`
    pub fn last_assignment(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match line {
            Line::Assignment { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Store `value` under `key`.
    ///
    /// The last existing assignment is rewritten in place, keeping its line
    /// ending, and any earlier assignment of the same key is removed, so the
    /// file ends up with a single authoritative line. Without an existing
    /// assignment a blank line and the new assignment are appended, using
    /// `\r\n` if the file's first line does.
    pub fn set(&mut self, key: &str, value: &ConfigValue) -> SetOutcome {
        let positions: Vec<usize> = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.key() == Some(key))
            .map(|(idx, _)| idx)
            .collect();

        let Some((&last, earlier)) = positions.split_last() else {
            let crlf = self.lines.first().is_some_and(Line::ends_with_cr);
            let blank = if crlf { "\r" } else { "" };
            self.lines.push(Line::Blank(blank.to_string()));
            self.lines.push(Line::assignment(key, value, crlf));
            self.trailing_newline = true;
            return SetOutcome::Appended;
        };

        let crlf = self.lines[last].ends_with_cr();
        self.lines[last] = Line::assignment(key, value, crlf);
        for &idx in earlier.iter().rev() {
            self.lines.remove(idx);
        }

        SetOutcome::Replaced {
            line: last - earlier.len(),
            removed: earlier.len(),
        }
    }

    /// Render the file with every line's original ending
    pub fn render(&self) -> String {
        let mut out = self
            .lines
            .iter()
            .map(Line::text)
            .collect::<Vec<_>>()
            .join("\n");
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }
}
