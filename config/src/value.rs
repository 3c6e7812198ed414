//! Typed configuration values
//!
//! A value is either a plain string or an ordered list of strings. On disk
//! scalars are double-quoted and lists are parenthesized with every element
//! double-quoted:
//!
//! ```text
//! USER_NAME="user"
//! SERVICES=("ssh" "cron")
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quote characters stripped from values, in stripping order.
const QUOTES: [char; 2] = ['"', '\''];

const LINE_BREAKS: &[char] = &['\n', '\r'];

/// A configuration value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// A single string
    Scalar(String),
    /// An ordered list of strings
    Array(Vec<String>),
}

impl ConfigValue {
    /// Create a scalar value
    pub fn scalar(value: impl Into<String>) -> Self {
        ConfigValue::Scalar(value.into())
    }

    /// Create an array value
    pub fn array<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ConfigValue::Array(items.into_iter().map(Into::into).collect())
    }

    /// An empty string or an array without elements
    pub fn is_empty(&self) -> bool {
        match self {
            ConfigValue::Scalar(value) => value.is_empty(),
            ConfigValue::Array(items) => items.is_empty(),
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            ConfigValue::Scalar(value) => Some(value),
            ConfigValue::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&[String]> {
        match self {
            ConfigValue::Scalar(_) => None,
            ConfigValue::Array(items) => Some(items),
        }
    }

    /// Render the right-hand side of an assignment line
    pub fn encode(&self) -> String {
        match self {
            ConfigValue::Scalar(value) => format!("\"{}\"", value),
            ConfigValue::Array(items) => {
                let elements = items
                    .iter()
                    .map(|item| format!("\"{}\"", item))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("({})", elements)
            }
        }
    }

    /// Decode the right-hand side of an assignment line.
    ///
    /// One layer of quoting is removed first. What remains is an array when
    /// it is wrapped in parentheses, and a scalar otherwise.
    pub fn decode(raw: &str) -> Self {
        let value = unquote(raw);

        match value.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
            Some(inner) => ConfigValue::Array(
                split_elements(inner)
                    .into_iter()
                    .map(|element| unquote(element).to_string())
                    .collect(),
            ),
            None => ConfigValue::Scalar(value.to_string()),
        }
    }

    /// Why this value cannot be written so that it reads back unchanged.
    ///
    /// There is no escaping in the file format, so values that would be
    /// decoded differently (a scalar shaped like an array, elements wrapped
    /// in single quotes, ...) are refused instead of silently corrupted.
    pub fn unrepresentable_reason(&self) -> Option<&'static str> {
        let has_line_break = match self {
            ConfigValue::Scalar(value) => value.contains(LINE_BREAKS),
            ConfigValue::Array(items) => items.iter().any(|i| i.contains(LINE_BREAKS)),
        };
        if has_line_break {
            return Some("values cannot span multiple lines");
        }

        if Self::decode(&self.encode()) != *self {
            return Some(match self {
                ConfigValue::Scalar(_) => "scalar would not read back unchanged",
                ConfigValue::Array(_) => "array elements would not read back unchanged",
            });
        }

        None
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Scalar(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Scalar(value)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(items: Vec<String>) -> Self {
        ConfigValue::Array(items)
    }
}

impl From<Vec<&str>> for ConfigValue {
    fn from(items: Vec<&str>) -> Self {
        ConfigValue::array(items)
    }
}

/// Strip at most one trailing and one leading quote, double quotes first.
pub fn unquote(raw: &str) -> &str {
    let mut value = raw;
    for quote in QUOTES {
        value = value.strip_suffix(quote).unwrap_or(value);
        value = value.strip_prefix(quote).unwrap_or(value);
    }
    value
}

/// Split the inside of `( ... )` on whitespace, keeping quoted runs together.
fn split_elements(inner: &str) -> Vec<&str> {
    let mut elements = Vec::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;

    for (idx, ch) in inner.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None if ch.is_whitespace() => {
                if let Some(begin) = start.take() {
                    elements.push(&inner[begin..idx]);
                }
            }
            None => {
                if start.is_none() {
                    start = Some(idx);
                }
                if QUOTES.contains(&ch) {
                    quote = Some(ch);
                }
            }
        }
    }

    if let Some(begin) = start {
        elements.push(&inner[begin..]);
    }

    elements
}
