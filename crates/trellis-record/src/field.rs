//! Typed field values
//!
//! Relationship fields arrive in three textual shapes:
//! - block list (one `- item` per line)
//! - inline list (`[a, b]`)
//! - bare scalar (`a`)
//!
//! All three decode into a [`FieldValue`]. There is exactly one encoding on
//! the way out, produced by [`FieldValue::to_yaml`]: scalars as plain strings
//! and lists as YAML block sequences.

use serde_yaml::Value;

/// Decoded value of a single front-matter field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    /// Single string value
    Scalar(String),
    /// Ordered list of string values
    List(Vec<String>),
}

impl FieldValue {
    /// Create scalar value
    #[inline]
    #[must_use]
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    /// Create list value
    #[must_use]
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Decode raw field text in any of the three accepted shapes
    #[must_use]
    pub fn parse_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::List(Vec::new());
        }

        if is_block_list(trimmed) {
            let items = trimmed
                .lines()
                .filter_map(|line| line.trim_start().strip_prefix('-'))
                .map(clean_item)
                .filter(|item| !item.is_empty())
                .collect();
            return Self::List(items);
        }

        if !is_link(trimmed) && trimmed.starts_with('[') && trimmed.ends_with(']') {
            let inner = &trimmed[1..trimmed.len() - 1];
            let items = split_inline(inner)
                .into_iter()
                .map(clean_item)
                .filter(|item| !item.is_empty())
                .collect();
            return Self::List(items);
        }

        let item = clean_item(trimmed);
        if item.is_empty() {
            Self::List(Vec::new())
        } else {
            Self::Scalar(item)
        }
    }

    /// Convert a decoded YAML value
    ///
    /// Returns `None` for mappings and tagged values, which are not field
    /// values this layer understands.
    #[must_use]
    pub fn from_yaml(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::List(Vec::new())),
            Value::Bool(b) => Some(Self::Scalar(b.to_string())),
            Value::Number(n) => Some(Self::Scalar(n.to_string())),
            Value::String(s) => Some(Self::parse_text(s)),
            Value::Sequence(seq) => {
                let mut items = Vec::new();
                collect_items(seq, &mut items);
                Some(Self::List(items))
            }
            Value::Mapping(_) | Value::Tagged(_) => None,
        }
    }

    /// Canonical YAML encoding
    #[must_use]
    pub fn to_yaml(&self) -> Value {
        match self {
            Self::Scalar(s) => Value::String(s.clone()),
            Self::List(items) => {
                Value::Sequence(items.iter().cloned().map(Value::String).collect())
            }
        }
    }

    /// Canonical text encoding (block list for lists)
    #[must_use]
    pub fn render_text(&self) -> String {
        match self {
            Self::Scalar(s) => s.clone(),
            Self::List(items) if items.is_empty() => "[]".to_string(),
            Self::List(items) => items
                .iter()
                .map(|item| format!("- {item}"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// All non-empty items, a scalar counting as a one-item list
    #[must_use]
    pub fn items(&self) -> Vec<&str> {
        match self {
            Self::Scalar(s) if s.is_empty() => Vec::new(),
            Self::Scalar(s) => vec![s.as_str()],
            Self::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// First item, if any
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.items().into_iter().next()
    }

    /// True when the value carries no items
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

/// Normalize a single item: trim, unquote, unwrap `[[link]]` / `[[link|alias]]`
#[must_use]
pub fn clean_item(raw: &str) -> String {
    let mut item = raw.trim();
    loop {
        let unquoted = strip_pair(item, '"', '"').or_else(|| strip_pair(item, '\'', '\''));
        match unquoted {
            Some(inner) => item = inner.trim(),
            None => break,
        }
    }
    if is_link(item) {
        let inner = &item[2..item.len() - 2];
        let target = inner.split('|').next().unwrap_or(inner);
        return target.trim().to_string();
    }
    item.to_string()
}

fn strip_pair(s: &str, open: char, close: char) -> Option<&str> {
    if s.len() >= 2 && s.starts_with(open) && s.ends_with(close) {
        Some(&s[open.len_utf8()..s.len() - close.len_utf8()])
    } else {
        None
    }
}

/// `[[target]]` with no nested link inside
fn is_link(s: &str) -> bool {
    s.len() >= 4
        && s.starts_with("[[")
        && s.ends_with("]]")
        && !s[2..s.len() - 2].contains("[[")
        && !s[2..s.len() - 2].contains("]]")
}

fn is_block_list(s: &str) -> bool {
    s.lines().any(|line| {
        let line = line.trim_start();
        line == "-" || line.starts_with("- ")
    })
}

/// Split inline list contents on top-level commas
fn split_inline(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (idx, ch) in inner.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&inner[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&inner[start..]);
    parts
}

/// Flatten a YAML sequence; unquoted `[[id]]` decodes as nested sequences
fn collect_items(seq: &[Value], out: &mut Vec<String>) {
    for value in seq {
        match value {
            Value::String(s) => {
                let item = clean_item(s);
                if !item.is_empty() {
                    out.push(item);
                }
            }
            Value::Number(n) => out.push(n.to_string()),
            Value::Bool(b) => out.push(b.to_string()),
            Value::Sequence(nested) => collect_items(nested, out),
            Value::Null | Value::Mapping(_) | Value::Tagged(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_block_list() {
        let value = FieldValue::parse_text("\n  - S-001\n  - \"S-002\"\n");
        assert_eq!(value, FieldValue::list(["S-001", "S-002"]));
    }

    #[test]
    fn parse_inline_list() {
        let value = FieldValue::parse_text("[S-001, 'S-002', \"[[S-003]]\"]");
        assert_eq!(value, FieldValue::list(["S-001", "S-002", "S-003"]));
    }

    #[test]
    fn parse_inline_list_of_links() {
        let value = FieldValue::parse_text("[[[M-001]], [[M-002|Second]]]");
        assert_eq!(value, FieldValue::list(["M-001", "M-002"]));
    }

    #[test]
    fn parse_scalar() {
        assert_eq!(FieldValue::parse_text(" M-001 "), FieldValue::scalar("M-001"));
        assert_eq!(FieldValue::parse_text("'M-001'"), FieldValue::scalar("M-001"));
        assert_eq!(FieldValue::parse_text("[[M-001]]"), FieldValue::scalar("M-001"));
    }

    #[test]
    fn parse_empty_shapes() {
        assert!(FieldValue::parse_text("").is_empty());
        assert!(FieldValue::parse_text("[]").is_empty());
        assert!(FieldValue::parse_text("\"\"").is_empty());
    }

    #[test]
    fn from_yaml_flattens_unquoted_links() {
        let value: Value = serde_yaml::from_str("[[S-001], [S-002]]").unwrap();
        assert_eq!(
            FieldValue::from_yaml(&value),
            Some(FieldValue::list(["S-001", "S-002"]))
        );
    }

    #[test]
    fn from_yaml_scalars() {
        let value: Value = serde_yaml::from_str("42").unwrap();
        assert_eq!(FieldValue::from_yaml(&value), Some(FieldValue::scalar("42")));

        let value: Value = serde_yaml::from_str("{a: b}").unwrap();
        assert_eq!(FieldValue::from_yaml(&value), None);
    }

    #[test]
    fn canonical_encoding_is_block_list() {
        let value = FieldValue::list(["T-001", "T-002"]);
        assert_eq!(value.render_text(), "- T-001\n- T-002");

        let yaml = serde_yaml::to_string(&value.to_yaml()).unwrap();
        assert_eq!(yaml, "- T-001\n- T-002\n");
    }

    #[test]
    fn items_and_first() {
        assert_eq!(FieldValue::scalar("M-001").items(), vec!["M-001"]);
        assert_eq!(FieldValue::list(["a", "b"]).first(), Some("a"));
        assert_eq!(FieldValue::scalar("").first(), None);
    }
}
