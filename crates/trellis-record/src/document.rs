//! Front-matter document codec
//!
//! A backing document is a YAML front-matter block delimited by `---` lines,
//! followed by a free-form Markdown body. Only the front matter is ever
//! rewritten; the body and unrelated keys pass through untouched.

use crate::error::ParseError;
use crate::field::FieldValue;
use crate::record::{FieldUpdate, FieldUpdates, RawRecord, RecordKey};
use pulldown_cmark::{Event, HeadingLevel, Parser as MdParser, Tag, TagEnd};
use serde_yaml::{Mapping, Value};

const DELIMITER: &str = "---";
const YAML_END: &str = "...";

/// A parsed document: front matter plus body
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    frontmatter: Mapping,
    body: String,
}

impl Document {
    /// Create document from parts
    #[inline]
    #[must_use]
    pub fn new(frontmatter: Mapping, body: impl Into<String>) -> Self {
        Self {
            frontmatter,
            body: body.into(),
        }
    }

    /// Parse document text
    ///
    /// # Errors
    /// - `ParseError::MissingFrontmatter` if the first line is not `---`
    /// - `ParseError::UnterminatedFrontmatter` if no closing line is found
    /// - `ParseError::Yaml` / `ParseError::NotAMapping` for a bad block
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = text.split_inclusive('\n');

        let first = lines.next().ok_or(ParseError::MissingFrontmatter)?;
        if first.trim_end() != DELIMITER {
            return Err(ParseError::MissingFrontmatter);
        }

        let yaml_start = first.len();
        let mut offset = yaml_start;
        for line in lines {
            let marker = line.trim_end();
            if marker == DELIMITER || marker == YAML_END {
                let frontmatter = parse_mapping(&text[yaml_start..offset])?;
                let body = text[offset + line.len()..].to_string();
                return Ok(Self { frontmatter, body });
            }
            offset += line.len();
        }

        Err(ParseError::UnterminatedFrontmatter)
    }

    /// Render document text with the canonical front-matter encoding
    ///
    /// # Errors
    /// `ParseError::Encode` if the mapping cannot be serialized
    pub fn render(&self) -> Result<String, ParseError> {
        let yaml = if self.frontmatter.is_empty() {
            String::new()
        } else {
            serde_yaml::to_string(&self.frontmatter)
                .map_err(|e| ParseError::Encode(e.to_string()))?
        };
        Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n{}", self.body))
    }

    /// Front matter mapping
    #[inline]
    #[must_use]
    pub fn frontmatter(&self) -> &Mapping {
        &self.frontmatter
    }

    /// Body text after the closing delimiter
    #[inline]
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Decode into a raw record
    ///
    /// Keys that are not strings, and values that are nested mappings, are
    /// left out: they are never relationship fields.
    #[must_use]
    pub fn to_record(&self, key: impl Into<RecordKey>) -> RawRecord {
        let mut record = RawRecord::new(key);
        for (name, value) in &self.frontmatter {
            let Some(name) = name.as_str() else {
                continue;
            };
            if let Some(value) = FieldValue::from_yaml(value) {
                record.fields.insert(name.to_string(), value);
            }
        }
        record.title = record
            .scalar("title")
            .map(str::to_string)
            .or_else(|| first_heading(&self.body));
        record
    }

    /// Merge updates into the front matter, keeping key order
    pub fn apply(&mut self, updates: &FieldUpdates) {
        for (name, update) in updates {
            match update {
                FieldUpdate::Set(value) => {
                    self.frontmatter
                        .insert(Value::String(name.clone()), value.to_yaml());
                }
                FieldUpdate::Remove => {
                    let current = std::mem::take(&mut self.frontmatter);
                    self.frontmatter = current
                        .into_iter()
                        .filter(|(k, _)| k.as_str() != Some(name.as_str()))
                        .collect();
                }
            }
        }
    }
}

fn parse_mapping(yaml: &str) -> Result<Mapping, ParseError> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    let value: Value = serde_yaml::from_str(yaml).map_err(|e| ParseError::Yaml(e.to_string()))?;
    match value {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        other => Err(ParseError::NotAMapping(kind_of(&other).to_string())),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Text of the first level-1 heading in the body
fn first_heading(body: &str) -> Option<String> {
    let mut in_title = false;
    let mut title = String::new();
    for event in MdParser::new(body) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_title = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) if in_title => {
                let text = title.trim();
                if !text.is_empty() {
                    return Some(text.to_string());
                }
                in_title = false;
                title.clear();
            }
            Event::Text(text) | Event::Code(text) if in_title => title.push_str(&text),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STORY: &str = "---\nid: S-002\ntype: story\nparent: \"[[M-001]]\"\ndepends_on: [S-001]\nstatus: open\n---\n\n# Login flow\n\nBody text.\n";

    #[test]
    fn parse_and_decode() {
        let doc = Document::parse(STORY).unwrap();
        let record = doc.to_record("stories/S-002.md");

        assert_eq!(record.scalar("id"), Some("S-002"));
        assert_eq!(record.scalar("parent"), Some("M-001"));
        assert_eq!(record.items("depends_on"), vec!["S-001"]);
        assert_eq!(record.title.as_deref(), Some("Login flow"));
        assert_eq!(doc.body(), "\n# Login flow\n\nBody text.\n");
    }

    #[test]
    fn title_field_wins_over_heading() {
        let doc = Document::parse("---\ntitle: Explicit\n---\n# Heading\n").unwrap();
        assert_eq!(doc.to_record("x.md").title.as_deref(), Some("Explicit"));
    }

    #[test]
    fn missing_frontmatter() {
        let err = Document::parse("# Just a note\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingFrontmatter));
    }

    #[test]
    fn unterminated_frontmatter() {
        let err = Document::parse("---\nid: S-001\n").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedFrontmatter));
    }

    #[test]
    fn non_mapping_frontmatter() {
        let err = Document::parse("---\n- a\n- b\n---\n").unwrap_err();
        assert!(matches!(err, ParseError::NotAMapping(_)));
    }

    #[test]
    fn empty_frontmatter_is_allowed() {
        let doc = Document::parse("---\n---\nbody").unwrap();
        assert!(doc.frontmatter().is_empty());
        assert_eq!(doc.render().unwrap(), "---\n---\nbody");
    }

    #[test]
    fn apply_rewrites_canonically_and_keeps_body() {
        let mut doc = Document::parse(STORY).unwrap();
        let mut updates = FieldUpdates::new();
        updates.insert(
            "depends_on".into(),
            FieldUpdate::Set(FieldValue::list(["S-001", "S-003"])),
        );
        updates.insert("status".into(), FieldUpdate::Remove);
        updates.insert("blocks".into(), FieldUpdate::Set(FieldValue::list(["S-004"])));
        doc.apply(&updates);

        let text = doc.render().unwrap();
        assert!(text.starts_with("---\nid: S-002\ntype: story\n"));
        assert!(text.contains("depends_on:\n- S-001\n- S-003\nblocks:\n- S-004\n---\n"));
        assert!(text.ends_with("---\n\n# Login flow\n\nBody text.\n"));
        assert!(!text.contains("status"));

        let reparsed = Document::parse(&text).unwrap().to_record("s.md");
        assert_eq!(reparsed.items("depends_on"), vec!["S-001", "S-003"]);
        assert_eq!(reparsed.get("status"), None);
    }
}
