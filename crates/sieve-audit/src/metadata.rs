//! Metadata field extraction.
//!
//! Picks requested fields out of a bibliographic record. A few well-known
//! fields fall back to placeholder values when absent; any other absent
//! field rejects the whole record.

use std::io::BufRead;

use serde::Serialize;
use serde_json::{json, Map, Value};
use sieve_core::Result;

/// Key whose presence marks an API envelope (`{"status": .., "message": {..}}`).
const ENVELOPE_STATUS: &str = "status";
const ENVELOPE_MESSAGE: &str = "message";

/// A record holding exactly the requested fields, in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetadataRecord(Map<String, Value>);

impl MetadataRecord {
    /// Value of `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Field names, in request order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwrap into the underlying JSON object.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Placeholder for a missing recognized field, or `None` if the field has
/// no default.
pub fn default_value(field: &str) -> Option<Value> {
    match field {
        "author" => Some(json!([{
            "given": "Noname",
            "family": "Nanashi",
            "sequence": "first",
            "affiliation": []
        }])),
        "subject" => Some(json!(["No subject"])),
        "title" => Some(json!(["No title"])),
        "published" => Some(json!([{ "date-parts": [[9999, 12, 31]] }])),
        _ => None,
    }
}

/// Extract `fields` from `record`.
///
/// Records carrying a `status` key are unwrapped to their `message` object
/// first. Present fields are copied verbatim, missing recognized fields get
/// their [`default_value`], and any other missing field makes the whole
/// call return `None`.
pub fn extract(record: &Value, fields: &[&str]) -> Option<MetadataRecord> {
    let source = if record.get(ENVELOPE_STATUS).is_some() {
        record.get(ENVELOPE_MESSAGE)?
    } else {
        record
    };
    let source = source.as_object()?;

    let mut out = Map::new();
    for &field in fields {
        let value = match source.get(field) {
            Some(value) => value.clone(),
            None => default_value(field)?,
        };
        out.insert(field.to_string(), value);
    }
    Some(MetadataRecord(out))
}

/// Outcome of extracting from one line of a JSON-lines stream.
#[derive(Debug)]
pub enum LineOutcome {
    /// All fields resolved.
    Record(MetadataRecord),
    /// The line parsed but a required field was missing.
    Skipped {
        /// 1-based line number.
        line: usize,
    },
}

/// Run [`extract`] over every non-blank line of a JSON-lines reader.
///
/// I/O and JSON errors stop iteration at the failing line.
pub fn extract_lines<'a, R: BufRead + 'a>(
    reader: R,
    fields: &'a [&'a str],
) -> impl Iterator<Item = Result<LineOutcome>> + 'a {
    reader
        .lines()
        .enumerate()
        .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
        .map(move |(idx, line)| -> Result<LineOutcome> {
            let value: Value = serde_json::from_str(&line?)?;
            Ok(match extract(&value, fields) {
                Some(record) => LineOutcome::Record(record),
                None => LineOutcome::Skipped { line: idx + 1 },
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn anonymous_author() -> Value {
        json!([{
            "given": "Noname",
            "family": "Nanashi",
            "sequence": "first",
            "affiliation": []
        }])
    }

    #[test]
    fn test_present_fields_copied_verbatim() {
        let record = json!({
            "title": ["Deep Learning"],
            "author": [{ "given": "Ada", "family": "Lovelace" }],
            "DOI": "10.1/x"
        });
        let out = extract(&record, &["DOI", "title"]).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.get("DOI").unwrap(), "10.1/x");
        assert_eq!(out.get("title").unwrap(), &json!(["Deep Learning"]));
        assert!(out.get("author").is_none());
    }

    #[test]
    fn test_missing_author_gets_default() {
        let record = json!({ "title": ["Real Title"] });
        let out = extract(&record, &["author", "title"]).unwrap();
        assert_eq!(out.get("author").unwrap(), &anonymous_author());
        assert_eq!(out.get("title").unwrap(), &json!(["Real Title"]));
    }

    #[test]
    fn test_all_defaults() {
        let out = extract(&json!({}), &["author", "subject", "title", "published"]).unwrap();
        assert_eq!(out.get("subject").unwrap(), &json!(["No subject"]));
        assert_eq!(out.get("title").unwrap(), &json!(["No title"]));
        assert_eq!(
            out.get("published").unwrap(),
            &json!([{ "date-parts": [[9999, 12, 31]] }])
        );
    }

    #[test]
    fn test_unrecognized_missing_field_rejects_record() {
        let record = json!({ "title": ["x"] });
        assert!(extract(&record, &["custom_unrecognized_field"]).is_none());
        assert!(extract(&record, &["title", "DOI", "author"]).is_none());
    }

    #[test]
    fn test_envelope_is_unwrapped() {
        let record = json!({
            "status": "ok",
            "message-type": "work",
            "message": { "DOI": "10.1/inner", "title": ["Inner"] }
        });
        let out = extract(&record, &["DOI", "title"]).unwrap();
        assert_eq!(out.get("DOI").unwrap(), "10.1/inner");

        // Top-level keys are not visible once unwrapped
        assert!(extract(&record, &["message-type"]).is_none());
    }

    #[test]
    fn test_envelope_without_message_object() {
        assert!(extract(&json!({ "status": "ok" }), &["title"]).is_none());
        assert!(extract(&json!({ "status": "ok", "message": 3 }), &["title"]).is_none());
    }

    #[test]
    fn test_field_order_follows_request() {
        let record = json!({ "b": 1, "a": 2 });
        let out = extract(&record, &["a", "b"]).unwrap();
        assert_eq!(out.fields().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_field_list() {
        let out = extract(&json!({ "a": 1 }), &[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_extract_lines() {
        let input = concat!(
            "{\"DOI\": \"10.1/a\", \"title\": [\"A\"]}\n",
            "\n",
            "{\"title\": [\"no doi\"]}\n",
            "{\"status\": \"ok\", \"message\": {\"DOI\": \"10.1/c\"}}\n",
        );
        let fields = ["DOI", "title"];
        let outcomes: Vec<LineOutcome> = extract_lines(Cursor::new(input), &fields)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(&outcomes[0], LineOutcome::Record(r) if r.get("DOI").unwrap() == "10.1/a"));
        assert!(matches!(outcomes[1], LineOutcome::Skipped { line: 3 }));
        match &outcomes[2] {
            LineOutcome::Record(r) => {
                assert_eq!(r.get("title").unwrap(), &json!(["No title"]));
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_lines_bad_json() {
        let fields = ["DOI"];
        let mut iter = extract_lines(Cursor::new("not json\n"), &fields);
        assert!(iter.next().unwrap().is_err());
    }
}
