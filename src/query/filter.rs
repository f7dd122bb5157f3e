//! Filter predicates and their evaluation against documents

use crate::error::Error;
use crate::storage::document::{Document, Value};
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use std::ops::Bound;

/// A predicate over documents.
///
/// Field names are dotted paths (see [`Document::resolve_path`]); `id` names the
/// document id. A predicate on a path that yields several values (an array)
/// holds when any one of them satisfies it.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    /// field = value. A `Null` value also matches a missing field.
    Eq { field: String, value: Value },
    /// field IN (values...)
    In { field: String, values: Vec<Value> },
    /// Ordered comparison; both bounds must hold for the same value
    Range {
        field: String,
        lower: Bound<Value>,
        upper: Bound<Value>,
    },
    /// Case-insensitive match of the whole string
    MatchesIgnoreCase { field: String, pattern: Pattern },
    /// Every inner filter must hold
    And(Vec<Filter>),
}

/// A whole-string, case-insensitive pattern for an exact piece of text.
/// Compares by its source text.
#[derive(Debug, Clone)]
pub struct Pattern {
    text: String,
    regex: Regex,
}

impl Pattern {
    /// Regex metacharacters in `text` are matched literally
    pub fn exact_ignore_case(text: &str) -> crate::Result<Self> {
        let regex = RegexBuilder::new(&format!("^{}$", regex::escape(text)))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::Other(format!("invalid pattern '{}': {}", text, e)))?;
        Ok(Self {
            text: text.to_string(),
            regex,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Inclusive on both ends
    pub fn between(field: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Filter::Range {
            field: field.into(),
            lower: Bound::Included(low.into()),
            upper: Bound::Included(high.into()),
        }
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Range {
            field: field.into(),
            lower: Bound::Excluded(value.into()),
            upper: Bound::Unbounded,
        }
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Range {
            field: field.into(),
            lower: Bound::Included(value.into()),
            upper: Bound::Unbounded,
        }
    }

    pub fn matches_ignore_case(field: impl Into<String>, text: &str) -> crate::Result<Self> {
        Ok(Filter::MatchesIgnoreCase {
            field: field.into(),
            pattern: Pattern::exact_ignore_case(text)?,
        })
    }

    /// Conjunction that drops `All` and flattens nested `And`s
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut parts = Vec::new();
        for filter in filters {
            match filter {
                Filter::All => {}
                Filter::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Filter::All,
            1 => parts.remove(0),
            _ => Filter::And(parts),
        }
    }

    /// Evaluate this filter against a document
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,

            Filter::Eq { field, value } => {
                let values = field_values(doc, field);
                if value.is_null() && values.is_empty() {
                    return true;
                }
                values.iter().any(|v| v.loosely_equals(value))
            }

            Filter::In { field, values } => field_values(doc, field)
                .iter()
                .any(|v| values.iter().any(|candidate| v.loosely_equals(candidate))),

            Filter::Range { field, lower, upper } => field_values(doc, field)
                .iter()
                .any(|v| satisfies_lower(v, lower) && satisfies_upper(v, upper)),

            Filter::MatchesIgnoreCase { field, pattern } => field_values(doc, field)
                .iter()
                .any(|v| v.as_str().map(|s| pattern.is_match(s)).unwrap_or(false)),

            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
        }
    }
}

fn field_values<'a>(doc: &'a Document, field: &str) -> Vec<Cow<'a, Value>> {
    if field == "id" {
        return vec![Cow::Owned(Value::String(doc.id.clone()))];
    }
    doc.resolve_path(field).into_iter().map(Cow::Borrowed).collect()
}

fn satisfies_lower(value: &Value, bound: &Bound<Value>) -> bool {
    match bound {
        Bound::Unbounded => true,
        Bound::Included(b) => value.compare(b).map(|o| o.is_ge()).unwrap_or(false),
        Bound::Excluded(b) => value.compare(b).map(|o| o.is_gt()).unwrap_or(false),
    }
}

fn satisfies_upper(value: &Value, bound: &Bound<Value>) -> bool {
    match bound {
        Bound::Unbounded => true,
        Bound::Included(b) => value.compare(b).map(|o| o.is_le()).unwrap_or(false),
        Bound::Excluded(b) => value.compare(b).map(|o| o.is_lt()).unwrap_or(false),
    }
}
