//! YAML frontmatter parsing and rendering
//!
//! Catalog documents use YAML frontmatter delimited by `---`:
//!
//! ```markdown
//! ---
//! title: Linen Shirt
//! color: white
//! discountedPrice: 899
//! ---
//!
//! Breathable linen, relaxed fit.
//! ```

use super::document::{Fields, Value};
use crate::error::Error;
use std::collections::BTreeMap;

/// Parse YAML frontmatter from markdown content
pub fn parse(content: &str) -> crate::Result<(Fields, String)> {
    let content = content.trim_start();

    // No frontmatter, entire content is body
    let Some(rest) = content.strip_prefix("---") else {
        return Ok((Fields::new(), content.to_string()));
    };

    let end_pos = rest.find("\n---").ok_or_else(|| Error::YamlParseError {
        message: "unclosed frontmatter: missing closing ---".to_string(),
    })?;

    let yaml_content = rest[..end_pos].trim();
    let body_start = end_pos + 4; // Skip past "\n---"
    let body = rest[body_start..].trim_start_matches('\n').to_string();

    let yaml_value: serde_yaml::Value = serde_yaml::from_str(yaml_content)?;
    let fields = yaml_to_fields(yaml_value)?;

    Ok((fields, body))
}

/// Convert serde_yaml::Value to our Fields type
fn yaml_to_fields(value: serde_yaml::Value) -> crate::Result<Fields> {
    match value {
        serde_yaml::Value::Mapping(map) => {
            let mut fields = Fields::new();
            for (k, v) in map {
                let key = k
                    .as_str()
                    .ok_or_else(|| Error::YamlParseError {
                        message: "non-string key in frontmatter".to_string(),
                    })?
                    .to_string();
                fields.insert(key, yaml_value_to_value(v));
            }
            Ok(fields)
        }
        serde_yaml::Value::Null => Ok(Fields::new()),
        _ => Err(Error::YamlParseError {
            message: "frontmatter must be a YAML mapping".to_string(),
        }),
    }
}

/// Convert a serde_yaml::Value to our Value type
fn yaml_value_to_value(v: serde_yaml::Value) -> Value {
    match v {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Null
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => {
            Value::Array(seq.into_iter().map(yaml_value_to_value).collect())
        }
        serde_yaml::Value::Mapping(map) => {
            let obj: BTreeMap<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| {
                    k.as_str().map(|key| (key.to_string(), yaml_value_to_value(v)))
                })
                .collect();
            Value::Object(obj)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_value_to_value(tagged.value),
    }
}

/// Convert our Value to serde_yaml::Value
fn value_to_yaml(v: &Value) -> serde_yaml::Value {
    match v {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Int(i) => serde_yaml::Value::Number((*i).into()),
        Value::Float(f) => serde_yaml::Value::Number(serde_yaml::Number::from(*f)),
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::Array(arr) => serde_yaml::Value::Sequence(arr.iter().map(value_to_yaml).collect()),
        Value::Object(obj) => {
            let map: serde_yaml::Mapping = obj
                .iter()
                .map(|(k, v)| (serde_yaml::Value::String(k.clone()), value_to_yaml(v)))
                .collect();
            serde_yaml::Value::Mapping(map)
        }
    }
}

/// Render fields and body back to markdown with frontmatter
pub fn render(fields: &Fields, body: &str) -> crate::Result<String> {
    if fields.is_empty() {
        return Ok(body.to_string());
    }

    let yaml_map: serde_yaml::Mapping = fields
        .iter()
        .map(|(k, v)| (serde_yaml::Value::String(k.clone()), value_to_yaml(v)))
        .collect();

    let yaml_str = serde_yaml::to_string(&serde_yaml::Value::Mapping(yaml_map)).map_err(|e| {
        Error::YamlSerializeError {
            message: e.to_string(),
        }
    })?;

    Ok(format!("---\n{}---\n\n{}", yaml_str, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frontmatter() {
        let content = r#"---
title: Linen Shirt
quantity: 42
sizes:
  - name: S
  - name: M
---

Breathable linen, relaxed fit.
"#;

        let (fields, body) = parse(content).unwrap();

        assert_eq!(fields.get("title"), Some(&Value::String("Linen Shirt".into())));
        assert_eq!(fields.get("quantity"), Some(&Value::Int(42)));
        assert_eq!(fields.get("sizes").and_then(|v| v.as_array()).map(Vec::len), Some(2));
        assert!(body.contains("relaxed fit"));
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "Just a description.";
        let (fields, body) = parse(content).unwrap();

        assert!(fields.is_empty());
        assert_eq!(body, "Just a description.");
    }

    #[test]
    fn test_unclosed_frontmatter() {
        let err = parse("---\ntitle: broken\n").unwrap_err();
        assert!(err.to_string().contains("unclosed frontmatter"));
    }

    #[test]
    fn test_render_sorts_keys() {
        let mut fields = Fields::new();
        fields.insert("title".into(), Value::String("Test".into()));
        fields.insert("color".into(), Value::String("red".into()));

        let rendered = render(&fields, "Body").unwrap();
        let color = rendered.find("color").unwrap();
        let title = rendered.find("title").unwrap();
        assert!(color < title);

        let (parsed_fields, parsed_body) = parse(&rendered).unwrap();
        assert_eq!(parsed_fields, fields);
        assert_eq!(parsed_body, "Body");
    }
}
