//! Compact descriptor summaries for listings and logs.

use serde::{Deserialize, Serialize};

use crate::descriptor::{Descriptor, Kind};

/// Field names reported before a summary truncates.
const MAX_SUMMARY_FIELDS: usize = 12;

/// Quick lines rendered before a summary truncates.
const MAX_QUICK_LINES: usize = 6;

/// A trimmed view of a descriptor, cheap enough to embed in list
/// responses. Full descriptors stay behind the per-version endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorSummary {
    pub kind: Kind,
    pub field_count: usize,
    pub field_names: Vec<String>,
    pub quick_lines: Vec<String>,
}

/// Summarizes a descriptor's top level.
///
/// Objects report their field count, the first [`MAX_SUMMARY_FIELDS`]
/// field names and up to [`MAX_QUICK_LINES`] `name: kind` lines. Arrays
/// report a single element line. Scalars and unions carry no lines beyond
/// their kind.
pub fn summarize(descriptor: &Descriptor) -> DescriptorSummary {
    match descriptor {
        Descriptor::Object { fields } => DescriptorSummary {
            kind: Kind::Object,
            field_count: fields.len(),
            field_names: fields
                .keys()
                .take(MAX_SUMMARY_FIELDS)
                .cloned()
                .collect(),
            quick_lines: fields
                .iter()
                .take(MAX_QUICK_LINES)
                .map(|(name, field)| {
                    format!("{name}: {}", display_kind(&field.shape))
                })
                .collect(),
        },
        Descriptor::Array { element } => DescriptorSummary {
            kind: Kind::Array,
            field_count: 0,
            field_names: Vec::new(),
            quick_lines: vec![format!("[]: {}", display_kind(element))],
        },
        other => DescriptorSummary {
            kind: other.kind(),
            field_count: 0,
            field_names: Vec::new(),
            quick_lines: Vec::new(),
        },
    }
}

/// Renders a field's kind for quick lines, one structural level deep.
fn display_kind(descriptor: &Descriptor) -> String {
    match descriptor {
        Descriptor::Object { .. } => "object".to_string(),
        Descriptor::Array { element } => {
            format!("array<{}>", display_kind(element))
        }
        Descriptor::Union { members } => {
            let kinds: Vec<&str> =
                members.iter().map(|m| m.kind().as_str()).collect();
            format!("union({})", kinds.join(", "))
        }
        scalar => scalar.kind().as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::infer;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map, Value};

    #[test]
    fn test_object_summary() {
        let shape = infer(&json!({
            "driver": "VER",
            "lap": 30,
            "sectors": [31.2, 28.9],
            "car": {"team": "RBR"},
        }));
        let summary = summarize(&shape);

        assert_eq!(summary.kind, Kind::Object);
        assert_eq!(summary.field_count, 4);
        assert_eq!(summary.field_names, vec!["car", "driver", "lap", "sectors"]);
        assert_eq!(
            summary.quick_lines,
            vec![
                "car: object",
                "driver: string",
                "lap: number",
                "sectors: array<number>",
            ]
        );
    }

    #[test]
    fn test_wide_objects_truncate() {
        let mut entries = Map::new();
        for i in 0..30 {
            entries.insert(format!("field_{i:02}"), Value::from(i));
        }
        let summary = summarize(&infer(&Value::Object(entries)));

        assert_eq!(summary.field_count, 30);
        assert_eq!(summary.field_names.len(), 12);
        assert_eq!(summary.quick_lines.len(), 6);
        assert_eq!(summary.field_names[0], "field_00");
        assert_eq!(summary.quick_lines[5], "field_05: number");
    }

    #[test]
    fn test_array_summary_reports_element() {
        let summary = summarize(&infer(&json!([{"lap": 1}])));
        assert_eq!(summary.kind, Kind::Array);
        assert_eq!(summary.field_count, 0);
        assert_eq!(summary.quick_lines, vec!["[]: object"]);
    }

    #[test]
    fn test_scalar_summary_is_bare() {
        let summary = summarize(&infer(&json!("fastest lap")));
        assert_eq!(summary.kind, Kind::String);
        assert!(summary.field_names.is_empty());
        assert!(summary.quick_lines.is_empty());
    }

    #[test]
    fn test_union_fields_render_member_kinds() {
        let shape = infer(&json!({"gap": [2.7, "2.7s", null]}));
        let summary = summarize(&shape);
        assert_eq!(
            summary.quick_lines,
            vec!["gap: array<union(null, number, string)>"]
        );
    }
}
