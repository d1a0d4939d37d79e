//! Field-level comparison of two descriptors.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::descriptor::{Descriptor, Kind};

/// Path label used when the root node itself changes kind.
const ROOT_PATH: &str = "$";

/// A deterministic field-level delta between two descriptors.
///
/// Paths are dot-separated field names from the root, with `[]` appended
/// when the walk descends into an array element and `<kind>` appended for
/// union member changes. `unchanged_count` tallies leaf positions present
/// on both sides with the same kind.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct Diff {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub type_changed: BTreeMap<String, KindChange>,
    pub unchanged_count: u64,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.type_changed.is_empty()
    }
}

/// One kind substitution at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindChange {
    pub from: Kind,
    pub to: Kind,
}

/// Compares two descriptors field by field.
///
/// The report depends only on the inputs: same pair, same report. Swapping
/// the inputs swaps `added` with `removed` and flips every `KindChange`.
pub fn diff(a: &Descriptor, b: &Descriptor) -> Diff {
    let mut out = Diff::default();
    walk(a, b, None, &mut out);
    out
}

fn walk(a: &Descriptor, b: &Descriptor, path: Option<&str>, out: &mut Diff) {
    match (a, b) {
        (Descriptor::Object { fields: a }, Descriptor::Object { fields: b }) => {
            for (name, a_field) in a {
                match b.get(name) {
                    Some(b_field) => {
                        let child = field_path(path, name);
                        walk(&a_field.shape, &b_field.shape, Some(&child), out);
                    }
                    None => {
                        out.removed.insert(field_path(path, name));
                    }
                }
            }
            for name in b.keys() {
                if !a.contains_key(name) {
                    out.added.insert(field_path(path, name));
                }
            }
        }
        (Descriptor::Array { element: a }, Descriptor::Array { element: b }) => {
            let child = element_path(path);
            walk(a, b, Some(&child), out);
        }
        (Descriptor::Union { members: a }, Descriptor::Union { members: b }) => {
            // Unions compare as member sets; the walk does not descend
            // into individual members.
            if a == b {
                out.unchanged_count += 1;
                return;
            }
            for member in a.difference(b) {
                out.removed.insert(member_path(path, member.kind()));
            }
            for member in b.difference(a) {
                out.added.insert(member_path(path, member.kind()));
            }
        }
        (a, b) if a.kind() == b.kind() => {
            out.unchanged_count += 1;
        }
        (a, b) => {
            let at = path.map_or_else(|| ROOT_PATH.to_string(), str::to_string);
            out.type_changed.insert(
                at,
                KindChange {
                    from: a.kind(),
                    to: b.kind(),
                },
            );
        }
    }
}

fn field_path(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}.{name}"),
        None => name.to_string(),
    }
}

fn element_path(parent: Option<&str>) -> String {
    match parent {
        Some(parent) => format!("{parent}[]"),
        None => "[]".to_string(),
    }
}

fn member_path(parent: Option<&str>, kind: Kind) -> String {
    match parent {
        Some(parent) => format!("{parent}<{kind}>"),
        None => format!("<{kind}>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldDescriptor;
    use crate::infer::infer;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn shapes(a: Value, b: Value) -> (Descriptor, Descriptor) {
        (infer(&a), infer(&b))
    }

    #[test]
    fn test_identical_descriptors_produce_empty_diff() {
        let shape = infer(&json!({"driver": "VER", "sectors": [31.2]}));
        let report = diff(&shape, &shape);

        assert!(report.is_empty());
        assert_eq!(report.unchanged_count, 2);
    }

    #[test]
    fn test_added_and_removed_fields() {
        let (a, b) = shapes(
            json!({"driver": "VER", "lap": 30}),
            json!({"driver": "VER", "gap": 2.7}),
        );
        let report = diff(&a, &b);

        assert_eq!(report.added, ["gap".to_string()].into());
        assert_eq!(report.removed, ["lap".to_string()].into());
        assert!(report.type_changed.is_empty());
        assert_eq!(report.unchanged_count, 1);
    }

    #[test]
    fn test_type_change_at_nested_path() {
        let (a, b) = shapes(
            json!({"timing": {"gap": "2.7s"}}),
            json!({"timing": {"gap": 2.7}}),
        );
        let report = diff(&a, &b);

        assert_eq!(report.type_changed.len(), 1);
        let change = &report.type_changed["timing.gap"];
        assert_eq!(change.from, Kind::String);
        assert_eq!(change.to, Kind::Number);
    }

    #[test]
    fn test_array_element_paths_use_bracket_suffix() {
        let (a, b) = shapes(
            json!({"laps": [{"time": 92.4}]}),
            json!({"laps": [{"time": 92.4, "tyre": "soft"}]}),
        );
        let report = diff(&a, &b);

        assert_eq!(report.added, ["laps[].tyre".to_string()].into());
        assert_eq!(report.unchanged_count, 1);
    }

    #[test]
    fn test_nested_array_paths_stack_suffixes() {
        let (a, b) = shapes(json!([[1.0]]), json!([["fastest"]]));
        let report = diff(&a, &b);

        let change = &report.type_changed["[][]"];
        assert_eq!(change.from, Kind::Number);
        assert_eq!(change.to, Kind::String);
    }

    #[test]
    fn test_root_type_change_uses_dollar_path() {
        let (a, b) = shapes(json!({"a": 1}), json!([1]));
        let report = diff(&a, &b);

        let change = &report.type_changed["$"];
        assert_eq!(change.from, Kind::Object);
        assert_eq!(change.to, Kind::Array);
    }

    #[test]
    fn test_union_member_changes_report_kinds() {
        let a = Descriptor::object([(
            "gap",
            FieldDescriptor::required(Descriptor::union_of([
                Descriptor::Null,
                Descriptor::Number,
            ])),
        )]);
        let b = Descriptor::object([(
            "gap",
            FieldDescriptor::required(Descriptor::union_of([
                Descriptor::Number,
                Descriptor::String,
            ])),
        )]);

        let report = diff(&a, &b);
        assert_eq!(report.added, ["gap<string>".to_string()].into());
        assert_eq!(report.removed, ["gap<null>".to_string()].into());
        assert_eq!(report.unchanged_count, 0);
    }

    #[test]
    fn test_identical_unions_count_as_unchanged() {
        let shape = infer(&json!({"gap": ["2.7s", 2.7]}));
        let report = diff(&shape, &shape);
        assert!(report.is_empty());
        assert_eq!(report.unchanged_count, 1);
    }

    #[test]
    fn test_union_versus_scalar_is_a_type_change() {
        let (a, b) = shapes(json!({"gap": ["2.7s", 2.7]}), json!({"gap": [2.7]}));
        let report = diff(&a, &b);

        let change = &report.type_changed["gap[]"];
        assert_eq!(change.from, Kind::Union);
        assert_eq!(change.to, Kind::Number);
    }

    #[test]
    fn test_diff_is_directionally_symmetric() {
        let cases = [
            (json!({"a": 1, "b": "x"}), json!({"b": 2, "c": true})),
            (json!({"laps": [{"t": 1}]}), json!({"laps": [{"s": 2}]})),
            (json!([1]), json!({"a": 1})),
            (json!({"g": [1, "x"]}), json!({"g": [null]})),
        ];
        for (left, right) in cases {
            let (a, b) = shapes(left, right);
            let forward = diff(&a, &b);
            let backward = diff(&b, &a);

            assert_eq!(forward.added, backward.removed);
            assert_eq!(forward.removed, backward.added);
            assert_eq!(forward.unchanged_count, backward.unchanged_count);
            let flipped: BTreeMap<String, KindChange> = backward
                .type_changed
                .iter()
                .map(|(path, change)| {
                    (
                        path.clone(),
                        KindChange {
                            from: change.to,
                            to: change.from,
                        },
                    )
                })
                .collect();
            assert_eq!(forward.type_changed, flipped);
        }
    }

    #[test]
    fn test_diff_is_deterministic() {
        let (a, b) = shapes(
            json!({"z": 1, "m": [true], "a": {"x": null}}),
            json!({"z": "1", "m": [], "b": {"x": null}}),
        );
        let first = diff(&a, &b);
        let second = diff(&a, &b);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
