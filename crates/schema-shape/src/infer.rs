//! Structural inference over raw JSON values.

use serde_json::Value;

use crate::descriptor::{Descriptor, FieldDescriptor};
use crate::merge::merge;

/// Nesting cutoff applied when no explicit depth is configured.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Infers the canonical descriptor for a JSON value.
///
/// Inference is total: every JSON document maps to exactly one descriptor,
/// and the same document always maps to the same descriptor. Values are
/// discarded, all numbers collapse into a single `number` kind, and fields
/// of a single document are never optional.
pub fn infer(value: &Value) -> Descriptor {
    infer_with_depth(value, DEFAULT_MAX_DEPTH)
}

/// Like [`infer`] but with an explicit nesting cutoff.
///
/// Nodes at or below the cutoff collapse into a `null` leaf, so adversarial
/// nesting cannot recurse without bound. Array elements and object field
/// values each count as one level.
pub fn infer_with_depth(value: &Value, max_depth: usize) -> Descriptor {
    infer_value(value, 0, max_depth)
}

fn infer_value(value: &Value, depth: usize, max_depth: usize) -> Descriptor {
    if depth >= max_depth {
        return Descriptor::Null;
    }
    match value {
        Value::Null => Descriptor::Null,
        Value::Bool(_) => Descriptor::Boolean,
        Value::Number(_) => Descriptor::Number,
        Value::String(_) => Descriptor::String,
        Value::Array(items) => {
            // Heterogeneous arrays fold element shapes pairwise. An empty
            // array keeps a null placeholder element until a later merge
            // observes real elements.
            let element = items
                .iter()
                .map(|item| infer_value(item, depth + 1, max_depth))
                .reduce(merge)
                .unwrap_or(Descriptor::Null);
            Descriptor::Array {
                element: Box::new(element),
            }
        }
        Value::Object(entries) => Descriptor::Object {
            fields: entries
                .iter()
                .map(|(name, field)| {
                    let shape = infer_value(field, depth + 1, max_depth);
                    (name.clone(), FieldDescriptor::required(shape))
                })
                .collect(),
        },
    }
}
