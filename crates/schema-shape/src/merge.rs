//! Descriptor merging and subsumption.
//!
//! `merge` is the engine's only widening operation: registration folds an
//! incoming shape into the latest known one, and inference folds array
//! elements pairwise. It is commutative and idempotent, and the result
//! subsumes both inputs.

use std::collections::BTreeMap;

use crate::descriptor::{Descriptor, FieldDescriptor};

/// Merges two descriptors into the least shape covering both.
///
/// Objects merge field-wise: fields seen on one side only become optional,
/// fields seen on both sides merge recursively and stay required unless a
/// side already marked them optional. Arrays merge their element shapes,
/// with a null placeholder element giving way to the other side. Anything
/// else that is not structurally equal widens into a union.
pub fn merge(a: Descriptor, b: Descriptor) -> Descriptor {
    match (a, b) {
        (Descriptor::Object { fields: a }, Descriptor::Object { fields: b }) => {
            merge_objects(a, b)
        }
        (Descriptor::Array { element: a }, Descriptor::Array { element: b }) => {
            let element = match (*a, *b) {
                // An empty array inferred to array<null>; the first real
                // elements refine the placeholder instead of widening it.
                (Descriptor::Null, other) | (other, Descriptor::Null) => other,
                (a, b) => merge(a, b),
            };
            Descriptor::Array {
                element: Box::new(element),
            }
        }
        (a, b) if a == b => a,
        (a, b) => Descriptor::union_of([a, b]),
    }
}

/// True when `shape` already accounts for `other`, i.e. merging `other`
/// into it changes nothing. Registration uses this to decide whether an
/// incoming document warrants a new schema version.
pub fn subsumes(shape: &Descriptor, other: &Descriptor) -> bool {
    merge(shape.clone(), other.clone()) == *shape
}

fn merge_objects(
    mut a: BTreeMap<String, FieldDescriptor>,
    b: BTreeMap<String, FieldDescriptor>,
) -> Descriptor {
    let mut fields = BTreeMap::new();
    for (name, b_field) in b {
        match a.remove(&name) {
            Some(a_field) => {
                fields.insert(
                    name,
                    FieldDescriptor {
                        shape: merge(a_field.shape, b_field.shape),
                        optional: a_field.optional || b_field.optional,
                    },
                );
            }
            None => {
                fields.insert(
                    name,
                    FieldDescriptor {
                        optional: true,
                        ..b_field
                    },
                );
            }
        }
    }
    // Whatever survived in `a` was missing from `b`.
    for (name, a_field) in a {
        fields.insert(
            name,
            FieldDescriptor {
                optional: true,
                ..a_field
            },
        );
    }
    Descriptor::Object { fields }
}
