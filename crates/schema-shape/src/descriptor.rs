//! Canonical structural descriptors for JSON documents.
//!
//! A [`Descriptor`] captures the shape of a document while discarding its
//! values: field names, nesting, element shapes and kind alternations
//! survive; strings, numbers and booleans do not. Object fields are kept in
//! a [`BTreeMap`] and union members in a [`BTreeSet`], so serializing a
//! descriptor always yields the same bytes for the same shape. Structural
//! equality and canonical-serialization equality therefore coincide.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ==========================================================================
// Kinds
// ==========================================================================

/// The seven structural kinds a descriptor node can take.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Null,
    Boolean,
    Number,
    String,
    Object,
    Array,
    Union,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Boolean => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::Union => "union",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================================================
// Descriptors
// ==========================================================================

/// A canonical structural schema for a JSON value.
///
/// Scalars carry no payload. Objects map field names to a
/// [`FieldDescriptor`], arrays describe a single element shape, and unions
/// hold a set of distinct member shapes. All integer and floating point
/// numbers collapse into [`Descriptor::Number`].
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Descriptor {
    Null,
    Boolean,
    Number,
    String,
    Object {
        fields: BTreeMap<String, FieldDescriptor>,
    },
    Array {
        element: Box<Descriptor>,
    },
    Union {
        members: BTreeSet<Descriptor>,
    },
}

impl Descriptor {
    pub fn kind(&self) -> Kind {
        match self {
            Descriptor::Null => Kind::Null,
            Descriptor::Boolean => Kind::Boolean,
            Descriptor::Number => Kind::Number,
            Descriptor::String => Kind::String,
            Descriptor::Object { .. } => Kind::Object,
            Descriptor::Array { .. } => Kind::Array,
            Descriptor::Union { .. } => Kind::Union,
        }
    }

    /// Builds an object descriptor from `(name, field)` pairs.
    pub fn object<N, I>(fields: I) -> Descriptor
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, FieldDescriptor)>,
    {
        Descriptor::Object {
            fields: fields
                .into_iter()
                .map(|(name, field)| (name.into(), field))
                .collect(),
        }
    }

    /// Builds an array descriptor around the given element shape.
    pub fn array(element: Descriptor) -> Descriptor {
        Descriptor::Array {
            element: Box::new(element),
        }
    }

    /// Builds a union from the given members.
    ///
    /// Nested unions are flattened into the result, structural duplicates
    /// collapse, and a union left with a single member collapses to that
    /// member. Unions built through this constructor never contain another
    /// union and never have fewer than two members.
    pub fn union_of<I>(members: I) -> Descriptor
    where
        I: IntoIterator<Item = Descriptor>,
    {
        let mut set = BTreeSet::new();
        for member in members {
            match member {
                Descriptor::Union { members } => set.extend(members),
                other => {
                    set.insert(other);
                }
            }
        }
        if set.len() <= 1 {
            set.into_iter().next().unwrap_or(Descriptor::Null)
        } else {
            Descriptor::Union { members: set }
        }
    }
}

/// The shape of one object field plus its presence flag.
///
/// `optional` is false while every observed document carried the field and
/// flips to true once any merge sees the field missing on one side. It
/// never flips back.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FieldDescriptor {
    pub shape: Descriptor,
    pub optional: bool,
}

impl FieldDescriptor {
    pub fn required(shape: Descriptor) -> Self {
        Self {
            shape,
            optional: false,
        }
    }

    pub fn optional(shape: Descriptor) -> Self {
        Self {
            shape,
            optional: true,
        }
    }
}

// ==========================================================================
// Tests
// ==========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lap_shape() -> Descriptor {
        Descriptor::object([
            ("driver", FieldDescriptor::required(Descriptor::String)),
            ("lap", FieldDescriptor::required(Descriptor::Number)),
        ])
    }

    #[test]
    fn test_scalar_serialization_is_tagged() {
        let json = serde_json::to_string(&Descriptor::Number).unwrap();
        assert_eq!(json, r#"{"kind":"number"}"#);
    }

    #[test]
    fn test_object_serialization_sorts_fields() {
        let a = Descriptor::object([
            ("zeta", FieldDescriptor::required(Descriptor::Number)),
            ("alpha", FieldDescriptor::required(Descriptor::String)),
        ]);
        let b = Descriptor::object([
            ("alpha", FieldDescriptor::required(Descriptor::String)),
            ("zeta", FieldDescriptor::required(Descriptor::Number)),
        ]);

        // Insertion order never leaks into the canonical form.
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_matches_canonical_serialization() {
        let a = lap_shape();
        let b = lap_shape();
        let c = Descriptor::object([(
            "driver",
            FieldDescriptor::optional(Descriptor::String),
        )]);

        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        assert_ne!(a, c);
        assert_ne!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&c).unwrap()
        );
    }

    #[test]
    fn test_equality_is_an_equivalence() {
        let a = lap_shape();
        let b = lap_shape();
        let c = lap_shape();

        assert_eq!(a, a);
        assert_eq!(a, b);
        assert_eq!(b, a);
        assert_eq!(b, c);
        assert_eq!(a, c);
    }

    #[test]
    fn test_union_deduplicates_members() {
        let union = Descriptor::union_of([
            Descriptor::Number,
            Descriptor::String,
            Descriptor::Number,
        ]);
        match &union {
            Descriptor::Union { members } => assert_eq!(members.len(), 2),
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn test_union_of_single_member_collapses() {
        let collapsed =
            Descriptor::union_of([Descriptor::String, Descriptor::String]);
        assert_eq!(collapsed, Descriptor::String);
    }

    #[test]
    fn test_union_of_flattens_nested_unions() {
        let inner = Descriptor::union_of([Descriptor::Null, Descriptor::Number]);
        let outer = Descriptor::union_of([inner, Descriptor::String]);
        match &outer {
            Descriptor::Union { members } => {
                assert_eq!(members.len(), 3);
                assert!(members.iter().all(|m| m.kind() != Kind::Union));
            }
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn test_serde_round_trip() {
        let original = Descriptor::object([
            ("tags", FieldDescriptor::required(Descriptor::array(Descriptor::String))),
            (
                "gap",
                FieldDescriptor::optional(Descriptor::union_of([
                    Descriptor::Null,
                    Descriptor::Number,
                ])),
            ),
        ]);

        let json = serde_json::to_string(&original).unwrap();
        let back: Descriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(original, back);
    }
}
