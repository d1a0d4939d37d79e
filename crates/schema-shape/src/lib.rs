//! Structural schema inference, merging and diffing for arbitrary JSON.
//!
//! This crate is the value-free core of the engine: it turns documents
//! into canonical [`Descriptor`] trees and defines every operation the
//! registry needs on top of them. Nothing here performs IO.
//!
//! # Features
//!
//! - **Inference**: [`infer`] maps any JSON value to its canonical shape,
//!   with a configurable nesting cutoff.
//! - **Merging**: [`merge`] widens two shapes into the least shape covering
//!   both; [`subsumes`] asks whether widening would change anything.
//! - **Diffing**: [`diff`] reports added, removed and re-typed field paths
//!   between two shapes.
//! - **Fingerprints**: [`compute_fingerprint`] hashes a shape for stable
//!   identifiers; [`schema_id`] and [`parse_schema_id`] handle the
//!   `{source}-v{version}-{fp8}` identifier layout.
//! - **Summaries**: [`summarize`] trims a shape down for list views.
//!
//! # Example
//!
//! ```
//! use schema_shape::{diff, infer};
//! use serde_json::json;
//!
//! let v1 = infer(&json!({"driver": "VER", "lap": 30}));
//! let v2 = infer(&json!({"driver": "VER", "lap": 30, "sectors": [31.2]}));
//!
//! let report = diff(&v1, &v2);
//! assert!(report.added.contains("sectors"));
//! assert!(report.type_changed.is_empty());
//! ```

mod descriptor;
mod diff;
mod fingerprint;
mod infer;
mod merge;
mod summary;

pub use descriptor::{Descriptor, FieldDescriptor, Kind};
pub use diff::{diff, Diff, KindChange};
pub use fingerprint::{
    compute_fingerprint, parse_schema_id, schema_id, short_fingerprint,
};
pub use infer::{infer, infer_with_depth, DEFAULT_MAX_DEPTH};
pub use merge::{merge, subsumes};
pub use summary::{summarize, DescriptorSummary};
