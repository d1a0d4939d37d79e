//! Storage backends for the drift engine.
//!
//! Both backends implement [`driftforge_core::SchemaRegistry`] and
//! [`driftforge_core::DocumentStore`] and share the same semantics:
//! contiguous versions per source, subsumption-checked registration, and
//! most-recent-first document listing.
//!
//! - [`MemoryStore`]: process-local, non-durable, no extra dependencies.
//! - [`SqliteStore`]: file-backed persistence, behind the `sqlite`
//!   feature.

mod mem_store;
#[cfg(feature = "sqlite")]
mod sqlite_store;

pub use mem_store::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteStore;
