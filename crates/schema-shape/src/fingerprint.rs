//! Descriptor fingerprints and schema identifiers.
//!
//! A fingerprint is the SHA-256 of a descriptor's structure, fed to the
//! hasher in canonical order. Because objects and unions already iterate
//! sorted, equal descriptors always hash identically and the fingerprint
//! can stand in for the full shape in logs and identifiers.

use sha2::{Digest, Sha256};

use crate::descriptor::Descriptor;

/// Computes the full 64 character hex fingerprint of a descriptor.
pub fn compute_fingerprint(descriptor: &Descriptor) -> String {
    let mut hasher = Sha256::new();
    hash_structure(descriptor, &mut hasher);
    hex::encode(hasher.finalize())
}

/// Computes a 16 character fingerprint for compact display.
pub fn short_fingerprint(descriptor: &Descriptor) -> String {
    compute_fingerprint(descriptor).chars().take(16).collect()
}

fn hash_structure(descriptor: &Descriptor, hasher: &mut Sha256) {
    match descriptor {
        Descriptor::Null => hasher.update(b"null"),
        Descriptor::Boolean => hasher.update(b"bool"),
        Descriptor::Number => hasher.update(b"number"),
        Descriptor::String => hasher.update(b"string"),
        Descriptor::Object { fields } => {
            hasher.update(b"obj{");
            for (name, field) in fields {
                hasher.update(name.as_bytes());
                hasher.update(if field.optional { b"?" } else { b":" });
                hash_structure(&field.shape, hasher);
                hasher.update(b",");
            }
            hasher.update(b"}");
        }
        Descriptor::Array { element } => {
            hasher.update(b"arr[");
            hash_structure(element, hasher);
            hasher.update(b"]");
        }
        Descriptor::Union { members } => {
            hasher.update(b"union(");
            for member in members {
                hash_structure(member, hasher);
                hasher.update(b"|");
            }
            hasher.update(b")");
        }
    }
}

// ==========================================================================
// Schema identifiers
// ==========================================================================

/// Formats the stable identifier for one registered schema version.
///
/// The layout is `{source}-v{version}-{fp8}` where `fp8` is the first 8
/// characters of the fingerprint. Sources may themselves contain dashes;
/// parsing anchors on the trailing two components instead.
pub fn schema_id(source: &str, version: u32, fingerprint: &str) -> String {
    let fp8: String = fingerprint.chars().take(8).collect();
    format!("{source}-v{version}-{fp8}")
}

/// Splits a schema identifier back into `(source, version)`.
///
/// Returns `None` when the trailing components are missing or malformed.
/// The fingerprint segment is validated for shape only; callers resolve
/// the version against the registry to learn whether it exists.
pub fn parse_schema_id(id: &str) -> Option<(&str, u32)> {
    let (rest, fp8) = id.rsplit_once('-')?;
    if fp8.len() != 8 || !fp8.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let (source, version) = rest.rsplit_once("-v")?;
    let version: u32 = version.parse().ok()?;
    if source.is_empty() || version == 0 {
        return None;
    }
    Some((source, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::infer;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_fingerprint_is_stable() {
        let shape = infer(&json!({"driver": "VER", "lap": 30}));
        let a = compute_fingerprint(&shape);
        let b = compute_fingerprint(&shape);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_ignores_values() {
        let a = infer(&json!({"driver": "VER", "lap": 30}));
        let b = infer(&json!({"driver": "HAM", "lap": 44}));
        assert_eq!(compute_fingerprint(&a), compute_fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_changes_with_structure() {
        let base = infer(&json!({"driver": "VER"}));
        let renamed = infer(&json!({"pilot": "VER"}));
        let retyped = infer(&json!({"driver": 1}));
        let grown = infer(&json!({"driver": "VER", "lap": 1}));

        let fp = compute_fingerprint(&base);
        assert_ne!(fp, compute_fingerprint(&renamed));
        assert_ne!(fp, compute_fingerprint(&retyped));
        assert_ne!(fp, compute_fingerprint(&grown));
    }

    #[test]
    fn test_fingerprint_tracks_optionality() {
        let required = infer(&json!({"lap": 1}));
        let optional = crate::merge::merge(
            required.clone(),
            infer(&json!({"lap": 1, "pit": true})),
        );
        assert_ne!(
            compute_fingerprint(&required),
            compute_fingerprint(&optional)
        );
    }

    #[test]
    fn test_short_fingerprint_is_prefix() {
        let shape = infer(&json!([1, 2, 3]));
        let full = compute_fingerprint(&shape);
        let short = short_fingerprint(&shape);
        assert_eq!(short.len(), 16);
        assert!(full.starts_with(&short));
    }

    #[test]
    fn test_schema_id_round_trip() {
        let shape = infer(&json!({"a": 1}));
        let fp = compute_fingerprint(&shape);
        let id = schema_id("telemetry", 3, &fp);

        assert_eq!(parse_schema_id(&id), Some(("telemetry", 3)));
    }

    #[test]
    fn test_schema_id_source_may_contain_dashes() {
        let shape = infer(&json!({"a": 1}));
        let fp = compute_fingerprint(&shape);

        // Both plain dashes and a literal "-v" inside the source name.
        let id = schema_id("live-v2-timing", 12, &fp);
        assert_eq!(parse_schema_id(&id), Some(("live-v2-timing", 12)));
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        assert_eq!(parse_schema_id(""), None);
        assert_eq!(parse_schema_id("telemetry"), None);
        assert_eq!(parse_schema_id("telemetry-3-deadbeef"), None);
        assert_eq!(parse_schema_id("telemetry-v0-deadbeef"), None);
        assert_eq!(parse_schema_id("telemetry-vX-deadbeef"), None);
        assert_eq!(parse_schema_id("telemetry-v3-nothexyz"), None);
        assert_eq!(parse_schema_id("telemetry-v3-dead"), None);
        assert_eq!(parse_schema_id("-v3-deadbeef"), None);
    }
}
