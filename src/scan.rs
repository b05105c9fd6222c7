//! Candidate scanning and post-filtering.
//!
//! The external index resolves tokens to candidate identifiers and their
//! raw stored attribute values. This second pass decodes each value and
//! keeps only the identifiers whose geometry actually satisfies the
//! query filter. Decoding is deliberately lenient: stored data may be
//! heterogeneous or legacy-encoded, and a single malformed value must
//! not abort the whole query.

use crate::filter::QueryFilter;
use crate::geometry::parse_wkt;

/// Declared type tag of a stored attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// WKT-encoded geometry.
    Geometry,
    Text,
    Numeric,
    Boolean,
    Binary,
}

/// A raw stored attribute value as handed over by the index layer.
#[derive(Debug, Clone, Copy)]
pub struct StoredValue<'a> {
    /// Raw value bytes; empty means no value stored.
    pub bytes: &'a [u8],
    /// Declared type tag.
    pub kind: ValueKind,
}

impl<'a> StoredValue<'a> {
    pub fn new(bytes: &'a [u8], kind: ValueKind) -> Self {
        Self { bytes, kind }
    }

    /// A geometry value from WKT bytes.
    pub fn geometry(bytes: &'a [u8]) -> Self {
        Self::new(bytes, ValueKind::Geometry)
    }
}

/// Filter candidate identifiers by their stored geometry values.
///
/// `ids` and `values` are parallel arrays produced by the index lookup;
/// unequal lengths are a programming-contract violation. Candidates with
/// empty values, non-geometry type tags, or undecodable bytes are
/// silently dropped. Output preserves input order.
pub fn filter_candidates(ids: &[u64], values: &[StoredValue<'_>], filter: &QueryFilter) -> Vec<u64> {
    assert_eq!(
        ids.len(),
        values.len(),
        "candidate ids and values must have equal length"
    );

    let mut matched = Vec::new();
    for (id, value) in ids.iter().zip(values) {
        if value.bytes.is_empty() {
            continue;
        }
        if value.kind != ValueKind::Geometry {
            continue;
        }
        let Ok(wkt_str) = std::str::from_utf8(value.bytes) else {
            continue;
        };
        let geom = match parse_wkt(wkt_str) {
            Ok(g) => g,
            Err(e) => {
                tracing::trace!(id = *id, error = %e, "skipping undecodable candidate value");
                continue;
            }
        };
        if filter.matches(&geom) {
            matched.push(*id);
        }
    }
    matched
}
