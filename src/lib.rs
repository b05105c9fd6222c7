//! Geo-predicate planning and exact filtering for graph database indexes.
//!
//! This crate answers geospatial predicate queries (`near`, `within`,
//! `contains`, `intersects`) over geometry-valued attributes in two
//! stages:
//!
//! 1. **Planning**: derive a small set of index lookup tokens that a
//!    coarse cell index resolves to a superset of candidate entities,
//!    plus a [`QueryFilter`] capturing the query shape.
//! 2. **Exact filtering**: verify each candidate's stored geometry
//!    against the filter, removing the false positives the coarse stage
//!    lets through.
//!
//! ```text
//!  predicate args ──► geo_tokens ──► (index tokens, QueryFilter)
//!                                        │              │
//!                          external index lookup        │
//!                                        ▼              ▼
//!                    (ids, raw values) ──► filter_candidates ──► ids
//! ```
//!
//! Entities are indexed symmetrically at write time via
//! [`index_tokens`]: cover-family tokens for their covering cells and
//! parent-family tokens for the ancestors of those cells.
//!
//! All operations are pure functions over their inputs: no shared
//! mutable state, no I/O, safe to invoke concurrently.
//!
//! # Modules
//!
//! - [`config`]: covering configuration
//! - [`geometry`]: WKT parsing, region normalization, ring predicates
//! - [`covering`]: hierarchical cell coverings and ancestor walks
//! - [`cap`]: bounding caps and distance conversion for `near`
//! - [`tokens`]: token derivation per predicate
//! - [`filter`]: exact-match predicate evaluation
//! - [`scan`]: candidate scanning over index results
//! - [`error`]: error types

pub mod cap;
pub mod config;
pub mod covering;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod scan;
pub mod tokens;

pub use cap::{haversine_distance, Cap, EARTH_RADIUS_METERS};
pub use config::CoveringConfig;
pub use covering::{ancestor_cells, covering_for_cap, covering_for_region, Cell};
pub use error::{GeoFilterError, Result};
pub use filter::{FilterShape, QueryFilter, QueryType};
pub use geometry::{normalize, parse_wkt, Loop, SphericalRegion};
pub use scan::{filter_candidates, StoredValue, ValueKind};
pub use tokens::{geo_tokens, index_tokens, is_geo_predicate, query_tokens};
