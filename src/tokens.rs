//! Index token derivation.
//!
//! Entities are indexed under two token families at write time: their
//! own cover cells (`c/` tokens) and the ancestors of those cover cells
//! up to the configured minimum level (`p/` tokens). Query planning
//! probes the family that makes the coarse lookup a superset of the true
//! matches:
//!
//! - `within` probes `p/` with the query cover: entities whose ancestors
//!   include a query cover cell are coarsely enclosed by the query.
//! - `contains` probes `c/` with the query ancestors: entities whose
//!   cover equals a query ancestor coarsely enclose the query.
//! - `intersects` probes the union of both derivations.
//! - `near` builds a cap from the distance and probes like `within`
//!   against the cap's cover.
//!
//! Precision is restored afterwards by [`QueryFilter::matches`].

use crate::cap::Cap;
use crate::config::CoveringConfig;
use crate::covering::{ancestor_cells, covering_for_cap, covering_for_region, Cell};
use crate::error::{GeoFilterError, Result};
use crate::filter::{FilterShape, QueryFilter, QueryType};
use crate::geometry::{normalize, parse_wkt, SphericalRegion};
use geo_types::Point;

/// Token family for an entity's own cover cells.
pub const COVER_PREFIX: &str = "c/";

/// Token family for the ancestors of an entity's cover cells.
pub const PARENT_PREFIX: &str = "p/";

/// True if the function name is a geo predicate.
pub fn is_geo_predicate(name: &str) -> bool {
    QueryType::from_name(name).is_some()
}

/// Derive index lookup tokens and an exact-match filter from a raw
/// predicate invocation.
///
/// `func_args` is the flat argument list: function name, attribute-name
/// placeholder, geometry literal (WKT), and for `near` a distance
/// literal in meters.
pub fn geo_tokens(
    func_args: &[String],
    config: &CoveringConfig,
) -> Result<(Vec<String>, QueryFilter)> {
    let name = func_args.first().ok_or_else(|| {
        GeoFilterError::Internal("geo predicate invoked with no arguments".to_string())
    })?;
    let query_type = QueryType::from_name(name)
        .ok_or_else(|| GeoFilterError::UnknownPredicate(name.clone()))?;

    let expected = match query_type {
        QueryType::Near => 4,
        _ => 3,
    };
    if func_args.len() != expected {
        return Err(GeoFilterError::InvalidArgumentCount {
            func: query_type.name().to_string(),
            expected,
            got: func_args.len(),
        });
    }

    let max_distance = match query_type {
        QueryType::Near => func_args[3].parse::<f64>().map_err(|e| {
            GeoFilterError::InvalidDistance(format!(
                "cannot parse distance literal '{}': {}",
                func_args[3], e
            ))
        })?,
        _ => 0.0,
    };

    let geom = parse_wkt(&func_args[2])?;
    let region = normalize(&geom)?;
    query_tokens(query_type, &region, max_distance, config)
}

/// Derive the index tokens and filter for a normalized query region.
///
/// `max_distance` is in meters and only used for `near`.
pub fn query_tokens(
    query_type: QueryType,
    region: &SphericalRegion,
    max_distance: f64,
    config: &CoveringConfig,
) -> Result<(Vec<String>, QueryFilter)> {
    if query_type == QueryType::Near {
        let SphericalRegion::Point(center) = region else {
            return Err(GeoFilterError::UnsupportedGeometry(
                "cannot use a polygon in a near query".to_string(),
            ));
        };
        return near_query_tokens(*center, max_distance, config);
    }

    let cover = covering_for_region(region, config)?;

    let (tokens, filter) = match query_type {
        QueryType::Within => {
            if matches!(region, SphericalRegion::Point(_)) {
                return Err(GeoFilterError::UnsupportedGeometry(
                    "within requires a polygon".to_string(),
                ));
            }
            (
                render_tokens(&cover, PARENT_PREFIX),
                QueryFilter::new(region.clone().into(), QueryType::Within),
            )
        }
        QueryType::Contains => {
            let parents = ancestor_cells(&cover, config.min_level);
            (
                render_tokens(&parents, COVER_PREFIX),
                QueryFilter::new(region.clone().into(), QueryType::Contains),
            )
        }
        QueryType::Intersects => {
            if matches!(region, SphericalRegion::Point(_)) {
                return Err(GeoFilterError::UnsupportedGeometry(
                    "intersects requires a polygon".to_string(),
                ));
            }
            let parents = ancestor_cells(&cover, config.min_level);
            let mut tokens = render_tokens(&cover, PARENT_PREFIX);
            tokens.extend(render_tokens(&parents, COVER_PREFIX));
            (
                tokens,
                QueryFilter::new(region.clone().into(), QueryType::Intersects),
            )
        }
        QueryType::Near => unreachable!("near handled above"),
    };

    tracing::debug!(
        query_type = query_type.name(),
        tokens = tokens.len(),
        "derived geo index tokens"
    );
    Ok((tokens, filter))
}

/// Tokens and filter for a `near` query: cover the bounding cap and
/// probe it like a `within` query against that cap.
fn near_query_tokens(
    center: Point<f64>,
    max_distance: f64,
    config: &CoveringConfig,
) -> Result<(Vec<String>, QueryFilter)> {
    let cap = Cap::from_distance(center, max_distance)?;
    let cover = covering_for_cap(&cap, config)?;
    let tokens = render_tokens(&cover, PARENT_PREFIX);

    tracing::debug!(
        radius_meters = max_distance,
        tokens = tokens.len(),
        "derived near query tokens"
    );
    Ok((
        tokens,
        QueryFilter::new(FilterShape::Cap(cap), QueryType::Near),
    ))
}

/// Write-time tokens for a stored entity's geometry: its cover cells
/// under the cover family plus their ancestors under the parent family.
///
/// Symmetric with the query-time derivation above; the coarse stage is
/// only sound when both sides use the same configuration.
pub fn index_tokens(region: &SphericalRegion, config: &CoveringConfig) -> Result<Vec<String>> {
    let cover = covering_for_region(region, config)?;
    let parents = ancestor_cells(&cover, config.min_level);

    let mut tokens = render_tokens(&cover, COVER_PREFIX);
    tokens.extend(render_tokens(&parents, PARENT_PREFIX));
    Ok(tokens)
}

fn render_tokens(cells: &[Cell], prefix: &str) -> Vec<String> {
    cells
        .iter()
        .map(|cell| format!("{}{}", prefix, cell.id()))
        .collect()
}
