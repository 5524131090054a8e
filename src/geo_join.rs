// Joins per-region totals onto the province boundaries for the map.
//
// The join is an inner join on the normalized region key. A region that
// exists on only one side is left out of the map without failing; the
// dropped keys are kept on `GeoJoin` so callers can log or display them.
use crate::types::{AggregateRow, GeoAggregate, RegionBoundary};
use crate::util::percentage;
use geo::{BoundingRect, Contains, Point, Rect};
use log::warn;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct GeoJoin {
    /// Joined rows in boundary order.
    pub rows: Vec<GeoAggregate>,
    /// Boundary regions with no aggregate row.
    pub dropped_boundaries: Vec<String>,
    /// Aggregate regions with no boundary.
    pub dropped_aggregates: Vec<String>,
}

impl GeoJoin {
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.region.as_str())
    }
}

/// Inner join of `boundaries` and per-region `aggregates`.
///
/// Aggregate rows without a key (ungrouped totals) never match.
pub fn join(boundaries: &[RegionBoundary], aggregates: &[AggregateRow]) -> GeoJoin {
    let by_region: HashMap<&str, &AggregateRow> = aggregates
        .iter()
        .filter_map(|a| a.key.as_deref().map(|k| (k, a)))
        .collect();

    let mut joined = GeoJoin::default();
    let mut matched: HashSet<&str> = HashSet::new();
    for boundary in boundaries {
        match by_region.get(boundary.region.as_str()) {
            Some(agg) => {
                matched.insert(boundary.region.as_str());
                joined.rows.push(GeoAggregate {
                    region: boundary.region.clone(),
                    geometry: boundary.geometry.clone(),
                    logged_in: agg.logged_in,
                    available: agg.available,
                    registered: agg.registered,
                    percentage: percentage(agg.logged_in, agg.registered),
                });
            }
            None => joined.dropped_boundaries.push(boundary.region.clone()),
        }
    }
    joined.dropped_aggregates = aggregates
        .iter()
        .filter_map(|a| a.key.as_deref())
        .filter(|k| !matched.contains(k))
        .map(str::to_string)
        .collect();

    if !joined.dropped_aggregates.is_empty() {
        warn!(
            "{} region(s) have data but no boundary and are not on the map: {}",
            joined.dropped_aggregates.len(),
            joined.dropped_aggregates.join(", ")
        );
    }
    joined
}

/// Bounding box of every joined geometry, used as the initial map view.
pub fn map_extent(rows: &[GeoAggregate]) -> Option<Rect<f64>> {
    rows.iter()
        .filter_map(|r| r.geometry.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
            )
        })
}

/// Region whose boundary contains the clicked point, if any.
pub fn region_at(boundaries: &[RegionBoundary], lon: f64, lat: f64) -> Option<&str> {
    let point = Point::new(lon, lat);
    boundaries
        .iter()
        .find(|b| b.geometry.contains(&point))
        .map(|b| b.region.as_str())
}
