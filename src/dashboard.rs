// One filter -> aggregate -> geo-join cycle.
//
// Every change of selection calls `run_cycle` again from scratch; nothing is
// cached between cycles and nothing outside the returned value is mutated.
use crate::filter::{self, FilterOutcome};
use crate::geo_join::{self, GeoJoin};
use crate::reports::{self, LoginBreakdown, SchoolBreakdown};
use crate::types::{AggregateRow, Dataset, FilterSelection, LevelShare, RegionChoice};
use geo::Rect;
use log::debug;

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub selection: FilterSelection,
    pub totals: AggregateRow,
    pub login: LoginBreakdown,
    pub schools: SchoolBreakdown,
    pub map: GeoJoin,
    pub map_extent: Option<Rect<f64>>,
    /// Login distribution by level, only when a region is selected.
    pub level_distribution: Option<Vec<LevelShare>>,
}

#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// The filters matched no rows; nothing was aggregated.
    NoMatch,
    Ready(Box<Dashboard>),
}

pub fn run_cycle(dataset: &Dataset, selection: &FilterSelection) -> CycleOutcome {
    let records = match filter::apply(&dataset.records, selection) {
        FilterOutcome::NoMatch => {
            debug!("no rows for {:?}; skipping aggregation", selection);
            return CycleOutcome::NoMatch;
        }
        FilterOutcome::Matched(records) => records,
    };

    let map = geo_join::join(&dataset.boundaries, &reports::by_region(&records));
    let map_extent = geo_join::map_extent(&map.rows);
    let level_distribution = match &selection.region {
        RegionChoice::All => None,
        RegionChoice::Region(region) => {
            Some(reports::level_distribution(&dataset.records, region))
        }
    };

    CycleOutcome::Ready(Box::new(Dashboard {
        selection: selection.clone(),
        totals: reports::totals(&records),
        login: reports::login_breakdown(&records, selection),
        schools: reports::school_breakdown(&records, selection),
        map,
        map_extent,
        level_distribution,
    }))
}
