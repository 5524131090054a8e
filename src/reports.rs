use crate::types::{
    AccountRecord, AggregateRow, FilterSelection, LevelChoice, LevelPivot, LevelShare,
    RegionChoice, SchoolCountRow,
};
use crate::util::{normalize_region, percentage};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Login rate figures for one cycle. Which variant is produced depends on
/// which dimensions the selection pins.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginBreakdown {
    /// Region not pinned: one row per region.
    ByRegion(Vec<AggregateRow>),
    /// Region pinned, level open: one row per level inside the region.
    ByLevel {
        region: String,
        rows: Vec<AggregateRow>,
    },
    /// Region and level pinned: a single total.
    Scalar {
        region: String,
        level: String,
        row: AggregateRow,
    },
}

/// Distinct school counts, grouped the same way as [`LoginBreakdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchoolBreakdown {
    ByRegion {
        total: usize,
        rows: Vec<SchoolCountRow>,
        /// Per-level annotation, only when the level is not pinned.
        pivot: Option<LevelPivot>,
    },
    ByLevel {
        region: String,
        total: usize,
        rows: Vec<SchoolCountRow>,
    },
    Scalar {
        region: String,
        level: String,
        schools: usize,
    },
}

#[derive(Default)]
struct Acc {
    logged_in: u64,
    available: u64,
    registered: u64,
}

impl Acc {
    fn add(&mut self, r: &AccountRecord) {
        // Counters are only bounded by u64; sums stop at the ceiling.
        self.logged_in = self.logged_in.saturating_add(r.logged_in);
        self.available = self.available.saturating_add(r.available);
        self.registered = self.registered.saturating_add(r.registered);
    }

    fn into_row(self, key: Option<String>) -> AggregateRow {
        AggregateRow {
            key,
            logged_in: self.logged_in,
            available: self.available,
            registered: self.registered,
            percentage: percentage(self.logged_in, self.registered),
        }
    }
}

fn sum_by<'a, I, F>(records: I, key: F) -> Vec<AggregateRow>
where
    I: IntoIterator<Item = &'a AccountRecord>,
    F: Fn(&AccountRecord) -> &str,
{
    let mut map: BTreeMap<String, Acc> = BTreeMap::new();
    for r in records {
        map.entry(key(r).to_string()).or_default().add(r);
    }
    map.into_iter()
        .map(|(k, acc)| acc.into_row(Some(k)))
        .collect()
}

/// Ungrouped sums over every record (the summary cards).
pub fn totals(records: &[AccountRecord]) -> AggregateRow {
    let mut acc = Acc::default();
    records.iter().for_each(|r| acc.add(r));
    acc.into_row(None)
}

/// Sums per region, sorted by region key. Also the input of the geo join.
pub fn by_region(records: &[AccountRecord]) -> Vec<AggregateRow> {
    sum_by(records, |r| r.region.as_str())
}

/// Sums per level for the records of one region, sorted by level. Rows
/// with a blank level belong to no level group.
pub fn by_level(records: &[AccountRecord], region: &str) -> Vec<AggregateRow> {
    sum_by(
        records
            .iter()
            .filter(|r| r.region == region && !r.level.is_empty()),
        |r| r.level.as_str(),
    )
}

pub fn login_breakdown(records: &[AccountRecord], sel: &FilterSelection) -> LoginBreakdown {
    match (&sel.region, &sel.level) {
        (RegionChoice::All, _) => LoginBreakdown::ByRegion(by_region(records)),
        (RegionChoice::Region(region), LevelChoice::All) => {
            let region = normalize_region(region);
            LoginBreakdown::ByLevel {
                rows: by_level(records, &region),
                region,
            }
        }
        (RegionChoice::Region(region), LevelChoice::Level(level)) => {
            let region = normalize_region(region);
            let mut acc = Acc::default();
            records
                .iter()
                .filter(|r| r.region == region && r.level == *level)
                .for_each(|r| acc.add(r));
            LoginBreakdown::Scalar {
                region,
                level: level.clone(),
                row: acc.into_row(None),
            }
        }
    }
}

/// Number of distinct school names in `records`. Blank names are not
/// counted.
pub fn distinct_schools(records: &[AccountRecord]) -> usize {
    records
        .iter()
        .map(|r| r.school.as_str())
        .filter(|s| !s.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

fn schools_by<'a, I, F>(records: I, key: F) -> Vec<SchoolCountRow>
where
    I: IntoIterator<Item = &'a AccountRecord>,
    F: Fn(&AccountRecord) -> &str,
{
    let mut map: BTreeMap<String, HashSet<&'a str>> = BTreeMap::new();
    for r in records {
        let schools = map.entry(key(r).to_string()).or_default();
        if !r.school.is_empty() {
            schools.insert(r.school.as_str());
        }
    }
    map.into_iter()
        .map(|(key, schools)| SchoolCountRow {
            key,
            schools: schools.len(),
        })
        .collect()
}

/// Region x level distinct school counts. Missing combinations are 0.
/// Rows without a level are left out; blank school names are not counted.
pub fn level_pivot(records: &[AccountRecord]) -> LevelPivot {
    let mut cells: BTreeMap<(&str, &str), HashSet<&str>> = BTreeMap::new();
    let mut levels: BTreeSet<&str> = BTreeSet::new();
    let mut regions: BTreeSet<&str> = BTreeSet::new();
    for r in records.iter().filter(|r| !r.level.is_empty()) {
        levels.insert(r.level.as_str());
        regions.insert(r.region.as_str());
        let schools = cells
            .entry((r.region.as_str(), r.level.as_str()))
            .or_default();
        if !r.school.is_empty() {
            schools.insert(r.school.as_str());
        }
    }

    let rows = regions
        .iter()
        .map(|region| {
            let counts = levels
                .iter()
                .map(|level| cells.get(&(*region, *level)).map_or(0, HashSet::len))
                .collect();
            (region.to_string(), counts)
        })
        .collect();
    LevelPivot {
        levels: levels.into_iter().map(str::to_string).collect(),
        rows,
    }
}

pub fn school_breakdown(records: &[AccountRecord], sel: &FilterSelection) -> SchoolBreakdown {
    match (&sel.region, &sel.level) {
        (RegionChoice::All, level) => SchoolBreakdown::ByRegion {
            total: distinct_schools(records),
            rows: schools_by(records, |r| r.region.as_str()),
            pivot: matches!(level, LevelChoice::All).then(|| level_pivot(records)),
        },
        (RegionChoice::Region(region), LevelChoice::All) => {
            let region = normalize_region(region);
            let scoped: Vec<AccountRecord> = records
                .iter()
                .filter(|r| r.region == region)
                .cloned()
                .collect();
            SchoolBreakdown::ByLevel {
                total: distinct_schools(&scoped),
                rows: schools_by(
                    scoped.iter().filter(|r| !r.level.is_empty()),
                    |r| r.level.as_str(),
                ),
                region,
            }
        }
        (RegionChoice::Region(region), LevelChoice::Level(level)) => SchoolBreakdown::Scalar {
            region: normalize_region(region),
            level: level.clone(),
            schools: distinct_schools(records),
        },
    }
}

/// Logged-in accounts per level for one region, taken from the full
/// dataset rather than the filtered rows.
pub fn level_distribution(all_records: &[AccountRecord], region: &str) -> Vec<LevelShare> {
    let region = normalize_region(region);
    by_level(all_records, &region)
        .into_iter()
        .map(|row| LevelShare {
            level: row.key.unwrap_or_default(),
            logged_in: row.logged_in,
        })
        .collect()
}

/// First rows of the dataset for the raw view. The requested size is
/// clamped to between 5 and 100 rows (never more than the dataset has).
pub fn preview(records: &[AccountRecord], requested: usize) -> &[AccountRecord] {
    let upper = records.len().min(100);
    let n = requested.max(5).min(upper);
    &records[..n]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KindGroup;

    fn rec(
        region: &str,
        level: &str,
        school: &str,
        kind: &str,
        (logged_in, available, registered): (u64, u64, u64),
    ) -> AccountRecord {
        AccountRecord {
            region: region.to_string(),
            level: level.to_string(),
            school: school.to_string(),
            kind: kind.to_string(),
            logged_in,
            available,
            registered,
        }
    }

    fn sample() -> Vec<AccountRecord> {
        vec![
            rec("LAMPUNG SELATAN", "SD", "SDN 1", "guru", (10, 12, 20)),
            rec("LAMPUNG SELATAN", "SD", "SDN 1", "tenaga kependidikan", (5, 5, 10)),
            rec("LAMPUNG SELATAN", "SMP", "SMPN 1", "guru", (6, 6, 8)),
            rec("METRO", "SD", "SDN 9", "guru", (3, 4, 4)),
            rec("METRO", "SMA", "SMAN 2", "guru", (0, 0, 0)),
        ]
    }

    fn select(region: Option<&str>, level: Option<&str>) -> FilterSelection {
        FilterSelection {
            region: region.map_or(RegionChoice::All, |r| RegionChoice::Region(r.to_string())),
            level: level.map_or(LevelChoice::All, |l| LevelChoice::Level(l.to_string())),
            kinds: KindGroup::Both,
        }
    }

    #[test]
    fn end_to_end_single_region_row() {
        let records = vec![
            rec("LAMPUNG SELATAN", "SD", "SDN 1", "guru", (10, 12, 20)),
            rec("LAMPUNG SELATAN", "SD", "SDN 1", "tenaga kependidikan", (5, 5, 10)),
        ];
        let LoginBreakdown::ByRegion(rows) = login_breakdown(&records, &select(None, None)) else {
            panic!("expected per-region rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key.as_deref(), Some("LAMPUNG SELATAN"));
        assert_eq!((rows[0].logged_in, rows[0].available, rows[0].registered), (15, 17, 30));
        assert!((rows[0].percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn per_region_sums_add_up_to_total() {
        let records = sample();
        let rows = by_region(&records);
        let sum: u64 = rows.iter().map(|r| r.logged_in).sum();
        assert_eq!(sum, totals(&records).logged_in);
        assert_eq!(sum, 24);
    }

    #[test]
    fn zero_registered_gives_zero_percentage() {
        let records = sample();
        let LoginBreakdown::Scalar { row, .. } =
            login_breakdown(&records, &select(Some("METRO"), Some("SMA")))
        else {
            panic!("expected scalar");
        };
        assert_eq!(row.registered, 0);
        assert_eq!(row.percentage, 0.0);

        let LoginBreakdown::Scalar { row, .. } =
            login_breakdown(&records, &select(Some("METRO"), Some("SMP")))
        else {
            panic!("expected scalar");
        };
        assert_eq!(row.logged_in, 0);
        assert_eq!(row.percentage, 0.0);
    }

    #[test]
    fn percentages_stay_in_range_for_well_formed_rows() {
        for row in by_region(&sample()).iter().chain(&by_level(&sample(), "METRO")) {
            assert!((0.0..=100.0).contains(&row.percentage), "{row:?}");
        }
    }

    #[test]
    fn pinned_region_groups_by_level() {
        let records = sample();
        let LoginBreakdown::ByLevel { region, rows } =
            login_breakdown(&records, &select(Some("Kab. Lampung Selatan"), None))
        else {
            panic!("expected per-level rows");
        };
        assert_eq!(region, "LAMPUNG SELATAN");
        let keys: Vec<_> = rows.iter().map(|r| r.key.clone().unwrap_or_default()).collect();
        assert_eq!(keys, vec!["SD", "SMP"]);
        assert_eq!(rows[0].logged_in, 15);
        assert!((rows[1].percentage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn school_counts_are_distinct_not_summed() {
        let records = sample();
        let SchoolBreakdown::ByRegion { total, rows, pivot } =
            school_breakdown(&records, &select(None, None))
        else {
            panic!("expected per-region counts");
        };
        assert_eq!(total, 4);
        assert_eq!(
            rows,
            vec![
                SchoolCountRow { key: "LAMPUNG SELATAN".into(), schools: 2 },
                SchoolCountRow { key: "METRO".into(), schools: 2 },
            ]
        );
        let pivot = pivot.expect("pivot when level is open");
        assert_eq!(pivot.levels, vec!["SD", "SMA", "SMP"]);
        assert_eq!(
            pivot.rows,
            vec![
                ("LAMPUNG SELATAN".to_string(), vec![1, 0, 1]),
                ("METRO".to_string(), vec![1, 1, 0]),
            ]
        );
    }

    #[test]
    fn pinned_level_drops_pivot() {
        let SchoolBreakdown::ByRegion { pivot, .. } =
            school_breakdown(&sample(), &select(None, Some("SD")))
        else {
            panic!("expected per-region counts");
        };
        assert!(pivot.is_none());
    }

    #[test]
    fn school_counts_by_level_and_scalar() {
        let records = sample();
        assert_eq!(
            school_breakdown(&records, &select(Some("LAMPUNG SELATAN"), None)),
            SchoolBreakdown::ByLevel {
                region: "LAMPUNG SELATAN".into(),
                total: 2,
                rows: vec![
                    SchoolCountRow { key: "SD".into(), schools: 1 },
                    SchoolCountRow { key: "SMP".into(), schools: 1 },
                ],
            }
        );
        let scoped: Vec<_> = records.iter().filter(|r| r.region == "METRO" && r.level == "SD").cloned().collect();
        assert_eq!(
            school_breakdown(&scoped, &select(Some("METRO"), Some("SD"))),
            SchoolBreakdown::Scalar {
                region: "METRO".into(),
                level: "SD".into(),
                schools: 1,
            }
        );
    }

    #[test]
    fn level_distribution_uses_region_rows_only() {
        let shares = level_distribution(&sample(), "Lampung Selatan");
        assert_eq!(
            shares,
            vec![
                LevelShare { level: "SD".into(), logged_in: 15 },
                LevelShare { level: "SMP".into(), logged_in: 6 },
            ]
        );
    }

    #[test]
    fn blank_school_and_level_are_not_groups() {
        let records = vec![
            rec("METRO", "SD", "SDN 1", "guru", (1, 1, 1)),
            rec("METRO", "SD", "", "guru", (1, 1, 1)),
            rec("METRO", "", "SDN 2", "guru", (2, 2, 2)),
        ];
        let SchoolBreakdown::ByRegion { total, rows, pivot } =
            school_breakdown(&records, &select(None, None))
        else {
            panic!("expected per-region counts");
        };
        assert_eq!(total, 2);
        assert_eq!(rows, vec![SchoolCountRow { key: "METRO".into(), schools: 2 }]);
        let pivot = pivot.expect("pivot when level is open");
        assert_eq!(pivot.levels, vec!["SD"]);
        assert_eq!(pivot.rows, vec![("METRO".to_string(), vec![1])]);

        let keys: Vec<_> = by_level(&records, "METRO")
            .into_iter()
            .map(|r| r.key.unwrap_or_default())
            .collect();
        assert_eq!(keys, vec!["SD"]);

        let SchoolBreakdown::ByLevel { total, rows, .. } =
            school_breakdown(&records, &select(Some("METRO"), None))
        else {
            panic!("expected per-level counts");
        };
        assert_eq!(total, 2);
        assert_eq!(rows, vec![SchoolCountRow { key: "SD".into(), schools: 1 }]);

        // Region totals still carry every row.
        assert_eq!(totals(&records).logged_in, 4);
    }

    #[test]
    fn sums_saturate_instead_of_overflowing() {
        let big = 10_000_000_000_000_000_000;
        let records = vec![
            rec("METRO", "SD", "SDN 1", "guru", (big, big, big)),
            rec("METRO", "SD", "SDN 2", "guru", (big, big, big)),
        ];
        let total = totals(&records);
        assert_eq!(total.logged_in, u64::MAX);
        assert_eq!(total.registered, u64::MAX);
        assert!(total.percentage.is_finite());
        assert_eq!(by_region(&records)[0].available, u64::MAX);
    }

    #[test]
    fn preview_is_clamped() {
        let records: Vec<_> = (0..150)
            .map(|i| rec("A", "SD", &format!("S{i}"), "guru", (1, 1, 1)))
            .collect();
        assert_eq!(preview(&records, 20).len(), 20);
        assert_eq!(preview(&records, 1).len(), 5);
        assert_eq!(preview(&records, 500).len(), 100);
        assert_eq!(preview(&records[..3], 20).len(), 3);
    }
}
