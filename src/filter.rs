// Filter engine and the session-scoped region selection.
use crate::types::{AccountRecord, FilterSelection, LevelChoice, RegionChoice};
use crate::util::normalize_region;
use log::debug;
use std::collections::BTreeSet;

/// Result of narrowing the account relation. An empty selection is a
/// normal outcome, not an error, and callers must stop before aggregating.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    Matched(Vec<AccountRecord>),
    NoMatch,
}

impl FilterOutcome {
    pub fn records(&self) -> &[AccountRecord] {
        match self {
            FilterOutcome::Matched(records) => records,
            FilterOutcome::NoMatch => &[],
        }
    }
}

/// Narrow `records` by region, then level, then account-kind group.
pub fn apply(records: &[AccountRecord], sel: &FilterSelection) -> FilterOutcome {
    let region = match &sel.region {
        RegionChoice::All => None,
        RegionChoice::Region(name) => Some(normalize_region(name)),
    };
    let level = match &sel.level {
        LevelChoice::All => None,
        LevelChoice::Level(level) => Some(level.as_str()),
    };

    let matched: Vec<AccountRecord> = records
        .iter()
        .filter(|r| region.as_deref().map_or(true, |want| r.region == want))
        .filter(|r| level.map_or(true, |want| r.level == want))
        .filter(|r| sel.kinds.admits(r.account_kind()))
        .cloned()
        .collect();

    debug!(
        "filter {:?}: {} of {} rows matched",
        sel,
        matched.len(),
        records.len()
    );
    if matched.is_empty() {
        FilterOutcome::NoMatch
    } else {
        FilterOutcome::Matched(matched)
    }
}

/// Sorted distinct school levels for the level dropdown. Blank levels are
/// not offered.
pub fn level_options(records: &[AccountRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.level.as_str())
        .filter(|l| !l.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Sorted distinct region keys for the region dropdown.
pub fn region_options(records: &[AccountRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.region.as_str())
        .filter(|r| !r.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Region selection that survives between cycles for one interactive
/// session. Owned by the caller and passed in explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub selected_region: Option<String>,
}

impl SessionState {
    /// Decide the region for this cycle and remember it.
    ///
    /// A map click wins over the dropdown, and the dropdown wins over the
    /// value carried from the previous cycle. A clicked or carried region
    /// that is not in `known` falls back to `All`.
    pub fn resolve(
        &mut self,
        dropdown: Option<RegionChoice>,
        map_click: Option<&str>,
        known: &[String],
    ) -> RegionChoice {
        let known_region = |name: &str| {
            let key = normalize_region(name);
            known.contains(&key).then_some(RegionChoice::Region(key))
        };

        let choice = match (map_click, dropdown) {
            (Some(clicked), _) => known_region(clicked).unwrap_or(RegionChoice::All),
            (None, Some(RegionChoice::All)) => RegionChoice::All,
            (None, Some(RegionChoice::Region(name))) => {
                known_region(&name).unwrap_or(RegionChoice::All)
            }
            (None, None) => self
                .selected_region
                .as_deref()
                .and_then(known_region)
                .unwrap_or(RegionChoice::All),
        };

        self.selected_region = match &choice {
            RegionChoice::All => None,
            RegionChoice::Region(name) => Some(name.clone()),
        };
        choice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KindGroup;

    fn rec(region: &str, level: &str, school: &str, kind: &str, login: u64) -> AccountRecord {
        AccountRecord {
            region: region.to_string(),
            level: level.to_string(),
            school: school.to_string(),
            kind: kind.to_string(),
            logged_in: login,
            available: login,
            registered: login * 2,
        }
    }

    fn sample() -> Vec<AccountRecord> {
        vec![
            rec("LAMPUNG SELATAN", "SD", "SDN 1", "guru", 10),
            rec("LAMPUNG SELATAN", "SD", "SDN 1", "tenaga kependidikan", 5),
            rec("LAMPUNG SELATAN", "SMP", "SMPN 1", "guru", 7),
            rec("METRO", "SD", "SDN 9", "guru", 3),
            rec("METRO", "SMA", "SMAN 2", "tenaga kependidikan", 4),
        ]
    }

    fn select(region: RegionChoice, level: LevelChoice, kinds: KindGroup) -> FilterSelection {
        FilterSelection {
            region,
            level,
            kinds,
        }
    }

    #[test]
    fn all_dimensions_open_is_identity() {
        let records = sample();
        let outcome = apply(&records, &FilterSelection::default());
        assert_eq!(outcome, FilterOutcome::Matched(records));
    }

    #[test]
    fn teacher_and_staff_partition_both() {
        let records = sample();
        let both = apply(&records, &FilterSelection::default());
        let teachers = apply(
            &records,
            &select(RegionChoice::All, LevelChoice::All, KindGroup::TeacherOnly),
        );
        let staff = apply(
            &records,
            &select(RegionChoice::All, LevelChoice::All, KindGroup::StaffOnly),
        );

        for t in teachers.records() {
            assert!(!staff.records().contains(t));
        }
        let mut union: Vec<AccountRecord> = teachers
            .records()
            .iter()
            .chain(staff.records())
            .cloned()
            .collect();
        let mut expected = both.records().to_vec();
        let key = |r: &AccountRecord| (r.region.clone(), r.level.clone(), r.school.clone(), r.kind.clone());
        union.sort_by_key(key);
        expected.sort_by_key(key);
        assert_eq!(union, expected);
    }

    #[test]
    fn unrecognised_kind_never_matches() {
        let mut records = sample();
        records.push(rec("METRO", "SD", "SDN 9", "operator", 1));
        let both = apply(&records, &FilterSelection::default());
        assert_eq!(both.records().len(), 5);
    }

    #[test]
    fn region_filter_normalizes_selection() {
        let records = sample();
        let outcome = apply(
            &records,
            &select(
                RegionChoice::Region("Kab. Lampung Selatan".to_string()),
                LevelChoice::Level("SD".to_string()),
                KindGroup::Both,
            ),
        );
        assert_eq!(outcome.records().len(), 2);
        assert!(outcome.records().iter().all(|r| r.region == "LAMPUNG SELATAN"));
    }

    #[test]
    fn empty_selection_is_no_match() {
        let records = sample();
        let outcome = apply(
            &records,
            &select(
                RegionChoice::Region("METRO".to_string()),
                LevelChoice::Level("SMP".to_string()),
                KindGroup::Both,
            ),
        );
        assert_eq!(outcome, FilterOutcome::NoMatch);
        assert!(outcome.records().is_empty());
    }

    #[test]
    fn options_are_sorted_and_distinct() {
        let records = sample();
        assert_eq!(level_options(&records), vec!["SD", "SMA", "SMP"]);
        assert_eq!(region_options(&records), vec!["LAMPUNG SELATAN", "METRO"]);
    }

    #[test]
    fn map_click_overrides_dropdown() {
        let known = region_options(&sample());
        let mut session = SessionState::default();
        let choice = session.resolve(
            Some(RegionChoice::Region("METRO".to_string())),
            Some("Lampung Selatan"),
            &known,
        );
        assert_eq!(choice, RegionChoice::Region("LAMPUNG SELATAN".to_string()));
        assert_eq!(session.selected_region.as_deref(), Some("LAMPUNG SELATAN"));
    }

    #[test]
    fn carried_region_is_reused_until_reselected() {
        let known = region_options(&sample());
        let mut session = SessionState {
            selected_region: Some("METRO".to_string()),
        };
        assert_eq!(
            session.resolve(None, None, &known),
            RegionChoice::Region("METRO".to_string())
        );
        assert_eq!(session.resolve(Some(RegionChoice::All), None, &known), RegionChoice::All);
        assert_eq!(session.selected_region, None);
        assert_eq!(session.resolve(None, None, &known), RegionChoice::All);
    }

    #[test]
    fn unknown_region_falls_back_to_all() {
        let known = region_options(&sample());
        let mut session = SessionState {
            selected_region: Some("TANGGAMUS".to_string()),
        };
        assert_eq!(session.resolve(None, None, &known), RegionChoice::All);
        assert_eq!(session.resolve(None, Some("Atlantis"), &known), RegionChoice::All);
    }
}
