use geo::MultiPolygon;
use serde::Deserialize;
use tabled::Tabled;

pub const KIND_TEACHER: &str = "guru";
pub const KIND_STAFF: &str = "tenaga kependidikan";

/// One spreadsheet row exactly as read, before any cleaning. Column names
/// are matched after trimming the header cells.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Kabupaten")]
    pub kabupaten: Option<String>,
    #[serde(rename = "jenjang")]
    pub jenjang: Option<String>,
    #[serde(rename = "nama_sekolah")]
    pub nama_sekolah: Option<String>,
    #[serde(rename = "Tipe Akun")]
    pub tipe_akun: Option<String>,
    #[serde(rename = "Total Akun Login")]
    pub total_login: Option<String>,
    #[serde(rename = "Total Akun Tersedia")]
    pub total_tersedia: Option<String>,
    #[serde(rename = "Total Akun Terdaftar Dapodik")]
    pub total_terdaftar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    /// Normalized region key (see `util::normalize_region`).
    pub region: String,
    pub level: String,
    pub school: String,
    /// Lower-cased, trimmed account kind.
    pub kind: String,
    pub logged_in: u64,
    pub available: u64,
    pub registered: u64,
}

impl AccountRecord {
    pub fn account_kind(&self) -> Option<AccountKind> {
        AccountKind::from_normalized(&self.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountKind {
    Teacher,
    Staff,
}

impl AccountKind {
    pub fn from_normalized(kind: &str) -> Option<Self> {
        match kind {
            KIND_TEACHER => Some(Self::Teacher),
            KIND_STAFF => Some(Self::Staff),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegionBoundary {
    pub region: String,
    pub geometry: MultiPolygon<f64>,
}

/// Both loaded relations. Immutable once loaded; every pipeline cycle reads
/// from it and never writes back.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<AccountRecord>,
    pub boundaries: Vec<RegionBoundary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionChoice {
    All,
    Region(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelChoice {
    All,
    Level(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindGroup {
    #[default]
    Both,
    TeacherOnly,
    StaffOnly,
}

impl KindGroup {
    pub fn admits(self, kind: Option<AccountKind>) -> bool {
        match (self, kind) {
            (KindGroup::Both, Some(_)) => true,
            (KindGroup::TeacherOnly, Some(AccountKind::Teacher)) => true,
            (KindGroup::StaffOnly, Some(AccountKind::Staff)) => true,
            _ => false,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            KindGroup::Both => "Guru dan Tenaga Kependidikan",
            KindGroup::TeacherOnly => "Guru",
            KindGroup::StaffOnly => "Tenaga Kependidikan",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub region: RegionChoice,
    pub level: LevelChoice,
    pub kinds: KindGroup,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            region: RegionChoice::All,
            level: LevelChoice::All,
            kinds: KindGroup::Both,
        }
    }
}

/// Summed counters for one group. `key` is the region or level the row was
/// grouped by, `None` for an ungrouped total.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: Option<String>,
    pub logged_in: u64,
    pub available: u64,
    pub registered: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchoolCountRow {
    pub key: String,
    pub schools: usize,
}

/// Region x level table of distinct school counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelPivot {
    pub levels: Vec<String>,
    /// One entry per region, counts aligned with `levels` (0 where the
    /// region has no school at that level).
    pub rows: Vec<(String, Vec<usize>)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelShare {
    pub level: String,
    pub logged_in: u64,
}

/// A boundary joined with the aggregated counters of its region.
#[derive(Debug, Clone)]
pub struct GeoAggregate {
    pub region: String,
    pub geometry: MultiPolygon<f64>,
    pub logged_in: u64,
    pub available: u64,
    pub registered: u64,
    pub percentage: f64,
}

#[derive(Debug, Tabled, Clone)]
pub struct LoginRateRow {
    #[tabled(rename = "Group")]
    pub group: String,
    #[tabled(rename = "Total Akun Login")]
    pub logged_in: String,
    #[tabled(rename = "Total Akun Tersedia")]
    pub available: String,
    #[tabled(rename = "Total Akun Terdaftar Dapodik")]
    pub registered: String,
    #[tabled(rename = "Persentase Login")]
    pub percentage: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct SchoolCountDisplayRow {
    #[tabled(rename = "Group")]
    pub group: String,
    #[tabled(rename = "Jumlah Sekolah")]
    pub schools: String,
    #[tabled(rename = "Per Jenjang")]
    pub breakdown: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct MapRegionRow {
    #[tabled(rename = "Kabupaten")]
    pub region: String,
    #[tabled(rename = "Total Akun Login")]
    pub logged_in: String,
    #[tabled(rename = "Total Akun Tersedia")]
    pub available: String,
    #[tabled(rename = "Total Akun Terdaftar Dapodik")]
    pub registered: String,
    #[tabled(rename = "Persentase Login")]
    pub percentage: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct RawDisplayRow {
    #[tabled(rename = "Kabupaten")]
    pub region: String,
    #[tabled(rename = "jenjang")]
    pub level: String,
    #[tabled(rename = "nama_sekolah")]
    pub school: String,
    #[tabled(rename = "Tipe Akun")]
    pub kind: String,
    #[tabled(rename = "Login")]
    pub logged_in: String,
    #[tabled(rename = "Tersedia")]
    pub available: String,
    #[tabled(rename = "Terdaftar")]
    pub registered: String,
}
