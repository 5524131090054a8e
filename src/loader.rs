use crate::error::{DataFormatError, Result};
use crate::types::{AccountRecord, Dataset, RawRow, RegionBoundary};
use crate::util::{normalize_kind, normalize_region, parse_count_safe, Count};
use calamine::{open_workbook_auto, Data, Reader};
use csv::{ReaderBuilder, Trim};
use geo::{Geometry, MultiPolygon};
use geojson::{Feature, GeoJson};
use log::{debug, info, warn};
use serde_json::Value;
use std::path::Path;

pub const COL_REGION: &str = "Kabupaten";
pub const COL_LEVEL: &str = "jenjang";
pub const COL_SCHOOL: &str = "nama_sekolah";
pub const COL_KIND: &str = "Tipe Akun";
pub const COL_LOGIN: &str = "Total Akun Login";
pub const COL_AVAILABLE: &str = "Total Akun Tersedia";
pub const COL_REGISTERED: &str = "Total Akun Terdaftar Dapodik";

const REQUIRED_COLUMNS: [&str; 7] = [
    COL_REGION,
    COL_LEVEL,
    COL_SCHOOL,
    COL_KIND,
    COL_LOGIN,
    COL_AVAILABLE,
    COL_REGISTERED,
];

/// Name of the region property on every boundary feature.
pub const BOUNDARY_REGION_PROPERTY: &str = "nm_dati2";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    /// Rows whose account kind is neither "guru" nor "tenaga kependidikan".
    /// They are kept but never match a kind filter.
    pub unrecognised_kinds: usize,
    /// Counter cells that were blank and counted as zero.
    pub blank_counters: usize,
    pub boundaries: usize,
}

/// Load both datasets for one session.
///
/// The spreadsheet is user supplied; the boundary file is the fixed
/// province GeoJSON. Region keys of both go through the same normalizer.
pub fn load(tabular: &Path, boundaries: &Path) -> Result<(Dataset, LoadReport)> {
    let (records, mut report) = load_accounts(tabular)?;
    let boundaries = load_boundaries(boundaries)?;
    report.boundaries = boundaries.len();
    Ok((Dataset { records, boundaries }, report))
}

/// Load the account spreadsheet. The format is picked from the file
/// extension: `.csv` goes through the CSV reader, workbook formats through
/// calamine (first worksheet only).
pub fn load_accounts(path: &Path) -> Result<(Vec<AccountRecord>, LoadReport)> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let raw_rows = match ext.as_str() {
        "csv" => read_csv_rows(path)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook_rows(path)?,
        _ => {
            return Err(DataFormatError::UnsupportedFormat {
                path: path.display().to_string(),
            }
            .into())
        }
    };

    let mut report = LoadReport::default();
    let mut records = Vec::with_capacity(raw_rows.len());
    for (idx, raw) in raw_rows.into_iter().enumerate() {
        let record = clean_row(raw, idx + 1, &mut report)?;
        if record.account_kind().is_none() {
            debug!("row {}: unrecognised account kind '{}'", idx + 1, record.kind);
            report.unrecognised_kinds += 1;
        }
        records.push(record);
    }
    report.rows = records.len();

    info!(
        "Loaded {} account rows from {}",
        report.rows,
        path.display()
    );
    if report.unrecognised_kinds > 0 {
        warn!(
            "{} rows have an unrecognised account kind and will not match any kind filter",
            report.unrecognised_kinds
        );
    }
    Ok((records, report))
}

fn check_columns(headers: &[String]) -> Result<()> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DataFormatError::MissingColumns {
            dataset: "account spreadsheet",
            columns: missing,
        }
        .into())
    }
}

fn read_csv_rows(path: &Path) -> Result<Vec<RawRow>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_path(path)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    check_columns(&headers)?;

    let mut rows = Vec::new();
    for result in rdr.deserialize::<RawRow>() {
        let row = result?;
        if is_blank(&row) {
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

fn read_workbook_rows(path: &Path) -> Result<Vec<RawRow>> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(DataFormatError::NoSheets)?;
    let range = workbook.worksheet_range(&sheet_name)?;
    debug!("Reading worksheet '{}' ({:?} cells)", sheet_name, range.get_size());

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .map(|r| r.iter().map(|c| c.to_string().trim().to_string()).collect())
        .unwrap_or_default();
    check_columns(&headers)?;

    // check_columns guarantees every required header is present.
    let col = |name: &str| headers.iter().position(|h| h == name).unwrap_or(usize::MAX);
    let (region, level, school, kind) = (
        col(COL_REGION),
        col(COL_LEVEL),
        col(COL_SCHOOL),
        col(COL_KIND),
    );
    let (login, available, registered) =
        (col(COL_LOGIN), col(COL_AVAILABLE), col(COL_REGISTERED));

    let mut rows = Vec::new();
    for cells in sheet_rows {
        let cell = |i: usize| match cells.get(i) {
            None | Some(Data::Empty) => None,
            Some(c) => Some(c.to_string()),
        };
        let row = RawRow {
            kabupaten: cell(region),
            jenjang: cell(level),
            nama_sekolah: cell(school),
            tipe_akun: cell(kind),
            total_login: cell(login),
            total_tersedia: cell(available),
            total_terdaftar: cell(registered),
        };
        if is_blank(&row) {
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

fn is_blank(row: &RawRow) -> bool {
    [
        &row.kabupaten,
        &row.jenjang,
        &row.nama_sekolah,
        &row.tipe_akun,
        &row.total_login,
        &row.total_tersedia,
        &row.total_terdaftar,
    ]
    .iter()
    .all(|v| v.as_deref().map_or(true, |s| s.trim().is_empty()))
}

fn clean_row(raw: RawRow, row: usize, report: &mut LoadReport) -> Result<AccountRecord> {
    let mut count = |value: Option<String>, column: &'static str| -> Result<u64> {
        match parse_count_safe(value.as_deref()) {
            Some(Count::Value(v)) => Ok(v),
            Some(Count::Blank) => {
                report.blank_counters += 1;
                Ok(0)
            }
            None => Err(DataFormatError::MalformedCount {
                row,
                column,
                value: value.unwrap_or_default(),
            }
            .into()),
        }
    };
    let logged_in = count(raw.total_login, COL_LOGIN)?;
    let available = count(raw.total_tersedia, COL_AVAILABLE)?;
    let registered = count(raw.total_terdaftar, COL_REGISTERED)?;

    Ok(AccountRecord {
        region: normalize_region(raw.kabupaten.as_deref().unwrap_or_default()),
        level: raw.jenjang.unwrap_or_default(),
        school: raw.nama_sekolah.unwrap_or_default(),
        kind: normalize_kind(raw.tipe_akun.as_deref().unwrap_or_default()),
        logged_in,
        available,
        registered,
    })
}

/// Load the province boundary features. Each feature must carry a
/// `nm_dati2` property and a Polygon or MultiPolygon geometry.
pub fn load_boundaries(path: &Path) -> Result<Vec<RegionBoundary>> {
    let text = std::fs::read_to_string(path)?;
    let geojson: GeoJson = text.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(DataFormatError::NotAFeatureCollection.into());
    };

    let boundaries = collection
        .features
        .into_iter()
        .enumerate()
        .map(|(idx, feature)| boundary_from_feature(idx, feature))
        .collect::<Result<Vec<_>>>()?;
    info!(
        "Loaded {} region boundaries from {}",
        boundaries.len(),
        path.display()
    );
    Ok(boundaries)
}

fn boundary_from_feature(feature_idx: usize, feature: Feature) -> Result<RegionBoundary> {
    let name = match feature.property(BOUNDARY_REGION_PROPERTY) {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => {
            return Err(DataFormatError::MissingProperty {
                feature: feature_idx,
                property: BOUNDARY_REGION_PROPERTY,
            }
            .into())
        }
        // Numeric or other scalar names are compared by their text.
        Some(other) => other.to_string(),
    };

    let geometry = feature
        .geometry
        .ok_or(DataFormatError::MissingGeometry {
            feature: feature_idx,
        })?;
    let geometry: Geometry<f64> = geometry
        .try_into()
        .map_err(|_| DataFormatError::UnsupportedGeometry {
            feature: feature_idx,
        })?;
    let geometry = match geometry {
        Geometry::MultiPolygon(mp) => mp,
        Geometry::Polygon(p) => MultiPolygon(vec![p]),
        _ => {
            return Err(DataFormatError::UnsupportedGeometry {
                feature: feature_idx,
            }
            .into())
        }
    };

    Ok(RegionBoundary {
        region: normalize_region(&name),
        geometry,
    })
}
