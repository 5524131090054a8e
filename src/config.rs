use clap::Parser;
use std::path::PathBuf;

/// Account activation report for Belajar.id accounts in Provinsi Lampung.
#[derive(Parser, Debug, Clone)]
#[command(name = "akun_report", version, about)]
pub struct Args {
    /// Account spreadsheet (.xlsx, .xls, .ods or .csv) to load at start-up
    #[arg(long, env = "AKUN_REPORT_DATA")]
    pub data: Option<PathBuf>,

    /// Province boundary GeoJSON with an `nm_dati2` property per feature
    #[arg(long, env = "AKUN_REPORT_BOUNDARIES", default_value = "data/lpg.geojson")]
    pub boundaries: PathBuf,

    /// Rows shown by the raw data view (clamped to 5..=100)
    #[arg(long, default_value_t = 20)]
    pub preview_rows: usize,
}
