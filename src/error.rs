/// Errors that can occur while loading the account spreadsheet or the
/// boundary dataset.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The workbook could not be opened or read.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// The boundary file is not valid GeoJSON.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The input was readable but does not have the expected shape.
    #[error(transparent)]
    DataFormat(#[from] DataFormatError),
}

/// Input that parses but cannot be used. Fatal to the current load; no
/// partial data is kept.
#[derive(Debug, thiserror::Error)]
pub enum DataFormatError {
    #[error("{dataset} is missing required column(s): {}", columns.join(", "))]
    MissingColumns {
        dataset: &'static str,
        columns: Vec<String>,
    },

    #[error("row {row}: column '{column}' has invalid count '{value}'")]
    MalformedCount {
        /// 1-based data row (the header is not counted).
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("workbook contains no worksheets")]
    NoSheets,

    #[error("feature {feature} has no '{property}' property")]
    MissingProperty {
        feature: usize,
        property: &'static str,
    },

    #[error("feature {feature} has no geometry")]
    MissingGeometry { feature: usize },

    #[error("feature {feature} geometry is not a Polygon or MultiPolygon")]
    UnsupportedGeometry { feature: usize },

    #[error("boundary file is not a GeoJSON FeatureCollection")]
    NotAFeatureCollection,

    #[error("unsupported spreadsheet format: {path}")]
    UnsupportedFormat { path: String },
}

pub type Result<T> = std::result::Result<T, Error>;
