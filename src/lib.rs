// Data pipeline behind the account activation report: load the account
// spreadsheet and province boundaries, filter, aggregate, and join the
// per-region totals onto the map geometry.
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod geo_join;
pub mod loader;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

pub use error::{DataFormatError, Error, Result};
