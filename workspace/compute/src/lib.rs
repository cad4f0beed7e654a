//! Data layer of the forecast tooling: workbook loading, start-date
//! resolution, the flat-file contract and the viewer's filter.

pub mod columns;
pub mod error;
pub mod export;
pub mod filter;
pub mod months;
pub mod resolver;
pub mod table;
pub mod values;
pub mod workbook;

pub use columns::ColumnNames;
pub use error::{ComputeError, Result};
pub use filter::{ForecastFilter, ViewerDefaults};
pub use resolver::{ResolveSummary, StartDateIndex, resolve, resolve_with_summary};
pub use table::ForecastTable;
pub use workbook::{WorkbookLayout, WorkbookTables, load_workbook};
