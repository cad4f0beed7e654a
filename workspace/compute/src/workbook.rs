use calamine::{Data, DataType as CellType, Range, Reader, open_workbook_auto};
use polars::prelude::*;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, instrument, trace};

use crate::error::{ComputeError, Result};

/// Where the two input sections live inside the forecast workbook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkbookLayout {
    /// Sheet with one start date per well
    pub start_dates_sheet: String,
    /// Sheet with the long-format monthly forecast
    pub forecast_sheet: String,
    /// Rows above the header row (the section label)
    pub header_offset: usize,
}

impl Default for WorkbookLayout {
    fn default() -> Self {
        Self {
            start_dates_sheet: "start_dates".to_string(),
            forecast_sheet: "forecast".to_string(),
            header_offset: 1,
        }
    }
}

/// Both input tables of the resolver.
#[derive(Debug, Clone)]
pub struct WorkbookTables {
    pub start_dates: DataFrame,
    pub forecast: DataFrame,
}

/// Loads the start-date and forecast sections of a workbook.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_workbook(path: impl AsRef<Path>, layout: &WorkbookLayout) -> Result<WorkbookTables> {
    info!("Loading start dates");
    let start_dates = load_sheet(&path, &layout.start_dates_sheet, layout.header_offset)?;
    info!("Loading forecasts");
    let forecast = load_sheet(&path, &layout.forecast_sheet, layout.header_offset)?;

    Ok(WorkbookTables {
        start_dates,
        forecast,
    })
}

/// Reads one sheet into a DataFrame, skipping `header_offset` rows before the header.
pub fn load_sheet(path: impl AsRef<Path>, sheet: &str, header_offset: usize) -> Result<DataFrame> {
    let path = path.as_ref();
    trace!("Opening workbook {}", path.display());
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        ComputeError::DataLoad(format!("Cannot open workbook '{}': {}", path.display(), e))
    })?;

    let range = workbook.worksheet_range(sheet).map_err(|e| {
        ComputeError::DataLoad(format!(
            "Cannot read sheet '{}' of '{}': {}",
            sheet,
            path.display(),
            e
        ))
    })?;

    let df = range_to_dataframe(&range, header_offset)
        .map_err(|e| match e {
            ComputeError::DataLoad(msg) => ComputeError::DataLoad(format!("Sheet '{}': {}", sheet, msg)),
            other => other,
        })?;
    debug!("Sheet '{}' loaded with {} rows and {} columns", sheet, df.height(), df.width());
    Ok(df)
}

/// The storage type chosen for one spreadsheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Empty,
    Integer,
    Float,
    Boolean,
    DateTime,
    Text,
}

impl ColumnKind {
    fn of_cell(cell: &Data) -> Self {
        match cell {
            Data::Empty => ColumnKind::Empty,
            Data::Int(_) => ColumnKind::Integer,
            Data::Float(f) if f.fract() == 0.0 => ColumnKind::Integer,
            Data::Float(_) => ColumnKind::Float,
            Data::Bool(_) => ColumnKind::Boolean,
            Data::DateTime(_) | Data::DateTimeIso(_) => ColumnKind::DateTime,
            _ => ColumnKind::Text,
        }
    }

    fn merge(self, other: ColumnKind) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (ColumnKind::Empty, b) => b,
            (a, ColumnKind::Empty) => a,
            (ColumnKind::Integer, ColumnKind::Float) | (ColumnKind::Float, ColumnKind::Integer) => {
                ColumnKind::Float
            }
            _ => ColumnKind::Text,
        }
    }
}

/// Converts a sheet range into a typed DataFrame.
///
/// `header_offset` counts sheet rows from the top of the sheet, not from the
/// first used cell. Fully blank data rows are dropped.
pub fn range_to_dataframe(range: &Range<Data>, header_offset: usize) -> Result<DataFrame> {
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let skip = header_offset.saturating_sub(first_row);

    let mut rows = range.rows().skip(skip);
    let header = rows
        .next()
        .ok_or_else(|| ComputeError::DataLoad("No header row found".to_string()))?;
    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Data::Empty => format!("column_{}", i),
            other => other.to_string().trim().to_string(),
        })
        .collect();

    let body: Vec<&[Data]> = rows
        .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
        .collect();

    let mut columns: Vec<Column> = Vec::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        let cells: Vec<&Data> = body.iter().map(|row| row.get(i).unwrap_or(&Data::Empty)).collect();
        columns.push(build_column(name, &cells)?);
    }

    Ok(DataFrame::new(columns)?)
}

fn build_column(name: &str, cells: &[&Data]) -> Result<Column> {
    let kind = cells
        .iter()
        .map(|cell| ColumnKind::of_cell(cell))
        .fold(ColumnKind::Empty, ColumnKind::merge);

    let series = match kind {
        ColumnKind::Integer => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v),
                    Data::Float(f) => Some(*f as i64),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        ColumnKind::Float => {
            let values: Vec<Option<f64>> = cells.iter().map(|cell| cell.as_f64()).collect();
            Series::new(name.into(), values)
        }
        ColumnKind::Boolean => {
            let values: Vec<Option<bool>> = cells.iter().map(|cell| cell.get_bool()).collect();
            Series::new(name.into(), values)
        }
        ColumnKind::DateTime => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| cell.as_datetime().map(|dt| dt.and_utc().timestamp_millis()))
                .collect();
            Series::new(name.into(), values)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        }
        ColumnKind::Empty | ColumnKind::Text => {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Empty => None,
                    other => Some(other.to_string()),
                })
                .collect();
            Series::new(name.into(), values)
        }
    };

    Ok(series.into())
}
