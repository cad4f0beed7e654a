use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::error::{ComputeError, Result};

/// Writes `frame` as a CSV file with a header row.
///
/// Dates are written as `YYYY-MM-DD`; nulls as empty fields.
#[instrument(skip_all, fields(path = %path.as_ref().display(), rows = frame.height()))]
pub fn write_csv(frame: &DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    let mut frame = frame.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut frame)?;

    info!("Wrote {} rows to {}", frame.height(), path.display());
    Ok(())
}

/// Reads a CSV file written by [`write_csv`].
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ComputeError::DataLoad(format!(
            "Forecast table '{}' does not exist",
            path.display()
        )));
    }

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| {
            ComputeError::DataLoad(format!("Cannot read '{}': {}", path.display(), e))
        })?;

    debug!("Read {} rows from {}", frame.height(), path.display());
    Ok(frame)
}
