//! Typed extraction of cell values from polars columns.
//!
//! Tables arrive from spreadsheets and CSV files, so the same logical column
//! can be stored as text, integers, floats, dates or datetimes depending on
//! the source. These helpers accept all of them.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

use crate::error::{ComputeError, Result};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Days between the unix epoch and `date`, the physical value of a polars `Date`.
pub fn days_since_epoch(date: NaiveDate) -> i32 {
    date.signed_duration_since(epoch()).num_days() as i32
}

/// Inverse of [`days_since_epoch`].
pub fn date_from_days(days: i32) -> Option<NaiveDate> {
    epoch().checked_add_signed(chrono::Duration::days(days as i64))
}

/// Builds a polars `Date` series from optional calendar dates.
pub fn date_series(name: &str, dates: &[Option<NaiveDate>]) -> Result<Series> {
    let days: Vec<Option<i32>> = dates.iter().map(|d| d.map(days_since_epoch)).collect();
    Ok(Series::new(name.into(), days).cast(&DataType::Date)?)
}

/// Parses a date written as text; any time of day is discarded.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|dt| dt.date())
        })
}

/// Text form of a cell, `None` for null.
pub fn text_value(value: &AnyValue) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(s) => Some(s.to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        other => Some(other.to_string()),
    }
}

/// Calendar date of a cell, normalised to midnight. `None` for null or blank text.
pub fn date_value(value: &AnyValue) -> Result<Option<NaiveDate>> {
    match value {
        AnyValue::Null => Ok(None),
        AnyValue::Date(days) => date_from_days(*days)
            .map(Some)
            .ok_or_else(|| ComputeError::Date(format!("Invalid date value: {}", days))),
        AnyValue::Datetime(ts, unit, _) => {
            let datetime = match unit {
                TimeUnit::Milliseconds => DateTime::from_timestamp_millis(*ts),
                TimeUnit::Microseconds => DateTime::from_timestamp_micros(*ts),
                TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(*ts)),
            };
            datetime
                .map(|dt| Some(dt.date_naive()))
                .ok_or_else(|| ComputeError::Date(format!("Invalid datetime value: {}", ts)))
        }
        other => match text_value(other) {
            Some(text) if text.trim().is_empty() => Ok(None),
            Some(text) => parse_date_text(&text)
                .map(Some)
                .ok_or_else(|| ComputeError::Date(format!("Cannot parse '{}' as a date", text))),
            None => Ok(None),
        },
    }
}

/// Numeric value of a cell. Blank text and null are `None`.
pub fn float_value(value: &AnyValue) -> Result<Option<f64>> {
    match value {
        AnyValue::Null => Ok(None),
        AnyValue::String(_) | AnyValue::StringOwned(_) => {
            let text = text_value(value).unwrap_or_default();
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>()
                .map(Some)
                .map_err(|e| ComputeError::Series(format!("Cannot parse '{}' as a number: {}", text, e)))
        }
        other => other
            .try_extract::<f64>()
            .map(Some)
            .map_err(|e| ComputeError::Series(format!("Cannot read {} as a number: {}", other, e))),
    }
}

/// Positive 1-based month index of a cell.
///
/// On failure the cell's text form is returned so the caller can report it.
pub fn month_index_value(value: &AnyValue) -> std::result::Result<u32, String> {
    let raw = text_value(value).unwrap_or_else(|| "null".to_string());
    let index = match value {
        AnyValue::Null => None,
        AnyValue::Float32(f) => whole_number(*f as f64),
        AnyValue::Float64(f) => whole_number(*f),
        AnyValue::String(_) | AnyValue::StringOwned(_) => {
            let text = raw.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(whole_number))
        }
        other => other.try_extract::<i64>().ok(),
    };

    match index {
        Some(index) if index >= 1 => u32::try_from(index).map_err(|_| raw),
        _ => Err(raw),
    }
}

fn whole_number(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

/// All values of `column` as text.
pub fn column_texts(frame: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let values = frame.column(column)?;
    let mut texts = Vec::with_capacity(frame.height());
    for i in 0..frame.height() {
        texts.push(text_value(&values.get(i)?));
    }
    Ok(texts)
}

/// All values of `column` as calendar dates.
pub fn column_dates(frame: &DataFrame, column: &str) -> Result<Vec<Option<NaiveDate>>> {
    let values = frame.column(column)?;
    let mut dates = Vec::with_capacity(frame.height());
    for i in 0..frame.height() {
        let value = values.get(i)?;
        let date = date_value(&value).map_err(|e| {
            ComputeError::Date(format!("Column '{}' row {}: {}", column, i, e))
        })?;
        dates.push(date);
    }
    Ok(dates)
}

/// All values of `column` as floats.
pub fn column_floats(frame: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    let values = frame.column(column)?;
    let mut floats = Vec::with_capacity(frame.height());
    for i in 0..frame.height() {
        floats.push(float_value(&values.get(i)?)?);
    }
    Ok(floats)
}
