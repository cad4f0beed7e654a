use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, instrument, trace, warn};

use crate::columns::{ColumnNames, require_column};
use crate::error::{ComputeError, Result};
use crate::months::resolve_month;
use crate::values::{column_dates, column_texts, date_series, month_index_value};

/// Entity to start-date lookup built from the start-date table.
#[derive(Debug, Clone, Default)]
pub struct StartDateIndex {
    dates: HashMap<String, NaiveDate>,
}

impl StartDateIndex {
    /// Builds the index in one pass over the start-date table.
    ///
    /// Rows without an entity or a start date are skipped. When an entity is
    /// listed twice the later row wins.
    #[instrument(skip_all, fields(rows = start_dates.height()))]
    pub fn from_frame(start_dates: &DataFrame, columns: &ColumnNames) -> Result<Self> {
        require_column(start_dates, &columns.entity, "start_dates")?;
        require_column(start_dates, &columns.start_date, "start_dates")?;

        let entities = column_texts(start_dates, &columns.entity)?;
        let starts = column_dates(start_dates, &columns.start_date)?;

        let mut dates = HashMap::with_capacity(entities.len());
        for (row, (entity, start)) in entities.into_iter().zip(starts).enumerate() {
            match (entity, start) {
                (Some(entity), Some(start)) => {
                    if let Some(previous) = dates.insert(entity.clone(), start) {
                        debug!("Entity '{}' listed twice, {} replaces {}", entity, start, previous);
                    }
                }
                (Some(entity), None) => warn!("Entity '{}' at row {} has no start date", entity, row),
                (None, _) => trace!("Skipping start-date row {} without entity", row),
            }
        }

        debug!("Start date index built for {} entities", dates.len());
        Ok(Self { dates })
    }

    pub fn from_records(records: &[common::StartDateRecord]) -> Self {
        Self {
            dates: records
                .iter()
                .map(|r| (r.entity_id.clone(), r.start_date))
                .collect(),
        }
    }

    pub fn get(&self, entity: &str) -> Option<NaiveDate> {
        self.dates.get(entity).copied()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Outcome counts of one resolver run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolveSummary {
    pub rows: usize,
    pub resolved: usize,
    pub unresolved: usize,
    /// Entities present in the forecast but missing from the start-date table
    pub unresolved_entities: BTreeSet<String>,
}

/// Adds the resolved-date column to the forecast table.
///
/// See [`resolve_with_summary`].
pub fn resolve(start_dates: &DataFrame, forecast: &DataFrame, columns: &ColumnNames) -> Result<DataFrame> {
    resolve_with_summary(start_dates, forecast, columns).map(|(df, _)| df)
}

/// Returns a copy of `forecast` with a date column holding, for each row, the
/// first day of month `month_index` counted from the entity's start month.
///
/// Rows of entities without a start date keep a null date and are never
/// dropped, whatever their month cell holds. For rows with a start date, a
/// month index that is not a positive integer aborts the run.
#[instrument(skip_all, fields(start_rows = start_dates.height(), forecast_rows = forecast.height()))]
pub fn resolve_with_summary(
    start_dates: &DataFrame,
    forecast: &DataFrame,
    columns: &ColumnNames,
) -> Result<(DataFrame, ResolveSummary)> {
    info!("Creating start dict");
    let index = StartDateIndex::from_frame(start_dates, columns)?;

    require_column(forecast, &columns.entity, "forecast")?;
    require_column(forecast, &columns.month, "forecast")?;

    let entities = column_texts(forecast, &columns.entity)?;
    let months = forecast.column(&columns.month)?;

    let mut summary = ResolveSummary {
        rows: forecast.height(),
        ..Default::default()
    };
    let mut dates = Vec::with_capacity(forecast.height());

    for (row, entity) in entities.iter().enumerate() {
        // Month cells of rows without a start date are never read
        let start = entity.as_deref().and_then(|e| index.get(e));
        let resolved = match start {
            Some(start) => {
                let month_index = month_index_value(&months.get(row)?).map_err(|value| {
                    ComputeError::InvalidMonthIndex {
                        row,
                        entity: entity.clone().unwrap_or_default(),
                        value,
                    }
                })?;
                Some(resolve_month(start, month_index)?)
            }
            None => {
                if let Some(entity) = entity {
                    if summary.unresolved_entities.insert(entity.clone()) {
                        warn!("No start date for entity '{}', its dates stay empty", entity);
                    }
                }
                None
            }
        };

        if resolved.is_some() {
            summary.resolved += 1;
        } else {
            summary.unresolved += 1;
        }
        dates.push(resolved);
    }

    let mut resolved = forecast.clone();
    resolved.with_column(date_series(&columns.resolved_date, &dates)?)?;

    info!(
        "Resolved dates for {} of {} forecast rows ({} entities without start date)",
        summary.resolved,
        summary.rows,
        summary.unresolved_entities.len()
    );
    Ok((resolved, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{column_dates, days_since_epoch};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn start_dates() -> DataFrame {
        let days: Vec<Option<i32>> = vec![
            Some(days_since_epoch(date(2024, 4, 1))),
            Some(days_since_epoch(date(2024, 1, 31))),
        ];
        DataFrame::new(vec![
            Series::new("Entity".into(), vec!["A-1", "B-2"]).into(),
            Series::new("Forecast Start Date".into(), days)
                .cast(&DataType::Date)
                .unwrap()
                .into(),
        ])
        .unwrap()
    }

    fn forecast() -> DataFrame {
        DataFrame::new(vec![
            Series::new("Entity".into(), vec!["A-1", "A-1", "A-1", "B-2", "WELL-9"]).into(),
            Series::new("Month".into(), vec![1i64, 2, 3, 2, 1]).into(),
            Series::new("Oil Rate".into(), vec![100.0, 90.0, 80.0, 50.0, 10.0]).into(),
            Series::new("Form Gas Rate".into(), vec![1.0, 1.0, 1.0, 2.0, 3.0]).into(),
            Series::new("Water Rate".into(), vec![0.5, 0.5, 0.5, 0.1, 0.0]).into(),
            Series::new("Likelihood".into(), vec!["Mid", "Mid", "Mid", "High", "Mid"]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolves_first_of_offset_month() {
        let columns = ColumnNames::default();
        let (df, summary) = resolve_with_summary(&start_dates(), &forecast(), &columns).unwrap();

        let dates = column_dates(&df, "Date").unwrap();
        assert_eq!(
            dates,
            vec![
                Some(date(2024, 4, 1)),
                Some(date(2024, 5, 1)),
                Some(date(2024, 6, 1)),
                Some(date(2024, 2, 1)),
                None,
            ]
        );
        assert_eq!(summary.rows, 5);
        assert_eq!(summary.resolved, 4);
        assert_eq!(summary.unresolved, 1);
        assert!(summary.unresolved_entities.contains("WELL-9"));
    }

    #[test]
    fn test_rows_of_unknown_entities_are_kept() {
        let columns = ColumnNames::default();
        let df = resolve(&start_dates(), &forecast(), &columns).unwrap();

        assert_eq!(df.height(), forecast().height());
        assert_eq!(df.width(), forecast().width() + 1);
        assert_eq!(df.column("Date").unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn test_inputs_are_not_mutated_and_rerun_is_identical() {
        let columns = ColumnNames::default();
        let input = forecast();
        let first = resolve(&start_dates(), &input, &columns).unwrap();
        let second = resolve(&start_dates(), &input, &columns).unwrap();

        assert!(first.equals_missing(&second));
        assert!(input.column("Date").is_err());
    }

    #[test]
    fn test_start_dates_from_text_and_datetime_are_normalized() {
        let start = DataFrame::new(vec![
            Series::new("Entity".into(), vec!["A-1"]).into(),
            Series::new("Forecast Start Date".into(), vec!["2024-04-15 17:00:00"]).into(),
        ])
        .unwrap();
        let columns = ColumnNames::default();
        let index = StartDateIndex::from_frame(&start, &columns).unwrap();
        assert_eq!(index.get("A-1"), Some(date(2024, 4, 15)));

        let df = resolve(&start, &forecast(), &columns).unwrap();
        let dates = column_dates(&df, "Date").unwrap();
        assert_eq!(dates[2], Some(date(2024, 6, 1)));
    }

    #[test]
    fn test_duplicate_start_dates_last_wins() {
        let start = DataFrame::new(vec![
            Series::new("Entity".into(), vec!["A-1", "A-1"]).into(),
            Series::new("Forecast Start Date".into(), vec!["2024-04-01", "2025-01-01"]).into(),
        ])
        .unwrap();
        let index = StartDateIndex::from_frame(&start, &ColumnNames::default()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("A-1"), Some(date(2025, 1, 1)));
    }

    #[test]
    fn test_missing_column_is_key_not_found() {
        let columns = ColumnNames::default();
        let no_month = forecast().drop("Month").unwrap();

        match resolve(&start_dates(), &no_month, &columns) {
            Err(ComputeError::KeyNotFound { column, table }) => {
                assert_eq!(column, "Month");
                assert_eq!(table, "forecast");
            }
            other => panic!("Expected KeyNotFound, got {:?}", other),
        }

        let no_start = start_dates().drop("Forecast Start Date").unwrap();
        assert!(matches!(
            resolve(&no_start, &forecast(), &columns),
            Err(ComputeError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn test_zero_month_index_is_rejected() {
        let columns = ColumnNames::default();
        let mut bad = forecast();
        bad.with_column(Series::new("Month".into(), vec![1i64, 2, 0, 2, 1]))
            .unwrap();

        match resolve(&start_dates(), &bad, &columns) {
            Err(ComputeError::InvalidMonthIndex { row, entity, value }) => {
                assert_eq!(row, 2);
                assert_eq!(entity, "A-1");
                assert_eq!(value, "0");
            }
            other => panic!("Expected InvalidMonthIndex, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolved_rows_ignore_their_month_cell() {
        let columns = ColumnNames::default();
        let start = DataFrame::new(vec![
            Series::new("Entity".into(), vec!["A-1"]).into(),
            Series::new("Forecast Start Date".into(), vec!["2024-04-01"]).into(),
        ])
        .unwrap();
        let fc = DataFrame::new(vec![
            Series::new("Entity".into(), vec![Some("A-1"), Some("WELL-9"), None]).into(),
            Series::new("Month".into(), vec![Some(1i64), None, None]).into(),
        ])
        .unwrap();

        let (df, summary) = resolve_with_summary(&start, &fc, &columns).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(
            column_dates(&df, "Date").unwrap(),
            vec![Some(date(2024, 4, 1)), None, None]
        );
        assert_eq!(summary.resolved, 1);
        assert_eq!(summary.unresolved, 2);
        assert_eq!(summary.unresolved_entities.len(), 1);
        assert!(summary.unresolved_entities.contains("WELL-9"));
    }

    #[test]
    fn test_custom_column_names() {
        let columns = ColumnNames {
            entity: "Well".to_string(),
            start_date: "Start".to_string(),
            month: "Offset".to_string(),
            resolved_date: "Forecast Month".to_string(),
            ..Default::default()
        };
        let start = DataFrame::new(vec![
            Series::new("Well".into(), vec!["X"]).into(),
            Series::new("Start".into(), vec!["2024-12-10"]).into(),
        ])
        .unwrap();
        let fc = DataFrame::new(vec![
            Series::new("Well".into(), vec!["X", "X"]).into(),
            Series::new("Offset".into(), vec![1i64, 2]).into(),
        ])
        .unwrap();

        let df = resolve(&start, &fc, &columns).unwrap();
        let dates = column_dates(&df, "Forecast Month").unwrap();
        assert_eq!(dates, vec![Some(date(2024, 12, 1)), Some(date(2025, 1, 1))]);
    }

    #[test]
    fn test_index_from_records() {
        let records = vec![common::StartDateRecord::new("A-1", date(2024, 4, 1))];
        let index = StartDateIndex::from_records(&records);
        assert_eq!(index.get("A-1"), Some(date(2024, 4, 1)));
        assert!(index.get("B-2").is_none());
    }
}
