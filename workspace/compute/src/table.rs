use chrono::NaiveDate;
use common::{DateInterval, ForecastRow, RateStream};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

use crate::columns::{ColumnNames, require_column};
use crate::error::{ComputeError, Result};
use crate::export::read_csv;
use crate::values::{column_dates, column_floats, column_texts, date_series, month_index_value};

/// The resolved forecast table as consumed by the viewer.
///
/// Construction checks that every column of the flat-file contract is
/// present and stores the resolved dates as a polars `Date` column.
#[derive(Debug, Clone)]
pub struct ForecastTable {
    frame: DataFrame,
    columns: ColumnNames,
}

impl ForecastTable {
    pub fn from_frame(frame: DataFrame, columns: ColumnNames) -> Result<Self> {
        for column in columns.forecast_table_columns() {
            require_column(&frame, column, "forecast")?;
        }

        let mut frame = frame;
        if frame.column(&columns.resolved_date)?.dtype() != &DataType::Date {
            debug!("Normalizing '{}' column to dates", columns.resolved_date);
            let dates = column_dates(&frame, &columns.resolved_date)?;
            frame.with_column(date_series(&columns.resolved_date, &dates)?)?;
        }

        Ok(Self { frame, columns })
    }

    /// Loads the flat file written by the resolver.
    pub fn load(path: impl AsRef<Path>, columns: ColumnNames) -> Result<Self> {
        Self::from_frame(read_csv(path)?, columns)
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn columns(&self) -> &ColumnNames {
        &self.columns
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Entity of each row; null entities read as an empty string.
    pub fn entity_values(&self) -> Result<Vec<String>> {
        Ok(column_texts(&self.frame, &self.columns.entity)?
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect())
    }

    /// Likelihood of each row; null likelihoods read as an empty string.
    pub fn likelihood_values(&self) -> Result<Vec<String>> {
        Ok(column_texts(&self.frame, &self.columns.likelihood)?
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect())
    }

    pub fn date_values(&self) -> Result<Vec<Option<NaiveDate>>> {
        column_dates(&self.frame, &self.columns.resolved_date)
    }

    pub fn rate_values(&self, rate: RateStream) -> Result<Vec<Option<f64>>> {
        column_floats(&self.frame, self.columns.rate(rate))
    }

    /// Distinct entities in alphabetical order.
    pub fn entities(&self) -> Result<Vec<String>> {
        let unique: BTreeSet<String> = self
            .entity_values()?
            .into_iter()
            .filter(|e| !e.is_empty())
            .collect();
        Ok(unique.into_iter().collect())
    }

    /// Distinct likelihood tags in order of first appearance.
    pub fn likelihoods(&self) -> Result<Vec<String>> {
        let mut seen = Vec::new();
        for likelihood in self.likelihood_values()? {
            if !likelihood.is_empty() && !seen.contains(&likelihood) {
                seen.push(likelihood);
            }
        }
        Ok(seen)
    }

    /// Earliest and latest resolved date, `None` when no row has a date.
    pub fn date_bounds(&self) -> Result<Option<DateInterval>> {
        let dates: Vec<NaiveDate> = self.date_values()?.into_iter().flatten().collect();
        Ok(match (dates.iter().min(), dates.iter().max()) {
            (Some(min), Some(max)) => DateInterval::new(*min, *max),
            _ => None,
        })
    }

    /// Typed rows. Rows whose month index is unreadable are skipped with a warning.
    pub fn rows(&self) -> Result<Vec<ForecastRow>> {
        let entities = self.entity_values()?;
        let likelihoods = self.likelihood_values()?;
        let dates = self.date_values()?;
        let oil = self.rate_values(RateStream::Oil)?;
        let gas = self.rate_values(RateStream::Gas)?;
        let water = self.rate_values(RateStream::Water)?;
        let months = self.frame.column(&self.columns.month)?;

        let mut rows = Vec::with_capacity(self.height());
        for i in 0..self.height() {
            let month_index = match month_index_value(&months.get(i)?) {
                Ok(month_index) => month_index,
                Err(value) => {
                    warn!("Skipping row {} with invalid month index '{}'", i, value);
                    continue;
                }
            };
            rows.push(ForecastRow {
                entity_id: entities[i].clone(),
                month_index,
                oil_rate: oil[i],
                gas_rate: gas[i],
                water_rate: water[i],
                likelihood: likelihoods[i].clone(),
                resolved_date: dates[i],
            });
        }
        Ok(rows)
    }

    /// Keeps the rows where `mask` is true.
    pub(crate) fn retain(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.height() {
            return Err(ComputeError::DataFrame(format!(
                "Mask length {} does not match table height {}",
                mask.len(),
                self.height()
            )));
        }
        let mask = BooleanChunked::from_slice("mask".into(), mask);
        Ok(Self {
            frame: self.frame.filter(&mask)?,
            columns: self.columns.clone(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{date, sample_table};
    use super::*;

    #[test]
    fn test_entities_sorted_and_likelihoods_in_appearance_order() {
        let table = sample_table();
        assert_eq!(table.entities().unwrap(), vec!["A-1", "B-2", "WELL-9"]);
        assert_eq!(table.likelihoods().unwrap(), vec!["High", "Mid", "Low"]);
    }

    #[test]
    fn test_date_bounds_ignore_missing_dates() {
        let bounds = sample_table().date_bounds().unwrap().unwrap();
        assert_eq!(bounds.start, date(2024, 4, 1));
        assert_eq!(bounds.end, date(2024, 6, 1));
    }

    #[test]
    fn test_rows_are_typed() {
        let rows = sample_table().rows().unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].entity_id, "B-2");
        assert_eq!(rows[1].water_rate, None);
        assert_eq!(rows[4].month_index, 3);
        assert_eq!(rows[4].resolved_date, Some(date(2024, 6, 1)));
        assert_eq!(rows[5].resolved_date, None);
    }

    #[test]
    fn test_missing_contract_column_is_key_not_found() {
        let frame = sample_table().frame().drop("Likelihood").unwrap();
        match ForecastTable::from_frame(frame, ColumnNames::default()) {
            Err(ComputeError::KeyNotFound { column, .. }) => assert_eq!(column, "Likelihood"),
            other => panic!("Expected KeyNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_text_dates_are_normalized() {
        let frame = sample_table()
            .frame()
            .clone()
            .with_column(Series::new(
                "Date".into(),
                vec![Some("2024-04-01"), None, None, None, None, None],
            ))
            .unwrap()
            .clone();
        let table = ForecastTable::from_frame(frame, ColumnNames::default()).unwrap();
        assert_eq!(table.frame().column("Date").unwrap().dtype(), &DataType::Date);
        assert_eq!(table.date_values().unwrap()[0], Some(date(2024, 4, 1)));
    }
}
