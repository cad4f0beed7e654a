use common::RateStream;
use polars::prelude::DataFrame;
use serde::Deserialize;

use crate::error::{ComputeError, Result};

/// Column labels of the start-date and forecast tables.
///
/// Defaults follow the forecast workbook template; every label can be
/// overridden through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Well name or code, present in both tables
    pub entity: String,
    /// Start date column of the start-date table
    pub start_date: String,
    /// 1-based month index column of the forecast table
    pub month: String,
    pub oil_rate: String,
    pub gas_rate: String,
    pub water_rate: String,
    pub likelihood: String,
    /// Column added by the resolver
    pub resolved_date: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            entity: "Entity".to_string(),
            start_date: "Forecast Start Date".to_string(),
            month: "Month".to_string(),
            oil_rate: "Oil Rate".to_string(),
            gas_rate: "Form Gas Rate".to_string(),
            water_rate: "Water Rate".to_string(),
            likelihood: "Likelihood".to_string(),
            resolved_date: "Date".to_string(),
        }
    }
}

impl ColumnNames {
    /// Column holding the values of the given rate stream.
    pub fn rate(&self, rate: RateStream) -> &str {
        match rate {
            RateStream::Oil => &self.oil_rate,
            RateStream::Gas => &self.gas_rate,
            RateStream::Water => &self.water_rate,
        }
    }

    /// Columns the flat forecast table must carry.
    pub fn forecast_table_columns(&self) -> [&str; 7] {
        [
            &self.entity,
            &self.month,
            &self.oil_rate,
            &self.gas_rate,
            &self.water_rate,
            &self.likelihood,
            &self.resolved_date,
        ]
    }
}

/// Fails with `KeyNotFound` unless `frame` has a column called `column`.
pub fn require_column(frame: &DataFrame, column: &str, table: &str) -> Result<()> {
    if frame.get_column_names().iter().any(|name| name.as_str() == column) {
        Ok(())
    } else {
        Err(ComputeError::KeyNotFound {
            column: column.to_string(),
            table: table.to_string(),
        })
    }
}
