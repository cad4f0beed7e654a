use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Production start date of a single well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StartDateRecord {
    /// Well name or code, the join key against the forecast rows
    pub entity_id: String,
    /// Start date, time of day discarded
    pub start_date: NaiveDate,
}

impl StartDateRecord {
    pub fn new(entity_id: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            entity_id: entity_id.into(),
            start_date,
        }
    }
}

/// One forecast month of one well.
///
/// `resolved_date` is `None` when the well has no start date; such rows are
/// kept in the table but never fall inside a date interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ForecastRow {
    /// Well name or code
    pub entity_id: String,
    /// 1-based month offset relative to the start month
    pub month_index: u32,
    /// Oil rate, if forecast
    pub oil_rate: Option<f64>,
    /// Gas rate, if forecast
    pub gas_rate: Option<f64>,
    /// Water rate, if forecast
    pub water_rate: Option<f64>,
    /// Forecast confidence tag (e.g. Low, Mid, High)
    pub likelihood: String,
    /// First day of the forecast month
    pub resolved_date: Option<NaiveDate>,
}
