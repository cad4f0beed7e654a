use chrono::{Datelike, Months, NaiveDate};

use crate::error::{ComputeError, Result};

/// First day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Calendar date of forecast month `month_index` for a well starting on `start`.
///
/// Month 1 is the start month itself. The result is always the first of a
/// month, so the day of `start` never matters: Jan 31 with month 2 resolves
/// to Feb 1, not March.
pub fn resolve_month(start: NaiveDate, month_index: u32) -> Result<NaiveDate> {
    if month_index == 0 {
        return Err(ComputeError::Date(
            "Month index must be 1 or greater".to_string(),
        ));
    }

    first_of_month(start)
        .checked_add_months(Months::new(month_index - 1))
        .ok_or_else(|| {
            ComputeError::Date(format!(
                "Date overflow shifting {} by {} months",
                start,
                month_index - 1
            ))
        })
}
