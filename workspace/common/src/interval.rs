use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Inclusive calendar date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct DateInterval {
    /// First date included
    pub start: NaiveDate,
    /// Last date included
    pub end: NaiveDate,
}

impl DateInterval {
    /// Returns `None` when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// A missing date is never inside a concrete interval.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        match date {
            Some(date) => self.start <= date && date <= self.end,
            None => false,
        }
    }

    /// Restricts this interval to `bounds`, or `None` if they do not overlap.
    pub fn clamp_to(&self, bounds: &DateInterval) -> Option<Self> {
        Self::new(self.start.max(bounds.start), self.end.min(bounds.end))
    }
}
