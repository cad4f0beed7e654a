use common::DateInterval;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::table::ForecastTable;

/// Likelihood tag preselected by the viewer when the data has it.
pub const DEFAULT_LIKELIHOOD: &str = "Mid";

/// The three user selections of the viewer.
///
/// An empty entity or likelihood list matches every row. The interval is
/// inclusive and never matches a row without a resolved date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastFilter {
    pub entities: Vec<String>,
    pub interval: DateInterval,
    pub likelihoods: Vec<String>,
}

impl ForecastFilter {
    pub fn new(entities: Vec<String>, interval: DateInterval, likelihoods: Vec<String>) -> Self {
        Self {
            entities,
            interval,
            likelihoods,
        }
    }

    fn matches(&self, entity: &str, date: Option<chrono::NaiveDate>, likelihood: &str) -> bool {
        (self.entities.is_empty() || self.entities.iter().any(|e| e == entity))
            && self.interval.contains(date)
            && (self.likelihoods.is_empty() || self.likelihoods.iter().any(|l| l == likelihood))
    }
}

impl ForecastTable {
    /// Rows matching all three selections, in their original order.
    #[instrument(skip(self), fields(rows = self.height()))]
    pub fn filter(&self, selection: &ForecastFilter) -> Result<ForecastTable> {
        let entities = self.entity_values()?;
        let dates = self.date_values()?;
        let likelihoods = self.likelihood_values()?;

        let mask: Vec<bool> = (0..self.height())
            .map(|i| selection.matches(&entities[i], dates[i], &likelihoods[i]))
            .collect();

        let filtered = self.retain(&mask)?;
        debug!("Filter kept {} of {} rows", filtered.height(), self.height());
        Ok(filtered)
    }
}

/// Initial selections shown before the user touches any control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewerDefaults {
    /// First entity alphabetically, if any
    pub entities: Vec<String>,
    /// Full date range of the data; `None` when no row has a date
    pub interval: Option<DateInterval>,
    /// `Mid` when the data has it, otherwise no preselection
    pub likelihoods: Vec<String>,
}

impl ViewerDefaults {
    pub fn for_table(table: &ForecastTable) -> Result<Self> {
        let entities = table.entities()?.into_iter().take(1).collect();
        let likelihoods = if table.likelihoods()?.iter().any(|l| l == DEFAULT_LIKELIHOOD) {
            vec![DEFAULT_LIKELIHOOD.to_string()]
        } else {
            Vec::new()
        };

        Ok(Self {
            entities,
            interval: table.date_bounds()?,
            likelihoods,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::testing::{date, sample_table};

    fn full_interval() -> DateInterval {
        DateInterval::new(date(2024, 4, 1), date(2024, 6, 1)).unwrap()
    }

    #[test]
    fn test_empty_selection_keeps_every_dated_row() {
        let table = sample_table();
        let selection = ForecastFilter::new(vec![], full_interval(), vec![]);
        let filtered = table.filter(&selection).unwrap();

        let dated = table.date_values().unwrap().iter().filter(|d| d.is_some()).count();
        assert_eq!(filtered.height(), dated);
        assert!(filtered.date_values().unwrap().iter().all(|d| d.is_some()));
    }

    #[test]
    fn test_entity_selection_spans_all_likelihoods_and_dates() {
        let table = sample_table();
        let selection = ForecastFilter::new(
            vec!["A-1".to_string(), "B-2".to_string()],
            full_interval(),
            vec![],
        );
        let filtered = table.filter(&selection).unwrap();

        assert_eq!(filtered.height(), 5);
        assert_eq!(filtered.entities().unwrap(), vec!["A-1", "B-2"]);
        assert_eq!(filtered.likelihoods().unwrap(), vec!["High", "Mid", "Low"]);
    }

    #[test]
    fn test_entity_without_start_date_never_matches_a_date_range() {
        let table = sample_table();
        let selection = ForecastFilter::new(vec!["WELL-9".to_string()], full_interval(), vec![]);
        assert!(table.filter(&selection).unwrap().is_empty());
    }

    #[test]
    fn test_interval_bounds_are_inclusive() {
        let table = sample_table();
        let selection = ForecastFilter::new(
            vec![],
            DateInterval::new(date(2024, 5, 1), date(2024, 6, 1)).unwrap(),
            vec![],
        );
        let filtered = table.filter(&selection).unwrap();
        assert_eq!(filtered.height(), 3);
    }

    #[test]
    fn test_likelihood_selection() {
        let table = sample_table();
        let selection = ForecastFilter::new(vec![], full_interval(), vec!["Mid".to_string()]);
        let filtered = table.filter(&selection).unwrap();

        assert_eq!(filtered.height(), 2);
        assert_eq!(filtered.entities().unwrap(), vec!["A-1"]);
    }

    #[test]
    fn test_filter_is_a_narrowing() {
        let table = sample_table();
        let selection = ForecastFilter::new(vec!["B-2".to_string()], full_interval(), vec![]);
        let once = table.filter(&selection).unwrap();
        let twice = once.filter(&selection).unwrap();
        assert!(once.frame().equals_missing(twice.frame()));
    }

    #[test]
    fn test_viewer_defaults() {
        let defaults = ViewerDefaults::for_table(&sample_table()).unwrap();
        assert_eq!(defaults.entities, vec!["A-1"]);
        assert_eq!(defaults.interval, Some(full_interval()));
        assert_eq!(defaults.likelihoods, vec!["Mid"]);
    }

    #[test]
    fn test_viewer_defaults_without_mid() {
        let table = sample_table();
        let selection = ForecastFilter::new(vec!["B-2".to_string()], full_interval(), vec![]);
        let high_only = table.filter(&selection).unwrap();

        let defaults = ViewerDefaults::for_table(&high_only).unwrap();
        assert!(defaults.likelihoods.is_empty());
        assert_eq!(defaults.entities, vec!["B-2"]);
    }
}
