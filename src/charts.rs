use chrono::NaiveDate;
use common::RateStream;
use compute::ForecastTable;
use plotly::common::{Mode, Title};
use plotly::layout::Axis;
use plotly::{Layout, Plot, Scatter};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Stacked-area chart of one rate stream, one band per entity.
///
/// Returns `None` for an empty table. Rows without a date or without a value
/// are left out; rows sharing entity and date are summed, so selecting
/// several likelihoods stacks them the same way a per-row stack would.
#[instrument(skip(table), fields(rows = table.height()))]
pub fn render_series(table: &ForecastTable, rate: RateStream) -> compute::Result<Option<Plot>> {
    if table.is_empty() {
        debug!("No rows to chart for {}", rate);
        return Ok(None);
    }

    let entities = table.entity_values()?;
    let dates = table.date_values()?;
    let values = table.rate_values(rate)?;

    let mut bands: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for ((entity, date), value) in entities.iter().zip(&dates).zip(&values) {
        if let (Some(date), Some(value)) = (date, value) {
            *bands
                .entry(entity.as_str())
                .or_default()
                .entry(*date)
                .or_insert(0.0) += value;
        }
    }

    let label = table.columns().rate(rate);
    let mut plot = Plot::new();
    for (entity, points) in bands {
        let (x, y): (Vec<String>, Vec<f64>) = points
            .into_iter()
            .map(|(date, value)| (date.format("%Y-%m-%d").to_string(), value))
            .unzip();

        let hover = format!(
            "Entity: {}<br>{}: %{{y}}<br>Date: %{{x}}<extra></extra>",
            entity, label
        );
        let trace = Scatter::new(x, y)
            .name(entity)
            .mode(Mode::Lines)
            .stack_group("rates")
            .hover_template(&hover);
        plot.add_trace(trace);
    }

    let layout = Layout::new()
        .title(Title::with_text(rate.title()))
        .x_axis(Axis::new().title(Title::with_text("Date")))
        .y_axis(Axis::new().title(Title::with_text(label)))
        .height(600);
    plot.set_layout(layout);

    Ok(Some(plot))
}
