use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use chrono::{Months, NaiveDate};
use common::{DateInterval, RateStream};
use compute::months::first_of_month;
use compute::{ComputeError, ForecastFilter, ForecastTable, ViewerDefaults};
use std::fmt::Write;
use tracing::{debug, error, instrument, warn};

use crate::charts::render_series;
use crate::schemas::AppState;

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const NO_DATA: &str = "No data to display. Please select different filters.";

/// Selections submitted by the viewer form.
///
/// Multi-selects arrive as repeated keys. `submitted` tells an empty
/// selection made by the user apart from a first visit, which gets the
/// defaults. The date range slider sends `from` and `to` as month positions
/// within the data's range; explicit `start` and `end` dates take precedence.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ViewerParams {
    pub submitted: bool,
    pub entities: Vec<String>,
    pub likelihoods: Vec<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub from: Option<usize>,
    pub to: Option<usize>,
}

impl ViewerParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "submitted" => params.submitted = true,
                "entity" if !value.is_empty() => params.entities.push(value.clone()),
                "likelihood" if !value.is_empty() => params.likelihoods.push(value.clone()),
                "start" => params.start = parse_date_param(key, value),
                "end" => params.end = parse_date_param(key, value),
                "from" => params.from = parse_step_param(key, value),
                "to" => params.to = parse_step_param(key, value),
                _ => {}
            }
        }
        params
    }
}

fn parse_date_param(key: &str, value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            warn!("Ignoring {}='{}': {}", key, value, e);
            None
        }
    }
}

fn parse_step_param(key: &str, value: &str) -> Option<usize> {
    match value.parse() {
        Ok(step) => Some(step),
        Err(e) => {
            warn!("Ignoring {}='{}': {}", key, value, e);
            None
        }
    }
}

/// First day of every month from the first to the last month of `bounds`.
fn month_steps(bounds: &DateInterval) -> Vec<NaiveDate> {
    let mut steps = Vec::new();
    let mut month = first_of_month(bounds.start);
    while month <= bounds.end {
        steps.push(month);
        match month.checked_add_months(Months::new(1)) {
            Some(next) => month = next,
            None => break,
        }
    }
    steps
}

fn last_of_month(month: NaiveDate) -> NaiveDate {
    month
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(month)
}

/// What the page shows after applying defaults to the submitted params.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Selection {
    entities: Vec<String>,
    likelihoods: Vec<String>,
    interval: Option<DateInterval>,
    notice: Option<String>,
}

fn select(params: ViewerParams, defaults: &ViewerDefaults) -> Selection {
    let (entities, likelihoods) = if params.submitted {
        (params.entities, params.likelihoods)
    } else {
        (defaults.entities.clone(), defaults.likelihoods.clone())
    };

    let mut notice = None;
    let interval = defaults.interval.map(|bounds| {
        let steps = month_steps(&bounds);
        let start = params
            .start
            .or_else(|| params.from.and_then(|i| steps.get(i).copied()))
            .unwrap_or(bounds.start);
        let end = params
            .end
            .or_else(|| params.to.and_then(|i| steps.get(i).copied()).map(last_of_month))
            .unwrap_or(bounds.end);
        match DateInterval::new(start, end).and_then(|i| i.clamp_to(&bounds)) {
            Some(interval) => interval,
            None => {
                notice = Some(format!(
                    "The date range {} to {} is empty or outside the data, showing {} to {}.",
                    start, end, bounds.start, bounds.end
                ));
                bounds
            }
        }
    });

    Selection {
        entities,
        likelihoods,
        interval,
        notice,
    }
}

/// Forecast viewer page
#[instrument(skip(state))]
pub async fn viewer_page(
    Query(pairs): Query<Vec<(String, String)>>,
    State(state): State<AppState>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let params = ViewerParams::from_pairs(&pairs);
    debug!("Viewer params: {:?}", params);

    let table = state.source.table().await.map_err(error_page)?;
    render_page(&table, params).map(Html).map_err(error_page)
}

fn render_page(table: &ForecastTable, params: ViewerParams) -> compute::Result<String> {
    let defaults = ViewerDefaults::for_table(table)?;
    let selection = select(params, &defaults);

    let filtered = match selection.interval {
        Some(interval) => Some(table.filter(&ForecastFilter::new(
            selection.entities.clone(),
            interval,
            selection.likelihoods.clone(),
        ))?),
        None => None,
    };

    let mut panels = String::new();
    for rate in RateStream::ALL {
        let plot = match &filtered {
            Some(filtered) => render_series(filtered, rate)?,
            None => None,
        };
        let _ = write!(panels, "<section class=\"panel\"><h2>{}</h2>", rate.title());
        match plot {
            Some(plot) => panels.push_str(&plot.to_inline_html(Some(&format!("chart-{}", rate.slug())))),
            None => {
                let _ = write!(panels, "<p class=\"no-data\">{}</p>", NO_DATA);
            }
        }
        panels.push_str("</section>");
    }

    let sidebar = render_sidebar(table, &selection, defaults.interval)?;
    let notice = selection
        .notice
        .as_deref()
        .map(|n| format!("<p class=\"notice\">{}</p>", escape_html(n)))
        .unwrap_or_default();

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Forecast Viewer</title>
<script src="{plotly}"></script>
<style>
body {{ font-family: sans-serif; margin: 0; display: flex; }}
aside {{ width: 280px; padding: 1rem; background: #f4f4f5; min-height: 100vh; box-sizing: border-box; }}
aside label {{ display: block; margin-top: 1rem; font-weight: bold; }}
aside select, aside input {{ width: 100%; }}
main {{ flex: 1; padding: 1rem 2rem; }}
.no-data {{ color: #71717a; }}
.notice {{ color: #b45309; }}
</style>
</head>
<body>
{sidebar}
<main>
<h1>Forecast Viewer</h1>
{notice}
{panels}
</main>
</body>
</html>
"#,
        plotly = PLOTLY_JS,
        sidebar = sidebar,
        notice = notice,
        panels = panels,
    ))
}

fn render_sidebar(
    table: &ForecastTable,
    selection: &Selection,
    bounds: Option<DateInterval>,
) -> compute::Result<String> {
    let mut html = String::from("<aside><form method=\"get\" action=\"/\">");
    html.push_str("<input type=\"hidden\" name=\"submitted\" value=\"1\">");

    html.push_str("<label for=\"entity\">Select Entity (clear to see all):</label>");
    html.push_str("<select id=\"entity\" name=\"entity\" multiple size=\"10\">");
    for entity in table.entities()? {
        push_option(&mut html, &entity, selection.entities.contains(&entity));
    }
    html.push_str("</select>");

    if let Some(bounds) = bounds {
        let interval = selection.interval.unwrap_or(bounds);
        let steps = month_steps(&bounds);
        let last = steps.len().saturating_sub(1);
        let from = steps.iter().rposition(|m| *m <= interval.start).unwrap_or(0);
        let to = steps.iter().rposition(|m| *m <= interval.end).unwrap_or(last);
        let label = |i: usize| steps.get(i).map(|m| m.format("%Y-%m").to_string()).unwrap_or_default();
        let months = steps
            .iter()
            .map(|m| format!("\"{}\"", m.format("%Y-%m")))
            .collect::<Vec<_>>()
            .join(",");
        let _ = write!(
            html,
            "<label for=\"from\">Select Date Range:</label>\
             <script>const MONTHS = [{months}];</script>\
             <input type=\"range\" id=\"from\" name=\"from\" min=\"0\" max=\"{last}\" value=\"{from}\" \
             oninput=\"document.getElementById('from-label').value = MONTHS[this.value]\">\
             <output id=\"from-label\" for=\"from\">{from_label}</output>\
             <input type=\"range\" id=\"to\" name=\"to\" min=\"0\" max=\"{last}\" value=\"{to}\" \
             oninput=\"document.getElementById('to-label').value = MONTHS[this.value]\">\
             <output id=\"to-label\" for=\"to\">{to_label}</output>",
            months = months,
            last = last,
            from = from,
            to = to,
            from_label = label(from),
            to_label = label(to),
        );
    }

    html.push_str("<label for=\"likelihood\">Select Likelihood:</label>");
    html.push_str("<select id=\"likelihood\" name=\"likelihood\" multiple size=\"4\">");
    for likelihood in table.likelihoods()? {
        push_option(&mut html, &likelihood, selection.likelihoods.contains(&likelihood));
    }
    html.push_str("</select>");

    html.push_str("<p><button type=\"submit\">Apply</button></p></form></aside>");
    Ok(html)
}

fn push_option(html: &mut String, value: &str, selected: bool) {
    let value = escape_html(value);
    let _ = write!(
        html,
        "<option value=\"{value}\"{selected}>{value}</option>",
        value = value,
        selected = if selected { " selected" } else { "" },
    );
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn error_page(err: ComputeError) -> (StatusCode, Html<String>) {
    error!("Viewer failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!(
            "<!DOCTYPE html><html><head><title>Forecast Viewer</title></head><body>\
             <h1>Forecast Viewer</h1><p>The forecast table could not be loaded: {}</p></body></html>",
            escape_html(&err.to_string())
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn defaults() -> ViewerDefaults {
        ViewerDefaults {
            entities: vec!["A-1".to_string()],
            interval: DateInterval::new(date(2024, 4, 1), date(2024, 12, 1)),
            likelihoods: vec!["Mid".to_string()],
        }
    }

    #[test]
    fn test_params_from_repeated_keys() {
        let params = ViewerParams::from_pairs(&pairs(&[
            ("submitted", "1"),
            ("entity", "A-1"),
            ("entity", "B-2"),
            ("likelihood", "High"),
            ("start", "2024-05-01"),
            ("end", "not-a-date"),
        ]));
        assert!(params.submitted);
        assert_eq!(params.entities, vec!["A-1", "B-2"]);
        assert_eq!(params.likelihoods, vec!["High"]);
        assert_eq!(params.start, Some(date(2024, 5, 1)));
        assert_eq!(params.end, None);
    }

    #[test]
    fn test_first_visit_uses_defaults() {
        let selection = select(ViewerParams::default(), &defaults());
        assert_eq!(selection.entities, vec!["A-1"]);
        assert_eq!(selection.likelihoods, vec!["Mid"]);
        assert_eq!(selection.interval, defaults().interval);
        assert!(selection.notice.is_none());
    }

    #[test]
    fn test_submitted_empty_selection_means_all() {
        let params = ViewerParams {
            submitted: true,
            ..Default::default()
        };
        let selection = select(params, &defaults());
        assert!(selection.entities.is_empty());
        assert!(selection.likelihoods.is_empty());
    }

    #[test]
    fn test_inverted_range_falls_back_to_bounds() {
        let params = ViewerParams {
            submitted: true,
            start: Some(date(2024, 9, 1)),
            end: Some(date(2024, 5, 1)),
            ..Default::default()
        };
        let selection = select(params, &defaults());
        assert_eq!(selection.interval, defaults().interval);
        assert!(selection.notice.is_some());
    }

    #[test]
    fn test_range_is_clamped_to_bounds() {
        let params = ViewerParams {
            submitted: true,
            start: Some(date(2023, 1, 1)),
            end: Some(date(2024, 6, 1)),
            ..Default::default()
        };
        let selection = select(params, &defaults());
        assert_eq!(
            selection.interval,
            DateInterval::new(date(2024, 4, 1), date(2024, 6, 1))
        );
    }

    #[test]
    fn test_slider_positions_select_whole_months() {
        let params = ViewerParams::from_pairs(&pairs(&[
            ("submitted", "1"),
            ("from", "1"),
            ("to", "2"),
        ]));
        assert_eq!(params.from, Some(1));
        assert_eq!(params.to, Some(2));

        let selection = select(params, &defaults());
        assert_eq!(
            selection.interval,
            DateInterval::new(date(2024, 5, 1), date(2024, 6, 30))
        );
    }

    #[test]
    fn test_slider_position_past_the_data_uses_bounds() {
        let params = ViewerParams {
            submitted: true,
            to: Some(40),
            ..Default::default()
        };
        assert_eq!(select(params, &defaults()).interval, defaults().interval);
    }

    #[test]
    fn test_month_steps_cover_bounds() {
        let bounds = DateInterval::new(date(2024, 11, 15), date(2025, 2, 1)).unwrap();
        assert_eq!(
            month_steps(&bounds),
            vec![date(2024, 11, 1), date(2024, 12, 1), date(2025, 1, 1), date(2025, 2, 1)]
        );
        assert_eq!(last_of_month(date(2024, 2, 1)), date(2024, 2, 29));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<A&B \"x\">"), "&lt;A&amp;B &quot;x&quot;&gt;");
    }
}
