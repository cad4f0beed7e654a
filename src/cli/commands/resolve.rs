use anyhow::Result;
use compute::{export::write_csv, load_workbook, resolve_with_summary};
use tracing::{debug, error, info, trace, warn};

use crate::config::Settings;

/// Runs the date resolver end to end: workbook in, flat CSV out.
pub fn resolve_workbook(workbook: &str, output: &str, settings: &Settings) -> Result<()> {
    trace!("Entering resolve_workbook function");
    info!("Resolving forecast dates");
    debug!("Workbook: {}", workbook);
    debug!("Output: {}", output);
    debug!("Layout: {:?}", settings.workbook);

    let tables = match load_workbook(workbook, &settings.workbook) {
        Ok(tables) => tables,
        Err(e) => {
            error!("Failed to load workbook '{}': {}", workbook, e);
            return Err(e.into());
        }
    };

    let (resolved, summary) =
        match resolve_with_summary(&tables.start_dates, &tables.forecast, &settings.columns) {
            Ok(result) => result,
            Err(e) => {
                error!("Failed to resolve forecast dates: {}", e);
                return Err(e.into());
            }
        };

    if !summary.unresolved_entities.is_empty() {
        warn!(
            "{} rows left without a date for entities: {}",
            summary.unresolved,
            summary
                .unresolved_entities
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    if let Err(e) = write_csv(&resolved, output) {
        error!("Failed to write '{}': {}", output, e);
        return Err(e.into());
    }

    info!(
        "Resolved {} of {} rows, written to {}",
        summary.resolved, summary.rows, output
    );
    trace!("resolve_workbook function completed");
    Ok(())
}
