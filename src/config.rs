use anyhow::{Context, Result};
use compute::{ColumnNames, WorkbookLayout};
use serde::Deserialize;
use std::sync::Arc;

use crate::schemas::AppState;
use crate::source::ForecastSource;

/// Configuration file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "wellcast";

/// Application settings.
///
/// Layered as: defaults, then the configuration file, then `WELLCAST__*`
/// environment variables (`__` separates nested keys, for example
/// `WELLCAST__COLUMNS__ENTITY=Well`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub workbook: WorkbookLayout,
    pub columns: ColumnNames,
    /// CSV written by `resolve` and read by `serve`
    pub output_path: String,
    pub bind_address: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workbook: WorkbookLayout::default(),
            columns: ColumnNames::default(),
            output_path: "forecast_withdate.csv".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings; `config_path` must exist when given.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = match config_path {
            Some(path) => config::File::with_name(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("WELLCAST").separator("__"))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize::<Settings>()
            .context("Invalid configuration")?;

        tracing::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }
}

/// Initialize application state for the viewer
pub fn initialize_app_state(data_path: &str, settings: &Settings) -> AppState {
    tracing::info!("Forecast table source: {}", data_path);
    AppState {
        source: Arc::new(ForecastSource::new(data_path, settings.columns.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_workbook_template() {
        let settings = Settings::default();
        assert_eq!(settings.workbook.start_dates_sheet, "start_dates");
        assert_eq!(settings.workbook.forecast_sheet, "forecast");
        assert_eq!(settings.workbook.header_offset, 1);
        assert_eq!(settings.columns.entity, "Entity");
        assert_eq!(settings.output_path, "forecast_withdate.csv");
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("wellcast-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("custom.toml");
        std::fs::write(
            &path,
            "output_path = \"out/resolved.csv\"\n\n[columns]\nentity = \"Well\"\n\n[workbook]\nheader_offset = 0\n",
        )
        .unwrap();

        let settings = Settings::load(path.to_str()).unwrap();
        assert_eq!(settings.output_path, "out/resolved.csv");
        assert_eq!(settings.columns.entity, "Well");
        assert_eq!(settings.columns.month, "Month");
        assert_eq!(settings.workbook.header_offset, 0);
        assert_eq!(settings.workbook.forecast_sheet, "forecast");
    }

    #[test]
    fn test_missing_explicit_config_file_fails() {
        assert!(Settings::load(Some("/nonexistent/wellcast-settings.toml")).is_err());
    }
}
