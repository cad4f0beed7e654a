use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod commands;

use crate::config::Settings;
use commands::{resolve_workbook, serve};

#[derive(Parser)]
#[command(name = "wellcast")]
#[command(about = "Well production forecast date resolver and viewer")]
#[command(version)]
pub struct Cli {
    /// Configuration file (without extension it is looked up as toml, yaml or json)
    ///
    /// Defaults to an optional `wellcast.toml` in the working directory.
    #[arg(short, long, global = true, env = "WELLCAST_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve calendar dates for every forecast row of a workbook
    ///
    /// Reads the start-date and forecast sheets, adds the resolved date
    /// column and writes the result as a flat CSV file for the viewer.
    Resolve {
        /// Path to the forecast workbook (xlsx, xlsm, xlsb, xls or ods)
        #[arg(short, long)]
        workbook: String,

        /// Output CSV path
        ///
        /// Defaults to `output_path` from the configuration
        /// (forecast_withdate.csv).
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Start the forecast viewer web server
    Serve {
        /// Resolved forecast CSV to display
        ///
        /// Defaults to `output_path` from the configuration.
        #[arg(short, long)]
        data: Option<String>,

        /// Bind address for the web server
        ///
        /// Format: IP:PORT (e.g., 0.0.0.0:3000, 127.0.0.1:8080)
        #[arg(short, long, env = "BIND_ADDRESS")]
        bind_address: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let settings = Settings::load(self.config.as_deref())?;

        match self.command {
            Commands::Resolve { workbook, output } => {
                let output = output.unwrap_or_else(|| settings.output_path.clone());
                resolve_workbook(&workbook, &output, &settings)?;
            }
            Commands::Serve { data, bind_address } => {
                let data = data.unwrap_or_else(|| settings.output_path.clone());
                let bind_address = bind_address.unwrap_or_else(|| settings.bind_address.clone());
                serve(&data, &bind_address, &settings).await?;
            }
        }
        Ok(())
    }
}
