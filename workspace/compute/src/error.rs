use thiserror::Error;
use tracing::error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// A source table could not be read (missing file, missing sheet, bad format)
    #[error("Data load error: {0}")]
    DataLoad(String),

    /// An expected column is absent from a table
    #[error("Column '{column}' not found in {table} table")]
    KeyNotFound { column: String, table: String },

    /// A forecast row carries a month index that is not a positive integer
    #[error("Invalid month index '{value}' for entity '{entity}' at row {row}")]
    InvalidMonthIndex {
        row: usize,
        entity: String,
        value: String,
    },

    /// Error from date operations
    #[error("Date error: {0}")]
    Date(String),

    /// Error from Polars DataFrame operations
    #[error("DataFrame error: {0}")]
    DataFrame(String),

    /// Error from Polars Series operations
    #[error("Series error: {0}")]
    Series(String),

    /// Error from filesystem operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComputeError {
    /// Stable machine-readable code, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ComputeError::DataLoad(_) => "DATA_LOAD_ERROR",
            ComputeError::KeyNotFound { .. } => "KEY_NOT_FOUND",
            ComputeError::InvalidMonthIndex { .. } => "INVALID_MONTH_INDEX",
            ComputeError::Date(_) => "DATE_ERROR",
            ComputeError::DataFrame(_) | ComputeError::Series(_) => "DATAFRAME_ERROR",
            ComputeError::Io(_) => "IO_ERROR",
        }
    }
}

impl From<polars::error::PolarsError> for ComputeError {
    fn from(error: polars::error::PolarsError) -> Self {
        match error {
            polars::error::PolarsError::ColumnNotFound(ref name) => {
                let err = ComputeError::KeyNotFound {
                    column: name.to_string(),
                    table: "source".to_string(),
                };
                error!(?err, "DataFrame error: Column not found");
                err
            }
            polars::error::PolarsError::NoData(_) => {
                let err = ComputeError::DataFrame(format!("No data: {}", error));
                error!(?err, "DataFrame error: No data");
                err
            }
            polars::error::PolarsError::ShapeMismatch(_) => {
                let err = ComputeError::DataFrame(format!("Shape mismatch: {}", error));
                error!(?err, "DataFrame error: Shape mismatch");
                err
            }
            polars::error::PolarsError::SchemaMismatch(_) => {
                let err = ComputeError::DataFrame(format!("Schema mismatch: {}", error));
                error!(?err, "DataFrame error: Schema mismatch");
                err
            }
            polars::error::PolarsError::ComputeError(_) => {
                let err = ComputeError::DataFrame(format!("Compute error: {}", error));
                error!(?err, "DataFrame error: Compute error");
                err
            }
            polars::error::PolarsError::IO { .. } => {
                let err = ComputeError::DataLoad(format!("{}", error));
                error!(?err, "DataFrame error: IO");
                err
            }
            _ => {
                let err = ComputeError::Series(format!("Series error: {}", error));
                error!(?err, "Series error");
                err
            }
        }
    }
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
