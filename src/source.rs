use compute::{ColumnNames, ComputeError, ForecastTable};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, instrument};

/// The resolved forecast table behind the viewer.
///
/// The flat file is read on first use and kept for the lifetime of the
/// process; a restart is the only way to pick up a new file. A failed load
/// is not cached, so the next request tries again.
#[derive(Debug)]
pub struct ForecastSource {
    path: PathBuf,
    columns: ColumnNames,
    table: OnceCell<Arc<ForecastTable>>,
}

impl ForecastSource {
    pub fn new(path: impl Into<PathBuf>, columns: ColumnNames) -> Self {
        Self {
            path: path.into(),
            columns,
            table: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.table.initialized()
    }

    /// Returns the cached table, loading it first if needed.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn table(&self) -> compute::Result<Arc<ForecastTable>> {
        let table = self
            .table
            .get_or_try_init(|| async {
                let path = self.path.clone();
                let columns = self.columns.clone();
                info!("Loading forecast table from {}", path.display());

                let table = tokio::task::spawn_blocking(move || ForecastTable::load(&path, columns))
                    .await
                    .map_err(|e| ComputeError::DataLoad(format!("Loader task failed: {}", e)))??;

                info!("Forecast table loaded with {} rows", table.height());
                Ok::<_, ComputeError>(Arc::new(table))
            })
            .await?;

        Ok(Arc::clone(table))
    }
}
