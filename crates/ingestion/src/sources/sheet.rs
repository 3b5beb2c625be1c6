//! SheetSource - programs read from a spreadsheet file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use contracts::{ContractError, Program, ProgramSource, SheetSourceConfig};
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::grid::read_grid;
use crate::sheet::{IngestStats, SheetIngestor, SheetOptions};

/// Spreadsheet-backed source
///
/// The file is parsed on first use and cached until [`SheetSource::reload`].
pub struct SheetSource {
    name: String,
    path: PathBuf,
    ingestor: SheetIngestor,
    cache: RwLock<Option<Arc<Vec<Program>>>>,
}

impl SheetSource {
    pub fn new(path: impl Into<PathBuf>, options: SheetOptions) -> Self {
        let path = path.into();
        Self {
            name: format!("sheet:{}", path.display()),
            path,
            ingestor: SheetIngestor::new(options),
            cache: RwLock::new(None),
        }
    }

    pub fn from_config(config: &SheetSourceConfig) -> Self {
        Self::new(&config.path, SheetOptions::from(config))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file and replace the cache
    ///
    /// On failure the previous cache is kept.
    pub async fn reload(&self) -> Result<IngestStats, ContractError> {
        let (programs, stats) = self.load().await?;
        *self.cache.write().await = Some(programs);
        Ok(stats)
    }

    async fn programs(&self) -> Result<Arc<Vec<Program>>, ContractError> {
        if let Some(programs) = self.cache.read().await.as_ref() {
            return Ok(Arc::clone(programs));
        }

        let mut cache = self.cache.write().await;
        if let Some(programs) = cache.as_ref() {
            return Ok(Arc::clone(programs));
        }
        let (programs, _) = self.load().await?;
        *cache = Some(Arc::clone(&programs));
        Ok(programs)
    }

    #[instrument(name = "sheet_source_load", skip(self), fields(source = %self.name))]
    async fn load(&self) -> Result<(Arc<Vec<Program>>, IngestStats), ContractError> {
        let path = self.path.clone();
        let ingestor = self.ingestor.clone();

        let ingest = tokio::task::spawn_blocking(move || {
            read_grid(&path).map(|grid| ingestor.ingest(&grid))
        })
        .await
        .map_err(|e| ContractError::source_unavailable(&self.name, e.to_string()))?
        .map_err(|e| e.into_unavailable(&self.name))?;

        let stats = ingest.stats;
        observability::record_rows_ingested(
            &self.name,
            stats.data_rows,
            stats.skipped_rows,
            stats.malformed_rows,
        );
        observability::record_programs_loaded(&self.name, stats.programs);
        info!(
            source = %self.name,
            programs = stats.programs,
            results = stats.results,
            skipped = stats.skipped_rows,
            malformed = stats.malformed_rows,
            "Sheet loaded"
        );

        Ok((Arc::new(ingest.programs), stats))
    }
}

impl ProgramSource for SheetSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_programs(&self) -> Result<Vec<Program>, ContractError> {
        let programs = self.programs().await?;
        Ok(programs.iter().map(Program::summary).collect())
    }

    async fn fetch_program(&self, key: &str) -> Result<Option<Program>, ContractError> {
        let programs = self.programs().await?;
        Ok(programs.iter().find(|p| p.key == key).cloned())
    }
}
