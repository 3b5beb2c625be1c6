//! FallbackSource - ordered chain of program sources

use contracts::{ContractError, Program, ProgramSource};
use tracing::{info, warn};

/// Tries each source in order
///
/// A source that reports `SourceUnavailable` is skipped in favour of the
/// next one. `fetch_program` also moves on when a source does not know the
/// key. The chain fails only when every source is unavailable.
pub struct FallbackSource<S> {
    name: String,
    sources: Vec<S>,
}

impl<S: ProgramSource> FallbackSource<S> {
    pub fn new(sources: Vec<S>) -> Self {
        let name = format!(
            "fallback[{}]",
            sources
                .iter()
                .map(|s| s.name().to_string())
                .collect::<Vec<_>>()
                .join(" > ")
        );
        Self { name, sources }
    }

    pub fn sources(&self) -> &[S] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn exhausted(&self, last_error: Option<ContractError>) -> ContractError {
        let detail = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no sources configured".to_string());
        ContractError::source_unavailable(&self.name, format!("all sources failed: {detail}"))
    }
}

impl<S: ProgramSource + Sync> ProgramSource for FallbackSource<S> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_programs(&self) -> Result<Vec<Program>, ContractError> {
        let mut last_error = None;
        for (idx, source) in self.sources.iter().enumerate() {
            match source.list_programs().await {
                Ok(programs) => {
                    if idx > 0 {
                        info!(source = source.name(), "Programs served by fallback source");
                    }
                    return Ok(programs);
                }
                Err(e) if e.is_source_unavailable() => {
                    warn!(source = source.name(), error = %e, "Source unavailable, falling back");
                    observability::record_source_fallback(source.name());
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(self.exhausted(last_error))
    }

    async fn fetch_program(&self, key: &str) -> Result<Option<Program>, ContractError> {
        let mut last_error = None;
        let mut answered = false;
        for source in &self.sources {
            match source.fetch_program(key).await {
                Ok(Some(program)) => return Ok(Some(program)),
                Ok(None) => answered = true,
                Err(e) if e.is_source_unavailable() => {
                    warn!(
                        source = source.name(),
                        key,
                        error = %e,
                        "Source unavailable, falling back"
                    );
                    observability::record_source_fallback(source.name());
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        if answered {
            Ok(None)
        } else {
            Err(self.exhausted(last_error))
        }
    }
}
