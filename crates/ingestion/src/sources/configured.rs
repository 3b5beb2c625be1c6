//! ConfiguredSource - a source built from `SourceConfig`

use contracts::{ContractError, Program, ProgramSource, SourceConfig};
use tracing::{info, warn};

use super::{FallbackSource, RestSource, SampleSource, SheetSource};
use crate::error::IngestionError;

/// Any source kind the configuration can name
pub enum ConfiguredSource {
    Sheet(SheetSource),
    Rest(RestSource),
    Sample(SampleSource),
}

impl ConfiguredSource {
    /// # Errors
    /// `SourceUnavailable` when a REST source has an unusable base url.
    pub fn from_config(config: &SourceConfig) -> Result<Self, ContractError> {
        Ok(match config {
            SourceConfig::Sheet(sheet) => ConfiguredSource::Sheet(SheetSource::from_config(sheet)),
            SourceConfig::Rest(rest) => ConfiguredSource::Rest(RestSource::new(rest)?),
            SourceConfig::Sample => ConfiguredSource::Sample(SampleSource::new()),
        })
    }

    /// Re-read cached sources; no-op for the others
    pub async fn reload(&self) -> Result<(), ContractError> {
        if let ConfiguredSource::Sheet(sheet) = self {
            sheet.reload().await?;
        }
        Ok(())
    }
}

impl ProgramSource for ConfiguredSource {
    fn name(&self) -> &str {
        match self {
            ConfiguredSource::Sheet(s) => s.name(),
            ConfiguredSource::Rest(s) => s.name(),
            ConfiguredSource::Sample(s) => s.name(),
        }
    }

    async fn list_programs(&self) -> Result<Vec<Program>, ContractError> {
        match self {
            ConfiguredSource::Sheet(s) => s.list_programs().await,
            ConfiguredSource::Rest(s) => s.list_programs().await,
            ConfiguredSource::Sample(s) => s.list_programs().await,
        }
    }

    async fn fetch_program(&self, key: &str) -> Result<Option<Program>, ContractError> {
        match self {
            ConfiguredSource::Sheet(s) => s.fetch_program(key).await,
            ConfiguredSource::Rest(s) => s.fetch_program(key).await,
            ConfiguredSource::Sample(s) => s.fetch_program(key).await,
        }
    }
}

/// Build the fallback chain in declaration order
///
/// Sources that cannot be constructed are logged and left out.
///
/// # Errors
/// `NoSources` when nothing usable remains.
pub fn build_chain(
    configs: &[SourceConfig],
) -> Result<FallbackSource<ConfiguredSource>, IngestionError> {
    let mut sources = Vec::with_capacity(configs.len());
    for (idx, config) in configs.iter().enumerate() {
        match ConfiguredSource::from_config(config) {
            Ok(source) => {
                info!(index = idx, source = source.name(), "Program source registered");
                sources.push(source);
            }
            Err(e) => {
                warn!(index = idx, kind = config.kind_name(), error = %e, "Program source skipped");
            }
        }
    }

    if sources.is_empty() {
        return Err(IngestionError::NoSources);
    }
    Ok(FallbackSource::new(sources))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{RestSourceConfig, SheetSourceConfig};

    #[tokio::test]
    async fn test_chain_falls_back_to_sample() {
        let chain = build_chain(&[
            SourceConfig::Sheet(SheetSourceConfig::new("/nonexistent/results.json")),
            SourceConfig::Sample,
        ])
        .unwrap();
        assert_eq!(chain.sources().len(), 2);

        let programs = chain.list_programs().await.unwrap();
        assert_eq!(programs.len(), 3);
        assert_eq!(programs[0].key, "prog-100");
    }

    #[test]
    fn test_invalid_rest_is_skipped() {
        let chain = build_chain(&[
            SourceConfig::Rest(RestSourceConfig::new("::bad::")),
            SourceConfig::Sample,
        ])
        .unwrap();
        assert_eq!(chain.sources().len(), 1);
        assert_eq!(chain.sources()[0].name(), "sample");
    }

    #[test]
    fn test_no_usable_sources() {
        let Err(err) = build_chain(&[]) else {
            panic!("empty source list must be rejected");
        };
        assert!(matches!(err, IngestionError::NoSources));
    }
}
