//! RestSource - programs served by the REST collaborator
//!
//! - `GET {base_url}{programs_path}`: program summaries, either a bare array
//!   or `{"items": [...]}`
//! - `GET {base_url}{program_detail_path}` with `:key` replaced: one program
//!   with results, 404 when unknown

use std::time::Duration;

use contracts::{ContractError, Program, ProgramSource, RestSourceConfig};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::error::IngestionError;

#[derive(Deserialize)]
#[serde(untagged)]
enum ProgramList {
    Bare(Vec<Program>),
    Wrapped { items: Vec<Program> },
}

impl ProgramList {
    fn into_vec(self) -> Vec<Program> {
        match self {
            ProgramList::Bare(programs) | ProgramList::Wrapped { items: programs } => programs,
        }
    }
}

/// HTTP-backed source
pub struct RestSource {
    name: String,
    client: reqwest::Client,
    base_url: Url,
    programs_path: String,
    program_detail_path: String,
}

impl RestSource {
    /// # Errors
    /// `SourceUnavailable` when the base url is invalid or the client cannot be built.
    pub fn new(config: &RestSourceConfig) -> Result<Self, ContractError> {
        let name = format!("rest:{}", config.base_url);
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ContractError::source_unavailable(&name, format!("invalid base url: {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ContractError::source_unavailable(
                &name,
                "base url cannot carry a path",
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ContractError::source_unavailable(&name, e.to_string()))?;

        Ok(Self {
            name,
            client,
            base_url,
            programs_path: config.programs_path.clone(),
            program_detail_path: config.program_detail_path.clone(),
        })
    }

    /// Append a path template to the base url, substituting `:key`
    ///
    /// Every segment is percent-encoded, so keys may contain spaces, slashes
    /// and parentheses.
    fn endpoint(&self, template: &str, key: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            for part in template.split('/').filter(|p| !p.is_empty()) {
                match key {
                    Some(key) => segments.push(&part.replace(":key", key)),
                    None => segments.push(part),
                };
            }
        }
        url
    }

    fn http_error(&self, url: &Url, message: impl Into<String>) -> ContractError {
        IngestionError::Http {
            url: url.to_string(),
            message: message.into(),
        }
        .into_unavailable(&self.name)
    }

    async fn get(&self, url: &Url) -> Result<reqwest::Response, ContractError> {
        self.client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.http_error(url, e.to_string()))
    }
}

impl ProgramSource for RestSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "rest_source_list", skip(self), fields(source = %self.name))]
    async fn list_programs(&self) -> Result<Vec<Program>, ContractError> {
        let url = self.endpoint(&self.programs_path, None);
        let response = self.get(&url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.http_error(&url, format!("status {status}")));
        }

        let list: ProgramList = response
            .json()
            .await
            .map_err(|e| self.http_error(&url, e.to_string()))?;
        let programs: Vec<Program> = list.into_vec().iter().map(Program::summary).collect();
        debug!(source = %self.name, count = programs.len(), "Programs fetched");
        Ok(programs)
    }

    #[instrument(name = "rest_source_fetch", skip(self), fields(source = %self.name))]
    async fn fetch_program(&self, key: &str) -> Result<Option<Program>, ContractError> {
        let url = self.endpoint(&self.program_detail_path, Some(key));
        let response = self.get(&url).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(self.http_error(&url, format!("status {status}")));
        }

        let program: Program = response
            .json()
            .await
            .map_err(|e| self.http_error(&url, e.to_string()))?;
        Ok(Some(program))
    }
}
