//! AnnounceEndpointTransport - HTTP post-announce on the REST collaborator

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use contracts::{AnnounceRequest, AnnouncementEvent, ContractError, Transport};

use crate::error::TransportError;

const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// POSTs every notice to `{base_url}/announce`
pub struct AnnounceEndpointTransport {
    name: String,
    endpoint: Url,
    client: Client,
}

impl AnnounceEndpointTransport {
    /// Build from `base_url` and optional `timeout_ms` parameters
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, TransportError> {
        let name = name.into();
        let base = params
            .get("base_url")
            .ok_or_else(|| TransportError::invalid_params(&name, "missing 'base_url' parameter"))?;

        let mut endpoint = Url::parse(base).map_err(|e| {
            TransportError::invalid_params(&name, format!("invalid base_url '{base}': {e}"))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(TransportError::invalid_params(
                &name,
                format!("unsupported scheme '{}'", endpoint.scheme()),
            ));
        }
        endpoint
            .path_segments_mut()
            .map_err(|_| TransportError::invalid_params(&name, "base_url cannot be a base"))?
            .pop_if_empty()
            .push("announce");

        let timeout_ms = match params.get("timeout_ms") {
            Some(v) => v.parse().map_err(|_| {
                TransportError::invalid_params(&name, format!("invalid timeout_ms '{v}'"))
            })?,
            None => DEFAULT_TIMEOUT_MS,
        };

        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| TransportError::connect(&name, e.to_string()))?;

        Ok(Self {
            name,
            endpoint,
            client,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Transport for AnnounceEndpointTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "announce_endpoint_send",
        skip(self, event),
        fields(transport = %self.name, kind = event.kind().as_str())
    )]
    async fn send(&mut self, event: &AnnouncementEvent) -> Result<(), ContractError> {
        let body = AnnounceRequest::from(event);
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ContractError::transport_unavailable(&self.name, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::transport_unavailable(
                &self.name,
                format!("announce returned {status}"),
            ));
        }
        debug!(transport = %self.name, status = %status, "Announce accepted");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::DisplayProgram;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn params(base: &str) -> HashMap<String, String> {
        HashMap::from([("base_url".to_string(), base.to_string())])
    }

    fn selected() -> AnnouncementEvent {
        AnnouncementEvent::ProgramSelected(DisplayProgram {
            program_key: Some("prog-1".into()),
            program_name: "Quiz".into(),
            section: "Open".into(),
        })
    }

    #[test]
    fn test_endpoint_joins_announce() {
        let t = AnnounceEndpointTransport::from_params("api", &params("http://localhost:8000"))
            .unwrap();
        assert_eq!(t.endpoint().as_str(), "http://localhost:8000/announce");

        let t = AnnounceEndpointTransport::from_params("api", &params("http://host/api/"))
            .unwrap();
        assert_eq!(t.endpoint().path(), "/api/announce");
    }

    #[test]
    fn test_rejects_socket_scheme() {
        assert!(AnnounceEndpointTransport::from_params("api", &params("ws://host")).is_err());
        assert!(AnnounceEndpointTransport::from_params("api", &HashMap::new()).is_err());
    }

    /// One-shot HTTP responder returning `status`
    async fn respond_once(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let response =
                format!("{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            stream.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_send_accepted() {
        let base = respond_once("HTTP/1.1 200 OK").await;
        let mut t = AnnounceEndpointTransport::from_params("api", &params(&base)).unwrap();
        assert!(t.send(&selected()).await.is_ok());
    }

    #[tokio::test]
    async fn test_send_non_success_is_unavailable() {
        let base = respond_once("HTTP/1.1 503 Service Unavailable").await;
        let mut t = AnnounceEndpointTransport::from_params("api", &params(&base)).unwrap();
        let err = t.send(&selected()).await.unwrap_err();
        assert!(matches!(err, ContractError::TransportUnavailable { .. }));
    }
}
