//! LogTransport - writes each outbound notice to the log

use contracts::{AnnouncementEvent, ContractError, Transport};
use tracing::{info, instrument};

/// Transport for headless sessions: every notice becomes a log line
pub struct LogTransport {
    name: String,
}

impl LogTransport {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_notice(&self, event: &AnnouncementEvent) {
        match event {
            AnnouncementEvent::ProgramSelected(p) => info!(
                transport = %self.name,
                program = %p.program_name,
                section = %p.section,
                key = p.program_key.as_deref().unwrap_or(""),
                "DISPLAY_PROGRAM"
            ),
            AnnouncementEvent::ResultSelected(r) => info!(
                transport = %self.name,
                program = %r.program_name,
                section = %r.section,
                index = ?r.result_index,
                position = %r.result.position,
                name = %r.result.name,
                team = %r.result.team,
                "DISPLAY_RESULT"
            ),
        }
    }
}

impl Transport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_transport_send", skip(self, event), fields(transport = %self.name))]
    async fn send(&mut self, event: &AnnouncementEvent) -> Result<(), ContractError> {
        self.log_notice(event);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        info!(transport = %self.name, "LogTransport closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DisplayResult, ResultEntry};

    #[tokio::test]
    async fn test_log_transport_send() {
        let mut transport = LogTransport::new("test_log");
        let event = AnnouncementEvent::ResultSelected(DisplayResult {
            program_key: Some("k".into()),
            program_name: "Quiz".into(),
            section: "Open".into(),
            result_index: Some(0),
            result: ResultEntry::default(),
        });
        assert!(transport.send(&event).await.is_ok());
        assert!(transport.close().await.is_ok());
    }
}
