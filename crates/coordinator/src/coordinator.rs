//! AnnouncementCoordinator - operator-facing selection/announcement state
//!
//! Holds the program list and the current selection. Every accepted action
//! publishes on the local bus synchronously, then hands the same event to the
//! transport registry without waiting for delivery.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument, warn};

use contracts::{AnnouncementEvent, Program, ProgramKey, ProgramSource};
use event_bus::{AnnouncementBus, PublishReport};
use observability::{MetricsSummary, SessionMetricsAggregator};
use transports::TransportRegistry;

use crate::error::CoordinatorError;
use crate::selection::{sort_programs, Selection};

/// Result of an accepted `select`
#[derive(Debug, Clone)]
pub struct SelectOutcome {
    pub key: ProgramKey,
    pub program_name: String,
    pub results: usize,
    pub publish: PublishReport,
    /// Transports that queued the notice
    pub queued: usize,
}

/// Result of an accepted `announce`
#[derive(Debug, Clone)]
pub struct AnnounceOutcome {
    pub index: usize,
    /// Index had been announced before in this selection
    pub repeated: bool,
    pub announced: usize,
    pub total: usize,
    pub publish: PublishReport,
    pub queued: usize,
    /// Set when this announcement completed the program
    pub completed: Option<Completion>,
}

/// A program that has just been announced in full
#[derive(Debug, Clone)]
pub struct Completion {
    pub key: ProgramKey,
    pub elapsed: Duration,
}

/// Snapshot of coordinator state
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoordinatorStatus {
    pub programs: usize,
    pub unread: usize,
    pub selection: Option<SelectionStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionStatus {
    pub key: ProgramKey,
    pub program_name: String,
    pub section: String,
    pub announced: Vec<usize>,
    pub total: usize,
}

/// Drives selection and announcement for one operator
pub struct AnnouncementCoordinator<S> {
    source: S,
    bus: Arc<AnnouncementBus>,
    transports: TransportRegistry,
    programs: Vec<Program>,
    selection: Option<Selection>,
    session: SessionMetricsAggregator,
}

impl<S: ProgramSource> AnnouncementCoordinator<S> {
    pub fn new(source: S, bus: Arc<AnnouncementBus>, transports: TransportRegistry) -> Self {
        Self {
            source,
            bus,
            transports,
            programs: Vec::new(),
            selection: None,
            session: SessionMetricsAggregator::new(),
        }
    }

    pub fn bus(&self) -> &Arc<AnnouncementBus> {
        &self.bus
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn transports(&self) -> &TransportRegistry {
        &self.transports
    }

    /// Programs in display order
    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    /// Key of the currently selected program
    pub fn selected(&self) -> Option<&ProgramKey> {
        self.selection.as_ref().map(|s| &s.program.key)
    }

    /// Fetch the program list and sort it
    ///
    /// Programs marked read during this session stay read even if the source
    /// still reports them unread.
    #[instrument(
        name = "coordinator_load_programs",
        skip(self),
        fields(source = %self.source.name())
    )]
    pub async fn load_programs(&mut self) -> Result<&[Program], CoordinatorError> {
        let mut programs = self.source.list_programs().await?;
        for program in &mut programs {
            let read_locally = self
                .programs
                .iter()
                .any(|p| p.read && p.key == program.key);
            if read_locally {
                program.mark_read();
            }
        }
        sort_programs(&mut programs);
        self.programs = programs;

        info!(
            programs = self.programs.len(),
            unread = self.programs.iter().filter(|p| !p.read).count(),
            "Program list loaded"
        );
        Ok(&self.programs)
    }

    /// Select a program: fetch it with results, reset the announced set and
    /// display it everywhere
    #[instrument(name = "coordinator_select", skip(self))]
    pub async fn select(&mut self, key: &str) -> Result<SelectOutcome, CoordinatorError> {
        let listed_read = self
            .programs
            .iter()
            .find(|p| p.key == key && p.read)
            .map(|p| p.key.clone());
        if let Some(read_key) = listed_read {
            return Err(self.reject(CoordinatorError::AlreadyRead(read_key)));
        }

        let Some(program) = self.source.fetch_program(key).await? else {
            return Err(self.reject(CoordinatorError::ProgramNotFound(key.to_string())));
        };
        if program.read {
            return Err(self.reject(CoordinatorError::AlreadyRead(program.key)));
        }

        let event = AnnouncementEvent::ProgramSelected(program.display());
        let outcome_key = program.key.clone();
        let program_name = program.name.clone();
        let results = program.results.len();
        self.selection = Some(Selection::new(program));

        let (publish, queued) = self.broadcast(&event);
        self.session.record_selection();

        info!(
            key = %outcome_key,
            program = %program_name,
            results,
            delivered = publish.delivered,
            queued,
            "Program selected"
        );

        Ok(SelectOutcome {
            key: outcome_key,
            program_name,
            results,
            publish,
            queued,
        })
    }

    /// Announce one result of the selected program
    ///
    /// Once every result has been announced the program is marked read, the
    /// list is re-sorted and the selection cleared.
    #[instrument(name = "coordinator_announce", skip(self))]
    pub fn announce(&mut self, index: usize) -> Result<AnnounceOutcome, CoordinatorError> {
        let event = {
            let Some(selection) = self.selection.as_ref() else {
                return Err(self.reject(CoordinatorError::NoSelection));
            };
            match selection.program.display_result(index) {
                Some(result) => AnnouncementEvent::ResultSelected(result),
                None => {
                    let count = selection.total();
                    return Err(self.reject(CoordinatorError::ResultOutOfRange { index, count }));
                }
            }
        };

        let (publish, queued) = self.broadcast(&event);
        self.session.record_announcement();

        let Some(selection) = self.selection.as_mut() else {
            return Err(CoordinatorError::NoSelection);
        };
        let repeated = !selection.mark(index);
        let announced = selection.announced().len();
        let total = selection.total();

        let completed = if selection.is_complete() {
            self.complete_selection()
        } else {
            None
        };

        info!(
            index,
            repeated,
            announced,
            total,
            completed = completed.is_some(),
            "Result announced"
        );

        Ok(AnnounceOutcome {
            index,
            repeated,
            announced,
            total,
            publish,
            queued,
            completed,
        })
    }

    pub fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            programs: self.programs.len(),
            unread: self.programs.iter().filter(|p| !p.read).count(),
            selection: self.selection.as_ref().map(|s| SelectionStatus {
                key: s.program.key.clone(),
                program_name: s.program.name.clone(),
                section: s.program.section.clone(),
                announced: s.announced().iter().copied().collect(),
                total: s.total(),
            }),
        }
    }

    /// Session counters, including the transport totals so far
    pub fn session_summary(&mut self) -> MetricsSummary {
        for (name, snapshot) in self.transports.metrics() {
            self.session.set_transport_counts(
                &name,
                snapshot.sent_count,
                snapshot.failure_count,
                snapshot.dropped_count,
            );
        }
        self.session.summary()
    }

    /// Stop the transports; queued notices are still delivered
    pub async fn shutdown(self) {
        self.transports.shutdown().await;
    }

    fn broadcast(&self, event: &AnnouncementEvent) -> (PublishReport, usize) {
        let publish = self.bus.publish(event);
        let queued = self.transports.notify(event);
        (publish, queued)
    }

    fn complete_selection(&mut self) -> Option<Completion> {
        let selection = self.selection.take()?;
        let key = selection.program.key.clone();
        let elapsed = selection.elapsed();

        match self.programs.iter_mut().find(|p| p.key == key) {
            Some(listed) => listed.mark_read(),
            None => {
                let mut summary = selection.program.summary();
                summary.mark_read();
                self.programs.push(summary);
            }
        }
        sort_programs(&mut self.programs);
        self.session.record_completion(elapsed);

        info!(key = %key, elapsed_ms = elapsed.as_millis() as u64, "Program completed");
        Some(Completion { key, elapsed })
    }

    fn reject(&mut self, error: CoordinatorError) -> CoordinatorError {
        self.session.record_rejection();
        warn!(component = "coordinator", error = %error, "Action rejected");
        error
    }
}
