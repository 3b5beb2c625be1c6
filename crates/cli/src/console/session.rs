//! Console session: executes operator commands against the coordinator.

use std::io::{self, Write};

use contracts::{Program, ProgramSource};
use coordinator::{AnnouncementCoordinator, CoordinatorError};
use tracing::warn;

use super::command::{ConsoleCommand, ProgramRef, HELP};

/// Whether the console keeps reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console<S> {
    coordinator: AnnouncementCoordinator<S>,
}

impl<S: ProgramSource> Console<S> {
    pub fn new(coordinator: AnnouncementCoordinator<S>) -> Self {
        Self { coordinator }
    }

    #[cfg(test)]
    pub fn coordinator(&self) -> &AnnouncementCoordinator<S> {
        &self.coordinator
    }

    /// Load the program list; a failing source leaves an empty list
    pub async fn load(&mut self, out: &mut impl Write) -> io::Result<()> {
        match self.coordinator.load_programs().await {
            Ok(programs) => writeln!(out, "{} programs loaded, type 'list'", programs.len()),
            Err(e) => {
                warn!(component = "cli", error = %e, "Program list unavailable");
                writeln!(out, "No programs available ({e})")
            }
        }
    }

    /// Parse and run one input line
    pub async fn handle_line(&mut self, line: &str, out: &mut impl Write) -> io::Result<Flow> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        match line.parse::<ConsoleCommand>() {
            Ok(command) => self.execute(command, out).await,
            Err(e) => {
                writeln!(out, "{e}")?;
                Ok(Flow::Continue)
            }
        }
    }

    pub async fn execute(
        &mut self,
        command: ConsoleCommand,
        out: &mut impl Write,
    ) -> io::Result<Flow> {
        match command {
            ConsoleCommand::List => self.list(out)?,
            ConsoleCommand::Select(target) => self.select(target, out).await?,
            ConsoleCommand::Announce(index) => self.announce(index, out)?,
            ConsoleCommand::Status => self.status(out)?,
            ConsoleCommand::Reload => self.load(out).await?,
            ConsoleCommand::Help => writeln!(out, "{HELP}")?,
            ConsoleCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Print the session summary and stop the transports
    pub async fn finish(mut self, out: &mut impl Write) -> io::Result<()> {
        let summary = self.coordinator.session_summary();
        write!(out, "{summary}")?;
        self.coordinator.shutdown().await;
        Ok(())
    }

    fn list(&self, out: &mut impl Write) -> io::Result<()> {
        let programs = self.coordinator.programs();
        if programs.is_empty() {
            return writeln!(out, "No programs");
        }
        let selected = self.coordinator.selected();
        for (i, program) in programs.iter().enumerate() {
            let marker = if selected == Some(&program.key) { "*" } else { " " };
            let state = if program.read { "read" } else { "" };
            writeln!(
                out,
                "{marker}#{:<3} {:<40} {:<24} {state}",
                i + 1,
                program.key.as_str(),
                program_label(program)
            )?;
        }
        Ok(())
    }

    async fn select(&mut self, target: ProgramRef, out: &mut impl Write) -> io::Result<()> {
        let key = match target {
            ProgramRef::Key(key) => key,
            ProgramRef::Position(n) => match self.coordinator.programs().get(n - 1) {
                Some(program) => program.key.to_string(),
                None => return writeln!(out, "No program at #{n}"),
            },
        };

        match self.coordinator.select(&key).await {
            Ok(outcome) => {
                writeln!(
                    out,
                    "Selected {} ({} results, {} transports notified)",
                    outcome.program_name, outcome.results, outcome.queued
                )?;
                let program = self.coordinator.status().selection;
                if let Some(selection) = program {
                    writeln!(
                        out,
                        "Announce with 'announce <0..{}>'",
                        selection.total.saturating_sub(1)
                    )?;
                }
                Ok(())
            }
            Err(e) => report(out, &e),
        }
    }

    fn announce(&mut self, index: usize, out: &mut impl Write) -> io::Result<()> {
        match self.coordinator.announce(index) {
            Ok(outcome) => {
                let again = if outcome.repeated { " (again)" } else { "" };
                writeln!(
                    out,
                    "Announced {}/{}{again}",
                    outcome.announced, outcome.total
                )?;
                if let Some(done) = outcome.completed {
                    writeln!(
                        out,
                        "All results announced, {} marked read after {:.1}s",
                        done.key,
                        done.elapsed.as_secs_f64()
                    )?;
                }
                Ok(())
            }
            Err(e) => report(out, &e),
        }
    }

    fn status(&self, out: &mut impl Write) -> io::Result<()> {
        let status = self.coordinator.status();
        writeln!(out, "Programs: {} ({} unread)", status.programs, status.unread)?;
        match status.selection {
            Some(selection) => writeln!(
                out,
                "Selected: {} [{}] announced {:?} of {}",
                selection.program_name, selection.section, selection.announced, selection.total
            )?,
            None => writeln!(out, "Selected: none")?,
        }
        for (name, snapshot) in self.coordinator.transports().metrics() {
            writeln!(
                out,
                "Transport {name}: sent {} failed {} dropped {} queued {}",
                snapshot.sent_count,
                snapshot.failure_count,
                snapshot.dropped_count,
                snapshot.queue_len
            )?;
        }
        Ok(())
    }
}

fn program_label(program: &Program) -> String {
    format!("{} [{}]", program.name, program.section)
}

fn report(out: &mut impl Write, error: &CoordinatorError) -> io::Result<()> {
    if error.is_rejection() {
        writeln!(out, "Rejected: {error}")
    } else {
        writeln!(out, "Error: {error}")
    }
}
