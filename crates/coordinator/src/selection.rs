//! Current selection and program ordering

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use contracts::Program;

/// The selected program and which of its results have been announced
#[derive(Debug, Clone)]
pub(crate) struct Selection {
    pub program: Program,
    announced: BTreeSet<usize>,
    started: Instant,
}

impl Selection {
    pub fn new(program: Program) -> Self {
        Self {
            program,
            announced: BTreeSet::new(),
            started: Instant::now(),
        }
    }

    /// Record an announced index; false if it was already announced
    pub fn mark(&mut self, index: usize) -> bool {
        self.announced.insert(index)
    }

    pub fn announced(&self) -> &BTreeSet<usize> {
        &self.announced
    }

    pub fn total(&self) -> usize {
        self.program.results.len()
    }

    /// Every result announced at least once
    pub fn is_complete(&self) -> bool {
        self.announced.len() == self.total()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Unread first, then name ascending (case-insensitive)
pub(crate) fn sort_programs(programs: &mut [Program]) {
    programs.sort_by_cached_key(|p| (p.read, p.name.to_lowercase()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ProgramKey, ResultEntry};

    fn program(key: &str, name: &str, read: bool) -> Program {
        let mut p = Program::new(ProgramKey::new(key), name, "Open");
        p.read = read;
        p
    }

    #[test]
    fn test_sort_unread_first_then_name() {
        let mut programs = vec![
            program("1", "zumba", false),
            program("2", "Anthem", true),
            program("3", "Ballad", false),
            program("4", "aria", false),
        ];
        sort_programs(&mut programs);
        let names: Vec<_> = programs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["aria", "Ballad", "zumba", "Anthem"]);
    }

    #[test]
    fn test_selection_completion() {
        let mut p = program("1", "Quiz", false);
        p.results = vec![ResultEntry::default(), ResultEntry::default()];
        let mut selection = Selection::new(p);

        assert!(selection.mark(1));
        assert!(!selection.mark(1));
        assert!(!selection.is_complete());
        assert!(selection.mark(0));
        assert!(selection.is_complete());
    }
}
