//! SampleSource - built-in demo programs

use contracts::{ContractError, Program, ProgramSource, ResultEntry};

fn entry(position: &str, grade: &str, name: &str, team: &str, chest_no: &str) -> ResultEntry {
    let seed = name
        .split_whitespace()
        .next()
        .unwrap_or(name)
        .to_lowercase();
    ResultEntry {
        position: position.to_string(),
        grade: grade.to_string(),
        name: name.to_string(),
        team: team.to_string(),
        chest_no: Some(chest_no.to_string()),
        photo_url: Some(format!("https://picsum.photos/seed/{seed}/400")),
    }
}

/// The three demo programs; the last one is already read
pub fn sample_programs() -> Vec<Program> {
    let orion = vec![
        entry("1", "A", "Alex Johnson", "Team Orion", "C-101"),
        entry("2", "B", "Bella Smith", "Team Orion", "C-102"),
        entry("3", "B", "Chris Lee", "Team Orion", "C-103"),
    ];
    let atlas = vec![
        entry("1", "A", "Divya Patel", "Team Atlas", "C-201"),
        entry("2", "A", "Ethan Clark", "Team Atlas", "C-202"),
        entry("3", "C", "Farah Khan", "Team Atlas", "C-203"),
    ];

    let mut dance = Program::new("prog-100".into(), "Dance Solo", "Senior");
    dance.results = orion.clone();

    let mut vocal = Program::new("prog-200".into(), "Classical Vocal", "Junior");
    vocal.results = atlas;

    let mut violin = Program::new("prog-300".into(), "Instrumental Violin", "Open");
    violin.results = orion;
    violin.mark_read();

    vec![dance, vocal, violin]
}

/// Source serving [`sample_programs`]; never fails
#[derive(Debug, Clone)]
pub struct SampleSource {
    programs: Vec<Program>,
}

impl SampleSource {
    pub fn new() -> Self {
        Self {
            programs: sample_programs(),
        }
    }

    /// Serve an arbitrary fixed program list
    pub fn with_programs(programs: Vec<Program>) -> Self {
        Self { programs }
    }
}

impl Default for SampleSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramSource for SampleSource {
    fn name(&self) -> &str {
        "sample"
    }

    async fn list_programs(&self) -> Result<Vec<Program>, ContractError> {
        Ok(self.programs.iter().map(Program::summary).collect())
    }

    async fn fetch_program(&self, key: &str) -> Result<Option<Program>, ContractError> {
        Ok(self.programs.iter().find(|p| p.key == key).cloned())
    }
}
