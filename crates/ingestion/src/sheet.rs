//! SheetIngestor - rebuilds programs and results from a two-row header grid
//!
//! Layout handled:
//!
//! ```text
//! row 0   | title / free text                                   |
//! row 1   | Program              | Candidates          | Result |
//! row 2   | Code | Program Name | Section | Chest No. | Name | Team | Position | Grade |
//! row 3.. | data rows; code/name/section merged down over a program's results      |
//! ```

use std::collections::HashMap;

use contracts::{Program, ProgramKey, ResultEntry, SheetSourceConfig};
use tracing::{debug, warn};

use crate::field_resolver::{FieldCandidates, FieldResolver};
use crate::grid::{cell, CellValue};

/// Token that marks the group header row
const HEADER_TOKEN: &str = "program";

/// Chest number cell meaning "no chest number"
const CHEST_PLACEHOLDER: &str = "-";

const CODE: FieldCandidates = FieldCandidates {
    groups: &["Program"],
    fields: &["Code", "Code No", "Prog Code"],
};

const PROGRAM_NAME: FieldCandidates = FieldCandidates {
    groups: &["Program"],
    fields: &["Program", "Program Name", "Event", "Item"],
};

const SECTION: FieldCandidates = FieldCandidates {
    groups: &["Program"],
    fields: &["Section", "Category", "Group"],
};

const CHEST_NO: FieldCandidates = FieldCandidates {
    groups: &["Candidate", "Candidates"],
    fields: &["Chest No.", "Chest No", "Chest", "Bib"],
};

const GRADE: FieldCandidates = FieldCandidates {
    groups: &["Result"],
    fields: &["Grade", "Class"],
};

const POSITION: FieldCandidates = FieldCandidates {
    groups: &["Result"],
    fields: &["Position", "Place", "Rank"],
};

const PARTICIPANT: FieldCandidates = FieldCandidates {
    groups: &["Candidate", "Candidates"],
    fields: &["Name"],
};

const TEAM: FieldCandidates = FieldCandidates {
    groups: &["Candidate", "Candidates"],
    fields: &["Team", "House", "School", "Club"],
};

/// Ingestor options
#[derive(Debug, Clone)]
pub struct SheetOptions {
    /// 0-based index of the group header row
    pub header_row: usize,
    /// Rows scanned for the header when `header_row` does not hold it
    pub header_scan_limit: usize,
    /// Grade value meaning "not graded"
    pub grade_placeholder: String,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            header_row: 1,
            header_scan_limit: 10,
            grade_placeholder: "-".to_string(),
        }
    }
}

impl From<&SheetSourceConfig> for SheetOptions {
    fn from(config: &SheetSourceConfig) -> Self {
        Self {
            header_row: config.header_row,
            header_scan_limit: config.header_scan_limit,
            grade_placeholder: config.grade_placeholder.clone(),
        }
    }
}

/// Ingestion statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Rows after the header pair
    pub data_rows: usize,
    /// Rows without program code and name (separators, notes)
    pub skipped_rows: usize,
    /// Rows dropped because a mapped cell holds an error
    pub malformed_rows: usize,
    /// Programs produced
    pub programs: usize,
    /// Results produced
    pub results: usize,
}

/// Ingestion output
#[derive(Debug, Clone, Default)]
pub struct SheetIngest {
    /// Programs in first-seen order
    pub programs: Vec<Program>,
    pub stats: IngestStats,
    /// Group header row used, `None` when the grid was too short
    pub header_row: Option<usize>,
}

/// Column index of every logical field
#[derive(Debug, Clone, Copy, Default)]
struct ColumnMap {
    code: Option<usize>,
    name: Option<usize>,
    section: Option<usize>,
    chest_no: Option<usize>,
    grade: Option<usize>,
    position: Option<usize>,
    participant: Option<usize>,
    team: Option<usize>,
}

impl ColumnMap {
    fn resolve(resolver: &FieldResolver) -> Self {
        Self {
            code: resolver.locate(&CODE),
            name: resolver.locate(&PROGRAM_NAME),
            section: resolver.locate(&SECTION),
            chest_no: resolver.locate(&CHEST_NO),
            grade: resolver.locate(&GRADE),
            position: resolver.locate(&POSITION),
            participant: resolver.locate(&PARTICIPANT),
            team: resolver.locate(&TEAM),
        }
    }

    fn all(&self) -> [Option<usize>; 8] {
        [
            self.code,
            self.name,
            self.section,
            self.chest_no,
            self.grade,
            self.position,
            self.participant,
            self.team,
        ]
    }
}

/// Last non-blank program cells seen
#[derive(Debug, Default)]
struct FillDown {
    code: String,
    name: String,
    section: String,
}

/// Take `value`, or the previous non-blank value when blank
fn fill(value: String, last: &str) -> String {
    if value.is_empty() {
        last.to_string()
    } else {
        value
    }
}

/// Spreadsheet ingestor
#[derive(Debug, Clone, Default)]
pub struct SheetIngestor {
    options: SheetOptions,
}

impl SheetIngestor {
    pub fn new(options: SheetOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SheetOptions {
        &self.options
    }

    /// Rebuild programs from a raw grid
    ///
    /// Never fails: a grid with fewer than 3 rows or without a header yields
    /// no programs, and malformed rows are counted and skipped.
    pub fn ingest(&self, grid: &[Vec<CellValue>]) -> SheetIngest {
        let Some(header_row) = self.locate_header(grid) else {
            debug!(rows = grid.len(), "grid too short for a two-row header");
            return SheetIngest::default();
        };

        let group_row: Vec<String> = grid[header_row].iter().map(CellValue::as_text).collect();
        let field_row: Vec<String> = grid[header_row + 1]
            .iter()
            .map(CellValue::as_text)
            .collect();
        let resolver = FieldResolver::from_header_rows(&group_row, &field_row);
        let columns = ColumnMap::resolve(&resolver);

        if columns.code.is_none() && columns.name.is_none() {
            warn!(
                header_row,
                "no program code or name column found, sheet yields no programs"
            );
        }

        let mut programs: Vec<Program> = Vec::new();
        let mut index: HashMap<ProgramKey, usize> = HashMap::new();
        let mut stats = IngestStats::default();
        let mut last = FillDown::default();

        for (row_idx, row) in grid.iter().enumerate().skip(header_row + 2) {
            stats.data_rows += 1;

            if let Some(col) = columns
                .all()
                .into_iter()
                .flatten()
                .find(|&col| row.get(col).is_some_and(CellValue::is_error))
            {
                stats.malformed_rows += 1;
                warn!(
                    row = row_idx,
                    column = col,
                    "error cell in mapped column, row skipped"
                );
                continue;
            }

            let text = |col: Option<usize>| {
                col.map(|c| cell(grid, row_idx, c).as_text())
                    .unwrap_or_default()
            };

            let code = fill(text(columns.code), &last.code);
            let name = fill(text(columns.name), &last.name);
            let section = fill(text(columns.section), &last.section);

            if code.is_empty() && name.is_empty() {
                stats.skipped_rows += 1;
                continue;
            }

            last = FillDown {
                code: code.clone(),
                name: name.clone(),
                section: section.clone(),
            };

            let key = ProgramKey::from_parts(&code, &name, &section);
            let slot = *index.entry(key.clone()).or_insert_with(|| {
                programs.push(Program::new(key, name, section));
                programs.len() - 1
            });

            let grade = text(columns.grade);
            let chest_no = text(columns.chest_no);
            let result = ResultEntry {
                position: text(columns.position),
                grade: if grade == self.options.grade_placeholder {
                    String::new()
                } else {
                    grade
                },
                name: text(columns.participant),
                team: text(columns.team),
                chest_no: if chest_no.is_empty() || chest_no == CHEST_PLACEHOLDER {
                    None
                } else {
                    Some(chest_no)
                },
                photo_url: None,
            };

            if !result.name.is_empty() || result.chest_no.is_some() {
                programs[slot].results.push(result);
                stats.results += 1;
            }
        }

        for program in &mut programs {
            if program.name.is_empty() {
                program.name = program.key.to_string();
            }
        }
        stats.programs = programs.len();

        debug!(
            header_row,
            programs = stats.programs,
            results = stats.results,
            skipped = stats.skipped_rows,
            malformed = stats.malformed_rows,
            "sheet ingested"
        );

        SheetIngest {
            programs,
            stats,
            header_row: Some(header_row),
        }
    }

    /// Index of the group header row
    ///
    /// Uses `header_row` when it contains the program token, otherwise the
    /// first row within `header_scan_limit` that does, otherwise `header_row`.
    fn locate_header(&self, grid: &[Vec<CellValue>]) -> Option<usize> {
        if grid.len() < 3 {
            return None;
        }

        let has_token = |row: usize| {
            grid.get(row).is_some_and(|cells| {
                cells
                    .iter()
                    .any(|c| c.as_text().to_lowercase().contains(HEADER_TOKEN))
            })
        };

        let configured = self.options.header_row;
        let header_row = if has_token(configured) {
            configured
        } else {
            let limit = self.options.header_scan_limit.min(grid.len() - 1);
            (0..limit).find(|&row| has_token(row)).unwrap_or(configured)
        };

        (header_row + 1 < grid.len()).then_some(header_row)
    }
}
