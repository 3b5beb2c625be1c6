//! Raw tabular grids and their readers
//!
//! - `.json`: array of rows, each an array of string / number / bool / null
//!   cells (`{"error": "#N/A"}` marks an error cell)
//! - `.xlsx` / `.xlsm` / `.xls` / `.ods`: first worksheet, via calamine
//!   (feature `xlsx`)

use std::path::Path;

use contracts::format_number;
use serde::Deserialize;

use crate::error::{IngestionError, Result};

/// One raw spreadsheet cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Formula error such as `#N/A`
    Error(String),
}

impl CellValue {
    /// Trimmed display text; error cells read as blank
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty | CellValue::Error(_) => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => b.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Null(()),
            Bool(bool),
            Number(f64),
            Text(String),
            Error { error: String },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Null(()) => CellValue::Empty,
            Raw::Bool(b) => CellValue::Bool(b),
            Raw::Number(n) => CellValue::Number(n),
            Raw::Text(s) if s.is_empty() => CellValue::Empty,
            Raw::Text(s) => CellValue::Text(s),
            Raw::Error { error } => CellValue::Error(error),
        })
    }
}

/// Rows of raw cells; rows may have different lengths
pub type Grid = Vec<Vec<CellValue>>;

/// Cell at `(row, col)`, `Empty` when out of bounds
pub fn cell(grid: &[Vec<CellValue>], row: usize, col: usize) -> &CellValue {
    static EMPTY: CellValue = CellValue::Empty;
    grid.get(row).and_then(|r| r.get(col)).unwrap_or(&EMPTY)
}

/// Supported grid file kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridFormat {
    Json,
    Workbook,
}

impl GridFormat {
    /// Infer the format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// Read a grid file (blocking)
pub fn read_grid(path: &Path) -> Result<Grid> {
    match GridFormat::from_path(path) {
        Some(GridFormat::Json) => {
            let content =
                std::fs::read_to_string(path).map_err(|e| IngestionError::ReadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
            parse_json_grid(&content, path)
        }
        Some(GridFormat::Workbook) => read_workbook(path),
        None => Err(IngestionError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Parse a JSON grid document
pub fn parse_json_grid(content: &str, path: &Path) -> Result<Grid> {
    serde_json::from_str(content).map_err(|e| IngestionError::ParseFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(feature = "xlsx")]
fn read_workbook(path: &Path) -> Result<Grid> {
    use calamine::{open_workbook_auto, Data, Reader};

    let mut workbook = open_workbook_auto(path).map_err(|e| IngestionError::ReadFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestionError::ParseFailed {
            path: path.to_path_buf(),
            message: "workbook has no worksheet".to_string(),
        })?
        .map_err(|e| IngestionError::ParseFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    // calamine trims leading empty rows/columns; restore absolute positions
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut grid: Grid = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; col_offset];
        cells.extend(row.iter().map(|data| match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) if s.is_empty() => CellValue::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                CellValue::Text(s.clone())
            }
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::Error(e) => CellValue::Error(format!("{e:?}")),
        }));
        grid.push(cells);
    }
    Ok(grid)
}

#[cfg(not(feature = "xlsx"))]
fn read_workbook(path: &Path) -> Result<Grid> {
    Err(IngestionError::UnsupportedFormat {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_grid() {
        let content = r##"[
            ["Results", null],
            ["Program", ""],
            [101, true, {"error": "#N/A"}, "  Alex  "]
        ]"##;
        let grid = parse_json_grid(content, Path::new("grid.json")).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0][1], CellValue::Empty);
        assert_eq!(grid[1][1], CellValue::Empty);
        assert_eq!(grid[2][0].as_text(), "101");
        assert_eq!(grid[2][1].as_text(), "true");
        assert!(grid[2][2].is_error());
        assert_eq!(grid[2][2].as_text(), "");
        assert_eq!(grid[2][3].as_text(), "Alex");
    }

    #[test]
    fn test_parse_json_grid_rejects_objects() {
        let err = parse_json_grid(r#"{"rows": []}"#, Path::new("grid.json")).unwrap_err();
        assert!(matches!(err, IngestionError::ParseFailed { .. }));
    }

    #[test]
    fn test_cell_out_of_bounds() {
        let grid: Grid = vec![vec!["a".into()]];
        assert_eq!(cell(&grid, 0, 0).as_text(), "a");
        assert!(cell(&grid, 0, 5).is_blank());
        assert!(cell(&grid, 9, 0).is_blank());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            GridFormat::from_path(Path::new("r.XLSX")),
            Some(GridFormat::Workbook)
        );
        assert_eq!(
            GridFormat::from_path(Path::new("r.json")),
            Some(GridFormat::Json)
        );
        assert_eq!(GridFormat::from_path(Path::new("r.csv")), None);
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_grid(Path::new("/nonexistent/results.json")).unwrap_err();
        assert!(matches!(err, IngestionError::ReadFailed { .. }));
    }

    #[test]
    fn test_read_unsupported() {
        let err = read_grid(Path::new("results.csv")).unwrap_err();
        assert!(matches!(err, IngestionError::UnsupportedFormat { .. }));
    }
}
