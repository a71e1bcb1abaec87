//! Spreadsheet statements. The first worksheet is flattened into
//! `;`-joined text rows and handed to the CSV row parser, so the shared
//! pipeline stays line-based for every source format.

use std::path::Path;

use calamine::{Data, Reader};

use crate::error::{KopilkaError, Result};

use super::cursor::LineCursor;
use super::generic_csv::CsvStatement;
use super::{LineOutcome, StatementFormat, ValidationOutcome};

/// Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug).
pub fn excel_serial_to_date(serial: f64) -> String {
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    let date = base + chrono::Duration::days(serial as i64);
    date.format("%d.%m.%Y").to_string()
}

// Serial day numbers for roughly 1954..2119; a date column holding a
// float in this range is a date, anything else is treated as a number.
fn looks_like_serial(value: f64) -> bool {
    (20_000.0..80_000.0).contains(&value)
}

fn cell_text(col: usize, cell: &Data) -> String {
    match cell {
        Data::String(s) => s.replace(';', ","),
        Data::Float(f) => {
            if col == 0 && looks_like_serial(*f) {
                excel_serial_to_date(*f)
            } else if f.fract() == 0.0 {
                format!("{f:.0}")
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => {
            if col == 0 && looks_like_serial(*i as f64) {
                excel_serial_to_date(*i as f64)
            } else {
                i.to_string()
            }
        }
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Flatten the first worksheet into text rows for the pipeline.
pub fn workbook_lines(path: &Path) -> Result<Vec<String>> {
    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| KopilkaError::Excel(e.to_string()))?;
    let names = workbook.sheet_names().to_owned();
    let first = names
        .first()
        .ok_or_else(|| KopilkaError::Excel("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(first)
        .map_err(|e| KopilkaError::Excel(e.to_string()))?;

    let mut lines = Vec::new();
    for row in range.rows() {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(col, cell)| cell_text(col, cell))
            .collect();
        lines.push(cells.join(";"));
    }
    Ok(lines)
}

/// Generic Excel strategy: the flattened rows are parsed by the CSV
/// handler with a fixed `;` delimiter.
pub struct ExcelStatement {
    inner: CsvStatement,
}

impl ExcelStatement {
    pub fn new() -> Self {
        Self {
            inner: CsvStatement::with_delimiter(b';'),
        }
    }
}

impl Default for ExcelStatement {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementFormat for ExcelStatement {
    fn source_name(&self) -> &'static str {
        "Excel Import"
    }

    fn source_color(&self) -> &'static str {
        "#1D6F42"
    }

    fn validate(&self, cursor: &mut LineCursor) -> ValidationOutcome {
        self.inner.validate(cursor)
    }

    fn skip_headers(&mut self, cursor: &mut LineCursor) {
        self.inner.skip_headers(cursor)
    }

    fn should_skip_line(&self, line: &str) -> bool {
        self.inner.should_skip_line(line)
    }

    fn parse_line(&mut self, line: &str) -> LineOutcome {
        self.inner.parse_line(line)
    }
}
