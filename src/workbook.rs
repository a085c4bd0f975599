//! Workbook access.
//!
//! The engine only needs two things from a workbook: its sheet names in
//! document order, and the rows of a sheet as cell text, read forward once.
//! [`CalamineWorkbook`] provides them for files on disk; [`MemoryWorkbook`]
//! for rows that are already in memory.

use crate::error::{ExtractError, Result};
use crate::normalizer::day_fraction_to_clock;
use calamine::{Data, Reader, Sheets, open_workbook_auto};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Forward-only stream of a sheet's rows
pub type RowStream<'a> = Box<dyn Iterator<Item = Result<Vec<String>>> + 'a>;

/// Source of sheets and rows of cell text
pub trait WorkbookReader {
    /// Sheet names in document order
    fn sheet_names(&self) -> Vec<String>;

    /// Rows of a sheet, top to bottom
    fn rows(&mut self, sheet: &str) -> Result<RowStream<'_>>;
}

/// Workbook file read through calamine (`.xlsx`, `.xlsm`, `.xls`, `.ods`)
///
/// The file handle is released when the value is dropped.
pub struct CalamineWorkbook {
    sheets: Sheets<BufReader<File>>,
}

impl CalamineWorkbook {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ExtractError::input(format!(
                "Workbook not found: {}",
                path.display()
            )));
        }

        let sheets = open_workbook_auto(path).map_err(|e| {
            ExtractError::input_with(format!("Error reading workbook {}", path.display()), e)
        })?;

        debug!("Opened workbook {}", path.display());
        Ok(Self { sheets })
    }
}

impl WorkbookReader for CalamineWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names().to_vec()
    }

    fn rows(&mut self, sheet: &str) -> Result<RowStream<'_>> {
        let range = self.sheets.worksheet_range(sheet).map_err(|e| {
            ExtractError::input_with(format!("Sheet not found: {}", sheet), e)
        })?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        Ok(Box::new(rows.into_iter().map(Ok)))
    }
}

/// Text of a cell as the extraction engine sees it
///
/// Native date cells become ISO dates and pure time cells become `HH:MM`, so
/// they take the same normalization path as text cells.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            if serial < 1.0 {
                day_fraction_to_clock(serial)
            } else {
                match dt.as_datetime() {
                    Some(datetime) => datetime.date().format("%Y-%m-%d").to_string(),
                    None => serial.to_string(),
                }
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

/// Workbook held in memory as sheets of cell text
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<(String, Vec<Vec<String>>)>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet
    pub fn with_sheet<R, C, S>(mut self, name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        self.sheets.push((name.into(), rows));
        self
    }
}

impl WorkbookReader for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn rows(&mut self, sheet: &str) -> Result<RowStream<'_>> {
        let (_, rows) = self
            .sheets
            .iter()
            .find(|(name, _)| name == sheet)
            .ok_or_else(|| ExtractError::input(format!("Sheet not found: {}", sheet)))?;

        Ok(Box::new(rows.iter().cloned().map(Ok)))
    }
}
