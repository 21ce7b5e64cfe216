//! Tabular file decoding (CSV and spreadsheet workbooks)
//!
//! Both readers yield `(row_number, ImportRow)` pairs where `row_number` is
//! the 1-based line/sheet row an operator would see, header included.
//! Entirely blank rows are dropped here so they never reach the totals.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use tracing::debug;

use crate::error::ImportError;
use crate::models::{ImportRow, RowField};

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Workbook,
}

impl FileFormat {
    /// Pick a format from the upload's file name extension
    pub fn from_file_name(file_name: &str) -> Result<Self, ImportError> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" | "txt" => Ok(FileFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(FileFormat::Workbook),
            _ => Err(ImportError::UnsupportedFormat(file_name.to_string())),
        }
    }
}

/// Decode every non-blank data row
pub fn read_rows(bytes: &[u8], format: FileFormat) -> Result<Vec<(usize, ImportRow)>, ImportError> {
    let rows = match format {
        FileFormat::Csv => read_csv(bytes)?,
        FileFormat::Workbook => read_workbook(bytes)?,
    };
    debug!(rows = rows.len(), ?format, "Decoded input file");
    Ok(rows)
}

/// `;` when it outnumbers `,` on the header line
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = header.iter().filter(|b| **b == b';').count();
    let commas = header.iter().filter(|b| **b == b',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn read_csv(bytes: &[u8]) -> Result<Vec<(usize, ImportRow)>, ImportError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(sniff_delimiter(bytes))
        .flexible(true)
        .has_headers(true)
        .from_reader(bytes);

    let columns: Vec<Option<RowField>> = reader
        .byte_headers()
        .map_err(|e| ImportError::UnreadableFile(format!("Failed to read CSV header: {}", e)))?
        .iter()
        .map(|cell| RowField::from_header(&String::from_utf8_lossy(cell)))
        .collect();

    if columns.is_empty() {
        return Ok(Vec::new());
    }
    if columns.iter().all(Option::is_none) {
        return Err(ImportError::UnreadableFile(
            "CSV header has no recognized columns".to_string(),
        ));
    }

    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    for (index, record) in reader.byte_records().enumerate() {
        let record = record.map_err(|e| {
            ImportError::UnreadableFile(format!("Failed to parse CSV row {}: {}", index + 2, e))
        })?;
        // Line the record starts on; empty lines and quoted line breaks count
        let row_number = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 2);

        let mut row = ImportRow::default();
        for (field, value) in columns.iter().zip(record.iter()) {
            let Some(field) = field else { continue };
            let value = String::from_utf8_lossy(value);
            // Repeated columns: first non-blank value wins
            if !value.trim().is_empty() && row.get(*field).is_empty() {
                row.set(*field, &value);
            }
        }

        if row.is_blank() {
            skipped.push(row_number);
        } else {
            rows.push((row_number, row));
        }
    }

    log_skipped(&skipped);
    Ok(rows)
}

fn read_workbook(bytes: &[u8]) -> Result<Vec<(usize, ImportRow)>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::CorruptWorkbook(e.to_string()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| ImportError::CorruptWorkbook(e.to_string()))?,
        None => return Ok(Vec::new()),
    };

    let Some((last_row, _)) = range.end() else {
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    // Absolute row 0 is the header
    for sheet_row in 1..=last_row {
        let values: Vec<String> = (0..RowField::ALL.len() as u32)
            .map(|col| {
                range
                    .get_value((sheet_row, col))
                    .map(cell_text)
                    .unwrap_or_default()
            })
            .collect();

        let row = ImportRow::from_positional(&values);
        let row_number = sheet_row as usize + 1;
        if row.is_blank() {
            skipped.push(row_number);
        } else {
            rows.push((row_number, row));
        }
    }

    log_skipped(&skipped);
    Ok(rows)
}

fn log_skipped(row_numbers: &[usize]) {
    if !row_numbers.is_empty() {
        debug!(rows = ?row_numbers, "Skipped blank rows");
    }
}

/// Render a cell as the text a user typed
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
