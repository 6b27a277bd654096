//! Workbook I/O.
//!
//! The template is edited in place: only cells the fill wrote are touched on save, so styles,
//! column widths, data validations and formulas of the template survive.

use std::fs;
use std::path::{Path, PathBuf};
use umya_spreadsheet::{reader, writer, Spreadsheet};

use crate::core::error::{FillError, FillResult};
use crate::core::sheet::{CellValue, MergedRange, Sheet};

/// A loaded workbook plus the value model of each worksheet, in file order.
#[derive(Debug)]
pub struct Document {
    book: Spreadsheet,
    pub sheets: Vec<Sheet>,
}

impl Document {
    /// The sheet the fill writes into.
    pub fn first_sheet_mut(&mut self) -> Option<&mut Sheet> {
        self.sheets.first_mut()
    }

    fn apply_edits(&mut self) {
        let worksheets = self.book.get_sheet_collection_mut();
        for (worksheet, sheet) in worksheets.iter_mut().zip(&self.sheets) {
            for ((row, col), value) in sheet.edits() {
                let cell = worksheet.get_cell_mut(cell_ref(row, col).as_str());
                match value {
                    CellValue::Empty => {
                        cell.set_value_string("");
                    }
                    CellValue::Text(s) => {
                        cell.set_value_string(s);
                    }
                    CellValue::Number(n) => {
                        cell.set_value_number(n);
                    }
                    CellValue::Bool(b) => {
                        cell.set_value_bool(b);
                    }
                }
            }
        }
    }
}

fn workbook_error(path: &Path, reason: impl ToString) -> FillError {
    FillError::Workbook {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// `A`, `B`, ..., `Z`, `AA` for a zero based column.
fn column_letters(col: u16) -> String {
    let mut n = col as u32 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn cell_ref(row: u32, col: u16) -> String {
    format!("{}{}", column_letters(col), row + 1)
}

/// Zero based `(row, col)` of an `A1` style reference; `$` markers are ignored.
fn parse_cell_ref(reference: &str) -> Option<(u32, u16)> {
    let reference = reference.replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 || col == 0 || col > u16::MAX as u32 {
        return None;
    }
    Some((row - 1, (col - 1) as u16))
}

fn parse_range(range: &str) -> Option<MergedRange> {
    let (start, end) = range.split_once(':').unwrap_or((range, range));
    let (r0, c0) = parse_cell_ref(start)?;
    let (r1, c1) = parse_cell_ref(end)?;
    Some(MergedRange::new(r0, c0, r1, c1))
}

fn cell_value(raw: String) -> CellValue {
    if raw.is_empty() {
        CellValue::Empty
    } else if let Ok(n) = raw.parse::<f64>() {
        CellValue::Number(n)
    } else {
        CellValue::Text(raw)
    }
}

/// Reads the workbook and builds the value model of every worksheet.
pub fn load_document(path: &Path) -> FillResult<Document> {
    if !path.exists() {
        return Err(FillError::InputNotFound(path.to_path_buf()));
    }
    let book = reader::xlsx::read(path).map_err(|e| workbook_error(path, e))?;

    let mut sheets = Vec::new();
    for worksheet in book.get_sheet_collection() {
        let mut sheet = Sheet::new(worksheet.get_name());
        let (max_col, max_row) = worksheet.get_highest_column_and_row();
        for row in 0..max_row {
            for col in 0..max_col.min(u16::MAX as u32) as u16 {
                let raw = worksheet.get_value(cell_ref(row, col).as_str());
                sheet.set(row, col, cell_value(raw));
            }
        }
        for range in worksheet.get_merge_cells() {
            match parse_range(&range.get_range()) {
                Some(merged) => sheet.merge(merged),
                None => log::warn!("Ignoring unreadable merged range {} on {}", range.get_range(), sheet.name),
            }
        }
        log::debug!(
            "Loaded sheet {} ({} rows, {} merged ranges)",
            sheet.name,
            sheet.height(),
            sheet.merged().len()
        );
        sheets.push(sheet);
    }
    if sheets.is_empty() {
        return Err(workbook_error(path, "workbook has no worksheets"));
    }
    Ok(Document { book, sheets })
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

/// Writes the edited workbook next to `path` first and renames it into place, so a failed
/// save never leaves a file under the final name.
pub fn save_document(document: &mut Document, path: &Path) -> FillResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    document.apply_edits();
    let partial = partial_path(path);
    if let Err(e) = writer::xlsx::write(&document.book, &partial) {
        let _ = fs::remove_file(&partial);
        return Err(FillError::Save(e.to_string()));
    }
    if let Err(e) = fs::rename(&partial, path) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    log::info!("Saved {}", path.display());
    Ok(())
}
