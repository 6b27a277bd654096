//! In-memory worksheet model the fill loop writes into.
//!
//! Rows and columns are zero based. The model keeps values, merged ranges and the set of cells
//! the fill wrote; loading and saving live in [`crate::core::xlsx`].

use std::collections::{BTreeMap, BTreeSet};

use crate::core::error::{FillError, FillResult};
use crate::core::text::collapse_whitespace;

pub const TITLE_HEADERS: &[&str] = &["наименование", "название", "наименование товара", "название товара", "title"];
pub const DESCRIPTION_HEADERS: &[&str] = &["описание", "описание товара", "description", "desc"];

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Inclusive cell range that displays as one cell anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRange {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl MergedRange {
    pub fn new(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Self {
        Self {
            first_row: first_row.min(last_row),
            first_col: first_col.min(last_col),
            last_row: first_row.max(last_row),
            last_col: first_col.max(last_col),
        }
    }

    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row) && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn anchor(&self) -> (u32, u16) {
        (self.first_row, self.first_col)
    }

    pub fn is_single_cell(&self) -> bool {
        self.first_row == self.last_row && self.first_col == self.last_col
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<(u32, u16), CellValue>,
    merged: Vec<MergedRange>,
    edited: BTreeSet<(u32, u16)>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn get(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    pub fn text(&self, row: u32, col: u16) -> Option<&str> {
        self.get(row, col).and_then(CellValue::as_text)
    }

    /// Raw write with no merge or protection handling.
    pub fn set(&mut self, row: u32, col: u16, value: CellValue) {
        if value == CellValue::Empty {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    /// Like [`Sheet::set`], but the cell is also remembered as edited.
    pub fn write(&mut self, row: u32, col: u16, value: CellValue) {
        self.set(row, col, value);
        self.edited.insert((row, col));
    }

    /// Cells changed through [`Sheet::write`] with their current values.
    pub fn edits(&self) -> impl Iterator<Item = ((u32, u16), CellValue)> + '_ {
        self.edited
            .iter()
            .map(|key| (*key, self.cells.get(key).cloned().unwrap_or(CellValue::Empty)))
    }

    pub fn merge(&mut self, range: MergedRange) {
        self.merged.push(range);
    }

    pub fn merged(&self) -> &[MergedRange] {
        &self.merged
    }

    pub fn cells(&self) -> impl Iterator<Item = (&(u32, u16), &CellValue)> {
        self.cells.iter()
    }

    /// Number of rows up to the last one holding a value.
    pub fn height(&self) -> u32 {
        self.cells.keys().map(|(r, _)| r + 1).max().unwrap_or(0)
    }

    pub fn width(&self) -> u16 {
        self.cells.keys().map(|(_, c)| c + 1).max().unwrap_or(0)
    }

    pub fn merged_range_at(&self, row: u32, col: u16) -> Option<&MergedRange> {
        self.merged.iter().find(|m| m.contains(row, col))
    }
}

/// Where the fill writes generated text.
pub trait CellSink {
    /// Writes `value` and reports whether anything was written. Protected rows and
    /// non-anchor cells of merged ranges are skipped without error.
    fn write_cell(&mut self, row: u32, col: u16, value: &str) -> bool;
}

/// A [`Sheet`] with the top `protected_rows` rows locked against writes.
pub struct SheetSink<'s> {
    sheet: &'s mut Sheet,
    protected_rows: u32,
}

impl<'s> SheetSink<'s> {
    pub fn new(sheet: &'s mut Sheet, protected_rows: u32) -> Self {
        Self { sheet, protected_rows }
    }
}

impl CellSink for SheetSink<'_> {
    fn write_cell(&mut self, row: u32, col: u16, value: &str) -> bool {
        if row < self.protected_rows {
            log::debug!("Skipping write to protected row {}", row);
            return false;
        }
        if let Some(range) = self.sheet.merged_range_at(row, col) {
            if range.anchor() != (row, col) {
                log::debug!("Skipping write inside merged range at ({}, {})", row, col);
                return false;
            }
        }
        self.sheet.write(row, col, CellValue::Text(value.to_string()));
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderColumns {
    pub title_col: u16,
    pub description_col: u16,
    /// Row holding the description header
    pub header_row: u32,
}

fn normalize_header(raw: &str) -> String {
    collapse_whitespace(&raw.to_lowercase().replace('ё', "е"))
}

fn header_matches(header: &str, wanted: &[&str]) -> bool {
    wanted.iter().any(|w| {
        header == *w
            || header
                .strip_prefix(w)
                .is_some_and(|rest| rest.starts_with([' ', '(', '[']))
    })
}

/// Finds the title and description columns in the top `scan_rows` rows (at least one).
pub fn find_header_columns(sheet: &Sheet, scan_rows: u32) -> FillResult<HeaderColumns> {
    let mut title_col: Option<u16> = None;
    let mut description: Option<(u16, u32)> = None;

    for row in 0..scan_rows.max(1) {
        for col in 0..sheet.width() {
            let Some(raw) = sheet.text(row, col) else {
                continue;
            };
            let header = normalize_header(raw);
            if title_col.is_none() && header_matches(&header, TITLE_HEADERS) {
                title_col = Some(col);
            }
            if description.is_none() && header_matches(&header, DESCRIPTION_HEADERS) {
                description = Some((col, row));
            }
        }
        if let (Some(title_col), Some((description_col, header_row))) = (title_col, description) {
            return Ok(HeaderColumns { title_col, description_col, header_row });
        }
    }

    let mut missing = Vec::new();
    if title_col.is_none() {
        missing.push("title");
    }
    if description.is_none() {
        missing.push("description");
    }
    Err(FillError::MissingColumns(missing.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn template() -> Sheet {
        let mut sheet = Sheet::new("Товары");
        sheet.set(0, 0, text("Шаблон карточек"));
        sheet.set(2, 1, text("Артикул"));
        sheet.set(2, 2, text("  Наименование "));
        sheet.set(2, 3, text("Описание (до 2000 символов)"));
        sheet
    }

    #[test]
    fn finds_columns_below_a_banner() {
        let cols = find_header_columns(&template(), 4).unwrap();
        assert_eq!(cols, HeaderColumns { title_col: 2, description_col: 3, header_row: 2 });
    }

    #[test]
    fn header_matching_folds_case_and_yo() {
        assert!(header_matches(&normalize_header("НАЗВАНИЕ   ТОВАРА"), TITLE_HEADERS));
        assert!(header_matches(&normalize_header("Description"), DESCRIPTION_HEADERS));
        assert!(header_matches(&normalize_header("Описаниё"), &["описание"]));
        assert!(!header_matches(&normalize_header("Описания"), DESCRIPTION_HEADERS));
        assert!(!header_matches(&normalize_header("descriptor"), DESCRIPTION_HEADERS));
    }

    #[test]
    fn missing_columns_are_reported() {
        let mut sheet = Sheet::new("s");
        sheet.set(0, 0, text("Наименование"));
        match find_header_columns(&sheet, 4) {
            Err(FillError::MissingColumns(m)) => assert_eq!(m, "description"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn headers_below_the_scan_window_are_ignored() {
        assert!(find_header_columns(&template(), 2).is_err());
    }

    #[test]
    fn sink_skips_protected_rows_and_merged_tails() {
        let mut sheet = template();
        sheet.merge(MergedRange::new(5, 3, 5, 5));
        let mut sink = SheetSink::new(&mut sheet, 4);
        assert!(!sink.write_cell(3, 2, "в шапке"));
        assert!(sink.write_cell(5, 3, "якорь"));
        assert!(!sink.write_cell(5, 4, "хвост"));
        assert!(sink.write_cell(6, 4, "обычная"));
        assert_eq!(sheet.text(5, 3), Some("якорь"));
        assert_eq!(sheet.get(5, 4), None);
        assert_eq!(sheet.text(3, 2), None);
        assert_eq!(sheet.height(), 7);
        let edited: Vec<(u32, u16)> = sheet.edits().map(|(key, _)| key).collect();
        assert_eq!(edited, vec![(5, 3), (6, 4)]);
    }
}
