use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{DataValidation, Format, Workbook};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use copysmith::core::batch_lock::{BatchLock, LOCK_FILE};
use copysmith::core::config::{parse_config, GenerationRequest};
use copysmith::core::error::FillError;
use copysmith::core::fill::{fill_batch, fill_template, output_path};
use copysmith::core::pools::Lexicon;

/// Marketplace-style template: a merged banner, a hint row, the header on row 4, a merged
/// block that swallows one description cell, a wide title column and a dropdown column.
fn write_template(path: &Path, with_description: bool) {
    let mut workbook = Workbook::new();
    let plain = Format::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Товары").unwrap();
    sheet.merge_range(0, 0, 0, 3, "Карточки товаров", &plain).unwrap();
    sheet.write_string(1, 0, "Заполните таблицу ниже").unwrap();
    sheet.write_string(3, 0, "Артикул").unwrap();
    sheet.write_string(3, 1, "Наименование").unwrap();
    if with_description {
        sheet.write_string(3, 2, "Описание (до 2000 символов)").unwrap();
    }
    sheet.write_number(3, 3, 1.0).unwrap();
    for row in 4..10 {
        sheet.write_string(row, 0, &format!("SKU-{}", row)).unwrap();
    }
    sheet.merge_range(8, 2, 8, 3, "", &plain).unwrap();
    sheet.set_column_width(1, 80).unwrap();
    let dropdown = DataValidation::new().allow_list_strings(&["Да", "Нет"]).unwrap();
    sheet.add_data_validation(4, 4, 9, 4, &dropdown).unwrap();

    let help = workbook.add_worksheet();
    help.set_name("Справка").unwrap();
    help.write_string(0, 0, "Не удалять").unwrap();
    workbook.save(path).unwrap();
}

fn read_cells(path: &Path, sheet: &str) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range(sheet).unwrap();
    let (row0, col0) = range.start().unwrap_or((0, 0));
    let mut grid = vec![vec![String::new(); 6]; 12];
    for (r, row) in range.rows().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let value = match cell {
                Data::Empty => String::new(),
                other => other.to_string(),
            };
            grid[row0 as usize + r][col0 as usize + c] = value;
        }
    }
    grid
}

fn first_sheet_xml(path: &Path) -> String {
    let mut archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
    let mut xml = String::new();
    archive
        .by_name("xl/worksheets/sheet1.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

fn request() -> GenerationRequest {
    let mut r = GenerationRequest::new("Ray-Ban");
    r.shape = "авиаторы".into();
    r.lens = "UV400".into();
    r.seed = Some(7);
    r
}

#[test]
fn fills_template_and_preserves_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("шаблон.xlsx");
    write_template(&input, true);
    let output = output_path(&input, None, 1, 1);

    let mut progress = Vec::new();
    let report = fill_template(
        &input,
        &output,
        &request(),
        &Lexicon::builtin(),
        None,
        1,
        &mut |p: u8| progress.push(p),
    )
    .unwrap();

    assert_eq!(output, dir.path().join("шаблон_filled.xlsx"));
    assert!(output.exists());
    assert_eq!(report.rows_filled, 6);
    assert_eq!(report.distinct_structures, 6);
    assert_eq!(report.uniqueness_strength, 90);
    assert!(report.avg_similarity <= report.max_similarity);
    assert_eq!(progress.last(), Some(&100));

    let grid = read_cells(&output, "Товары");
    assert_eq!(grid[0][0], "Карточки товаров");
    assert_eq!(grid[1][0], "Заполните таблицу ниже");
    assert_eq!(grid[3][1], "Наименование");
    assert_eq!(grid[3][3], "1");
    for row in 4..10 {
        assert_eq!(grid[row][0], format!("SKU-{}", row));
        let title = &grid[row][1];
        assert!(!title.is_empty() && title.chars().count() <= 60, "row {} title {:?}", row, title);
    }
    for row in [4, 5, 6, 7, 9] {
        assert!(grid[row][2].chars().count() > 100, "row {} description missing", row);
    }
    // description cell of row 9 sits inside a merged block anchored on itself
    assert!(!grid[8][2].is_empty());
    assert!(grid[8][3].is_empty());
    assert!(grid[10][1].is_empty());

    let help = read_cells(&output, "Справка");
    assert_eq!(help[0][0], "Не удалять");
    // the template itself is untouched
    assert!(read_cells(&input, "Товары")[4][1].is_empty());
}

#[test]
fn fill_keeps_column_widths_and_dropdowns() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("шаблон.xlsx");
    write_template(&input, true);
    let before = first_sheet_xml(&input);
    assert!(before.contains("<dataValidation") && before.contains("<cols>"));

    let output = output_path(&input, None, 1, 1);
    fill_template(&input, &output, &request(), &Lexicon::builtin(), None, 1, &mut |_: u8| {}).unwrap();

    let after = first_sheet_xml(&output);
    assert!(after.contains("<dataValidation"), "data validation lost");
    assert!(after.contains("<cols>"), "column widths lost");
    assert!(after.contains("Да,Нет"));
}

#[test]
fn missing_columns_abort_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("no_desc.xlsx");
    write_template(&input, false);
    let output = output_path(&input, None, 1, 1);

    let err = fill_template(&input, &output, &request(), &Lexicon::builtin(), None, 1, &mut |_: u8| {})
        .unwrap_err();
    assert!(matches!(err, FillError::MissingColumns(ref m) if m == "description"));
    assert!(!output.exists());
}

#[test]
fn missing_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("absent.xlsx");
    let err = fill_template(
        &input,
        &dir.path().join("out.xlsx"),
        &request(),
        &Lexicon::builtin(),
        None,
        1,
        &mut |_: u8| {},
    )
    .unwrap_err();
    assert!(matches!(err, FillError::InputNotFound(_)));
}

#[test]
fn invalid_request_fails_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let mut req = request();
    req.rows = 0;
    let err = fill_template(
        &dir.path().join("absent.xlsx"),
        &dir.path().join("out.xlsx"),
        &req,
        &Lexicon::builtin(),
        None,
        1,
        &mut |_: u8| {},
    )
    .unwrap_err();
    assert!(matches!(err, FillError::InvalidRequest(_)));
}

fn batch_config(dir: &Path, input: &Path, files: usize, reset_lock: bool) -> String {
    format!(
        "version = 2\ndata_dir = '{}'\n\n[request]\nbrand = 'Ray-Ban'\nshape = 'авиаторы'\nlens = 'UV400'\nseed = 5\n\n[batch]\ninput = '{}'\noutput_dir = '{}'\nfiles = {}\nreset_lock = {}\n",
        dir.join("data").display(),
        input.display(),
        dir.join("out").display(),
        files,
        reset_lock
    )
}

#[test]
fn batch_writes_numbered_files_and_shares_the_lock() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("очки.xlsx");
    write_template(&input, true);
    let config = parse_config(&batch_config(dir.path(), &input, 3, false)).unwrap();

    let mut progress = Vec::new();
    let reports = fill_batch(&config, &Lexicon::builtin(), &mut |p: u8| progress.push(p)).unwrap();

    assert_eq!(reports.len(), 3);
    let expected: Vec<PathBuf> = (1..=3)
        .map(|i| dir.path().join("out").join(format!("очки_filled_0{}.xlsx", i)))
        .collect();
    for (report, path) in reports.iter().zip(&expected) {
        assert_eq!(&report.output, path);
        assert!(path.exists());
    }
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last(), Some(&100));

    // 18 titles from a pool of 30 openers: none repeats across the batch
    let lock = BatchLock::load(dir.path().join("data").join(LOCK_FILE));
    assert_eq!(lock.len(), 18);
    let mut openers = std::collections::HashSet::new();
    for path in &expected {
        let grid = read_cells(path, "Товары");
        for row in 4..10 {
            let first_word = grid[row][1].split_whitespace().next().unwrap_or_default().to_lowercase();
            openers.insert(first_word);
        }
    }
    assert!(openers.len() >= 17);
}

#[test]
fn reset_lock_forgets_earlier_batches() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("t.xlsx");
    write_template(&input, true);
    let lock_path = dir.path().join("data").join(LOCK_FILE);
    fs::create_dir_all(lock_path.parent().unwrap()).unwrap();
    fs::write(&lock_path, r#"{"slogans": ["старое", "другое"]}"#).unwrap();

    let config = parse_config(&batch_config(dir.path(), &input, 1, true)).unwrap();
    fill_batch(&config, &Lexicon::builtin(), &mut |_: u8| {}).unwrap();

    let lock = BatchLock::load(&lock_path);
    assert!(!lock.contains("старое"));
    assert_eq!(lock.len(), 6);
    assert!(dir.path().join("out").join("t_filled.xlsx").exists());
}
