//! Entry points that tie the generators to documents: one template, a batch of templates,
//! and an in-memory preview.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::batch_lock::{BatchLock, LOCK_FILE};
use crate::core::config::{Config, GenerationRequest};
use crate::core::error::{FillError, FillResult};
use crate::core::occasion;
use crate::core::pools::Lexicon;
use crate::core::sheet::{find_header_columns, CellSink, Sheet, SheetSink};
use crate::core::similarity::average_pairwise;
use crate::core::uniqueness::{seed_for, Copywriter, RowOutcome, RunState};
use crate::core::xlsx::{load_document, save_document};

const OUTPUT_SUFFIX: &str = "_filled";

/// Summary of one filled file, printed as JSON by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct FillReport {
    pub run_id: String,
    pub generated_at: String,
    pub output: PathBuf,
    pub rows_filled: usize,
    pub uniqueness_strength: u8,
    pub similarity_threshold: f64,
    pub avg_similarity: f64,
    pub max_similarity: f64,
    /// Rows kept after the attempt budget ran out
    pub fallback_rows: usize,
    pub distinct_structures: usize,
}

/// `<stem>_filled.xlsx` for a single file, `<stem>_filled_<NN>.xlsx` inside a batch.
pub fn output_path(input: &Path, output_dir: Option<&Path>, index: usize, total: usize) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("template");
    let name = if total <= 1 {
        format!("{}{}.xlsx", stem, OUTPUT_SUFFIX)
    } else {
        let width = total.to_string().len().max(2);
        format!("{}{}_{:0width$}.xlsx", stem, OUTPUT_SUFFIX, index, width = width)
    };
    match output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

/// Fills `request.rows` rows below the header and returns what was generated.
///
/// Columns are located before any text is generated, so a template without them fails fast.
/// `progress` receives a non-decreasing percentage after every row.
pub fn fill_sheet(
    sheet: &mut Sheet,
    writer: &Copywriter<'_>,
    state: &mut RunState<'_>,
    request: &GenerationRequest,
    progress: &mut dyn FnMut(u8),
) -> FillResult<Vec<RowOutcome>> {
    let columns = find_header_columns(sheet, request.skip_top_rows as u32)?;
    let first_row = (request.skip_top_rows as u32).max(columns.header_row + 1);
    log::info!(
        "Filling sheet {}: title column {}, description column {}, rows from {}",
        sheet.name,
        columns.title_col,
        columns.description_col,
        first_row
    );

    let mut sink = SheetSink::new(sheet, request.skip_top_rows as u32);
    let mut outcomes = Vec::with_capacity(request.rows);
    progress(0);
    for i in 0..request.rows {
        let outcome = writer.fill_row(state, i);
        let row = first_row + i as u32;
        let wrote_title = sink.write_cell(row, columns.title_col, &outcome.title);
        let wrote_description = sink.write_cell(row, columns.description_col, &outcome.description);
        if !(wrote_title && wrote_description) {
            log::warn!("Row {} is partly covered by a merged range, some text was not written", row);
        }
        outcomes.push(outcome);
        progress(((i + 1) * 100 / request.rows) as u8);
    }
    Ok(outcomes)
}

/// Fills one template and saves it to `output`.
///
/// `file_index` separates the random sequences of files in a batch. Nothing is written to
/// `output` unless the whole fill succeeds.
pub fn fill_template(
    input: &Path,
    output: &Path,
    request: &GenerationRequest,
    lexicon: &Lexicon,
    lock: Option<&mut BatchLock>,
    file_index: usize,
    progress: &mut dyn FnMut(u8),
) -> FillResult<FillReport> {
    request.validate()?;
    let mut document = load_document(input)?;
    let sheet = document.first_sheet_mut().ok_or_else(|| FillError::Workbook {
        path: input.to_path_buf(),
        reason: "workbook has no worksheets".into(),
    })?;

    let discriminator = input.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let seed = seed_for(discriminator, file_index, request.seed);
    let mut state = RunState::new(seed, request.rows);
    if let Some(lock) = lock {
        state = state.with_lock(lock);
    }
    let writer = Copywriter::new(request, lexicon, occasion::resolve_today(request.occasion.as_deref()));

    let outcomes = fill_sheet(sheet, &writer, &mut state, request, progress)?;
    save_document(&mut document, output)?;

    let report = FillReport {
        run_id: uuid::Uuid::new_v4().to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        output: output.to_path_buf(),
        rows_filled: outcomes.len(),
        uniqueness_strength: request.uniqueness_strength,
        similarity_threshold: writer.threshold(),
        avg_similarity: average_pairwise(state.accepted_texts()),
        max_similarity: outcomes.iter().map(|o| o.max_similarity).fold(0.0, f64::max),
        fallback_rows: outcomes.iter().filter(|o| !o.within_threshold).count(),
        distinct_structures: state.distinct_structures(),
    };
    log::info!(
        "Filled {} rows into {} (avg similarity {:.3}, {} fallback rows)",
        report.rows_filled,
        output.display(),
        report.avg_similarity,
        report.fallback_rows
    );
    Ok(report)
}

/// Produces `batch.files` filled copies of the configured template.
///
/// All files share one slogan lock so openers do not repeat across the batch. Progress runs
/// from 0 to 100 over the whole batch.
pub fn fill_batch(
    config: &Config,
    lexicon: &Lexicon,
    progress: &mut dyn FnMut(u8),
) -> FillResult<Vec<FillReport>> {
    config.request.validate()?;
    let input = config
        .batch
        .input
        .as_deref()
        .ok_or_else(|| FillError::InvalidRequest("no input template configured".into()))?;
    if !input.exists() {
        return Err(FillError::InputNotFound(input.to_path_buf()));
    }

    let total = config.batch.files.max(1);
    let mut lock = if config.batch.slogan_lock {
        let mut lock = BatchLock::load(config.data_dir().join(LOCK_FILE));
        if config.batch.reset_lock {
            if let Some(path) = lock.path() {
                log::info!("Resetting slogan lock {} ({} entries)", path.display(), lock.len());
            }
            lock.clear();
            if let Err(e) = lock.save() {
                log::warn!("Failed to persist slogan lock: {}", e);
            }
        }
        Some(lock)
    } else {
        None
    };

    let mut reports = Vec::with_capacity(total);
    for index in 1..=total {
        let output = output_path(input, config.batch.output_dir.as_deref(), index, total);
        log::info!("File {}/{}: {}", index, total, output.display());
        let mut file_progress = |p: u8| progress((((index - 1) * 100 + p as usize) / total) as u8);
        reports.push(fill_template(
            input,
            &output,
            &config.request,
            lexicon,
            lock.as_mut(),
            index,
            &mut file_progress,
        )?);
    }
    Ok(reports)
}

/// Title and description pairs without touching any document or lock.
pub fn generate_preview(request: &GenerationRequest, lexicon: &Lexicon, count: usize) -> Vec<(String, String)> {
    let count = count.max(1);
    let writer = Copywriter::new(request, lexicon, occasion::resolve_today(request.occasion.as_deref()));
    let mut state = RunState::new(seed_for("preview", 1, request.seed), count);
    (0..count)
        .map(|i| {
            let outcome = writer.fill_row(&mut state, i);
            (outcome.title, outcome.description)
        })
        .collect()
}
