//! Structural analysis of questionnaire sheets extracted as raw table text.
//!
//! Four sequential passes: the grid scanner splits text into cells, the
//! layout pass assigns column roles, the question extractor builds records,
//! and the hierarchy resolver links parents. All passes are pure; degraded
//! recognition is recorded as ambiguity notes, never raised as an error.

pub mod grid;
pub mod hierarchy;
pub mod layout;
pub mod options;
pub mod questions;
pub mod report;
pub mod rows;

#[cfg(test)]
mod tests;

use tracing::debug;

pub use options::{AnalyzerOptions, RequirementDecision, RequirementPolicy, RoleHint};
pub use report::{derive_batches, question_details, render, render_guide};
pub use rows::{questions_in_column, select_rows};

use crate::model::{AnalysisReport, QuestionDetails};

/// Analyze raw table text with the default options.
pub fn analyze(raw_table_text: &str, sheet_name: &str) -> AnalysisReport {
    analyze_with_options(raw_table_text, sheet_name, &AnalyzerOptions::default())
}

/// Run the full pipeline. Never fails: empty or malformed input degrades to
/// a report with zero questions and ambiguity notes.
pub fn analyze_with_options(
    raw_table_text: &str,
    sheet_name: &str,
    options: &AnalyzerOptions,
) -> AnalysisReport {
    let (grid, mut ambiguities) = grid::scan_grid(raw_table_text);

    if grid.is_empty() {
        ambiguities.push("input contains no cells; produced an empty analysis".to_string());
    }

    debug!(
        convention = grid.convention().as_str(),
        rows = grid.total_rows(),
        cells = grid.cells().len(),
        "grid scanned"
    );

    let layout = layout::analyze_layout(&grid, sheet_name, options, &mut ambiguities);

    if layout.question_column.is_none() && !grid.is_empty() {
        ambiguities.push("no question column could be identified".to_string());
    }

    debug!(
        header_row = ?layout.meta.header_row,
        question_column = ?layout.question_column,
        response_column = ?layout.response_column,
        "layout resolved"
    );

    let drafts = questions::extract_questions(&grid, &layout, options, &mut ambiguities);
    let questions = hierarchy::resolve_hierarchy(drafts, &mut ambiguities);

    AnalysisReport {
        sheet_meta: layout.meta,
        questions,
        ambiguities,
    }
}

/// Equivalent to [`analyze`] for callers that want the structured record
/// directly instead of a rendered report.
pub fn extract_question_details(raw_table_text: &str) -> QuestionDetails {
    let report = analyze(raw_table_text, "Sheet1");
    report::question_details(&report)
}
