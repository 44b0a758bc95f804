use serde::{Deserialize, Serialize};

use crate::analyzer::grid::column_letter;

/// Inferred purpose of a column, drawn from a fixed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    QuestionId,
    QuestionText,
    Response,
    Comment,
    Note,
    Unknown,
}

impl ColumnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QuestionId => "question id",
            Self::QuestionText => "question text",
            Self::Response => "response",
            Self::Comment => "comment",
            Self::Note => "note",
            Self::Unknown => "unknown",
        }
    }
}

/// Expected answer format for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    YesNo,
    YesNoNaPartial,
    FreeText,
    DateValue,
    MultipleChoice,
    Unknown,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::YesNo => "yes_no",
            Self::YesNoNaPartial => "yes_no_na_partial",
            Self::FreeText => "free_text",
            Self::DateValue => "date_value",
            Self::MultipleChoice => "multiple_choice",
            Self::Unknown => "unknown",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::YesNo => "Yes/No",
            Self::YesNoNaPartial => "Yes/No/NA/Partial",
            Self::FreeText => "Free text",
            Self::DateValue => "Date",
            Self::MultipleChoice => "Multiple choice",
            Self::Unknown => "Unknown",
        }
    }
}

/// How cell boundaries were encoded in the raw table text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableConvention {
    CellReference,
    PipeDelimited,
    TabDelimited,
    SingleColumn,
}

impl TableConvention {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CellReference => "cell-reference",
            Self::PipeDelimited => "pipe-delimited",
            Self::TabDelimited => "tab-delimited",
            Self::SingleColumn => "single-column",
        }
    }
}

/// Address of one grid cell. Rows are 1-based, columns are 0-based indexes
/// rendered as Excel-style letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellLocation {
    pub row: u32,
    pub column: usize,
}

impl CellLocation {
    pub fn new(row: u32, column: usize) -> Self {
        Self { row, column }
    }

    /// Compact Excel-style reference, e.g. `C4`.
    pub fn cell_ref(&self) -> String {
        format!("{}{}", column_letter(self.column), self.row)
    }

    /// Long form used in rendered reports, e.g. `Row 4, Column C`.
    pub fn describe(&self) -> String {
        format!("Row {}, Column {}", self.row, column_letter(self.column))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub column: usize,
    pub letter: String,
    pub role: ColumnRole,
    pub header_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetMeta {
    pub sheet_name: String,
    pub convention: TableConvention,
    pub total_rows: u32,
    pub total_columns: usize,
    pub header_row: Option<u32>,
    pub data_start_row: u32,
    pub columns: Vec<ColumnInfo>,
}

/// One questionnaire item with its location and everything a downstream
/// consumer needs to place an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: String,
    pub numbering_token: Option<String>,
    pub location: CellLocation,
    pub text: String,
    pub response_location: Option<CellLocation>,
    pub response_type: ResponseType,
    pub options: Vec<String>,
    pub required: bool,
    pub parent_id: Option<String>,
    pub special_instructions: Vec<String>,
    pub cross_references: Vec<String>,
}

/// Complete result of one analysis run. Contains no timestamps or hashes so
/// rendering stays deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub sheet_meta: SheetMeta,
    pub questions: Vec<QuestionRecord>,
    pub ambiguities: Vec<String>,
}

/// A root question together with the rows of its follow-ups, answerable in a
/// single downstream pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBatch {
    pub batch_id: u32,
    pub rows: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailsMetadata {
    pub has_hierarchical_structure: bool,
    pub has_options: bool,
    pub has_comments: bool,
}

/// Structured record for programmatic consumers that skip text rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDetails {
    pub questions: Vec<QuestionRecord>,
    pub total_questions: usize,
    pub response_columns: Vec<String>,
    pub batches: Vec<QuestionBatch>,
    pub metadata: DetailsMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisCounts {
    pub total_rows: u32,
    pub total_columns: usize,
    pub questions_total: usize,
    pub yes_no_count: usize,
    pub yes_no_na_partial_count: usize,
    pub free_text_count: usize,
    pub date_value_count: usize,
    pub multiple_choice_count: usize,
    pub unknown_count: usize,
    pub root_count: usize,
    pub child_count: usize,
    pub special_instruction_count: usize,
    pub cross_reference_count: usize,
    pub ambiguity_count: usize,
}

impl AnalysisCounts {
    pub fn from_report(report: &AnalysisReport) -> Self {
        let mut counts = Self {
            total_rows: report.sheet_meta.total_rows,
            total_columns: report.sheet_meta.total_columns,
            questions_total: report.questions.len(),
            ambiguity_count: report.ambiguities.len(),
            ..Self::default()
        };

        for question in &report.questions {
            match question.response_type {
                ResponseType::YesNo => counts.yes_no_count += 1,
                ResponseType::YesNoNaPartial => counts.yes_no_na_partial_count += 1,
                ResponseType::FreeText => counts.free_text_count += 1,
                ResponseType::DateValue => counts.date_value_count += 1,
                ResponseType::MultipleChoice => counts.multiple_choice_count += 1,
                ResponseType::Unknown => counts.unknown_count += 1,
            }

            if question.parent_id.is_some() {
                counts.child_count += 1;
            } else {
                counts.root_count += 1;
            }

            counts.special_instruction_count += question.special_instructions.len();
            counts.cross_reference_count += question.cross_references.len();
        }

        counts
    }
}

/// Written as JSON under the cache root after each archived run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub sheet_name: String,
    pub source_path: String,
    pub source_sha256: String,
    pub convention: String,
    pub counts: AnalysisCounts,
    pub ambiguities: Vec<String>,
}

pub const MANIFEST_VERSION: u32 = 1;
