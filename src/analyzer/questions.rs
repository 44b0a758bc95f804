use std::sync::OnceLock;

use regex::Regex;

use crate::analyzer::grid::CellGrid;
use crate::analyzer::hierarchy::NumberingToken;
use crate::analyzer::layout::LayoutAnalysis;
use crate::analyzer::options::{AnalyzerOptions, RequirementDecision};
use crate::model::{CellLocation, QuestionRecord, ResponseType};

/// Extractor output before hierarchy resolution: the record plus the cues the
/// resolver needs.
#[derive(Debug, Clone)]
pub(crate) struct QuestionDraft {
    pub record: QuestionRecord,
    pub token: Option<NumberingToken>,
    pub indent: usize,
}

pub(crate) struct RuleContext<'a> {
    pub text: &'a str,
    pub adjacent: &'a [String],
}

impl RuleContext<'_> {
    fn haystack(&self) -> String {
        let mut haystack = self.text.to_lowercase();
        for value in self.adjacent {
            haystack.push(' ');
            haystack.push_str(&value.to_lowercase());
        }
        haystack
    }
}

/// One entry of the ordered response-type rule table.
pub(crate) struct ResponseRule {
    pub name: &'static str,
    pub detect: fn(&RuleContext) -> Option<(ResponseType, Vec<String>)>,
}

/// Evaluated top to bottom; the first matching rule wins.
pub(crate) static RESPONSE_RULES: &[ResponseRule] = &[
    ResponseRule {
        name: "yes_no_na_partial",
        detect: detect_yes_no_na_partial,
    },
    ResponseRule {
        name: "multiple_choice",
        detect: detect_multiple_choice,
    },
    ResponseRule {
        name: "yes_no",
        detect: detect_yes_no,
    },
    ResponseRule {
        name: "date_value",
        detect: detect_date_value,
    },
];

fn yes_no_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\by(?:es)?\s*/\s*n(?:o)?\b|\byes\s+or\s+no\b|\(y/n\)")
            .expect("yes/no regex")
    })
}

fn na_partial_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bn/?a\b|\bnot\s+applicable\b|\bpartial(?:ly)?\b")
            .expect("na/partial regex")
    })
}

fn date_cue_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bdate\b|\bdd/mm\b|\bmm/dd\b|\byyyy\b|\bexpiry\b|\bexpiration\b")
            .expect("date cue regex")
    })
}

fn parenthetical_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([^()]{2,120})\)").expect("parenthetical regex"))
}

fn split_option_list(candidate: &str) -> Option<Vec<String>> {
    let separator = if candidate.contains('/') {
        '/'
    } else if candidate.contains(',') {
        ','
    } else {
        return None;
    };

    let parts = candidate
        .split(separator)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect::<Vec<String>>();

    if parts.len() >= 2 && parts.iter().all(|part| part.chars().count() <= 40) {
        Some(parts)
    } else {
        None
    }
}

/// First explicit enumerated option list: a parenthetical inside the question
/// text, else an adjacent cell that is nothing but a separated list.
fn explicit_options(context: &RuleContext) -> Option<Vec<String>> {
    for captures in parenthetical_regex().captures_iter(context.text) {
        if let Some(options) = captures.get(1).and_then(|value| split_option_list(value.as_str())) {
            return Some(options);
        }
    }

    for value in context.adjacent {
        let trimmed = value.trim();
        if trimmed.chars().count() <= 80 {
            if let Some(options) = split_option_list(trimmed) {
                return Some(options);
            }
        }
    }

    None
}

fn is_yes_no_family(option: &str) -> bool {
    matches!(
        option.trim().to_lowercase().as_str(),
        "yes" | "y" | "no" | "n" | "na" | "n/a" | "not applicable" | "partial" | "partially"
    )
}

fn detect_yes_no_na_partial(context: &RuleContext) -> Option<(ResponseType, Vec<String>)> {
    let haystack = context.haystack();
    if yes_no_regex().is_match(&haystack) && na_partial_regex().is_match(&haystack) {
        let options = explicit_options(context)
            .filter(|options| options.iter().all(|option| is_yes_no_family(option)))
            .unwrap_or_default();
        return Some((ResponseType::YesNoNaPartial, options));
    }
    None
}

fn detect_multiple_choice(context: &RuleContext) -> Option<(ResponseType, Vec<String>)> {
    let options = explicit_options(context)?;
    if options.iter().all(|option| is_yes_no_family(option)) {
        return None;
    }
    Some((ResponseType::MultipleChoice, options))
}

fn detect_yes_no(context: &RuleContext) -> Option<(ResponseType, Vec<String>)> {
    let haystack = context.haystack();
    if yes_no_regex().is_match(&haystack) {
        let options = explicit_options(context)
            .filter(|options| options.iter().all(|option| is_yes_no_family(option)))
            .unwrap_or_default();
        return Some((ResponseType::YesNo, options));
    }
    None
}

fn detect_date_value(context: &RuleContext) -> Option<(ResponseType, Vec<String>)> {
    if date_cue_regex().is_match(&context.haystack()) {
        return Some((ResponseType::DateValue, Vec::new()));
    }
    None
}

pub(crate) fn infer_response_type(context: &RuleContext) -> (ResponseType, Vec<String>, &'static str) {
    for rule in RESPONSE_RULES {
        if let Some((response_type, options)) = (rule.detect)(context) {
            return (response_type, options, rule.name);
        }
    }

    if context.text.chars().any(|ch| ch.is_alphabetic()) {
        (ResponseType::FreeText, Vec::new(), "free_text")
    } else {
        (ResponseType::Unknown, Vec::new(), "unknown")
    }
}

fn conditional_clause_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bif\s+(?:yes|no|not|so|applicable|answered)\b[^.?!]*[.?!]?")
            .expect("conditional clause regex")
    })
}

fn imperative_clause_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:please\s+)?(?:attach|provide|include|enclose|upload|specify)\b[^.?!]*[.?!]?")
            .expect("imperative clause regex")
    })
}

/// Verbatim conditional and attachment clauses, in encounter order. A clause
/// fully contained in another match is dropped so a conditional that ends in
/// an imperative is captured once.
pub(crate) fn extract_special_instructions(texts: &[&str]) -> Vec<String> {
    let mut instructions = Vec::<String>::new();

    for text in texts {
        let mut spans = Vec::<(usize, usize)>::new();
        for found in conditional_clause_regex().find_iter(text) {
            spans.push((found.start(), found.end()));
        }
        for found in imperative_clause_regex().find_iter(text) {
            spans.push((found.start(), found.end()));
        }
        spans.sort_unstable();

        for (start, end) in &spans {
            let contained = spans.iter().any(|(other_start, other_end)| {
                (other_start, other_end) != (start, end)
                    && other_start <= start
                    && end <= other_end
            });
            if contained {
                continue;
            }

            let clause = text[*start..*end].trim().to_string();
            if !instructions.contains(&clause) {
                instructions.push(clause);
            }
        }
    }

    instructions
}

fn cross_reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:see|refer\s+to|proceed\s+to|go\s+to|skip\s+to|as\s+per)\s+(?:question|section|item|q)?\s*#?\s*(\d+(?:\.\d+)*[a-z]?)\b",
        )
        .expect("cross reference regex")
    })
}

pub(crate) fn extract_cross_references(text: &str) -> Vec<String> {
    let mut references = Vec::<String>::new();
    for captures in cross_reference_regex().captures_iter(text) {
        if let Some(token) = captures.get(1) {
            let token = token.as_str().to_string();
            if !references.contains(&token) {
                references.push(token);
            }
        }
    }
    references
}

/// Scan the grid for question cells and build partially-populated records;
/// parent links are resolved by the hierarchy pass.
pub(crate) fn extract_questions(
    grid: &CellGrid,
    layout: &LayoutAnalysis,
    options: &AnalyzerOptions,
    ambiguities: &mut Vec<String>,
) -> Vec<QuestionDraft> {
    let Some(question_column) = layout.question_column else {
        return Vec::new();
    };

    let mut drafts = Vec::<QuestionDraft>::new();
    let data_start = layout.meta.data_start_row;

    for cell in grid.column_cells(question_column) {
        if cell.row < data_start {
            continue;
        }
        if Some(cell.row) == layout.meta.header_row {
            continue;
        }

        let text = cell.trimmed();
        if text.is_empty() || NumberingToken::parse(text).is_some() {
            continue;
        }

        let id_cell_token = layout.id_column.and_then(|column| {
            grid.cell_text(cell.row, column)
                .and_then(NumberingToken::parse)
        });
        let token = id_cell_token.or_else(|| NumberingToken::parse_leading(text));

        let response_location = layout
            .response_column
            .or_else(|| {
                layout
                    .comment_columns
                    .iter()
                    .copied()
                    .find(|column| *column > question_column)
            })
            .map(|column| CellLocation::new(cell.row, column));

        let adjacent = grid
            .row_cells(cell.row)
            .filter(|other| other.column != cell.column && Some(other.column) != layout.id_column)
            .map(|other| other.trimmed().to_string())
            .collect::<Vec<String>>();

        let context = RuleContext {
            text,
            adjacent: &adjacent,
        };
        let (response_type, options_found, _rule) = infer_response_type(&context);

        let note_texts = layout
            .note_columns
            .iter()
            .chain(layout.comment_columns.iter())
            .filter_map(|column| grid.cell_text(cell.row, *column))
            .collect::<Vec<&str>>();
        let mut instruction_sources = vec![text];
        instruction_sources.extend(note_texts);
        let special_instructions = extract_special_instructions(&instruction_sources);

        let required = match options.requirement_policy.assess(text) {
            RequirementDecision::Optional => false,
            RequirementDecision::Required | RequirementDecision::Unstated => true,
            RequirementDecision::Conflicting => {
                ambiguities.push(format!(
                    "conflicting requirement markers at {}; defaulting to required",
                    CellLocation::new(cell.row, cell.column).describe()
                ));
                true
            }
        };

        let record = QuestionRecord {
            id: String::new(),
            numbering_token: token.as_ref().map(NumberingToken::key),
            location: CellLocation::new(cell.row, cell.column),
            text: text.to_string(),
            response_location,
            response_type,
            options: options_found,
            required,
            parent_id: None,
            special_instructions,
            cross_references: extract_cross_references(text),
        };

        drafts.push(QuestionDraft {
            record,
            token,
            indent: cell.indent(),
        });
    }

    drafts
}
