use std::collections::HashMap;
use std::fmt::Write as _;

use crate::analyzer::grid::column_letter;
use crate::model::{
    AnalysisReport, ColumnRole, DetailsMetadata, QuestionBatch, QuestionDetails, QuestionRecord,
    ResponseType,
};

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn render_overview(out: &mut String, report: &AnalysisReport) {
    let meta = &report.sheet_meta;

    push_line(out, "## SHEET OVERVIEW");
    let _ = writeln!(out, "- Sheet name: {}", meta.sheet_name);
    let _ = writeln!(out, "- Cell convention: {}", meta.convention.as_str());
    let _ = writeln!(out, "- Total rows: {}", meta.total_rows);
    if meta.total_columns > 0 {
        let _ = writeln!(
            out,
            "- Total columns: {} (A-{})",
            meta.total_columns,
            column_letter(meta.total_columns - 1)
        );
    } else {
        push_line(out, "- Total columns: 0");
    }
    match meta.header_row {
        Some(row) => {
            let _ = writeln!(out, "- Header row: Row {row}");
        }
        None => push_line(out, "- Header row: none detected"),
    }
    let _ = writeln!(out, "- Data starts: Row {}", meta.data_start_row);
    let _ = writeln!(out, "- Questions found: {}", report.questions.len());
}

fn render_header_structure(out: &mut String, report: &AnalysisReport) {
    push_line(out, "## HEADER STRUCTURE");

    if report.sheet_meta.columns.is_empty() {
        push_line(out, "No columns identified.");
        return;
    }

    for column in &report.sheet_meta.columns {
        let header = column
            .header_text
            .as_deref()
            .map(|text| format!(" (header \"{text}\")"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "- Column {}: {}{}",
            column.letter,
            column.role.as_str(),
            header
        );
    }
}

fn render_question(out: &mut String, question: &QuestionRecord) {
    let _ = writeln!(out, "### Question {}", question.id);
    let _ = writeln!(out, "- Location: {}", question.location.describe());
    let _ = writeln!(out, "- Text: \"{}\"", question.text);
    let _ = writeln!(
        out,
        "- Response type: {}",
        question.response_type.label()
    );
    match &question.response_location {
        Some(location) => {
            let _ = writeln!(out, "- Response location: {}", location.describe());
        }
        None => push_line(out, "- Response location: not identified"),
    }
    let _ = writeln!(
        out,
        "- Required: {}",
        if question.required { "yes" } else { "no" }
    );
    if !question.options.is_empty() {
        let _ = writeln!(out, "- Options: {}", question.options.join(", "));
    }
    if let Some(parent_id) = &question.parent_id {
        let _ = writeln!(out, "- Parent question: {parent_id}");
    }
    for instruction in &question.special_instructions {
        let _ = writeln!(out, "- Instruction: \"{instruction}\"");
    }
    if !question.cross_references.is_empty() {
        let _ = writeln!(
            out,
            "- References questions: {}",
            question.cross_references.join(", ")
        );
    }
}

fn render_question_analysis(out: &mut String, report: &AnalysisReport) {
    push_line(out, "## QUESTION ANALYSIS");

    if report.questions.is_empty() {
        push_line(out, "No questions found.");
        return;
    }

    for (index, question) in report.questions.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        render_question(out, question);
    }
}

fn render_response_mapping(out: &mut String, report: &AnalysisReport) {
    push_line(out, "## RESPONSE MAPPING");

    if report.questions.is_empty() {
        push_line(out, "No responses to map.");
        return;
    }

    for question in &report.questions {
        match &question.response_location {
            Some(location) => {
                let _ = writeln!(
                    out,
                    "- Question {}: fill {} ({})",
                    question.id,
                    location.describe(),
                    question.response_type.label()
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "- Question {}: no response cell identified",
                    question.id
                );
            }
        }
    }
}

fn children_by_parent(report: &AnalysisReport) -> HashMap<&str, Vec<usize>> {
    let mut children = HashMap::<&str, Vec<usize>>::new();
    for (index, question) in report.questions.iter().enumerate() {
        if let Some(parent_id) = &question.parent_id {
            children.entry(parent_id.as_str()).or_default().push(index);
        }
    }
    children
}

fn render_tree_node(
    out: &mut String,
    report: &AnalysisReport,
    children: &HashMap<&str, Vec<usize>>,
    index: usize,
    depth: usize,
) {
    let question = &report.questions[index];
    let _ = writeln!(
        out,
        "{}- {} (Row {})",
        "  ".repeat(depth),
        question.id,
        question.location.row
    );

    if let Some(child_indexes) = children.get(question.id.as_str()) {
        for child_index in child_indexes {
            render_tree_node(out, report, children, *child_index, depth + 1);
        }
    }
}

fn render_hierarchy(out: &mut String, report: &AnalysisReport) {
    push_line(out, "## HIERARCHICAL STRUCTURE");

    if report.questions.is_empty() {
        push_line(out, "No questions found.");
        return;
    }

    let children = children_by_parent(report);
    if children.is_empty() {
        push_line(out, "All questions are top-level.");
    }

    for (index, question) in report.questions.iter().enumerate() {
        if question.parent_id.is_none() {
            render_tree_node(out, report, &children, index, 0);
        }
    }
}

fn render_special_instructions(out: &mut String, report: &AnalysisReport) {
    push_line(out, "## SPECIAL INSTRUCTIONS");

    let mut any = false;
    for question in &report.questions {
        for instruction in &question.special_instructions {
            any = true;
            let _ = writeln!(
                out,
                "- Question {} (Row {}): \"{instruction}\"",
                question.id, question.location.row
            );
        }
    }

    if !any {
        push_line(out, "None recorded.");
    }
}

fn render_analysis_notes(out: &mut String, report: &AnalysisReport) {
    push_line(out, "## ANALYSIS NOTES");

    if report.ambiguities.is_empty() {
        push_line(out, "None recorded.");
        return;
    }

    for ambiguity in &report.ambiguities {
        let _ = writeln!(out, "- {ambiguity}");
    }
}

fn response_type_guidance(response_type: ResponseType) -> &'static str {
    match response_type {
        ResponseType::YesNo => "answer exactly \"Yes\" or \"No\"",
        ResponseType::YesNoNaPartial => {
            "answer exactly \"Yes\", \"No\", \"NA\", or \"Partial\""
        }
        ResponseType::FreeText => "answer in short free text (2-3 sentences at most)",
        ResponseType::DateValue => "answer with a date",
        ResponseType::MultipleChoice => "answer with one of the listed options, verbatim",
        ResponseType::Unknown => "response format could not be determined; answer conservatively",
    }
}

fn render_filling_instructions(out: &mut String, report: &AnalysisReport) {
    push_line(out, "## FILLING INSTRUCTIONS FOR LLM");

    let mut step = 0usize;
    let mut numbered = |out: &mut String, text: &str| {
        step += 1;
        let _ = writeln!(out, "{step}. {text}");
    };

    numbered(
        out,
        "Place each answer in the exact cell listed under RESPONSE MAPPING; cells are addressed as \"Row N, Column X\".",
    );

    let mut seen_types = Vec::<ResponseType>::new();
    for question in &report.questions {
        if !seen_types.contains(&question.response_type) {
            seen_types.push(question.response_type);
        }
    }
    for response_type in seen_types {
        numbered(
            out,
            &format!(
                "For {} questions, {}.",
                response_type.label(),
                response_type_guidance(response_type)
            ),
        );
    }

    if report.questions.iter().any(|question| question.parent_id.is_some()) {
        numbered(
            out,
            "Answer child questions only when the parent's answer makes them applicable; parentage is listed under HIERARCHICAL STRUCTURE.",
        );
    }
    if report
        .questions
        .iter()
        .any(|question| !question.special_instructions.is_empty())
    {
        numbered(
            out,
            "Follow every clause under SPECIAL INSTRUCTIONS exactly as written.",
        );
    }
    numbered(
        out,
        "Leave a cell blank when the available information is insufficient; never guess.",
    );
}

/// Render the fixed-format text report. Pure: alters no analysis field,
/// renders every question exactly once in document order, and always produces
/// the same text for the same report.
pub fn render(report: &AnalysisReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# SHEET ANALYSIS: {}", report.sheet_meta.sheet_name);
    out.push('\n');
    render_overview(&mut out, report);
    out.push('\n');
    render_header_structure(&mut out, report);
    out.push('\n');
    render_question_analysis(&mut out, report);
    out.push('\n');
    render_response_mapping(&mut out, report);
    out.push('\n');
    render_hierarchy(&mut out, report);
    out.push('\n');
    render_special_instructions(&mut out, report);
    out.push('\n');
    render_analysis_notes(&mut out, report);
    out.push('\n');
    render_filling_instructions(&mut out, report);

    out
}

fn compose_response_instruction(question: &QuestionRecord) -> String {
    let mut instruction = String::new();

    let target = question
        .response_location
        .map(|location| format!("Write the answer in cell {}.", location.cell_ref()))
        .unwrap_or_else(|| "No response cell was identified; flag this question.".to_string());

    let _ = write!(
        instruction,
        "{}. {target}",
        capitalize(response_type_guidance(question.response_type))
    );

    if !question.options.is_empty() {
        let _ = write!(instruction, " Available options: {}.", question.options.join(", "));
    }
    if !question.required {
        instruction.push_str(" This question is optional.");
    }
    for clause in &question.special_instructions {
        let _ = write!(instruction, " Note: \"{clause}\".");
    }

    instruction
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Per-question filling guide: question text, cell location, and a composed
/// response instruction. Deterministic, like `render`.
pub fn render_guide(report: &AnalysisReport) -> String {
    let mut out = String::new();

    push_line(&mut out, "# QUESTIONS AND RESPONSE INSTRUCTIONS");
    push_line(&mut out, &"=".repeat(60));
    out.push('\n');

    if report.questions.is_empty() {
        push_line(&mut out, "No questions found in the analysis.");
        return out;
    }

    for (index, question) in report.questions.iter().enumerate() {
        let _ = writeln!(out, "## {}. Question {}", index + 1, question.id);
        let _ = writeln!(out, "**Question:** {}", question.text);
        let cell = question
            .response_location
            .map(|location| location.cell_ref())
            .unwrap_or_else(|| "not identified".to_string());
        let _ = writeln!(out, "**Cell Location:** {cell}");
        out.push('\n');
        push_line(&mut out, "**Response Instruction:**");
        push_line(&mut out, &compose_response_instruction(question));
        out.push('\n');
        push_line(&mut out, &"-".repeat(60));
        out.push('\n');
    }

    out
}

fn descendant_rows(
    report: &AnalysisReport,
    children: &HashMap<&str, Vec<usize>>,
    index: usize,
    rows: &mut Vec<u32>,
) {
    let question = &report.questions[index];
    rows.push(question.location.row);

    if let Some(child_indexes) = children.get(question.id.as_str()) {
        for child_index in child_indexes {
            descendant_rows(report, children, *child_index, rows);
        }
    }
}

/// Group each root question with its descendants into a batch of rows that a
/// downstream consumer can answer in one pass.
pub fn derive_batches(report: &AnalysisReport) -> Vec<QuestionBatch> {
    let children = children_by_parent(report);
    let mut batches = Vec::<QuestionBatch>::new();

    for (index, question) in report.questions.iter().enumerate() {
        if question.parent_id.is_some() {
            continue;
        }

        let mut rows = Vec::<u32>::new();
        descendant_rows(report, &children, index, &mut rows);

        batches.push(QuestionBatch {
            batch_id: (batches.len() + 1) as u32,
            rows,
        });
    }

    batches
}

/// Build the structured record for programmatic consumers.
pub fn question_details(report: &AnalysisReport) -> QuestionDetails {
    let response_columns = report
        .sheet_meta
        .columns
        .iter()
        .filter(|column| matches!(column.role, ColumnRole::Response | ColumnRole::Comment))
        .map(|column| column.letter.clone())
        .collect::<Vec<String>>();

    let metadata = DetailsMetadata {
        has_hierarchical_structure: report
            .questions
            .iter()
            .any(|question| question.parent_id.is_some()),
        has_options: report
            .questions
            .iter()
            .any(|question| !question.options.is_empty()),
        has_comments: report
            .sheet_meta
            .columns
            .iter()
            .any(|column| column.role == ColumnRole::Comment),
    };

    QuestionDetails {
        total_questions: report.questions.len(),
        response_columns,
        batches: derive_batches(report),
        metadata,
        questions: report.questions.clone(),
    }
}
