use super::*;

use crate::analyzer::grid::{column_index, column_letter, scan_grid};
use crate::analyzer::hierarchy::NumberingToken;
use crate::analyzer::questions::{RuleContext, infer_response_type};
use crate::model::{ColumnRole, ResponseType, TableConvention};

const CELL_REF_SHEET: &str = r#"Row 1
A1 = "Filled by - compliance team"
Row 2
A2 = "Assessment Questionnaire"
C2 = "Vendor Response"
Row 4
A4 = "1"
B4 = "Do you use AI models in your service? Y/N"
Row 5
A5 = "1a"
B5 = "If yes, please answer the following questions. If no, please proceed to question 2."
Row 6
A6 = "1b"
B6 = "What are the intended use cases?"
"#;

fn pipe_sheet(rows: &[&str]) -> String {
    let mut text = String::from("ID | Question | Response | Comment\n");
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}

#[test]
fn column_letters_round_trip() {
    assert_eq!(column_letter(0), "A");
    assert_eq!(column_letter(25), "Z");
    assert_eq!(column_letter(26), "AA");
    assert_eq!(column_letter(27), "AB");
    assert_eq!(column_letter(702), "AAA");

    for index in [0usize, 3, 25, 26, 51, 700] {
        assert_eq!(column_index(&column_letter(index)), Some(index));
    }
    assert_eq!(column_index(""), None);
    assert_eq!(column_index("4"), None);
}

#[test]
fn detects_pipe_convention() {
    let (grid, ambiguities) = scan_grid("A | B | C\n1 | two | three\n");
    assert_eq!(grid.convention(), TableConvention::PipeDelimited);
    assert!(ambiguities.is_empty());
    assert_eq!(grid.cell_text(2, 1), Some("two"));
}

#[test]
fn detects_tab_convention_and_flags_mixed_delimiters() {
    let text = "ID\tQuestion\tResponse\n1\tIs there a plan?\t\n2 | stray pipe row | \n";
    let (grid, ambiguities) = scan_grid(text);
    assert_eq!(grid.convention(), TableConvention::TabDelimited);
    assert_eq!(ambiguities.len(), 1);
    assert!(ambiguities[0].contains("mixed cell-delimiting conventions"));
}

#[test]
fn cell_reference_convention_keeps_source_row_numbers() {
    let (grid, ambiguities) = scan_grid(CELL_REF_SHEET);
    assert_eq!(grid.convention(), TableConvention::CellReference);
    assert!(ambiguities.is_empty());
    assert_eq!(grid.total_rows(), 6);
    assert_eq!(grid.cell_text(4, 0), Some("1"));
    assert_eq!(
        grid.cell_text(6, 1),
        Some("What are the intended use cases?")
    );
    // Row 3 carried no cells in the source.
    assert!(grid.row_cells(3).next().is_none());
}

#[test]
fn numbering_tokens_parse_and_derive_parents() {
    let token = NumberingToken::parse("3.1.2").expect("dotted token");
    assert_eq!(token.level(), 3);
    assert_eq!(token.key(), "3.1.2");
    assert_eq!(token.parent_key(), Some("3.1".to_string()));

    let alpha = NumberingToken::parse("1a").expect("alpha token");
    assert_eq!(alpha.level(), 2);
    assert_eq!(alpha.key(), "1a");
    assert_eq!(alpha.parent_key(), Some("1".to_string()));

    assert_eq!(NumberingToken::parse("2.").map(|token| token.key()), Some("2".to_string()));
    assert!(NumberingToken::parse("plan").is_none());
    assert!(NumberingToken::parse("").is_none());

    let leading = NumberingToken::parse_leading("3.1 Is there an incident plan?");
    assert_eq!(leading.map(|token| token.key()), Some("3.1".to_string()));
    assert!(NumberingToken::parse_leading("Provide details").is_none());
}

#[test]
fn header_row_assigns_column_roles() {
    let text = pipe_sheet(&["3.1 | Is there an incident plan? | |"]);
    let report = analyze(&text, "Controls");

    let meta = &report.sheet_meta;
    assert_eq!(meta.header_row, Some(1));
    assert_eq!(meta.total_columns, 4);
    assert_eq!(meta.columns[0].role, ColumnRole::QuestionId);
    assert_eq!(meta.columns[1].role, ColumnRole::QuestionText);
    assert_eq!(meta.columns[2].role, ColumnRole::Response);
    assert_eq!(meta.columns[3].role, ColumnRole::Comment);
    assert_eq!(meta.data_start_row, 2);
}

#[test]
fn numbered_child_links_to_its_parent() {
    let text = pipe_sheet(&[
        "3.1 | Is there an incident plan? | |",
        "3.1.1 | Does it include recovery steps? | |",
    ]);
    let report = analyze(&text, "Incidents");

    assert_eq!(report.questions.len(), 2);
    assert_eq!(report.questions[0].id, "3.1");
    assert_eq!(report.questions[1].id, "3.1.1");
    assert_eq!(
        report.questions[1].parent_id.as_deref(),
        Some(report.questions[0].id.as_str())
    );
}

#[test]
fn orphan_numbering_becomes_root_with_ambiguity() {
    let text = pipe_sheet(&["5.2.1 | Is access logged? | |"]);
    let report = analyze(&text, "Access");

    assert_eq!(report.questions.len(), 1);
    assert_eq!(report.questions[0].id, "5.2.1");
    assert!(report.questions[0].parent_id.is_none());
    assert!(
        report
            .ambiguities
            .iter()
            .any(|note| note.contains("5.2.1") && note.contains("5.2"))
    );
}

#[test]
fn duplicate_ids_keep_first_occurrence_canonical() {
    let text = pipe_sheet(&[
        "1 | First question? | |",
        "1 | Repeated numbering? | |",
    ]);
    let report = analyze(&text, "Duplicates");

    assert_eq!(report.questions.len(), 2);
    assert_eq!(report.questions[0].id, "1");
    assert_eq!(report.questions[1].id, "Q2");
    assert_eq!(
        report.questions[1].numbering_token.as_deref(),
        Some("1")
    );
    assert!(
        report
            .ambiguities
            .iter()
            .any(|note| note.contains("duplicate question id 1"))
    );

    let canonical = report
        .questions
        .iter()
        .filter(|question| question.id == "1")
        .count();
    assert_eq!(canonical, 1);
}

#[test]
fn yes_no_na_partial_options_are_captured() {
    let text = pipe_sheet(&["1 | Is data encrypted at rest? (Yes/No/NA/Partial) | |"]);
    let report = analyze(&text, "Encryption");

    let question = &report.questions[0];
    assert_eq!(question.response_type, ResponseType::YesNoNaPartial);
    assert_eq!(question.options, vec!["Yes", "No", "NA", "Partial"]);
}

#[test]
fn response_rule_table_is_ordered() {
    let cases: &[(&str, ResponseType)] = &[
        ("Do you maintain a risk register? Y/N", ResponseType::YesNo),
        (
            "Is MFA enforced for all users? (Yes/No/NA/Partial)",
            ResponseType::YesNoNaPartial,
        ),
        (
            "What deployment model do you use? (Cloud/On-premise/Hybrid)",
            ResponseType::MultipleChoice,
        ),
        (
            "What is the expiry date of your certification?",
            ResponseType::DateValue,
        ),
        ("Describe your patching process.", ResponseType::FreeText),
        ("----", ResponseType::Unknown),
    ];

    for &(text, expected) in cases {
        let context = RuleContext {
            text,
            adjacent: &[],
        };
        let (response_type, _, _) = infer_response_type(&context);
        assert_eq!(response_type, expected, "text: {text}");
    }
}

#[test]
fn multiple_choice_options_come_from_adjacent_cells() {
    let text = "ID | Question | Response\n1 | Which regions host production data? | Americas, EMEA, APAC\n";
    let report = analyze(text, "Hosting");

    let question = &report.questions[0];
    assert_eq!(question.response_type, ResponseType::MultipleChoice);
    assert_eq!(question.options, vec!["Americas", "EMEA", "APAC"]);
}

#[test]
fn optional_marker_flips_required() {
    let text = pipe_sheet(&[
        "1 | Describe additional controls (optional). | |",
        "2 | Is there a breach notification process? | |",
    ]);
    let report = analyze(&text, "Controls");

    assert!(!report.questions[0].required);
    assert!(report.questions[1].required);
}

#[test]
fn conflicting_requirement_markers_are_flagged() {
    let text = pipe_sheet(&[
        "1 | This mandatory section covers optional add-on services you provide. | |",
    ]);
    let report = analyze(&text, "Services");

    assert!(report.questions[0].required);
    assert!(
        report
            .ambiguities
            .iter()
            .any(|note| note.contains("conflicting requirement markers"))
    );
}

#[test]
fn conditional_clauses_become_special_instructions() {
    let text = pipe_sheet(&[
        "1 | Do you subcontract data processing? Y/N | |",
        "1a | If yes, attach the list of subcontractors. | |",
    ]);
    let report = analyze(&text, "Subprocessing");

    let follow_up = &report.questions[1];
    assert_eq!(follow_up.parent_id.as_deref(), Some("1"));
    assert_eq!(
        follow_up.special_instructions,
        vec!["If yes, attach the list of subcontractors."]
    );
}

#[test]
fn cross_references_are_notes_not_parents() {
    let text = pipe_sheet(&[
        "1 | Do you hold an ISO 27001 certificate? Y/N | |",
        " | If no, proceed to question 4 and explain. | |",
    ]);
    let report = analyze(&text, "Certification");

    let question = &report.questions[1];
    assert_eq!(question.cross_references, vec!["4"]);
    // The conditional continuation nests under the predecessor, not under
    // the referenced question.
    assert_eq!(question.parent_id.as_deref(), Some("1"));
}

#[test]
fn cell_reference_sheet_builds_alpha_hierarchy() {
    let report = analyze(CELL_REF_SHEET, "AI Questionnaire");

    assert_eq!(report.sheet_meta.convention, TableConvention::CellReference);
    assert_eq!(report.questions.len(), 3);

    let ids = report
        .questions
        .iter()
        .map(|question| question.id.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(ids, vec!["1", "1a", "1b"]);

    assert_eq!(report.questions[0].location.row, 4);
    assert_eq!(report.questions[0].response_type, ResponseType::YesNo);
    assert_eq!(report.questions[1].parent_id.as_deref(), Some("1"));
    assert_eq!(report.questions[2].parent_id.as_deref(), Some("1"));
    assert_eq!(report.questions[1].cross_references, vec!["2"]);
}

#[test]
fn indented_follow_up_nests_under_predecessor() {
    let text = "Do you operate a security operations center?\n  Provide the date of the last tabletop exercise.\n";
    let report = analyze(text, "Operations");

    assert_eq!(report.questions.len(), 2);
    assert_eq!(report.questions[0].id, "Q1");
    assert_eq!(report.questions[1].parent_id.as_deref(), Some("Q1"));
    assert_eq!(report.questions[1].response_type, ResponseType::DateValue);
}

#[test]
fn missing_header_falls_back_to_column_a() {
    let text = "Describe your backup strategy.\nHow often are restores tested?\n";
    let report = analyze(text, "Backups");

    assert_eq!(report.sheet_meta.header_row, None);
    assert_eq!(report.questions.len(), 2);
    assert_eq!(report.questions[0].location.column, 0);
    assert!(
        report
            .ambiguities
            .iter()
            .any(|note| note.contains("no header row detected"))
    );
}

#[test]
fn empty_input_degrades_to_empty_report() {
    let report = analyze("", "Empty");

    assert!(report.questions.is_empty());
    assert!(!report.ambiguities.is_empty());
    assert_eq!(report.sheet_meta.total_rows, 0);

    let rendered = render(&report);
    for section in [
        "## SHEET OVERVIEW",
        "## HEADER STRUCTURE",
        "## QUESTION ANALYSIS",
        "## RESPONSE MAPPING",
        "## HIERARCHICAL STRUCTURE",
        "## SPECIAL INSTRUCTIONS",
        "## ANALYSIS NOTES",
        "## FILLING INSTRUCTIONS FOR LLM",
    ] {
        assert!(rendered.contains(section), "missing section {section}");
    }
}

#[test]
fn analyze_never_panics_on_hostile_input() {
    for text in [
        "|||||\n|||",
        "Row x\nZZ = \"\"",
        "\t\t\t",
        "1 | 2 | 3",
        "Row 1\nA1 = unquoted value",
        "🙂 | emoji | cells",
    ] {
        let report = analyze(text, "Fuzz");
        let _ = render(&report);
        let _ = render_guide(&report);
    }
}

#[test]
fn render_is_deterministic() {
    let text = pipe_sheet(&[
        "1 | Do you encrypt backups? Y/N | |",
        "1.1 | If yes, specify the algorithm. | |",
    ]);
    let report = analyze(&text, "Encryption");

    assert_eq!(render(&report), render(&report));
    assert_eq!(render_guide(&report), render_guide(&report));
}

#[test]
fn report_renders_every_question_once_in_document_order() {
    let text = pipe_sheet(&[
        "1 | First question? | |",
        "2 | Second question? | |",
        "2.1 | Third question? | |",
    ]);
    let report = analyze(&text, "Ordering");
    let rendered = render(&report);

    let mut last_offset = 0usize;
    for question in &report.questions {
        let needle = format!("### Question {}\n", question.id);
        let offset = rendered.find(&needle).expect("question rendered");
        assert!(offset >= last_offset, "question {} out of order", question.id);
        assert_eq!(rendered.matches(&needle).count(), 1);
        last_offset = offset;
    }
}

#[test]
fn report_coordinates_use_row_column_form() {
    let text = pipe_sheet(&["3.1 | Is there an incident plan? | |"]);
    let report = analyze(&text, "Incidents");
    let rendered = render(&report);

    assert!(rendered.contains("Row 2, Column B"));
    assert!(rendered.contains("fill Row 2, Column C"));
}

#[test]
fn ambiguities_render_verbatim() {
    let text = pipe_sheet(&["5.2.1 | Is access logged? | |"]);
    let report = analyze(&text, "Access");
    let rendered = render(&report);

    for ambiguity in &report.ambiguities {
        assert!(rendered.contains(ambiguity.as_str()));
    }
}

#[test]
fn hierarchy_invariant_holds_for_all_parents() {
    let text = pipe_sheet(&[
        "1 | Parent? | |",
        "1.1 | Child? | |",
        "1.1.1 | Grandchild? | |",
        "7.3 | Orphan? | |",
    ]);
    let report = analyze(&text, "Tree");

    for question in &report.questions {
        let Some(parent_id) = &question.parent_id else {
            continue;
        };
        let parent = report
            .questions
            .iter()
            .find(|candidate| candidate.id == *parent_id)
            .expect("parent exists in the same report");

        let child_level = question.id.split('.').count();
        let parent_level = parent.id.split('.').count();
        assert_eq!(child_level, parent_level + 1);
    }
}

#[test]
fn guide_lists_cell_locations_and_instructions() {
    let text = pipe_sheet(&["1 | Do you encrypt data in transit? Y/N | |"]);
    let report = analyze(&text, "Encryption");
    let guide = render_guide(&report);

    assert!(guide.contains("# QUESTIONS AND RESPONSE INSTRUCTIONS"));
    assert!(guide.contains("**Question:** Do you encrypt data in transit? Y/N"));
    assert!(guide.contains("**Cell Location:** C2"));
    assert!(guide.contains("Answer exactly \"Yes\" or \"No\". Write the answer in cell C2."));
}

#[test]
fn question_details_groups_batches_by_root() {
    let details = extract_question_details(CELL_REF_SHEET);

    assert_eq!(details.total_questions, 3);
    assert_eq!(details.batches.len(), 1);
    assert_eq!(details.batches[0].batch_id, 1);
    assert_eq!(details.batches[0].rows, vec![4, 5, 6]);
    assert!(details.metadata.has_hierarchical_structure);
    assert_eq!(details.response_columns, vec!["C"]);
}

#[test]
fn select_rows_reformats_requested_rows() {
    let selection = select_rows(CELL_REF_SHEET, &[4, 6]);
    let expected = "Row 4\nA4 = \"1\"\nB4 = \"Do you use AI models in your service? Y/N\"\nRow 6\nA6 = \"1b\"\nB6 = \"What are the intended use cases?\"";
    assert_eq!(selection, expected);

    assert_eq!(select_rows(CELL_REF_SHEET, &[99]), "");
}

#[test]
fn questions_in_column_lists_verbatim_texts() {
    let questions = questions_in_column(CELL_REF_SHEET, "B");
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0], "Do you use AI models in your service? Y/N");
    assert_eq!(questions[2], "What are the intended use cases?");

    assert!(questions_in_column(CELL_REF_SHEET, "9").is_empty());
}
