use crate::analyzer::grid::{CellGrid, column_letter};
use crate::analyzer::hierarchy::NumberingToken;
use crate::analyzer::options::AnalyzerOptions;
use crate::model::{ColumnInfo, ColumnRole, SheetMeta};

/// Resolved layout for one sheet: the immutable `SheetMeta` plus the column
/// assignments the extractor works from.
#[derive(Debug, Clone)]
pub struct LayoutAnalysis {
    pub meta: SheetMeta,
    pub question_column: Option<usize>,
    pub id_column: Option<usize>,
    pub response_column: Option<usize>,
    pub comment_columns: Vec<usize>,
    pub note_columns: Vec<usize>,
}

fn detect_header_row(
    grid: &CellGrid,
    options: &AnalyzerOptions,
) -> Option<(u32, Vec<(usize, ColumnRole, String)>)> {
    for row in grid.occupied_rows() {
        let mut matches = Vec::<(usize, ColumnRole, String)>::new();

        for cell in grid.row_cells(row) {
            let role = options.match_role(cell.trimmed());
            if role != ColumnRole::Unknown {
                matches.push((cell.column, role, cell.trimmed().to_string()));
            }
        }

        let distinct_columns = {
            let mut columns = matches.iter().map(|entry| entry.0).collect::<Vec<usize>>();
            columns.dedup();
            columns.len()
        };

        if distinct_columns >= options.min_header_matches {
            return Some((row, matches));
        }
    }

    None
}

fn column_is_numbering(grid: &CellGrid, column: usize, data_start: u32, threshold: f64) -> bool {
    let mut total = 0usize;
    let mut tokens = 0usize;

    for cell in grid.column_cells(column) {
        if cell.row < data_start {
            continue;
        }
        total += 1;
        if NumberingToken::parse(cell.trimmed()).is_some() {
            tokens += 1;
        }
    }

    total > 0 && (tokens as f64) / (total as f64) >= threshold
}

fn first_data_column(grid: &CellGrid, data_start: u32, skip: &[usize]) -> Option<usize> {
    for column in 0..grid.column_count() {
        if skip.contains(&column) {
            continue;
        }
        if grid
            .column_cells(column)
            .any(|cell| cell.row >= data_start)
        {
            return Some(column);
        }
    }
    None
}

/// Assign roles to columns and derive the sheet metadata. Header-less sheets
/// fall back to positional defaults with a recorded ambiguity.
pub fn analyze_layout(
    grid: &CellGrid,
    sheet_name: &str,
    options: &AnalyzerOptions,
    ambiguities: &mut Vec<String>,
) -> LayoutAnalysis {
    let column_count = grid.column_count();
    let mut roles = vec![ColumnRole::Unknown; column_count];
    let mut header_texts = vec![None::<String>; column_count];

    let header = detect_header_row(grid, options);
    let header_row = header.as_ref().map(|(row, _)| *row);

    if let Some((row, matches)) = &header {
        for cell in grid.row_cells(*row) {
            header_texts[cell.column] = Some(cell.trimmed().to_string());
        }
        for (column, role, _) in matches {
            if roles[*column] == ColumnRole::Unknown {
                roles[*column] = *role;
            }
        }
    }

    let data_start_guess = header_row.map(|row| row + 1).unwrap_or(1);

    // Data-driven refinement: a column full of numbering tokens is an id
    // column no matter what its header said.
    for column in 0..column_count {
        if matches!(roles[column], ColumnRole::Unknown | ColumnRole::QuestionText)
            && column_is_numbering(grid, column, data_start_guess, options.id_column_threshold)
        {
            roles[column] = ColumnRole::QuestionId;
        }
    }

    let id_column = roles.iter().position(|role| *role == ColumnRole::QuestionId);
    let mut question_column = roles
        .iter()
        .position(|role| *role == ColumnRole::QuestionText);
    let mut response_column = roles.iter().position(|role| *role == ColumnRole::Response);

    if question_column.is_none() && !grid.is_empty() {
        let skip = roles
            .iter()
            .enumerate()
            .filter(|(_, role)| **role == ColumnRole::QuestionId)
            .map(|(column, _)| column)
            .collect::<Vec<usize>>();
        question_column = first_data_column(grid, data_start_guess, &skip);

        if let Some(column) = question_column {
            roles[column] = ColumnRole::QuestionText;

            if response_column.is_none() {
                response_column = ((column + 1)..column_count).find(|candidate| {
                    grid.column_cells(*candidate)
                        .any(|cell| cell.row >= data_start_guess)
                });
                if let Some(candidate) = response_column {
                    if roles[candidate] == ColumnRole::Unknown {
                        roles[candidate] = ColumnRole::Response;
                    }
                }
            }

            if header_row.is_none() {
                let response_text = response_column
                    .map(|candidate| {
                        format!("Column {} as responses", column_letter(candidate))
                    })
                    .unwrap_or_else(|| "found no response column".to_string());
                ambiguities.push(format!(
                    "no header row detected; treating Column {} as question text and {}",
                    column_letter(column),
                    response_text
                ));
            } else {
                ambiguities.push(format!(
                    "header row did not identify a question column; treating Column {} as question text",
                    column_letter(column)
                ));
            }
        }
    }

    let comment_columns = roles
        .iter()
        .enumerate()
        .filter(|(_, role)| **role == ColumnRole::Comment)
        .map(|(column, _)| column)
        .collect::<Vec<usize>>();
    let note_columns = roles
        .iter()
        .enumerate()
        .filter(|(_, role)| **role == ColumnRole::Note)
        .map(|(column, _)| column)
        .collect::<Vec<usize>>();

    let data_start_row = question_column
        .and_then(|column| {
            grid.column_cells(column)
                .map(|cell| cell.row)
                .find(|row| *row >= data_start_guess)
        })
        .unwrap_or(data_start_guess);

    let columns = (0..column_count)
        .map(|column| ColumnInfo {
            column,
            letter: column_letter(column),
            role: roles[column],
            header_text: header_texts[column].clone(),
        })
        .collect::<Vec<ColumnInfo>>();

    let meta = SheetMeta {
        sheet_name: sheet_name.to_string(),
        convention: grid.convention(),
        total_rows: grid.total_rows(),
        total_columns: column_count,
        header_row,
        data_start_row,
        columns,
    };

    LayoutAnalysis {
        meta,
        question_column,
        id_column,
        response_column,
        comment_columns,
        note_columns,
    }
}
