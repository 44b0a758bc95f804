use std::sync::OnceLock;

use regex::Regex;

use crate::model::TableConvention;

/// One non-empty grid position. `text` keeps the raw cell content so
/// indentation cues survive into hierarchy resolution.
#[derive(Debug, Clone)]
pub struct Cell {
    pub row: u32,
    pub column: usize,
    pub text: String,
}

impl Cell {
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }

    pub fn indent(&self) -> usize {
        self.text
            .chars()
            .take_while(|ch| ch.is_whitespace())
            .map(|ch| if ch == '\t' { 4 } else { 1 })
            .sum()
    }
}

/// Sparse cell grid for one sheet. Empty cells are omitted rather than stored
/// as blanks; row/column identify at most one cell.
#[derive(Debug, Clone)]
pub struct CellGrid {
    cells: Vec<Cell>,
    convention: TableConvention,
    max_row: u32,
    column_count: usize,
}

impl CellGrid {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn convention(&self) -> TableConvention {
        self.convention
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn total_rows(&self) -> u32 {
        self.max_row
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn cell(&self, row: u32, column: usize) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|cell| cell.row == row && cell.column == column)
    }

    pub fn cell_text(&self, row: u32, column: usize) -> Option<&str> {
        self.cell(row, column).map(Cell::trimmed)
    }

    pub fn row_cells(&self, row: u32) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(move |cell| cell.row == row)
    }

    /// Non-empty cells of one column, in row order.
    pub fn column_cells(&self, column: usize) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(move |cell| cell.column == column)
    }

    /// Distinct row numbers that carry at least one cell, ascending. Cells
    /// are kept sorted by (row, column).
    pub fn occupied_rows(&self) -> Vec<u32> {
        let mut rows = Vec::<u32>::new();
        for cell in &self.cells {
            if rows.last() != Some(&cell.row) {
                rows.push(cell.row);
            }
        }
        rows
    }
}

/// Convert a 0-based column index to Excel-style letters (0 -> A, 26 -> AA).
pub fn column_letter(column: usize) -> String {
    let mut letters = String::new();
    let mut value = column;
    loop {
        letters.insert(0, (b'A' + (value % 26) as u8) as char);
        if value < 26 {
            break;
        }
        value = value / 26 - 1;
    }
    letters
}

/// Parse Excel-style letters back to a 0-based column index.
pub fn column_index(letters: &str) -> Option<usize> {
    let trimmed = letters.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut value = 0usize;
    for ch in trimmed.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        value = value * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(value - 1)
}

fn row_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*Row\s+(\d+)\s*$").expect("row marker regex"))
}

fn cell_ref_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*([A-Za-z]{1,3})(\d+)\s*=\s*(.*)$"#).expect("cell ref regex")
    })
}

fn detect_convention(lines: &[&str]) -> (TableConvention, Option<String>) {
    let mut marker_lines = 0usize;
    let mut cell_ref_lines = 0usize;
    let mut pipe_lines = 0usize;
    let mut tab_lines = 0usize;
    let mut non_empty = 0usize;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        non_empty += 1;

        if row_marker_regex().is_match(line) {
            marker_lines += 1;
        } else if cell_ref_regex().is_match(line) {
            cell_ref_lines += 1;
        }

        if line.contains('|') {
            pipe_lines += 1;
        }
        if line.contains('\t') {
            tab_lines += 1;
        }
    }

    if non_empty == 0 {
        return (TableConvention::SingleColumn, None);
    }

    if cell_ref_lines > 0 && (marker_lines > 0 || cell_ref_lines * 2 >= non_empty) {
        return (TableConvention::CellReference, None);
    }

    if pipe_lines > 0 && pipe_lines >= tab_lines {
        let note = (tab_lines > 0).then(|| {
            format!(
                "mixed cell-delimiting conventions: {pipe_lines} line(s) use '|' and {tab_lines} line(s) use tabs; applying the pipe-delimited convention throughout"
            )
        });
        return (TableConvention::PipeDelimited, note);
    }

    if tab_lines > 0 {
        let note = (pipe_lines > 0).then(|| {
            format!(
                "mixed cell-delimiting conventions: {tab_lines} line(s) use tabs and {pipe_lines} line(s) use '|'; applying the tab-delimited convention throughout"
            )
        });
        return (TableConvention::TabDelimited, note);
    }

    (TableConvention::SingleColumn, None)
}

fn unquote(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

fn parse_cell_reference(lines: &[&str], ambiguities: &mut Vec<String>) -> Vec<Cell> {
    let mut cells = Vec::<Cell>::new();
    let mut unparsed_lines = 0usize;

    for line in lines {
        if line.trim().is_empty() || row_marker_regex().is_match(line) {
            continue;
        }

        let Some(captures) = cell_ref_regex().captures(line) else {
            unparsed_lines += 1;
            continue;
        };

        let letters = captures.get(1).map(|value| value.as_str()).unwrap_or("");
        let row = captures
            .get(2)
            .and_then(|value| value.as_str().parse::<u32>().ok());
        let text = captures.get(3).map(|value| value.as_str()).unwrap_or("");

        let (Some(column), Some(row)) = (column_index(letters), row) else {
            unparsed_lines += 1;
            continue;
        };

        let text = unquote(text);
        if text.trim().is_empty() {
            continue;
        }

        cells.push(Cell {
            row,
            column,
            text: text.to_string(),
        });
    }

    if unparsed_lines > 0 {
        ambiguities.push(format!(
            "{unparsed_lines} line(s) did not match the cell-reference convention and were skipped"
        ));
    }

    cells
}

fn parse_delimited(lines: &[&str], delimiter: char) -> Vec<Cell> {
    let mut cells = Vec::<Cell>::new();

    for (index, line) in lines.iter().enumerate() {
        let row = (index + 1) as u32;
        if line.trim().is_empty() {
            continue;
        }

        for (column, field) in line.split(delimiter).enumerate() {
            // Drop the single pad space that usually follows the delimiter;
            // deeper indentation is deliberate and stays measurable.
            let field = field.strip_prefix(' ').unwrap_or(field);
            if field.trim().is_empty() {
                continue;
            }

            let leading = &field[..field.len() - field.trim_start().len()];
            let text = format!("{leading}{}", unquote(field.trim()));

            cells.push(Cell { row, column, text });
        }
    }

    cells
}

fn parse_single_column(lines: &[&str]) -> Vec<Cell> {
    let mut cells = Vec::<Cell>::new();

    for (index, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        cells.push(Cell {
            row: (index + 1) as u32,
            column: 0,
            text: line.trim_end().to_string(),
        });
    }

    cells
}

/// Split raw table text into a sparse cell grid, applying one consistent
/// cell-delimiting convention for the whole call. Never fails: degenerate
/// input produces an empty grid plus ambiguity notes.
pub fn scan_grid(raw_table_text: &str) -> (CellGrid, Vec<String>) {
    let lines = raw_table_text.lines().collect::<Vec<&str>>();
    let mut ambiguities = Vec::<String>::new();

    let (convention, convention_note) = detect_convention(&lines);
    if let Some(note) = convention_note {
        ambiguities.push(note);
    }

    let cells = match convention {
        TableConvention::CellReference => parse_cell_reference(&lines, &mut ambiguities),
        TableConvention::PipeDelimited => parse_delimited(&lines, '|'),
        TableConvention::TabDelimited => parse_delimited(&lines, '\t'),
        TableConvention::SingleColumn => parse_single_column(&lines),
    };

    let max_row = cells.iter().map(|cell| cell.row).max().unwrap_or(0);
    let column_count = cells
        .iter()
        .map(|cell| cell.column + 1)
        .max()
        .unwrap_or(0);

    let mut grid = CellGrid {
        cells,
        convention,
        max_row,
        column_count,
    };
    grid.cells
        .sort_by(|left, right| (left.row, left.column).cmp(&(right.row, right.column)));
    // A position defined twice keeps its first definition.
    grid.cells
        .dedup_by(|current, kept| current.row == kept.row && current.column == kept.column);

    (grid, ambiguities)
}
