use crate::analyzer::grid::{column_index, column_letter, scan_grid};

/// Re-render a subset of rows in the row-wise cell-reference format, for
/// follow-up prompting over just those rows. Rows absent from the grid are
/// skipped silently.
pub fn select_rows(raw_table_text: &str, rows: &[u32]) -> String {
    let (grid, _) = scan_grid(raw_table_text);
    let mut out_lines = Vec::<String>::new();

    for row in rows {
        let cells = grid.row_cells(*row).collect::<Vec<_>>();
        if cells.is_empty() {
            continue;
        }

        out_lines.push(format!("Row {row}"));
        for cell in cells {
            out_lines.push(format!(
                "{}{} = \"{}\"",
                column_letter(cell.column),
                cell.row,
                cell.trimmed()
            ));
        }
    }

    out_lines.join("\n")
}

/// Verbatim texts of all non-empty cells in one column, in row order. An
/// unparseable column reference yields an empty list.
pub fn questions_in_column(raw_table_text: &str, column: &str) -> Vec<String> {
    let Some(column) = column_index(column) else {
        return Vec::new();
    };

    let (grid, _) = scan_grid(raw_table_text);
    grid.column_cells(column)
        .map(|cell| cell.trimmed().to_string())
        .collect()
}
