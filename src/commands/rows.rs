use anyhow::Result;
use tracing::info;

use crate::analyzer;
use crate::cli::RowsArgs;
use crate::util::read_table_text;

pub fn run(args: RowsArgs) -> Result<()> {
    let raw_table_text = read_table_text(&args.input)?;

    let selection = analyzer::select_rows(&raw_table_text, &args.rows);
    info!(requested = args.rows.len(), "row selection complete");

    if !selection.is_empty() {
        println!("{selection}");
    }

    Ok(())
}
