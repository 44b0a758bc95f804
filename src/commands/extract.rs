use anyhow::{Context, Result};
use tracing::info;

use crate::analyzer;
use crate::cli::ExtractArgs;
use crate::util::read_table_text;

pub fn run(args: ExtractArgs) -> Result<()> {
    let raw_table_text = read_table_text(&args.input)?;

    if let Some(column) = &args.column {
        let questions = analyzer::questions_in_column(&raw_table_text, column);
        info!(column = %column, questions = questions.len(), "column extraction complete");
        for question in questions {
            println!("{question}");
        }
        return Ok(());
    }

    let details = analyzer::extract_question_details(&raw_table_text);
    info!(
        questions = details.total_questions,
        batches = details.batches.len(),
        "question details extracted"
    );

    let json = serde_json::to_string_pretty(&details)
        .context("failed to serialize question details")?;
    println!("{json}");

    Ok(())
}
