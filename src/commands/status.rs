use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::archive;
use crate::model::AnalysisRunManifest;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_path = args.cache_root.join("manifests").join("analysis_run.json");
    let db_path = args.cache_root.join(archive::DB_FILE_NAME);

    info!(cache_root = %args.cache_root.display(), "status requested");

    if manifest_path.exists() {
        let raw = fs::read(&manifest_path)
            .with_context(|| format!("failed to read {}", manifest_path.display()))?;
        let manifest: AnalysisRunManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", manifest_path.display()))?;

        info!(
            run_id = %manifest.run_id,
            generated_at = %manifest.generated_at,
            sheet = %manifest.sheet_name,
            convention = %manifest.convention,
            questions = manifest.counts.questions_total,
            ambiguities = manifest.counts.ambiguity_count,
            "loaded run manifest"
        );
    } else {
        warn!(path = %manifest_path.display(), "run manifest missing");
    }

    if db_path.exists() {
        let connection = archive::open_archive(&db_path)?;
        let summary = archive::summarize(&connection)?;

        info!(
            path = %db_path.display(),
            runs = summary.runs,
            questions = summary.questions,
            last_run_id = %summary.last_run_id.unwrap_or_default(),
            last_generated_at = %summary.last_generated_at.unwrap_or_default(),
            "archive status"
        );
    } else {
        warn!(path = %db_path.display(), "archive database missing");
    }

    Ok(())
}
