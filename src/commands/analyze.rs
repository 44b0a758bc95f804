use std::fs;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::analyzer;
use crate::cli::{AnalyzeArgs, ReportFormat};
use crate::commands::archive;
use crate::model::{AnalysisCounts, AnalysisRunManifest, MANIFEST_VERSION};
use crate::util::{
    now_utc_string, read_table_text, sha256_text, slugify, utc_compact_string, write_json_pretty,
};

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let raw_table_text = read_table_text(&args.input)?;

    let sheet_name = args
        .sheet_name
        .clone()
        .or_else(|| {
            args.input
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
        })
        .filter(|name| name != "-")
        .unwrap_or_else(|| "Sheet1".to_string());

    let report = analyzer::analyze(&raw_table_text, &sheet_name);

    info!(
        sheet = %sheet_name,
        convention = report.sheet_meta.convention.as_str(),
        questions = report.questions.len(),
        ambiguities = report.ambiguities.len(),
        "analysis complete"
    );

    let rendered = match args.format {
        ReportFormat::Text => analyzer::render(&report),
        ReportFormat::Guide => analyzer::render_guide(&report),
        ReportFormat::Json => {
            let mut json = serde_json::to_string_pretty(&report)
                .context("failed to serialize analysis report")?;
            json.push('\n');
            json
        }
    };

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                crate::util::ensure_directory(parent)?;
            }
            fs::write(path, &rendered)
                .with_context(|| format!("failed to write report: {}", path.display()))?;
            info!(path = %path.display(), format = args.format.as_str(), "report written");
        }
        None => print!("{rendered}"),
    }

    if !args.no_archive {
        let run_id = format!("{}-{}", slugify(&sheet_name), utc_compact_string(Utc::now()));
        let manifest = AnalysisRunManifest {
            manifest_version: MANIFEST_VERSION,
            run_id,
            generated_at: now_utc_string(),
            sheet_name: sheet_name.clone(),
            source_path: args.input.display().to_string(),
            source_sha256: sha256_text(&raw_table_text),
            convention: report.sheet_meta.convention.as_str().to_string(),
            counts: AnalysisCounts::from_report(&report),
            ambiguities: report.ambiguities.clone(),
        };

        let manifest_path = args.cache_root.join("manifests").join("analysis_run.json");
        write_json_pretty(&manifest_path, &manifest)?;

        let db_path = args.cache_root.join(archive::DB_FILE_NAME);
        let mut connection = archive::open_archive(&db_path)?;
        let report_text = analyzer::render(&report);
        archive::record_run(&mut connection, &manifest, &report, &report_text)?;

        info!(
            run_id = %manifest.run_id,
            manifest = %manifest_path.display(),
            db = %db_path.display(),
            "run archived"
        );
    }

    Ok(())
}
