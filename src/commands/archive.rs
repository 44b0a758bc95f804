use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::model::{AnalysisReport, AnalysisRunManifest};
use crate::util::now_utc_string;

pub const DB_SCHEMA_VERSION: &str = "0.1.0";
pub const DB_FILE_NAME: &str = "sheetscan_archive.sqlite";

pub fn open_archive(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        crate::util::ensure_directory(parent)?;
    }

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open archive database: {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS runs (
          run_id TEXT PRIMARY KEY,
          sheet_name TEXT NOT NULL,
          source_path TEXT NOT NULL,
          source_sha256 TEXT NOT NULL,
          convention TEXT NOT NULL,
          generated_at TEXT NOT NULL,
          total_rows INTEGER NOT NULL,
          total_columns INTEGER NOT NULL,
          questions_total INTEGER NOT NULL,
          ambiguity_count INTEGER NOT NULL,
          report_text TEXT NOT NULL,
          manifest_json TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS questions (
          run_id TEXT NOT NULL,
          question_id TEXT NOT NULL,
          row INTEGER NOT NULL,
          column INTEGER NOT NULL,
          text TEXT NOT NULL,
          response_type TEXT NOT NULL,
          response_row INTEGER,
          response_column INTEGER,
          required INTEGER NOT NULL,
          parent_id TEXT,
          PRIMARY KEY (run_id, question_id),
          FOREIGN KEY (run_id) REFERENCES runs(run_id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_questions_run ON questions(run_id);
        CREATE INDEX IF NOT EXISTS idx_runs_sheet ON runs(sheet_name, generated_at);
        ",
    )?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}

pub fn record_run(
    connection: &mut Connection,
    manifest: &AnalysisRunManifest,
    report: &AnalysisReport,
    report_text: &str,
) -> Result<()> {
    let manifest_json =
        serde_json::to_string(manifest).context("failed to serialize run manifest")?;

    let tx = connection.transaction()?;

    tx.execute(
        "
        INSERT INTO runs(run_id, sheet_name, source_path, source_sha256, convention,
                         generated_at, total_rows, total_columns, questions_total,
                         ambiguity_count, report_text, manifest_json)
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(run_id) DO UPDATE SET
          sheet_name=excluded.sheet_name,
          source_path=excluded.source_path,
          source_sha256=excluded.source_sha256,
          convention=excluded.convention,
          generated_at=excluded.generated_at,
          total_rows=excluded.total_rows,
          total_columns=excluded.total_columns,
          questions_total=excluded.questions_total,
          ambiguity_count=excluded.ambiguity_count,
          report_text=excluded.report_text,
          manifest_json=excluded.manifest_json
        ",
        params![
            manifest.run_id,
            manifest.sheet_name,
            manifest.source_path,
            manifest.source_sha256,
            manifest.convention,
            manifest.generated_at,
            manifest.counts.total_rows,
            manifest.counts.total_columns as i64,
            manifest.counts.questions_total as i64,
            manifest.counts.ambiguity_count as i64,
            report_text,
            manifest_json,
        ],
    )?;

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO questions(run_id, question_id, row, column, text, response_type,
                                  response_row, response_column, required, parent_id)
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(run_id, question_id) DO UPDATE SET
              row=excluded.row,
              column=excluded.column,
              text=excluded.text,
              response_type=excluded.response_type,
              response_row=excluded.response_row,
              response_column=excluded.response_column,
              required=excluded.required,
              parent_id=excluded.parent_id
            ",
        )?;

        for question in &report.questions {
            statement.execute(params![
                manifest.run_id,
                question.id,
                question.location.row,
                question.location.column as i64,
                question.text,
                question.response_type.as_str(),
                question.response_location.map(|location| location.row),
                question
                    .response_location
                    .map(|location| location.column as i64),
                question.required as i64,
                question.parent_id,
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct ArchiveSummary {
    pub runs: i64,
    pub questions: i64,
    pub last_run_id: Option<String>,
    pub last_generated_at: Option<String>,
}

pub fn summarize(connection: &Connection) -> Result<ArchiveSummary> {
    let runs = query_count(connection, "SELECT COUNT(*) FROM runs")?;
    let questions = query_count(connection, "SELECT COUNT(*) FROM questions")?;

    let last = connection
        .query_row(
            "SELECT run_id, generated_at FROM runs ORDER BY generated_at DESC LIMIT 1",
            [],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .map(Some)
        .or_else(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;

    Ok(ArchiveSummary {
        runs,
        questions,
        last_run_id: last.as_ref().map(|(run_id, _)| run_id.clone()),
        last_generated_at: last.map(|(_, generated_at)| generated_at),
    })
}

fn query_count(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer;
    use crate::model::{AnalysisCounts, AnalysisRunManifest, MANIFEST_VERSION};

    fn sample_manifest(report: &AnalysisReport) -> AnalysisRunManifest {
        AnalysisRunManifest {
            manifest_version: MANIFEST_VERSION,
            run_id: "vendor_sheet-20260101T000000Z".to_string(),
            generated_at: "2026-01-01T00:00:00Z".to_string(),
            sheet_name: report.sheet_meta.sheet_name.clone(),
            source_path: "questionnaire.txt".to_string(),
            source_sha256: "deadbeef".to_string(),
            convention: report.sheet_meta.convention.as_str().to_string(),
            counts: AnalysisCounts::from_report(report),
            ambiguities: report.ambiguities.clone(),
        }
    }

    #[test]
    fn record_run_round_trips_counts() {
        let text = "ID | Question | Response\n1 | Is encryption enabled? (Yes/No) |\n1.1 | Which algorithm is used? |\n";
        let report = analyzer::analyze(text, "Security");
        let manifest = sample_manifest(&report);
        let rendered = analyzer::render(&report);

        let mut connection = Connection::open_in_memory().expect("open in-memory db");
        configure_connection(&connection).expect("configure");
        ensure_schema(&connection).expect("schema");

        record_run(&mut connection, &manifest, &report, &rendered).expect("record run");

        let summary = summarize(&connection).expect("summarize");
        assert_eq!(summary.runs, 1);
        assert_eq!(summary.questions, report.questions.len() as i64);
        assert_eq!(summary.last_run_id.as_deref(), Some(manifest.run_id.as_str()));
    }

    #[test]
    fn record_run_is_idempotent_per_run_id() {
        let text = "ID | Question | Response\n1 | Is there a policy? (Yes/No) |\n";
        let report = analyzer::analyze(text, "Policies");
        let manifest = sample_manifest(&report);
        let rendered = analyzer::render(&report);

        let mut connection = Connection::open_in_memory().expect("open in-memory db");
        configure_connection(&connection).expect("configure");
        ensure_schema(&connection).expect("schema");

        record_run(&mut connection, &manifest, &report, &rendered).expect("first record");
        record_run(&mut connection, &manifest, &report, &rendered).expect("second record");

        let summary = summarize(&connection).expect("summarize");
        assert_eq!(summary.runs, 1);
        assert_eq!(summary.questions, report.questions.len() as i64);
    }
}
