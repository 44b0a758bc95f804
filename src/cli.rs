use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "sheetscan",
    version,
    about = "Questionnaire sheet structure analysis tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Analyze(AnalyzeArgs),
    Extract(ExtractArgs),
    Rows(RowsArgs),
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
    Guide,
}

impl ReportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Guide => "guide",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Table text file, or '-' for stdin.
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub sheet_name: Option<String>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value = ".cache/sheetscan")]
    pub cache_root: PathBuf,

    #[arg(long, default_value_t = false)]
    pub no_archive: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Table text file, or '-' for stdin.
    #[arg(long)]
    pub input: PathBuf,

    /// List verbatim question texts from this column instead of emitting the
    /// structured record.
    #[arg(long)]
    pub column: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RowsArgs {
    /// Table text file, or '-' for stdin.
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long = "row", required = true)]
    pub rows: Vec<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/sheetscan")]
    pub cache_root: PathBuf,
}
