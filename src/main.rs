use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use stock_sync::config::{CompanyRenamePolicy, SimilarityKind};
use stock_sync::model::{Diagnostics, Severity, Table};
use stock_sync::tidy::{TidySpec, tidy};
use stock_sync::{Pipeline, PipelineConfig, PipelineOutcome, Result, ToolError};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stock_sync=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Merge(args) => execute_merge(args),
    }
}

fn execute_merge(args: MergeArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let outcome = Pipeline::new(config)?.run(&args.dir)?;

    let (table, mut diagnostics) = match outcome {
        PipelineOutcome::Completed { table, diagnostics } => (table, diagnostics),
        aborted @ PipelineOutcome::Aborted { .. } => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&aborted)?);
            }
            return aborted.into_result().map(|_| ());
        }
    };

    let table = if args.tidy {
        tidy(&table, &TidySpec::default(), &mut diagnostics)?
    } else {
        table
    };

    if args.json {
        let report = Report {
            status: "completed",
            rows: table.row_count(),
            columns: table.column_names(),
            diagnostics: &diagnostics,
            table: &table,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&table, &diagnostics);
    }
    Ok(())
}

fn print_summary(table: &Table, diagnostics: &Diagnostics) {
    println!(
        "merged {} rows x {} columns",
        table.row_count(),
        table.column_count()
    );
    println!("columns: {}", table.column_names().join(" | "));
    println!(
        "diagnostics: {} info, {} warnings, {} errors",
        diagnostics.count(Severity::Info),
        diagnostics.count(Severity::Warning),
        diagnostics.count(Severity::Error)
    );
}

#[derive(Serialize)]
struct Report<'a> {
    status: &'static str,
    rows: usize,
    columns: Vec<&'a str>,
    diagnostics: &'a Diagnostics,
    table: &'a Table,
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Reconcile and merge market-data exports into one table."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge the six source exports found in a folder.
    Merge(MergeArgs),
}

#[derive(clap::Args)]
struct MergeArgs {
    /// Folder holding the CSV exports.
    #[arg(long, default_value = "playground")]
    dir: PathBuf,

    /// Optional JSON configuration overriding keywords, columns and joins.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Refuse to guess when several columns look like a company name.
    #[arg(long)]
    strict_company: bool,

    /// Acceptance threshold for approximate file matches.
    #[arg(long)]
    threshold: Option<f64>,

    /// Similarity algorithm for approximate file matches.
    #[arg(long, value_enum)]
    similarity: Option<SimilarityArg>,

    /// Reduce the merged table to the presentation columns.
    #[arg(long)]
    tidy: bool,

    /// Print a JSON report including the merged table.
    #[arg(long)]
    json: bool,
}

impl MergeArgs {
    fn resolve_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if self.strict_company {
            config.company_policy = CompanyRenamePolicy::Strict;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(similarity) = self.similarity {
            config.similarity = similarity.into();
        }
        Ok(config)
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SimilarityArg {
    Levenshtein,
    JaroWinkler,
}

impl From<SimilarityArg> for SimilarityKind {
    fn from(kind: SimilarityArg) -> Self {
        match kind {
            SimilarityArg::Levenshtein => SimilarityKind::NormalizedLevenshtein,
            SimilarityArg::JaroWinkler => SimilarityKind::JaroWinkler,
        }
    }
}
