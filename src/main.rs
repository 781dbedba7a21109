// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Parser, Subcommand};
use pdf_search::utils::logging::{format_error, format_success, format_warning, init_logger};
use pdf_search::{
    Config, ElasticClient, ExtractionMethod, JsonExporter, PipelineError, PipelineOrchestrator,
    TextExtractor, Validator,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pdf_search")]
#[command(version = "0.1.0")]
#[command(about = "Index PDF documents into Elasticsearch and search them", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a PDF (OCR for scanned pages) and index it
    Upload {
        /// Path to the PDF file
        pdf_path: PathBuf,
    },

    /// Fuzzy full-text search over indexed documents
    Search {
        /// Search words, joined with spaces
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        query: Vec<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    colored::control::set_override(cli.color);
    init_logger(cli.color, cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", format_error(&format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if let Commands::Upload { pdf_path } = &cli.command {
        // checked before the backend is contacted
        if let Err(e) = Validator::validate_file_path(pdf_path) {
            eprintln!("{}", format_error(&e.to_string()));
            return Ok(ExitCode::FAILURE);
        }
    }

    info!("Loading configuration from: {}", cli.config.display());
    if !cli.config.exists() {
        warn!(
            "Config file {} not found, using defaults and environment",
            cli.config.display()
        );
    }
    let config = Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?;

    let client =
        ElasticClient::new(config.backend.clone()).context("Failed to create search client")?;
    client
        .ping()
        .await
        .with_context(|| format!("Search backend at {} is not available", client.endpoint()))?;

    let orchestrator = PipelineOrchestrator::new(&config, &client);

    match cli.command {
        Commands::Upload { pdf_path } => cmd_upload(&config, &orchestrator, &pdf_path).await,
        Commands::Search { query } => cmd_search(&config, &orchestrator, &query.join(" ")).await,
    }
}

async fn cmd_upload(
    config: &Config,
    orchestrator: &PipelineOrchestrator<'_>,
    pdf_path: &Path,
) -> Result<ExitCode> {
    info!("Uploading {}", pdf_path.display());

    let extractor = TextExtractor::from_config(&config.extraction);

    match orchestrator.upload(pdf_path, extractor).await {
        Ok(report) => {
            if report.extraction.is_empty() {
                eprintln!(
                    "{}",
                    format_warning("No text could be extracted; indexed an empty document")
                );
            } else if report.extraction.method == ExtractionMethod::Ocr {
                info!("Text recovered with OCR");
            }

            println!(
                "{}",
                format_success(&format!(
                    "PDF uploaded and indexed successfully: {} (id {})",
                    report.record.filename, report.document_id
                ))
            );
            Ok(ExitCode::SUCCESS)
        }
        // reported but not fatal; the document is simply not indexed
        Err(e @ PipelineError::IndexSubmit { .. }) => {
            eprintln!("{}", format_error(&e.to_string()));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Err(e).context("Upload failed"),
    }
}

async fn cmd_search(
    config: &Config,
    orchestrator: &PipelineOrchestrator<'_>,
    query: &str,
) -> Result<ExitCode> {
    let results = orchestrator
        .search(query)
        .await
        .context("Search failed")?;

    if results.is_empty() {
        println!("No results found.");
        return Ok(ExitCode::FAILURE);
    }

    let rendered = JsonExporter::new(config.search.snippet_length)
        .render(&results)
        .context("Failed to render results")?;
    println!("{}", rendered);

    Ok(ExitCode::SUCCESS)
}
