#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for monthly report extraction.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use monthly_report_cli_utils::{IndicatifProgress, init_logger};
use monthly_report_extract::registry::registry;
use monthly_report_extract::{DocumentResult, ExtractOptions, Pipeline};
use monthly_report_extract_models::COLUMNS;
use monthly_report_ingest::{BatchSummary, IngestRequest, ingest};
use monthly_report_pdf::{PopplerTools, TesseractRecognizer, TextRecognizer};

#[derive(Parser)]
#[command(
    name = "monthly_report_ingest",
    about = "Extract school monthly compliance reports into a spreadsheet"
)]
struct Cli {
    /// Show per-field and per-rule diagnostics (ignored when `RUST_LOG` is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// External tool locations and the OCR toggle.
#[derive(Args)]
struct ToolArgs {
    /// `pdftotext` executable used for the page layout
    #[arg(long, env = "MONTHLY_REPORT_PDFTOTEXT", default_value = "pdftotext")]
    pdftotext: PathBuf,
    /// `pdftoppm` executable used to render pages for OCR
    #[arg(long, env = "MONTHLY_REPORT_PDFTOPPM", default_value = "pdftoppm")]
    pdftoppm: PathBuf,
    /// `tesseract` executable
    #[arg(long, env = "MONTHLY_REPORT_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,
    /// Skip OCR and use only the fixed layout offsets
    #[arg(long)]
    no_ocr: bool,
}

impl ToolArgs {
    fn poppler(&self) -> PopplerTools {
        PopplerTools {
            pdftotext: self.pdftotext.clone(),
            pdftoppm: self.pdftoppm.clone(),
        }
    }

    fn options(&self) -> ExtractOptions {
        ExtractOptions {
            use_ocr: !self.no_ocr,
            ..ExtractOptions::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every report in the given PDFs, directories and ZIP archives
    Run {
        /// PDF files, directories of PDFs, or ZIP archives
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output CSV (default: `monthly_report_data_<timestamp>.csv`)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Append to the output file instead of replacing it
        #[arg(long, requires = "output")]
        append: bool,
        #[command(flatten)]
        tools: ToolArgs,
    },
    /// Show the extracted record and rows for a single report
    Inspect {
        /// Report PDF
        pdf: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        tools: ToolArgs,
    },
    /// List schools with special handling
    Schools,
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("Documents: {}", summary.total);
    println!("Succeeded: {}", summary.succeeded);
    println!("Failed:    {}", summary.failed.len());
    println!("Rows:      {}", summary.rows.len());
    if let Some(output) = &summary.output {
        println!("Output:    {}", output.display());
    }

    if !summary.failed.is_empty() {
        println!();
        println!("Failed documents:");
        for failure in &summary.failed {
            println!("  {}: {}", failure.document, failure.error);
        }
    }
}

fn print_result(result: &DocumentResult) {
    let record = &result.record;
    println!("Document: {}", result.document);
    println!("School:   {}", record.name());
    println!("Combined: {}", record.is_both());
    println!("Source:   {}", result.source);
    println!();

    println!("{:<10} VALUE", "FIELD");
    println!("{}", "-".repeat(20));
    for (label, value) in record.fields() {
        let value = value.map_or_else(|| "-".to_owned(), |v| v.to_string());
        println!("{:<10} {value}", label.to_string());
    }
    println!();

    println!("{}", COLUMNS.join(","));
    for row in &result.rows {
        println!("{}", row.cells().join(","));
    }
}

fn print_schools() {
    println!("{:<45} {:<9} CORRECTIONS", "SCHOOL", "COMBINED");
    println!("{}", "-".repeat(70));
    for school in registry().schools() {
        println!(
            "{:<45} {:<9} {}",
            school.name,
            if school.combined { "yes" } else { "no" },
            school.corrections_summary()
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let multi = init_logger(cli.verbose);

    match cli.command {
        Commands::Run {
            inputs,
            output,
            append,
            tools,
        } => {
            let request = IngestRequest {
                inputs,
                output,
                append,
                options: tools.options(),
                tools: tools.poppler(),
                tesseract: tools.tesseract.clone(),
            };

            let progress = IndicatifProgress::documents_bar(&multi);
            let summary = ingest(&request, &progress)?;
            print_summary(&summary);
        }
        Commands::Inspect { pdf, json, tools } => {
            let recognizer = TesseractRecognizer::new(&tools.tesseract);
            let recognizer: Option<&dyn TextRecognizer> = Some(&recognizer);
            let pipeline = Pipeline::new(tools.options(), recognizer);

            let result = pipeline.process_file(&pdf, &tools.poppler())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
        }
        Commands::Schools => print_schools(),
    }

    Ok(())
}
