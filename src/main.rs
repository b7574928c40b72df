//! bookflat - flatten ebooks into single-file outputs

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use bookflat::{
    BatchStatus, ConversionRequest, OutputFormat, RenderOptions, convert_batch, convert_file,
};

#[derive(Parser)]
#[command(name = "bookflat")]
#[command(version, about = "Flatten ebooks into text, Markdown, HTML, PDF, or DOCX", long_about = None)]
#[command(after_help = "EXAMPLES:
    bookflat book.epub --to text          Write book_flat.txt beside the source
    bookflat book.mobi --to pdf           Bridge through ebook-convert, then render
    bookflat a.epub b.epub --to markdown  Convert a batch
    bookflat book.epub --to html -o out.html")]
struct Cli {
    /// Input files (EPUB, MOBI, AZW, AZW3, KFX, CBZ)
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Target format
    #[arg(long = "to", value_enum, value_name = "FORMAT")]
    format: OutputFormat,

    /// Output path (single input only; default is <stem>_flat.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Prefix text/Markdown output with a title/author/timestamp header
    #[arg(long)]
    document_header: bool,

    /// Promote long untagged lines to headings in Markdown output
    #[arg(long)]
    heuristic_headings: bool,

    /// Emit a JSON report of per-file outcomes on stdout
    #[arg(long)]
    json: bool,

    /// Suppress progress messages
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Serialize)]
struct FileReport {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'static str>,
}

#[derive(Serialize)]
struct BatchReport {
    total: usize,
    succeeded: usize,
    failed: usize,
    files: Vec<FileReport>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if cli.quiet { "error" } else { "info" })
        }))
        .with_writer(std::io::stderr)
        .init();

    if cli.output.is_some() && cli.inputs.len() > 1 {
        eprintln!("error: --output requires exactly one input");
        return ExitCode::FAILURE;
    }

    let options = RenderOptions {
        document_header: cli.document_header,
        heuristic_headings: cli.heuristic_headings,
        timestamp: None,
    };

    // Single input with an explicit output path skips batch bookkeeping.
    if let Some(output) = &cli.output {
        let input = &cli.inputs[0];
        let request = ConversionRequest::new(input, cli.format).with_output(output);
        return match convert_file(&request, &options) {
            Ok(()) => {
                report_single(&cli, input, output, None);
                ExitCode::SUCCESS
            }
            Err(e) => {
                report_single(&cli, input, output, Some(&e));
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let result = convert_batch(&cli.inputs, cli.format, &options);

    if cli.json {
        print_json_report(&result);
    } else if !cli.quiet {
        for (input, output) in &result.succeeded {
            println!("{} -> {}", input.display(), output.display());
        }
        for (input, error) in &result.failed {
            eprintln!("{}: {error}", input.display());
        }
        eprintln!("{}", result.summary());
    }

    match result.status() {
        BatchStatus::AllSucceeded | BatchStatus::Empty => ExitCode::SUCCESS,
        BatchStatus::Partial | BatchStatus::AllFailed => ExitCode::FAILURE,
    }
}

fn report_single(cli: &Cli, input: &PathBuf, output: &PathBuf, error: Option<&bookflat::Error>) {
    if cli.json {
        let ok = error.is_none();
        let report = BatchReport {
            total: 1,
            succeeded: usize::from(ok),
            failed: usize::from(!ok),
            files: vec![FileReport {
                input: input.display().to_string(),
                output: ok.then(|| output.display().to_string()),
                ok,
                error: error.map(|e| e.to_string()),
                error_kind: error.map(|e| e.kind()),
            }],
        };
        print_report(&report);
    } else if error.is_none() && !cli.quiet {
        println!("{} -> {}", input.display(), output.display());
    }
}

fn print_json_report(result: &bookflat::BatchResult) {
    let mut files = Vec::with_capacity(result.total);
    for (input, output) in &result.succeeded {
        files.push(FileReport {
            input: input.display().to_string(),
            output: Some(output.display().to_string()),
            ok: true,
            error: None,
            error_kind: None,
        });
    }
    for (input, error) in &result.failed {
        files.push(FileReport {
            input: input.display().to_string(),
            output: None,
            ok: false,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        });
    }
    let report = BatchReport {
        total: result.total,
        succeeded: result.succeeded.len(),
        failed: result.failed.len(),
        files,
    };
    print_report(&report);
}

fn print_report(report: &BatchReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("error: failed to serialize report: {e}"),
    }
}
