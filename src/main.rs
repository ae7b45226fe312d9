use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use shotdoc_pdf::{RenderConfig, WARNING_HEADER_LIMIT, convert_request_file};

#[derive(Parser)]
#[command(name = "shotdoc-pdf")]
#[command(version)]
#[command(about = "Render a tutorial or meeting summary request with screenshots to PDF", long_about = None)]
struct Cli {
    /// Request JSON (schemaType, enforceSchema, structuredResult or rawText, shots)
    #[arg(value_name = "REQUEST")]
    input: PathBuf,

    /// Output PDF (defaults to the suggested filename in the current directory)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// TrueType/OpenType file for the regular face
    #[arg(long, value_name = "PATH")]
    font_regular: Option<PathBuf>,

    /// TrueType/OpenType file for the bold face
    #[arg(long, value_name = "PATH")]
    font_bold: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let mut cfg = RenderConfig::from_env();
    if cli.font_regular.is_some() {
        cfg.font_regular = cli.font_regular;
    }
    if cli.font_bold.is_some() {
        cfg.font_bold = cli.font_bold;
    }

    match convert_request_file(&cli.input, cli.output.as_deref(), &cfg) {
        Ok((path, output)) => {
            for warning in &output.warnings {
                eprintln!("warning: {warning}");
            }
            if let Some(summary) = output.warnings_header(WARNING_HEADER_LIMIT) {
                log::debug!("X-Render-Warnings: {summary}");
            }
            println!(
                "Wrote {} ({} pages, {} bytes)",
                path.display(),
                output.page_count,
                output.bytes.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
