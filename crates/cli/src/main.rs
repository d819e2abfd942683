mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use exporter::{ExportError, Exporter};
use logging::LOG_TAG;
use std::io::Read;
use std::process::ExitCode;

/// Forward an OTLP/JSON trace export read from stdin to Arize over gRPC
#[derive(Parser, Debug)]
#[command(name = "arize-send-span")]
#[command(about = "Forward an OTLP/JSON trace export from stdin to Arize", long_about = None)]
struct Args {
    /// Decode the input and print a summary without sending anything
    #[arg(long)]
    dry_run: bool,

    /// Collector URL, overriding ARIZE_OTLP_ENDPOINT
    #[arg(long)]
    endpoint: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs share stderr with diagnostics; stdout is reserved for --dry-run.
    logging::init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .context("Failed to read trace export from stdin")?;

    let config = Config::from_env()?;
    tracing::debug!(?config, "Loaded configuration");

    // Input problems are reported before credential problems
    let export = mapper::decode(&input, &config.project_name)?;
    config.validate()?;

    let summary = mapper::summarize(&export);
    tracing::info!(
        resource_spans = summary.resource_spans,
        scope_spans = summary.scope_spans,
        spans = summary.spans,
        encoded_bytes = summary.encoded_bytes,
        project = %config.project_name,
        "Decoded trace export"
    );

    if args.dry_run {
        println!(
            "{} resource spans, {} scope spans, {} spans for project {} ({} bytes encoded)",
            summary.resource_spans,
            summary.scope_spans,
            summary.spans,
            config.project_name,
            summary.encoded_bytes
        );
        return Ok(());
    }

    let mut exporter = Exporter::new(&config);
    if let Some(endpoint) = args.endpoint {
        exporter = exporter.with_endpoint(endpoint);
    }

    exporter
        .export(export)
        .await
        .context("gRPC export failed")?;

    Ok(())
}

/// Write a diagnostic for a failed run
///
/// Export failures get the whole cause chain; everything else is one line.
fn report(err: &anyhow::Error) {
    tracing::debug!(error = ?err, "Run failed");

    eprintln!("{} {}", LOG_TAG, err);
    if err.downcast_ref::<ExportError>().is_some() {
        for cause in err.chain().skip(1) {
            eprintln!("{}   caused by: {}", LOG_TAG, cause);
        }
    }
}
