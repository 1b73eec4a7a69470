use anyhow::Context;
use archive_core::{ArchiveConfig, ErrorReporter};
use dialoguer::Confirm;
use std::io::IsTerminal;

const DEFAULT_LOG_FILTER: &str =
    "plurk_archive=info,archiver=info,image_fetcher=info,exif_writer=info,export_parser=warn";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting Plurk image archive");

    let write_metadata = ask_write_metadata().context("prompt failed")?;
    let config = ArchiveConfig::default();

    let summary = match archiver::run_archive(config, write_metadata).await {
        Ok(summary) => summary,
        Err(e) => {
            ErrorReporter::new().report_error(&e);
            return Err(e).context("archive run aborted");
        }
    };

    println!();
    println!("{}", "=".repeat(40));
    println!("Archive results:");
    println!("{summary}");
    println!("{}", "=".repeat(40));
    Ok(())
}

/// Asks whether capture times should be reconciled. Answers no without asking when
/// metadata support is not built in or stdin is not a terminal.
fn ask_write_metadata() -> anyhow::Result<bool> {
    if !archiver::metadata_available() {
        println!("Image metadata support is not built in; running in download-only mode.");
        return Ok(false);
    }
    if !std::io::stdin().is_terminal() {
        return Ok(false);
    }

    let answer = Confirm::new()
        .with_prompt("Check and rewrite each image's EXIF capture time?")
        .default(false)
        .interact()?;
    Ok(answer)
}
