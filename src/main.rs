//! vidsched CLI
//!
//! Schedules a folder of videos and uploads the ones that are due.

use anyhow::Context;
use clap::Parser;
use core_library::VideoRecord;
use core_runtime::logging::init_logging;
use core_service::{RunOutcome, EXIT_ABORTED};
use tracing::error;

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.logging_config()).context("failed to initialize logging")?;

    let code = match execute(&cli).await {
        Ok(outcome) => {
            report(&cli, &outcome);
            outcome.exit_code()
        }
        Err(e) => {
            error!(error = %e, "Run aborted");
            eprintln!("Error: {:#}", e);
            EXIT_ABORTED
        }
    };

    std::process::exit(code);
}

async fn execute(cli: &Cli) -> anyhow::Result<RunOutcome> {
    let config = cli
        .scheduler_config()
        .context("invalid configuration")?;
    let mut scheduler =
        core_service::bootstrap_desktop(config).context("failed to initialize scheduler")?;
    let outcome = scheduler.run(cli.run_options()).await?;
    Ok(outcome)
}

fn report(cli: &Cli, outcome: &RunOutcome) {
    match outcome {
        RunOutcome::NothingToDo { folder_created } => {
            if *folder_created {
                println!(
                    "Created video folder {}. Add videos to it and run again.",
                    cli.video_folder.display()
                );
            } else {
                println!("No video files found in {}.", cli.video_folder.display());
            }
        }
        RunOutcome::Listed(records) => print_schedule(records),
        RunOutcome::Incomplete(incomplete) => {
            eprintln!("{}", incomplete);
            eprintln!(
                "Fill in the missing fields in {} and run again.",
                cli.metadata.display()
            );
        }
        RunOutcome::DryRun { due } => {
            if due.is_empty() {
                println!("Nothing is due for upload.");
            } else {
                println!("Would upload {} video(s):", due.len());
                print_schedule(due);
            }
        }
        RunOutcome::Completed(summary) => {
            println!(
                "Success: {}, Fail/Skip: {}",
                summary.uploaded, summary.failed
            );
        }
    }
}

fn print_schedule(records: &[VideoRecord]) {
    let width = records
        .iter()
        .map(|r| r.file_name.len())
        .max()
        .unwrap_or(0)
        .max("File".len());

    println!(
        "{:<width$}  {:<10}  {:<5}  {:<8}  Title",
        "File", "Date", "Time", "Uploaded"
    );
    for record in records {
        println!(
            "{:<width$}  {:<10}  {:<5}  {:<8}  {}",
            record.file_name,
            record.upload_date,
            record.upload_time,
            if record.uploaded { "yes" } else { "no" },
            record.title,
        );
    }
}
