//! `shiftgrid`: attendance export in, `schedules.zip` of weekly workbooks out.
//!
//! ```bash
//! shiftgrid --input attendance.xlsx --settings settings.xlsx --footer footer.xlsx
//! RUST_LOG=shiftgrid_schedule=debug shiftgrid -i attendance.xlsx
//! ```

mod archive;
mod args;

use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use shiftgrid_schedule::process_files;
use tracing_subscriber::EnvFilter;

use crate::archive::write_archive;
use crate::args::{Cli, read_input};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over the -v default.
    let c_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(c_level)),
        )
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether at least one workbook was written.
fn run(cli: &Cli) -> Result<bool> {
    let v_input = read_input(&cli.input)?;
    let v_settings = cli.settings.as_deref().map(read_input).transpose()?;
    let v_footer = cli.footer.as_deref().map(read_input).transpose()?;

    let report = process_files(
        &v_input,
        v_settings.as_deref(),
        v_footer.as_deref(),
        &cli.to_options(),
    )
    .with_context(|| format!("failed to build schedules from {}", cli.input.display()))?;

    for failure in &report.failures {
        tracing::warn!(
            week = failure.week_number,
            file = %failure.file_name,
            "{}",
            failure.exception
        );
    }
    if report.workbooks.is_empty() {
        tracing::error!("no workbook produced; nothing written");
        return Ok(false);
    }

    let file = File::create(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;
    let writer = write_archive(BufWriter::new(file), &report.workbooks)?;
    writer
        .into_inner()
        .map_err(|err| err.into_error())
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    tracing::info!(
        output = %cli.output.display(),
        workbooks = report.workbooks.len(),
        failures = report.failure_count(),
        "archive written"
    );
    Ok(true)
}
