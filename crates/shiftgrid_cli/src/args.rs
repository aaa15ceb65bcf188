//! Command-line arguments.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::NaiveTime;
use clap::Parser;
use shiftgrid_schedule::{SpecScheduleOptions, parse_time_of_day};

/// Default archive written next to the working directory.
pub const C_OUTPUT_DEFAULT: &str = "schedules.zip";

#[derive(Debug, Parser)]
#[command(name = "shiftgrid")]
#[command(about = "Turn attendance exports into one hour-grid workbook per week")]
#[command(version)]
pub struct Cli {
    /// Attendance workbook (employeeId, lastName, firstName, shiftType, date, time, department)
    #[arg(long, short = 'i', env = "SHIFTGRID_INPUT")]
    pub input: PathBuf,

    /// Employee settings workbook (employeeId, phone, role)
    #[arg(long, short = 's', env = "SHIFTGRID_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Workbook whose first sheet is copied under every day grid
    #[arg(long, short = 'f', env = "SHIFTGRID_FOOTER")]
    pub footer: Option<PathBuf>,

    /// Zip archive to write
    #[arg(long, short = 'o', default_value = C_OUTPUT_DEFAULT)]
    pub output: PathBuf,

    /// Give up on weeks still pending after this many seconds
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Worker threads (defaults to min(cores, 8))
    #[arg(long)]
    pub workers: Option<usize>,

    /// Output file prefix, `"<prefix> <week>.xlsx"`
    #[arg(long)]
    pub file_prefix: Option<String>,

    /// Hour boundaries before this time (HH:MM) are not displayed
    #[arg(long, value_parser = parse_hide_before)]
    pub hide_before: Option<NaiveTime>,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// Map flags onto run options; unset flags keep the defaults.
    pub fn to_options(&self) -> SpecScheduleOptions {
        let mut options = SpecScheduleOptions {
            num_workers_max: self.workers,
            deadline: self.deadline_secs.map(Duration::from_secs),
            ..Default::default()
        };
        if let Some(c_prefix) = &self.file_prefix {
            options.file_prefix = c_prefix.clone();
        }
        if let Some(hide_before) = self.hide_before {
            options.grid.hide_before = hide_before;
        }
        options
    }
}

fn parse_hide_before(raw: &str) -> Result<NaiveTime> {
    let Some(t) = parse_time_of_day(raw) else {
        bail!("expected HH:MM, got {raw:?}");
    };
    Ok(t)
}

/// Read an input file with its path in the error.
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_options_applies_flags() {
        let cli = Cli::try_parse_from([
            "shiftgrid",
            "--input",
            "attendance.xlsx",
            "--workers",
            "2",
            "--deadline-secs",
            "30",
            "--file-prefix",
            "Vecka",
            "--hide-before",
            "08:00",
        ])
        .unwrap();
        let options = cli.to_options();

        assert_eq!(cli.output, PathBuf::from("schedules.zip"));
        assert_eq!(options.num_workers_max, Some(2));
        assert_eq!(options.deadline, Some(Duration::from_secs(30)));
        assert_eq!(options.file_prefix, "Vecka");
        assert_eq!(options.grid.hide_before, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    }

    #[test]
    fn defaults_and_bad_hide_before() {
        let cli = Cli::try_parse_from(["shiftgrid", "-i", "a.xlsx"]).unwrap();
        assert_eq!(cli.to_options(), SpecScheduleOptions::default());

        assert!(
            Cli::try_parse_from(["shiftgrid", "-i", "a.xlsx", "--hide-before", "8am"]).is_err()
        );
    }
}
