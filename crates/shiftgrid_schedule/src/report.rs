//! Schedule report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::SpecWeekFailure;

/// Output workbooks plus counters and diagnostics for one `process_files` run.
#[derive(Debug, Default, Clone)]
pub struct ReportSchedule {
    /// `"<prefix> <week>.xlsx"` to workbook bytes, ordered by file name.
    pub workbooks: BTreeMap<String, Vec<u8>>,
    /// Attendance data rows read (header excluded).
    pub cnt_rows: u64,
    /// Rows skipped as blank.
    pub cnt_skipped: u64,
    /// Shifts that reached the grid.
    pub cnt_shifts: u64,
    /// Weeks scheduled (successful or not).
    pub cnt_weeks: u64,
    /// Day sheets written.
    pub cnt_sheets: u64,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
    /// Weeks that produced no workbook.
    pub failures: Vec<SpecWeekFailure>,
}

impl ReportSchedule {
    /// Number of failed weeks.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_rows".to_string(), self.cnt_rows);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_shifts".to_string(), self.cnt_shifts);
        dict_counts.insert("cnt_weeks".to_string(), self.cnt_weeks);
        dict_counts.insert("cnt_sheets".to_string(), self.cnt_sheets);
        dict_counts.insert("cnt_workbooks".to_string(), self.workbooks.len() as u64);
        dict_counts.insert("cnt_failures".to_string(), self.failure_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} rows={} skipped={} shifts={} weeks={} sheets={} workbooks={} failures={} warnings={}",
            dict_counts["cnt_rows"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_shifts"],
            dict_counts["cnt_weeks"],
            dict_counts["cnt_sheets"],
            dict_counts["cnt_workbooks"],
            dict_counts["cnt_failures"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[SCHEDULE]"))
    }
}

/// Mutable accumulator for a schedule run.
#[derive(Debug, Default, Clone)]
pub struct ReportScheduleBuilder {
    /// See [`ReportSchedule::workbooks`].
    pub workbooks: BTreeMap<String, Vec<u8>>,
    /// See [`ReportSchedule::cnt_rows`].
    pub cnt_rows: u64,
    /// See [`ReportSchedule::cnt_skipped`].
    pub cnt_skipped: u64,
    /// See [`ReportSchedule::cnt_shifts`].
    pub cnt_shifts: u64,
    /// See [`ReportSchedule::cnt_weeks`].
    pub cnt_weeks: u64,
    /// See [`ReportSchedule::cnt_sheets`].
    pub cnt_sheets: u64,
    /// See [`ReportSchedule::warnings`].
    pub warnings: Vec<String>,
    /// See [`ReportSchedule::failures`].
    pub failures: Vec<SpecWeekFailure>,
}

impl ReportScheduleBuilder {
    /// Increment one or more named counters by `value`.
    ///
    /// Unknown names are ignored.
    pub fn add_counts(&mut self, field_names: &[&str], value: u64) {
        for field_name in field_names {
            match *field_name {
                "cnt_rows" => self.cnt_rows += value,
                "cnt_skipped" => self.cnt_skipped += value,
                "cnt_shifts" => self.cnt_shifts += value,
                "cnt_weeks" => self.cnt_weeks += value,
                "cnt_sheets" => self.cnt_sheets += value,
                _ => {}
            }
        }
    }

    /// Add warning message and emit it as a `warn` event.
    pub fn add_warning(&mut self, warning: String) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Record one failed week.
    pub fn add_failure(&mut self, week_number: u32, file_name: String, exception: String) {
        tracing::warn!(week = week_number, file = %file_name, "week failed: {exception}");
        self.failures.push(SpecWeekFailure {
            week_number,
            file_name,
            exception,
        });
    }

    /// Store one finished workbook.
    pub fn add_workbook(&mut self, file_name: String, v_bytes: Vec<u8>) {
        self.workbooks.insert(file_name, v_bytes);
    }

    /// Finalize builder into immutable report. Failures are ordered by week.
    pub fn build(mut self) -> ReportSchedule {
        self.failures
            .sort_by(|a, b| (a.week_number, &a.file_name).cmp(&(b.week_number, &b.file_name)));
        ReportSchedule {
            workbooks: self.workbooks,
            cnt_rows: self.cnt_rows,
            cnt_skipped: self.cnt_skipped,
            cnt_shifts: self.cnt_shifts,
            cnt_weeks: self.cnt_weeks,
            cnt_sheets: self.cnt_sheets,
            warnings: self.warnings,
            failures: self.failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ReportSchedule, ReportScheduleBuilder};

    #[test]
    fn report_schedule_to_dict_and_format() {
        let mut builder = ReportScheduleBuilder::default();
        builder.add_counts(&["cnt_rows"], 10);
        builder.add_counts(&["cnt_shifts", "cnt_sheets"], 4);
        builder.add_counts(&["cnt_weeks"], 2);
        builder.add_counts(&["cnt_unknown"], 99);
        builder.add_warning("w".to_string());
        builder.add_workbook("Week 2.xlsx".to_string(), vec![1, 2, 3]);
        builder.add_failure(3, "Week 3.xlsx".to_string(), "boom".to_string());
        let report: ReportSchedule = builder.build();

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_rows"], 10);
        assert_eq!(dict_counts["cnt_shifts"], 4);
        assert_eq!(dict_counts["cnt_sheets"], 4);
        assert_eq!(dict_counts["cnt_workbooks"], 1);
        assert_eq!(dict_counts["cnt_failures"], 1);

        let txt = report.format("[SCHEDULE]");
        assert_eq!(
            txt,
            "[SCHEDULE] rows=10 skipped=0 shifts=4 weeks=2 sheets=4 workbooks=1 failures=1 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }

    #[test]
    fn build_orders_failures_by_week() {
        let mut builder = ReportScheduleBuilder::default();
        builder.add_failure(9, "Week 9.xlsx".to_string(), "late".to_string());
        builder.add_failure(2, "Week 2.xlsx".to_string(), "early".to_string());
        let report = builder.build();
        assert_eq!(
            report
                .failures
                .iter()
                .map(|failure| failure.week_number)
                .collect::<Vec<_>>(),
            vec![2, 9]
        );
    }
}
