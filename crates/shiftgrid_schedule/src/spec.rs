//! Schedule models, options and errors.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, Weekday};
use shiftgrid_io_xlsx::{EnumSheetSelector, SpecCellFormat, XlsxIoError};
use thiserror::Error;

use crate::conf::{
    C_FILE_PREFIX_DEFAULT, C_LABEL_LUNCH, C_SHEET_ATTENDANCE_DEFAULT, derive_default_hide_before,
    derive_default_labels_leading, derive_default_schedule_theme,
};

////////////////////////////////////////////////////////////////////////////////
// #region ShiftRecords

/// Parsed `"HH:MM - HH:MM"` window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecShiftWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// Worked hours, lunch hour already deducted.
    pub duration_hours: f64,
    pub has_lunch: bool,
}

/// One attendance row after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecNormalizedShift {
    /// Parsed id, or the sentinel `-1` when the raw cell is not an integer.
    pub employee_id: i64,
    pub last_name: String,
    pub first_name: String,
    pub shift_type: String,
    pub department: String,
    pub date: NaiveDate,
    /// Raw window text, shown as the shift label.
    pub time_label: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub shift_length_hours: f64,
    pub has_lunch: bool,
    /// ISO-8601 week number.
    pub week_number: u32,
}

/// Role and phone from the optional settings table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecEmployeeSettings {
    pub phone: String,
    pub role: String,
}

/// Normalized shift joined with its settings; empty strings on no match.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecEnrichedShift {
    pub shift: SpecNormalizedShift,
    pub role: String,
    pub phone: String,
}

/// Output of attendance normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecNormalizedBatch {
    /// Successfully parsed rows in input order.
    pub shifts: Vec<SpecNormalizedShift>,
    /// First window error per ISO week; those weeks produce no workbook.
    pub dict_week_errors: BTreeMap<u32, String>,
    /// Number of data rows read (header excluded, blank rows included).
    pub cnt_rows: u64,
    /// Number of all-blank rows skipped.
    pub cnt_skipped: u64,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DayGrid

/// Classification of one employee in one hour slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumHourState {
    Free,
    Work,
    Lunch,
    Assigned,
}

/// One row of a day sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecShiftActivity {
    pub employee_id: i64,
    pub employee_name: String,
    pub shift_time_label: String,
    pub role: String,
    pub phone: String,
    pub shift_length_label: String,
    /// One state per displayed slot.
    pub hour_states: Vec<EnumHourState>,
}

/// Everything needed to lay out one day sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDaySchedule {
    pub weekday: Weekday,
    /// Full weekday name, also the sheet name.
    pub weekday_label: String,
    pub date: NaiveDate,
    /// `YYYY-MM-DD`.
    pub date_label: String,
    pub week_number: u32,
    /// Leading labels followed by `"HH:MM-HH:MM"` slot headers.
    pub headers: Vec<String>,
    /// Visible slot boundaries; `boundaries.len() - 1` slots.
    pub boundaries: Vec<NaiveTime>,
    pub shifts: Vec<SpecShiftActivity>,
}

/// Grid builder settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecGridOptions {
    /// Boundaries strictly before this time are not displayed.
    pub hide_before: NaiveTime,
    pub labels_leading: Vec<String>,
}

impl Default for SpecGridOptions {
    fn default() -> Self {
        Self {
            hide_before: derive_default_hide_before(),
            labels_leading: derive_default_labels_leading(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ThemeAndOptions

/// Cell styles of a day sheet, one per role.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecScheduleTheme {
    pub title: SpecCellFormat,
    pub header: SpecCellFormat,
    pub name: SpecCellFormat,
    pub free: SpecCellFormat,
    pub work: SpecCellFormat,
    pub lunch: SpecCellFormat,
    pub assigned: SpecCellFormat,
}

impl Default for SpecScheduleTheme {
    fn default() -> Self {
        derive_default_schedule_theme()
    }
}

/// Options for one `process_files` run.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecScheduleOptions {
    /// Grid cut-off and leading labels.
    pub grid: SpecGridOptions,
    /// Cell styles.
    pub theme: SpecScheduleTheme,
    /// Text written into lunch cells.
    pub lunch_label: String,
    /// Output file name prefix, `"<prefix> <week>.xlsx"`.
    pub file_prefix: String,
    /// Worker cap. `None` uses `min(cores, 8)`.
    pub num_workers_max: Option<usize>,
    /// Wall-clock bound for the per-week fan-out.
    pub deadline: Option<Duration>,
    /// Attendance sheet selection.
    pub selector_attendance: EnumSheetSelector,
    /// Settings sheet selection.
    pub selector_settings: EnumSheetSelector,
    /// Footer template sheet selection.
    pub selector_footer: EnumSheetSelector,
}

impl Default for SpecScheduleOptions {
    fn default() -> Self {
        Self {
            grid: SpecGridOptions::default(),
            theme: SpecScheduleTheme::default(),
            lunch_label: C_LABEL_LUNCH.to_string(),
            file_prefix: C_FILE_PREFIX_DEFAULT.to_string(),
            num_workers_max: None,
            deadline: None,
            selector_attendance: EnumSheetSelector::PreferNamed(
                C_SHEET_ATTENDANCE_DEFAULT.to_string(),
            ),
            selector_settings: EnumSheetSelector::First,
            selector_footer: EnumSheetSelector::First,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Outcomes

/// Result of one per-week unit, sent back to the aggregator.
#[derive(Debug)]
pub struct SpecWeekOutcome {
    pub week_number: u32,
    pub file_name: String,
    pub result: Result<Vec<u8>, ScheduleError>,
}

/// Week that produced no workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecWeekFailure {
    pub week_number: u32,
    pub file_name: String,
    pub exception: String,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Schedule generation failures.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Window text is not `"HH:MM - HH:MM"`.
    #[error("Invalid shift window: {raw:?}")]
    InvalidShiftWindow { raw: String },
    /// Date text is not `YYYY-MM-DD`.
    #[error("Invalid date: {raw:?}")]
    InvalidDate { raw: String },
    /// Grid requested for a date without shifts.
    #[error("No shifts for the requested day.")]
    EmptyDay,
    /// Attendance stream could not be read.
    #[error("Failed to read attendance table: {0}")]
    Attendance(String),
    /// Invalid run options.
    #[error("Invalid options: {0}")]
    Options(String),
    /// Workbook read/write failure.
    #[error(transparent)]
    Xlsx(#[from] XlsxIoError),
    /// Per-week unit panicked.
    #[error("Worker panicked: {0}")]
    WorkerPanic(String),
    /// Per-week unit did not finish before the deadline.
    #[error("Deadline exceeded before the week was generated.")]
    DeadlineExceeded,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
