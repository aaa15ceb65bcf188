//! Schedule constants and default presets.

use chrono::{NaiveTime, TimeDelta};
use shiftgrid_io_xlsx::SpecCellFormat;

use crate::spec::SpecScheduleTheme;

////////////////////////////////////////////////////////////////////////////////
// #region InputTables

/// Attendance table columns, in order.
pub const TUP_ATTENDANCE_COLUMNS: [&str; 7] = [
    "employeeId",
    "lastName",
    "firstName",
    "shiftType",
    "date",
    "time",
    "department",
];
/// Settings table columns, in order.
pub const TUP_SETTINGS_COLUMNS: [&str; 3] = ["employeeId", "phone", "role"];
/// Sheet name of the staffing export.
pub const C_SHEET_ATTENDANCE_DEFAULT: &str = "Worksheet";

/// Stored when an employee id is not an integer.
pub const N_EMPLOYEE_ID_SENTINEL: i64 = -1;
/// Separator between window start and end.
pub const C_SHIFT_WINDOW_SEPARATOR: &str = " - ";
/// Time-of-day format of window parts and slot headers.
pub const C_TIME_FORMAT: &str = "%H:%M";
/// Attendance date format.
pub const C_DATE_FORMAT: &str = "%Y-%m-%d";

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LunchRule

/// Shifts strictly longer than this get a lunch hour.
pub const N_HOURS_LUNCH_THRESHOLD: f64 = 5.0;
/// Lunch slot starts this many hours after the shift start.
pub const N_HOURS_LUNCH_OFFSET: i64 = 5;
/// Hours deducted from the shift length for lunch.
pub const N_HOURS_LUNCH_DEDUCTION: f64 = 1.0;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetLayout

/// Full weekday names, Monday first.
pub const TUP_WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
/// Leading column labels.
pub const TUP_LABELS_LEADING_DEFAULT: [&str; 3] = ["Shift", "Name", "Phone"];
/// Lunch cell text.
pub const C_LABEL_LUNCH: &str = "Lunch";
/// Output file prefix.
pub const C_FILE_PREFIX_DEFAULT: &str = "Week";

pub const N_ROW_TITLE: usize = 0;
pub const N_ROW_HEADER: usize = 1;
pub const N_ROW_DATA_START: usize = 2;
/// Blank rows between the trailing header and the footer.
pub const N_ROWS_FOOTER_GAP: usize = 1;

pub const N_COL_SHIFT: usize = 0;
pub const N_COL_NAME: usize = 1;
pub const N_COL_PHONE: usize = 2;
/// First hour-slot column.
pub const N_COL_HOUR_START: usize = 3;

pub const N_WIDTH_COL_SHIFT: f64 = 15.0;
pub const N_WIDTH_COL_NAME: f64 = 30.0;
pub const N_WIDTH_COL_HOUR: f64 = 12.0;

/// Default worker cap when none is requested.
pub const N_WORKERS_DEFAULT_MAX: usize = 8;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Presets

/// Hour boundaries before this time are hidden.
pub fn derive_default_hide_before() -> NaiveTime {
    NaiveTime::default() + TimeDelta::hours(10)
}

pub fn derive_default_labels_leading() -> Vec<String> {
    TUP_LABELS_LEADING_DEFAULT
        .iter()
        .map(|c_label| c_label.to_string())
        .collect()
}

fn derive_default_bordered_fill(bg_color: &str) -> SpecCellFormat {
    SpecCellFormat {
        border: Some(1),
        border_color: Some("#000000".to_string()),
        bg_color: Some(bg_color.to_string()),
        ..Default::default()
    }
}

/// Default day-sheet theme.
pub fn derive_default_schedule_theme() -> SpecScheduleTheme {
    let fmt_centered = SpecCellFormat {
        align: Some("center".to_string()),
        ..Default::default()
    };

    SpecScheduleTheme {
        title: derive_default_bordered_fill("#AAAAAA").with_(SpecCellFormat {
            bold: Some(true),
            font_size: Some(20.0),
            font_color: Some("#FFFFFF".to_string()),
            align: Some("center".to_string()),
            ..Default::default()
        }),
        header: derive_default_bordered_fill("#A1C2F1").with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            ..Default::default()
        }),
        name: derive_default_bordered_fill("#F4D793"),
        free: derive_default_bordered_fill("#B4B4B8").merge(&fmt_centered),
        work: derive_default_bordered_fill("#FFFFFF").merge(&fmt_centered),
        lunch: derive_default_bordered_fill("#F6EFBD").merge(&fmt_centered),
        assigned: derive_default_bordered_fill("#FFFFFF").merge(&fmt_centered),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_distinguishes_states() {
        let theme = derive_default_schedule_theme();
        assert_eq!(theme.title.font_size, Some(20.0));
        assert_eq!(theme.header.bg_color.as_deref(), Some("#A1C2F1"));
        assert_ne!(theme.free.bg_color, theme.lunch.bg_color);
        assert_eq!(theme.work.align.as_deref(), Some("center"));
        assert_eq!(derive_default_hide_before().format(C_TIME_FORMAT).to_string(), "10:00");
    }
}
