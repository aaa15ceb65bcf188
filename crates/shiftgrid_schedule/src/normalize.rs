//! Attendance row normalization.

use chrono::{Datelike, NaiveDate};

use crate::conf::{
    C_DATE_FORMAT, C_SHIFT_WINDOW_SEPARATOR, N_EMPLOYEE_ID_SENTINEL, N_HOURS_LUNCH_DEDUCTION,
    N_HOURS_LUNCH_THRESHOLD, TUP_ATTENDANCE_COLUMNS,
};
use crate::report::ReportScheduleBuilder;
use crate::spec::{ScheduleError, SpecNormalizedBatch, SpecNormalizedShift, SpecShiftWindow};
use crate::util::parse_time_of_day;

/// Parse an employee id; anything but an integer yields the sentinel `-1`.
pub fn parse_employee_id(raw: &str) -> i64 {
    raw.trim().parse::<i64>().unwrap_or(N_EMPLOYEE_ID_SENTINEL)
}

/// Parse `"HH:MM - HH:MM"` and apply the lunch rule.
///
/// Shifts longer than five hours get `has_lunch` and one hour deducted.
pub fn parse_shift_window(raw: &str) -> Result<SpecShiftWindow, ScheduleError> {
    let derive_err = || ScheduleError::InvalidShiftWindow {
        raw: raw.to_string(),
    };

    let l_parts = raw.split(C_SHIFT_WINDOW_SEPARATOR).collect::<Vec<_>>();
    let [c_start, c_end] = l_parts.as_slice() else {
        return Err(derive_err());
    };
    let start = parse_time_of_day(c_start).ok_or_else(derive_err)?;
    let end = parse_time_of_day(c_end).ok_or_else(derive_err)?;

    let mut duration_hours = end.signed_duration_since(start).num_minutes() as f64 / 60.0;
    let has_lunch = duration_hours > N_HOURS_LUNCH_THRESHOLD;
    if has_lunch {
        duration_hours -= N_HOURS_LUNCH_DEDUCTION;
    }

    Ok(SpecShiftWindow {
        start,
        end,
        duration_hours,
        has_lunch,
    })
}

/// Parse `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(raw.trim(), C_DATE_FORMAT).map_err(|_| ScheduleError::InvalidDate {
        raw: raw.to_string(),
    })
}

/// ISO-8601 week number of a `YYYY-MM-DD` date.
pub fn compute_week_number(raw: &str) -> Result<u32, ScheduleError> {
    Ok(parse_date(raw)?.iso_week().week())
}

/// Normalize one attendance row. Short rows are padded with empty cells.
pub fn normalize_row(row: &[String]) -> Result<SpecNormalizedShift, ScheduleError> {
    let derive_cell = |n_idx: usize| row.get(n_idx).map_or("", String::as_str);

    let date = parse_date(derive_cell(4))?;
    let c_time = derive_cell(5);
    let window = parse_shift_window(c_time)?;

    Ok(SpecNormalizedShift {
        employee_id: parse_employee_id(derive_cell(0)),
        last_name: derive_cell(1).to_string(),
        first_name: derive_cell(2).to_string(),
        shift_type: derive_cell(3).to_string(),
        department: derive_cell(6).to_string(),
        date,
        time_label: c_time.to_string(),
        start_time: window.start,
        end_time: window.end,
        shift_length_hours: window.duration_hours,
        has_lunch: window.has_lunch,
        week_number: date.iso_week().week(),
    })
}

/// Normalize all attendance rows; the first row is the header.
///
/// A bad date fails the whole run. A bad window fails only its week, which is
/// recorded in `dict_week_errors`.
pub fn normalize_rows(
    rows: &[Vec<String>],
    builder: &mut ReportScheduleBuilder,
) -> Result<SpecNormalizedBatch, ScheduleError> {
    let mut batch = SpecNormalizedBatch::default();

    for (n_idx, row) in rows.iter().enumerate().skip(1) {
        batch.cnt_rows += 1;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            tracing::debug!(row = n_idx + 1, "blank attendance row skipped");
            batch.cnt_skipped += 1;
            continue;
        }
        if row.len() > TUP_ATTENDANCE_COLUMNS.len() {
            tracing::debug!(row = n_idx + 1, cells = row.len(), "extra attendance cells ignored");
        }

        match normalize_row(row) {
            Ok(shift) => batch.shifts.push(shift),
            Err(err @ ScheduleError::InvalidShiftWindow { .. }) => {
                let c_date = row.get(4).map_or("", String::as_str);
                let n_week = compute_week_number(c_date)?;
                let c_message = format!("Row {}: {err}", n_idx + 1);
                builder.add_warning(format!("Week {n_week} marked failed. {c_message}"));
                batch.dict_week_errors.entry(n_week).or_insert(c_message);
            }
            Err(err) => {
                return Err(match err {
                    ScheduleError::InvalidDate { raw } => ScheduleError::InvalidDate {
                        raw: format!("{raw} (row {})", n_idx + 1),
                    },
                    other => other,
                });
            }
        }
    }

    tracing::debug!(
        rows = batch.cnt_rows,
        shifts = batch.shifts.len(),
        failed_weeks = batch.dict_week_errors.len(),
        "normalized attendance rows"
    );
    Ok(batch)
}
