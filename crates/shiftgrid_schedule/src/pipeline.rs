//! End-to-end run: attendance bytes in, one workbook per week out.

use std::sync::Arc;
use std::time::Instant;

use shiftgrid_io_xlsx::{capture_footer, read_table_rows};

use crate::conf::TUP_LABELS_LEADING_DEFAULT;
use crate::enrich::{build_settings_index, join_settings};
use crate::normalize::normalize_rows;
use crate::report::{ReportSchedule, ReportScheduleBuilder};
use crate::spec::{ScheduleError, SpecScheduleOptions};
use crate::util::derive_week_file_name;
use crate::week::{SpecWeekShared, create_week_schedules, group_week_jobs};

/// Generate weekly schedule workbooks.
///
/// `v_settings` and `v_footer` are optional; when either cannot be read the run
/// continues without it and a warning is recorded. An unreadable attendance
/// workbook or a malformed date fails the whole run. Per-week problems show up
/// as failures in the returned report.
pub fn process_files(
    v_input: &[u8],
    v_settings: Option<&[u8]>,
    v_footer: Option<&[u8]>,
    options: &SpecScheduleOptions,
) -> Result<ReportSchedule, ScheduleError> {
    let instant_start = Instant::now();
    validate_options(options)?;

    let mut builder = ReportScheduleBuilder::default();

    let l_rows_attendance = read_table_rows(v_input, &options.selector_attendance)
        .map_err(|err| ScheduleError::Attendance(err.to_string()))?;
    let batch = normalize_rows(&l_rows_attendance, &mut builder)?;
    builder.add_counts(&["cnt_rows"], batch.cnt_rows);
    builder.add_counts(&["cnt_skipped"], batch.cnt_skipped);

    let dict_settings = match v_settings {
        Some(v_bytes) => match read_table_rows(v_bytes, &options.selector_settings) {
            Ok(l_rows) => build_settings_index(&l_rows, &mut builder),
            Err(err) => {
                builder.add_warning(format!("Settings workbook ignored: {err}"));
                Default::default()
            }
        },
        None => Default::default(),
    };

    let footer = match v_footer {
        Some(v_bytes) => match capture_footer(v_bytes, &options.selector_footer) {
            Ok(template) if template.is_empty() => {
                tracing::debug!(sheet = %template.sheet_name, "footer template is empty");
                None
            }
            Ok(template) => Some(template),
            Err(err) => {
                builder.add_warning(format!("Footer template ignored: {err}"));
                None
            }
        },
        None => None,
    };

    let l_shifts = join_settings(batch.shifts, &dict_settings)
        .into_iter()
        .filter(|shift| !batch.dict_week_errors.contains_key(&shift.shift.week_number))
        .collect::<Vec<_>>();
    builder.add_counts(&["cnt_shifts"], l_shifts.len() as u64);

    for (week_number, c_message) in &batch.dict_week_errors {
        builder.add_failure(
            *week_number,
            derive_week_file_name(&options.file_prefix, *week_number),
            c_message.clone(),
        );
    }

    let jobs = group_week_jobs(l_shifts, &options.file_prefix);
    builder.add_counts(&["cnt_weeks"], (jobs.len() + batch.dict_week_errors.len()) as u64);
    tracing::info!(
        weeks = jobs.len(),
        failed_weeks = batch.dict_week_errors.len(),
        employees_with_settings = dict_settings.len(),
        has_footer = footer.is_some(),
        "generating week schedules"
    );

    let shared = Arc::new(SpecWeekShared {
        grid: options.grid.clone(),
        theme: options.theme.clone(),
        lunch_label: options.lunch_label.clone(),
        footer,
    });
    create_week_schedules(jobs, shared, options, &mut builder);

    let report = builder.build();
    tracing::info!(
        elapsed_ms = instant_start.elapsed().as_millis() as u64,
        "{report}"
    );
    Ok(report)
}

fn validate_options(options: &SpecScheduleOptions) -> Result<(), ScheduleError> {
    let n_labels = options.grid.labels_leading.len();
    if n_labels != TUP_LABELS_LEADING_DEFAULT.len() {
        return Err(ScheduleError::Options(format!(
            "expected {} leading labels, got {n_labels}",
            TUP_LABELS_LEADING_DEFAULT.len()
        )));
    }
    if options.file_prefix.trim().is_empty() {
        return Err(ScheduleError::Options("file prefix must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use calamine::{Data, Reader, Xlsx};
    use rust_xlsxwriter::{Format, Workbook};

    use super::*;
    use crate::conf::TUP_ATTENDANCE_COLUMNS;

    fn build_workbook(sheet_name: &str, rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name).unwrap();
        for (n_row, row) in rows.iter().enumerate() {
            for (n_col, value) in row.iter().enumerate() {
                worksheet
                    .write_string(n_row as u32, n_col as u16, *value)
                    .unwrap();
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    fn build_attendance(rows: &[&[&str]]) -> Vec<u8> {
        let mut l_rows: Vec<&[&str]> = vec![&TUP_ATTENDANCE_COLUMNS[..]];
        l_rows.extend_from_slice(rows);
        build_workbook("Worksheet", &l_rows)
    }

    fn build_footer() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let format = Format::new().set_bold();
        worksheet
            .merge_range(0, 0, 0, 2, "Approved by", &format)
            .unwrap();
        worksheet.write_number(1, 0, 42.0).unwrap();
        workbook.save_to_buffer().unwrap()
    }

    fn cell(v_bytes: &[u8], sheet: &str, row: u32, col: u32) -> Data {
        let mut reader: Xlsx<_> = Xlsx::new(Cursor::new(v_bytes.to_vec())).unwrap();
        let range = reader.worksheet_range(sheet).unwrap();
        range.get_value((row, col)).cloned().unwrap_or(Data::Empty)
    }

    #[test]
    fn process_files_builds_one_workbook_per_week() {
        let v_input = build_attendance(&[
            &["1", "Doe", "Jane", "Day", "2024-03-05", "09:00 - 17:00", "Kitchen"],
            &["2", "Roe", "Rick", "Day", "2024-03-04", "12:00 - 14:00", "Bar"],
            &["", "", "", "", "", "", ""],
            &["1", "Doe", "Jane", "Day", "2024-03-12", "10:00 - 13:00", "Kitchen"],
        ]);
        let v_settings = build_workbook(
            "Sheet1",
            &[&["employeeId", "phone", "role"], &["1", "555-0100", "Chef"]],
        );
        let v_footer = build_footer();

        let report = process_files(
            &v_input,
            Some(v_settings.as_slice()),
            Some(v_footer.as_slice()),
            &SpecScheduleOptions::default(),
        )
        .unwrap();

        assert_eq!(
            report.workbooks.keys().cloned().collect::<Vec<_>>(),
            vec!["Week 10.xlsx", "Week 11.xlsx"]
        );
        assert_eq!(report.cnt_rows, 4);
        assert_eq!(report.cnt_skipped, 1);
        assert_eq!(report.cnt_shifts, 3);
        assert_eq!(report.cnt_weeks, 2);
        assert_eq!(report.cnt_sheets, 3);
        assert!(report.failures.is_empty());

        let v_week = &report.workbooks["Week 10.xlsx"];
        let reader: Xlsx<_> = Xlsx::new(Cursor::new(v_week.clone())).unwrap();
        assert_eq!(reader.sheet_names(), vec!["Monday", "Tuesday"]);
        assert_eq!(
            cell(v_week, "Tuesday", 2, 3),
            Data::String("Chef".to_string())
        );
        assert_eq!(
            cell(v_week, "Tuesday", 2, 2),
            Data::String("555-0100".to_string())
        );
        // Title, header, one shift, trailing header, a blank row, then the footer.
        assert_eq!(cell(v_week, "Tuesday", 4, 0), Data::Empty);
        assert_eq!(
            cell(v_week, "Tuesday", 5, 0),
            Data::String("Approved by".to_string())
        );
        assert_eq!(cell(v_week, "Tuesday", 6, 0), Data::Float(42.0));
    }

    #[test]
    fn process_files_fails_only_week_with_bad_window() {
        let v_input = build_attendance(&[
            &["1", "Doe", "Jane", "Day", "2024-03-05", "09:00 - 17:00", "Kitchen"],
            &["2", "Roe", "Rick", "Day", "2024-03-12", "9 to 5", "Bar"],
            &["3", "Poe", "Edna", "Day", "2024-03-13", "10:00 - 12:00", "Bar"],
        ]);

        let report = process_files(&v_input, None, None, &SpecScheduleOptions::default()).unwrap();

        assert_eq!(
            report.workbooks.keys().cloned().collect::<Vec<_>>(),
            vec!["Week 10.xlsx"]
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].week_number, 11);
        assert_eq!(report.failures[0].file_name, "Week 11.xlsx");
        assert_eq!(report.cnt_weeks, 2);
        assert_eq!(report.cnt_shifts, 1);
    }

    #[test]
    fn process_files_degrades_on_unreadable_optional_inputs() {
        let v_input = build_attendance(&[&[
            "1",
            "Doe",
            "Jane",
            "Day",
            "2024-03-05",
            "09:00 - 17:00",
            "Kitchen",
        ]]);
        let report = process_files(
            &v_input,
            Some(&b"not a workbook"[..]),
            Some(&b"not a workbook either"[..]),
            &SpecScheduleOptions::default(),
        )
        .unwrap();

        assert_eq!(report.workbooks.len(), 1);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn process_files_rejects_unreadable_attendance_and_bad_dates() {
        assert!(matches!(
            process_files(b"garbage", None, None, &SpecScheduleOptions::default()),
            Err(ScheduleError::Attendance(_))
        ));

        let v_input =
            build_attendance(&[&["1", "Doe", "Jane", "Day", "5 March", "09:00 - 17:00", "K"]]);
        assert!(matches!(
            process_files(&v_input, None, None, &SpecScheduleOptions::default()),
            Err(ScheduleError::InvalidDate { .. })
        ));
    }

    #[test]
    fn process_files_validates_options() {
        let v_input = build_attendance(&[]);
        let mut options = SpecScheduleOptions::default();
        options.grid.labels_leading.pop();
        assert!(matches!(
            process_files(&v_input, None, None, &options),
            Err(ScheduleError::Options(_))
        ));
    }

    #[test]
    fn process_files_custom_prefix_and_deadline() {
        let v_input = build_attendance(&[&[
            "1",
            "Doe",
            "Jane",
            "Day",
            "2024-03-05",
            "09:00 - 17:00",
            "Kitchen",
        ]]);
        let options = SpecScheduleOptions {
            file_prefix: "Vecka".to_string(),
            deadline: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        let report = process_files(&v_input, None, None, &options).unwrap();
        assert!(report.workbooks.contains_key("Vecka 10.xlsx"));
    }
}
