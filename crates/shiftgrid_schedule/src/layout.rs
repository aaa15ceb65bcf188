//! Day sheet layout.

use rust_xlsxwriter::{Format, Worksheet};
use shiftgrid_io_xlsx::util::derive_xlsx_error;
use shiftgrid_io_xlsx::{
    EnumCellValue, SpecFooterTemplate, cast_col_num, cast_row_num, derive_rust_xlsx_format,
    replay_footer, write_cell_with_format, write_header_row, write_merged_text,
};

use crate::conf::{
    N_COL_HOUR_START, N_COL_NAME, N_COL_PHONE, N_COL_SHIFT, N_ROW_DATA_START, N_ROW_HEADER,
    N_ROW_TITLE, N_ROWS_FOOTER_GAP, N_WIDTH_COL_HOUR, N_WIDTH_COL_NAME, N_WIDTH_COL_SHIFT,
};
use crate::spec::{EnumHourState, ScheduleError, SpecDaySchedule, SpecScheduleTheme};

/// Writer formats for one workbook, built once from the theme.
#[derive(Debug, Clone)]
pub struct SpecStyleRegistry {
    pub title: Format,
    pub header: Format,
    pub name: Format,
    pub free: Format,
    pub work: Format,
    pub lunch: Format,
    pub assigned: Format,
}

impl SpecStyleRegistry {
    pub fn from_theme(theme: &SpecScheduleTheme) -> Self {
        Self {
            title: derive_rust_xlsx_format(&theme.title),
            header: derive_rust_xlsx_format(&theme.header),
            name: derive_rust_xlsx_format(&theme.name),
            free: derive_rust_xlsx_format(&theme.free),
            work: derive_rust_xlsx_format(&theme.work),
            lunch: derive_rust_xlsx_format(&theme.lunch),
            assigned: derive_rust_xlsx_format(&theme.assigned),
        }
    }
}

/// Summary of one written sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecSheetLayout {
    /// Row of the trailing header.
    pub row_trailing_header: usize,
    /// Row the footer starts at.
    pub row_footer: usize,
    /// Footer cells written.
    pub cnt_footer_cells: usize,
}

/// Lay out one day: title, header, one row per shift, trailing header, footer.
pub fn write_day_sheet(
    worksheet: &mut Worksheet,
    day: &SpecDaySchedule,
    styles: &SpecStyleRegistry,
    footer: Option<&SpecFooterTemplate>,
    lunch_label: &str,
) -> Result<SpecSheetLayout, ScheduleError> {
    let n_cols_header = day.headers.len().max(1);
    let c_title = format!("{} - {}", day.weekday_label, day.date_label);
    write_merged_text(
        worksheet,
        (N_ROW_TITLE, 0),
        (N_ROW_TITLE, n_cols_header - 1),
        &c_title,
        &styles.title,
    )?;
    write_header_row(worksheet, N_ROW_HEADER, 0, &day.headers, &styles.header)?;

    let n_col_length = day.headers.len();
    for (n_offset, activity) in day.shifts.iter().enumerate() {
        let n_row = N_ROW_DATA_START + n_offset;
        write_text(worksheet, n_row, N_COL_SHIFT, &activity.shift_time_label, None)?;
        write_text(worksheet, n_row, N_COL_NAME, &activity.employee_name, Some(&styles.name))?;
        write_text(worksheet, n_row, N_COL_PHONE, &activity.phone, None)?;

        for (n_slot, state) in activity.hour_states.iter().enumerate() {
            let n_col = N_COL_HOUR_START + n_slot;
            let (value, format) = match state {
                EnumHourState::Free => (EnumCellValue::None, &styles.free),
                EnumHourState::Work => (EnumCellValue::None, &styles.work),
                EnumHourState::Lunch => {
                    (EnumCellValue::String(lunch_label.to_string()), &styles.lunch)
                }
                EnumHourState::Assigned => {
                    (EnumCellValue::String(activity.role.clone()), &styles.assigned)
                }
            };
            write_cell_with_format(worksheet, n_row, n_col, &value, format)?;
        }
        write_text(worksheet, n_row, n_col_length, &activity.shift_length_label, None)?;
    }

    worksheet
        .set_column_width(cast_col_num(N_COL_SHIFT)?, N_WIDTH_COL_SHIFT)
        .map_err(derive_xlsx_error)?;
    worksheet
        .set_column_width(cast_col_num(N_COL_NAME)?, N_WIDTH_COL_NAME)
        .map_err(derive_xlsx_error)?;
    let n_slots = day.boundaries.len().saturating_sub(1);
    for n_col in N_COL_HOUR_START..N_COL_HOUR_START + n_slots {
        worksheet
            .set_column_width(cast_col_num(n_col)?, N_WIDTH_COL_HOUR)
            .map_err(derive_xlsx_error)?;
    }

    let row_trailing_header = N_ROW_DATA_START + day.shifts.len();
    write_header_row(worksheet, row_trailing_header, 0, &day.headers, &styles.header)?;

    let row_footer = row_trailing_header + 1 + N_ROWS_FOOTER_GAP;
    let cnt_footer_cells = match footer {
        Some(template) if !template.is_empty() => {
            // The whole block must fit before any of it is written.
            cast_row_num(row_footer + template.height() as usize - 1)?;
            replay_footer(worksheet, template, cast_row_num(row_footer)?)?
        }
        _ => 0,
    };

    Ok(SpecSheetLayout {
        row_trailing_header,
        row_footer,
        cnt_footer_cells,
    })
}

/// Unstyled empty text is left unwritten.
fn write_text(
    worksheet: &mut Worksheet,
    n_row: usize,
    n_col: usize,
    text: &str,
    format: Option<&Format>,
) -> Result<(), ScheduleError> {
    let value = if text.is_empty() {
        EnumCellValue::None
    } else {
        EnumCellValue::String(text.to_string())
    };
    match format {
        Some(format) => write_cell_with_format(worksheet, n_row, n_col, &value, format)?,
        None if value == EnumCellValue::None => {}
        None => write_cell_with_format(worksheet, n_row, n_col, &value, &Format::new())?,
    }
    Ok(())
}
