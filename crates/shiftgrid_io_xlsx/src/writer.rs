//! Cell-level write helpers shared by sheet layout and footer replay.

use rust_xlsxwriter::{Format, Worksheet};

use crate::spec::{EnumCellValue, XlsxIoError};
use crate::util::{cast_col_num, cast_row_num, derive_xlsx_error};

/// Write one value with `format`. `None` becomes a styled blank.
pub fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), XlsxIoError> {
    let row = cast_row_num(row_idx)?;
    let col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(row, col, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(row, col, val, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::Number(val) => {
            worksheet
                .write_number_with_format(row, col, *val, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::Boolean(val) => {
            worksheet
                .write_boolean_with_format(row, col, *val, format)
                .map_err(derive_xlsx_error)?;
        }
    }
    Ok(())
}

/// Write `labels` left to right starting at `(row_idx, col_idx_start)`.
///
/// Empty labels are written as styled blanks.
pub fn write_header_row(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx_start: usize,
    labels: &[String],
    fmt_header: &Format,
) -> Result<(), XlsxIoError> {
    for (n_offset, label) in labels.iter().enumerate() {
        let value = if label.is_empty() {
            EnumCellValue::None
        } else {
            EnumCellValue::String(label.clone())
        };
        write_cell_with_format(worksheet, row_idx, col_idx_start + n_offset, &value, fmt_header)?;
    }
    Ok(())
}

/// Merge an inclusive range and write `text` into it.
///
/// A single-cell range is written as a plain cell; the writer rejects one-cell merges.
pub fn write_merged_text(
    worksheet: &mut Worksheet,
    (row_first, col_first): (usize, usize),
    (row_last, col_last): (usize, usize),
    text: &str,
    format: &Format,
) -> Result<(), XlsxIoError> {
    if row_first == row_last && col_first == col_last {
        return write_cell_with_format(
            worksheet,
            row_first,
            col_first,
            &EnumCellValue::String(text.to_string()),
            format,
        );
    }
    worksheet
        .merge_range(
            cast_row_num(row_first)?,
            cast_col_num(col_first)?,
            cast_row_num(row_last)?,
            cast_col_num(col_last)?,
            text,
            format,
        )
        .map_err(derive_xlsx_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_xlsxwriter::Workbook;

    use super::*;
    use crate::conf::N_NROWS_EXCEL_MAX;

    #[test]
    fn test_write_cell_rejects_row_past_sheet_limit() {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let err = write_cell_with_format(
            worksheet,
            N_NROWS_EXCEL_MAX,
            0,
            &EnumCellValue::Number(1.0),
            &Format::new(),
        )
        .unwrap_err();
        assert!(matches!(err, XlsxIoError::Write(_)));
    }

    #[test]
    fn test_write_merged_text_accepts_single_cell() {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        write_merged_text(worksheet, (0, 0), (0, 0), "Title", &Format::new()).unwrap();
        write_merged_text(worksheet, (1, 0), (1, 3), "Wide", &Format::new()).unwrap();
        write_header_row(
            worksheet,
            2,
            0,
            &["Shift".to_string(), String::new()],
            &Format::new().set_bold(),
        )
        .unwrap();
        assert!(workbook.save_to_buffer().is_ok());
    }
}
