//! Value-only table reader for input workbooks.

use std::io::Cursor;

use calamine::{Data, DataType, Reader, Xlsx};

use crate::spec::{EnumSheetSelector, XlsxIoError};

/// Resolve `selector` against the workbook's sheet names.
pub fn select_sheet_name(
    sheet_names: &[String],
    selector: &EnumSheetSelector,
) -> Result<String, XlsxIoError> {
    let Some(c_first) = sheet_names.first() else {
        return Err(XlsxIoError::NoSheets);
    };

    match selector {
        EnumSheetSelector::First => Ok(c_first.clone()),
        EnumSheetSelector::Named(name) => sheet_names
            .iter()
            .find(|c_name| *c_name == name)
            .cloned()
            .ok_or_else(|| XlsxIoError::SheetNotFound(name.clone())),
        EnumSheetSelector::PreferNamed(name) => Ok(sheet_names
            .iter()
            .find(|c_name| *c_name == name)
            .unwrap_or(c_first)
            .clone()),
    }
}

/// Read one sheet as a string grid.
///
/// Cells are rendered as text: whole floats lose their `.0`, spreadsheet dates
/// become `YYYY-MM-DD`. Leading empty columns are kept so that column positions
/// match the sheet even when the used range does not start at `A`.
pub fn read_table_rows(
    v_bytes: &[u8],
    selector: &EnumSheetSelector,
) -> Result<Vec<Vec<String>>, XlsxIoError> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(v_bytes)).map_err(|err| XlsxIoError::Open(err.to_string()))?;

    let c_sheet_name = select_sheet_name(&workbook.sheet_names(), selector)?;
    let range = workbook
        .worksheet_range(&c_sheet_name)
        .map_err(|err| XlsxIoError::Open(format!("sheet {c_sheet_name:?}: {err}")))?;

    let n_col_offset = range.start().map_or(0, |(_, col)| col as usize);
    let l_rows = range
        .rows()
        .map(|row| {
            let mut l_cells = vec![String::new(); n_col_offset];
            l_cells.extend(row.iter().map(derive_cell_text));
            l_cells
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        sheet = %c_sheet_name,
        rows = l_rows.len(),
        "read table rows"
    );
    Ok(l_rows)
}

fn derive_cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(val) | Data::DateTimeIso(val) | Data::DurationIso(val) => val.clone(),
        Data::Float(val) => {
            if val.is_finite() && val.fract() == 0.0 && val.abs() < 1e15 {
                format!("{}", *val as i64)
            } else {
                val.to_string()
            }
        }
        Data::Int(val) => val.to_string(),
        Data::Bool(val) => val.to_string(),
        Data::DateTime(_) => cell
            .as_date()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        Data::Error(err) => err.to_string(),
    }
}
