//! Footer template capture and replay.
//!
//! Capture reads a template sheet straight from the package XML so that cell
//! styles survive; replay writes the captured block into a destination worksheet
//! below its last used row.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rust_xlsxwriter::Worksheet;

use crate::package::{
    XlsxPackage, derive_attr_value, derive_xml_error, parse_shared_strings, parse_theme_colors,
};
use crate::reader::select_sheet_name;
use crate::spec::{
    EnumCellValue, EnumSheetSelector, SpecCellFormat, SpecCellRange, SpecFooterCell,
    SpecFooterTemplate, XlsxIoError,
};
use crate::styles::{SpecStylesheet, parse_stylesheet};
use crate::util::{derive_rust_xlsx_format, parse_cell_ref, parse_range_ref};
use crate::writer::{write_cell_with_format, write_merged_text};

////////////////////////////////////////////////////////////////////////////////
// #region Capture

#[derive(Debug, Default)]
struct SpecRawCell {
    row: u32,
    col: u16,
    style_idx: usize,
    cell_type: Option<String>,
    raw_value: Option<String>,
    inline_text: Option<String>,
}

#[derive(Debug, Default)]
struct SpecSheetParseState {
    cells: Vec<SpecRawCell>,
    merges: Vec<SpecCellRange>,
    row_current: u32,
    col_next: u16,
    cell: Option<SpecRawCell>,
    if_in_v: bool,
    if_in_is: bool,
    if_in_t: bool,
    if_in_phonetic: bool,
}

impl SpecSheetParseState {
    fn open(&mut self, e: &BytesStart<'_>, part: &str) -> Result<(), XlsxIoError> {
        match e.local_name().as_ref() {
            b"row" => {
                if let Some(n_row) =
                    derive_attr_value(e, b"r", part)?.and_then(|val| val.parse::<u32>().ok())
                    && n_row > 0
                {
                    self.row_current = n_row - 1;
                }
                self.col_next = 0;
            }
            b"c" => {
                let (row, col) = match derive_attr_value(e, b"r", part)? {
                    Some(c_ref) => parse_cell_ref(&c_ref)?,
                    None => (self.row_current, self.col_next),
                };
                self.col_next = col.saturating_add(1);
                self.cell = Some(SpecRawCell {
                    row,
                    col,
                    style_idx: derive_attr_value(e, b"s", part)?
                        .and_then(|val| val.parse().ok())
                        .unwrap_or(0),
                    cell_type: derive_attr_value(e, b"t", part)?,
                    ..Default::default()
                });
            }
            b"v" if self.cell.is_some() => self.if_in_v = true,
            b"is" if self.cell.is_some() => self.if_in_is = true,
            b"rPh" => self.if_in_phonetic = true,
            b"t" if self.if_in_is && !self.if_in_phonetic => self.if_in_t = true,
            b"mergeCell" => {
                if let Some(c_ref) = derive_attr_value(e, b"ref", part)? {
                    let range = parse_range_ref(&c_ref)?;
                    if range.row_first != range.row_last || range.col_first != range.col_last {
                        self.merges.push(range);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn push_text(&mut self, c_text: &str) {
        let Some(cell) = self.cell.as_mut() else {
            return;
        };
        if self.if_in_v {
            cell.raw_value.get_or_insert_with(String::new).push_str(c_text);
        } else if self.if_in_t {
            cell.inline_text.get_or_insert_with(String::new).push_str(c_text);
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"v" => self.if_in_v = false,
            b"t" => self.if_in_t = false,
            b"rPh" => self.if_in_phonetic = false,
            b"is" => self.if_in_is = false,
            b"c" => {
                if let Some(cell) = self.cell.take() {
                    self.cells.push(cell);
                }
            }
            _ => {}
        }
    }
}

fn parse_sheet_cells(
    xml: &str,
    part: &str,
) -> Result<(Vec<SpecRawCell>, Vec<SpecCellRange>), XlsxIoError> {
    let mut reader = Reader::from_str(xml);
    let mut state = SpecSheetParseState::default();

    loop {
        match reader.read_event().map_err(|err| derive_xml_error(part, err))? {
            Event::Start(e) => state.open(&e, part)?,
            Event::Empty(e) => {
                state.open(&e, part)?;
                state.close(e.local_name().as_ref());
            }
            Event::Text(e) => {
                let c_text = e.unescape().map_err(|err| derive_xml_error(part, err))?;
                state.push_text(&c_text);
            }
            Event::CData(e) => {
                let c_text = String::from_utf8_lossy(&e).into_owned();
                state.push_text(&c_text);
            }
            Event::End(e) => state.close(e.local_name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok((state.cells, state.merges))
}

fn derive_cell_value(
    cell: &SpecRawCell,
    l_shared_strings: &[String],
    part: &str,
) -> Result<EnumCellValue, XlsxIoError> {
    let value = match cell.cell_type.as_deref() {
        Some("s") => {
            let Some(c_raw) = cell.raw_value.as_deref() else {
                return Ok(EnumCellValue::None);
            };
            let c_text = c_raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n_idx| l_shared_strings.get(n_idx))
                .ok_or_else(|| {
                    derive_xml_error(part, format!("shared string index {c_raw:?} out of range"))
                })?;
            EnumCellValue::String(c_text.clone())
        }
        Some("inlineStr") => EnumCellValue::String(cell.inline_text.clone().unwrap_or_default()),
        Some("b") => EnumCellValue::Boolean(cell.raw_value.as_deref().map(str::trim) == Some("1")),
        Some("str" | "e" | "d") => match &cell.raw_value {
            Some(c_raw) => EnumCellValue::String(c_raw.clone()),
            None => EnumCellValue::None,
        },
        _ => match cell.raw_value.as_deref().map(str::trim) {
            None | Some("") => EnumCellValue::None,
            Some(c_raw) => match c_raw.parse::<f64>() {
                Ok(val) => EnumCellValue::Number(val),
                Err(_) => EnumCellValue::String(c_raw.to_string()),
            },
        },
    };
    Ok(value)
}

/// Capture every cell (styled empty cells included) of the selected sheet.
///
/// Formula cells contribute their cached value. Merge ranges are attached to
/// their anchor cell; an anchor missing from the sheet XML is synthesized as a
/// blank cell.
pub fn capture_footer(
    v_bytes: &[u8],
    selector: &EnumSheetSelector,
) -> Result<SpecFooterTemplate, XlsxIoError> {
    let mut package = XlsxPackage::open(v_bytes)?;
    let layout = package.derive_workbook_layout()?;

    let l_sheet_names = layout
        .sheets
        .iter()
        .map(|sheet| sheet.name.clone())
        .collect::<Vec<_>>();
    let c_sheet_name = select_sheet_name(&l_sheet_names, selector)?;
    let Some(sheet_part) = layout.sheets.iter().find(|sheet| sheet.name == c_sheet_name) else {
        return Err(XlsxIoError::SheetNotFound(c_sheet_name));
    };

    let l_shared_strings = match package.read_part_optional(&layout.path_shared_strings)? {
        Some(xml) => parse_shared_strings(&xml, &layout.path_shared_strings)?,
        None => Vec::new(),
    };
    let l_theme_colors = match package.read_part_optional(&layout.path_theme)? {
        Some(xml) => parse_theme_colors(&xml, &layout.path_theme)?,
        None => Vec::new(),
    };
    let stylesheet = match package.read_part_optional(&layout.path_styles)? {
        Some(xml) => parse_stylesheet(&xml, &layout.path_styles, &l_theme_colors)?,
        None => SpecStylesheet::default(),
    };

    let xml_sheet = package.read_part(&sheet_part.path_part)?;
    let (l_raw_cells, l_merges) = parse_sheet_cells(&xml_sheet, &sheet_part.path_part)?;

    let mut cells = Vec::with_capacity(l_raw_cells.len());
    for raw in &l_raw_cells {
        cells.push(SpecFooterCell {
            row: raw.row,
            col: raw.col,
            value: derive_cell_value(raw, &l_shared_strings, &sheet_part.path_part)?,
            format: stylesheet.resolve(raw.style_idx),
            merge_range: l_merges
                .iter()
                .find(|range| range.is_anchor(raw.row, raw.col))
                .copied(),
        });
    }
    for range in &l_merges {
        if !cells
            .iter()
            .any(|cell| cell.row == range.row_first && cell.col == range.col_first)
        {
            cells.push(SpecFooterCell {
                row: range.row_first,
                col: range.col_first,
                value: EnumCellValue::None,
                format: SpecCellFormat::default(),
                merge_range: Some(*range),
            });
        }
    }
    cells.sort_by_key(|cell| (cell.row, cell.col));

    tracing::debug!(
        sheet = %c_sheet_name,
        cells = cells.len(),
        merges = l_merges.len(),
        "captured footer template"
    );
    Ok(SpecFooterTemplate {
        sheet_name: c_sheet_name,
        cells,
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Replay

/// Write `template` into `worksheet`, shifting every row by `row_offset`.
///
/// Cells covered by a merge (other than its anchor) are skipped. Returns the
/// number of cells written.
pub fn replay_footer(
    worksheet: &mut Worksheet,
    template: &SpecFooterTemplate,
    row_offset: u32,
) -> Result<usize, XlsxIoError> {
    let l_merges = template
        .cells
        .iter()
        .filter_map(|cell| cell.merge_range)
        .collect::<Vec<_>>();
    let n_offset = row_offset as usize;

    let mut n_written = 0usize;
    for cell in &template.cells {
        if l_merges
            .iter()
            .any(|range| range.contains(cell.row, cell.col) && !range.is_anchor(cell.row, cell.col))
        {
            continue;
        }

        let format = derive_rust_xlsx_format(&cell.format);
        let n_row = cell.row as usize + n_offset;
        let n_col = cell.col as usize;

        match cell.merge_range {
            Some(range) => {
                let c_text = match &cell.value {
                    EnumCellValue::String(val) => val.as_str(),
                    _ => "",
                };
                write_merged_text(
                    worksheet,
                    (n_row, n_col),
                    (range.row_last as usize + n_offset, range.col_last as usize),
                    c_text,
                    &format,
                )?;
                if matches!(cell.value, EnumCellValue::Number(_) | EnumCellValue::Boolean(_)) {
                    write_cell_with_format(worksheet, n_row, n_col, &cell.value, &format)?;
                }
            }
            None => {
                if cell.value == EnumCellValue::None && cell.format.is_empty() {
                    continue;
                }
                write_cell_with_format(worksheet, n_row, n_col, &cell.value, &format)?;
            }
        }
        n_written += 1;
    }
    Ok(n_written)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use calamine::{Data, Reader as _, Xlsx};
    use rust_xlsxwriter::{Color, Format, FormatAlign, Formula, Workbook};
    use std::io::Cursor;

    use super::*;

    fn build_template() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet_other = workbook.add_worksheet();
        sheet_other.set_name("Notes").unwrap();
        sheet_other.write_string(0, 0, "not the footer").unwrap();

        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Footer").unwrap();
        let fmt_title = Format::new()
            .set_bold()
            .set_background_color("#A1C2F1")
            .set_align(FormatAlign::Center);
        worksheet
            .merge_range(0, 0, 0, 3, "Manager signature", &fmt_title)
            .unwrap();
        worksheet.write_number(1, 0, 42.5).unwrap();
        worksheet.write_boolean(1, 1, true).unwrap();
        worksheet
            .write_blank(1, 2, &Format::new().set_background_color("#F6EFBD"))
            .unwrap();
        worksheet
            .write_formula(2, 0, Formula::new("=1+1").set_result("2"))
            .unwrap();
        worksheet.write_string(2, 1, "Thanks & see you").unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_capture_footer_reads_values_styles_and_merges() {
        let template =
            capture_footer(&build_template(), &EnumSheetSelector::Named("Footer".to_string()))
                .unwrap();

        assert_eq!(template.sheet_name, "Footer");
        assert_eq!(template.height(), 3);

        let anchor = &template.cells[0];
        assert_eq!((anchor.row, anchor.col), (0, 0));
        assert_eq!(anchor.value, EnumCellValue::String("Manager signature".to_string()));
        assert_eq!(anchor.format.bold, Some(true));
        assert_eq!(anchor.format.bg_color.as_deref(), Some("#A1C2F1"));
        assert_eq!(anchor.format.align.as_deref(), Some("center"));
        assert_eq!(
            anchor.merge_range,
            Some(SpecCellRange {
                row_first: 0,
                col_first: 0,
                row_last: 0,
                col_last: 3,
            })
        );

        let find = |row: u32, col: u16| {
            template
                .cells
                .iter()
                .find(|cell| cell.row == row && cell.col == col)
                .expect("captured cell")
        };
        assert_eq!(find(1, 0).value, EnumCellValue::Number(42.5));
        assert_eq!(find(1, 1).value, EnumCellValue::Boolean(true));
        assert_eq!(find(1, 2).value, EnumCellValue::None);
        assert_eq!(find(1, 2).format.bg_color.as_deref(), Some("#F6EFBD"));
        assert_eq!(find(2, 0).value, EnumCellValue::Number(2.0));
        assert_eq!(
            find(2, 1).value,
            EnumCellValue::String("Thanks & see you".to_string())
        );
    }

    #[test]
    fn test_capture_footer_defaults_to_first_sheet() {
        let template = capture_footer(&build_template(), &EnumSheetSelector::First).unwrap();
        assert_eq!(template.sheet_name, "Notes");
        assert_eq!(template.cells.len(), 1);
    }

    #[test]
    fn test_capture_footer_rejects_invalid_bytes() {
        assert!(matches!(
            capture_footer(b"plain text", &EnumSheetSelector::First),
            Err(XlsxIoError::Open(_))
        ));
    }

    #[test]
    fn test_replay_footer_round_trips_at_offset() {
        let template =
            capture_footer(&build_template(), &EnumSheetSelector::Named("Footer".to_string()))
                .unwrap();

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "body").unwrap();
        let n_written = replay_footer(worksheet, &template, 5).unwrap();
        assert_eq!(n_written, 6);
        let v_bytes = workbook.save_to_buffer().unwrap();

        let replayed = capture_footer(&v_bytes, &EnumSheetSelector::First).unwrap();
        let anchor = replayed
            .cells
            .iter()
            .find(|cell| cell.row == 5 && cell.col == 0)
            .expect("anchor");
        assert_eq!(anchor.value, EnumCellValue::String("Manager signature".to_string()));
        assert_eq!(anchor.format.bold, Some(true));
        assert_eq!(anchor.format.bg_color.as_deref(), Some("#A1C2F1"));
        assert_eq!(anchor.format.align.as_deref(), Some("center"));
        assert_eq!(anchor.merge_range.map(|range| range.row_last), Some(5));

        let mut reader: Xlsx<_> = Xlsx::new(Cursor::new(v_bytes)).unwrap();
        let range = reader.worksheet_range_at(0).unwrap().unwrap();
        assert_eq!(range.get_value((6, 0)), Some(&Data::Float(42.5)));
        assert_eq!(range.get_value((6, 1)), Some(&Data::Bool(true)));
        assert_eq!(range.get_value((7, 0)), Some(&Data::Float(2.0)));
    }

    #[test]
    fn test_replay_footer_keeps_theme_colors() {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let fmt_theme = Format::new()
            .set_background_color(Color::Theme(4, 2))
            .set_font_color(Color::Theme(1, 0));
        worksheet
            .write_string_with_format(0, 0, "Approved", &fmt_theme)
            .unwrap();
        let template =
            capture_footer(&workbook.save_to_buffer().unwrap(), &EnumSheetSelector::First)
                .unwrap();

        let captured = &template.cells[0].format;
        let c_bg_color = captured.bg_color.clone().expect("theme fill resolved");
        assert_eq!(c_bg_color.len(), 7);
        assert_ne!(c_bg_color, "#4F81BD");
        assert_eq!(captured.font_color.as_deref(), Some("#000000"));

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        replay_footer(worksheet, &template, 2).unwrap();
        let replayed =
            capture_footer(&workbook.save_to_buffer().unwrap(), &EnumSheetSelector::First)
                .unwrap();
        let cell = replayed
            .cells
            .iter()
            .find(|cell| cell.row == 2 && cell.col == 0)
            .expect("replayed cell");
        assert_eq!(cell.format.bg_color.as_deref(), Some(c_bg_color.as_str()));
        assert_eq!(cell.format.font_color.as_deref(), Some("#000000"));
    }

    #[test]
    fn test_replay_footer_reports_row_overflow() {
        let template =
            capture_footer(&build_template(), &EnumSheetSelector::Named("Footer".to_string()))
                .unwrap();
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let err = replay_footer(worksheet, &template, 1_048_575).unwrap_err();
        assert!(matches!(err, XlsxIoError::Write(_)));
    }
}
