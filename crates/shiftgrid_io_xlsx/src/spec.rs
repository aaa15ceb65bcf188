//! Shared XLSX cell, footer and error models.

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell style descriptor.
///
/// Workbook-independent: the same descriptor is converted into a fresh
/// `rust_xlsxwriter::Format` for every destination workbook it is written to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<f64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,
    /// Single underline.
    pub underline: Option<bool>,
    /// Font color (`#RRGGBB`).
    pub font_color: Option<String>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Border style for all sides.
    pub border: Option<i64>,
    /// Top border override.
    pub top: Option<i64>,
    /// Bottom border override.
    pub bottom: Option<i64>,
    /// Left border override.
    pub left: Option<i64>,
    /// Right border override.
    pub right: Option<i64>,
    /// Border color for all sides (`#RRGGBB`).
    pub border_color: Option<String>,

    /// Custom number format code.
    pub num_format: Option<String>,
    /// Built-in number format index.
    pub num_format_index: Option<u8>,
    /// Background fill color (`#RRGGBB`), solid pattern.
    pub bg_color: Option<String>,
}

/// Normalized cell value read from or written to a worksheet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            text_wrap: other.text_wrap.or(self.text_wrap),
            border: other.border.or(self.border),
            top: other.top.or(self.top),
            bottom: other.bottom.or(self.bottom),
            left: other.left.or(self.left),
            right: other.right.or(self.right),
            border_color: other
                .border_color
                .clone()
                .or_else(|| self.border_color.clone()),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            num_format_index: other.num_format_index.or(self.num_format_index),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
        }
    }

    /// True when no property is set.
    pub fn is_empty(&self) -> bool {
        *self == SpecCellFormat::default()
    }
}

/// Which sheet of a workbook to read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnumSheetSelector {
    /// First sheet in workbook order.
    #[default]
    First,
    /// Named sheet; missing name is an error.
    Named(String),
    /// Named sheet when present, otherwise the first sheet.
    PreferNamed(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FooterSpecification

/// Inclusive zero-based cell range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecCellRange {
    /// First row index.
    pub row_first: u32,
    /// First column index.
    pub col_first: u16,
    /// Last row index.
    pub row_last: u32,
    /// Last column index.
    pub col_last: u16,
}

impl SpecCellRange {
    /// True when `(row, col)` lies inside the range.
    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.row_first..=self.row_last).contains(&row)
            && (self.col_first..=self.col_last).contains(&col)
    }

    /// True when `(row, col)` is the top-left anchor of the range.
    pub fn is_anchor(&self, row: u32, col: u16) -> bool {
        row == self.row_first && col == self.col_first
    }
}

/// One captured template cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecFooterCell {
    /// Zero-based row index on the template sheet.
    pub row: u32,
    /// Zero-based column index on the template sheet.
    pub col: u16,
    /// Cell value (cached result for formula cells).
    pub value: EnumCellValue,
    /// Resolved style descriptor.
    pub format: SpecCellFormat,
    /// Merge range anchored at this cell, if any.
    pub merge_range: Option<SpecCellRange>,
}

/// Captured footer block, replayed onto every generated sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecFooterTemplate {
    /// Name of the sheet the cells were captured from.
    pub sheet_name: String,
    /// Cells in row-major document order.
    pub cells: Vec<SpecFooterCell>,
}

impl SpecFooterTemplate {
    /// Number of rows spanned by the template, counting from row 0.
    pub fn height(&self) -> u32 {
        self.cells
            .iter()
            .map(|cell| match cell.merge_range {
                Some(range) => range.row_last + 1,
                None => cell.row + 1,
            })
            .max()
            .unwrap_or(0)
    }

    /// True when nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// XLSX read/write failures.
#[derive(Debug, Error)]
pub enum XlsxIoError {
    /// Workbook bytes could not be opened as an XLSX package.
    #[error("Failed to open workbook: {0}")]
    Open(String),
    /// Requested sheet does not exist.
    #[error("Sheet not found: {0:?}")]
    SheetNotFound(String),
    /// Workbook has no sheets at all.
    #[error("Workbook contains no sheets.")]
    NoSheets,
    /// Malformed package part.
    #[error("Malformed XML in {part}: {message}")]
    Xml {
        /// Package part path.
        part: String,
        /// Parser error text.
        message: String,
    },
    /// Malformed cell or range reference.
    #[error("Invalid cell reference: {0:?}")]
    CellReference(String),
    /// Write failure reported by the workbook writer.
    #[error("xlsx write error: {0}")]
    Write(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_right_side_values() {
        let base = SpecCellFormat {
            bold: Some(true),
            font_size: Some(11.0),
            align: Some("left".to_string()),
            ..Default::default()
        };
        let merged = base.with_(SpecCellFormat {
            align: Some("center".to_string()),
            bg_color: Some("#FFFFFF".to_string()),
            ..Default::default()
        });

        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.font_size, Some(11.0));
        assert_eq!(merged.align.as_deref(), Some("center"));
        assert_eq!(merged.bg_color.as_deref(), Some("#FFFFFF"));
        assert!(!merged.is_empty());
        assert!(SpecCellFormat::default().is_empty());
    }

    #[test]
    fn footer_height_accounts_for_merges() {
        let template = SpecFooterTemplate {
            sheet_name: "Sheet1".to_string(),
            cells: vec![
                SpecFooterCell {
                    row: 0,
                    col: 0,
                    value: EnumCellValue::String("a".to_string()),
                    format: SpecCellFormat::default(),
                    merge_range: Some(SpecCellRange {
                        row_first: 0,
                        col_first: 0,
                        row_last: 2,
                        col_last: 1,
                    }),
                },
                SpecFooterCell {
                    row: 1,
                    col: 3,
                    value: EnumCellValue::Number(1.0),
                    format: SpecCellFormat::default(),
                    merge_range: None,
                },
            ],
        };
        assert_eq!(template.height(), 3);
        assert_eq!(SpecFooterTemplate::default().height(), 0);
    }
}
