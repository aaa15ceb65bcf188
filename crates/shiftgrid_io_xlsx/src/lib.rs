//! `shiftgrid_io_xlsx`:
//! XLSX read/capture/write kernel for schedule workbooks.
//!
//! - `conf`    : constants and package part locations
//! - `spec`    : cell, footer and error models
//! - `util`    : pure helper functions
//! - `reader`  : value-only table reader (input workbooks)
//! - `package` : raw OOXML part access
//! - `styles`  : `styles.xml` to format descriptors
//! - `footer`  : footer template capture and replay
//! - `writer`  : cell-level write helpers
pub mod conf;
pub mod footer;
mod package;
pub mod reader;
pub mod spec;
pub mod styles;
pub mod util;
pub mod writer;

pub use conf::{N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL};
pub use footer::{capture_footer, replay_footer};
pub use reader::{read_table_rows, select_sheet_name};
pub use spec::{
    EnumCellValue, EnumSheetSelector, SpecCellFormat, SpecCellRange, SpecFooterCell,
    SpecFooterTemplate, XlsxIoError,
};
pub use util::{
    cast_col_num, cast_row_num, derive_rust_xlsx_format, derive_unique_sheet_name,
    sanitize_sheet_name,
};
pub use writer::{write_cell_with_format, write_header_row, write_merged_text};
