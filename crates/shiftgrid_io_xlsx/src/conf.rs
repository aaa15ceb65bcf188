//! XLSX constants and package part locations.

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Workbook part inside the package.
pub const C_PART_WORKBOOK: &str = "xl/workbook.xml";
/// Workbook relationships part.
pub const C_PART_WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
/// Fallback stylesheet part when relationships do not name one.
pub const C_PART_STYLES_DEFAULT: &str = "xl/styles.xml";
/// Fallback shared-strings part when relationships do not name one.
pub const C_PART_SHARED_STRINGS_DEFAULT: &str = "xl/sharedStrings.xml";

/// Fallback theme part when relationships do not name one.
pub const C_PART_THEME_DEFAULT: &str = "xl/theme/theme1.xml";

/// `clrScheme` slots in the order `theme="N"` indexes them.
///
/// Light/dark pairs come swapped relative to document order.
pub const TUP_THEME_COLOR_SLOTS: [&str; 12] = [
    "lt1", "dk1", "lt2", "dk2", "accent1", "accent2", "accent3", "accent4", "accent5", "accent6",
    "hlink", "folHlink",
];

/// Legacy palette behind `indexed="N"` when `styles.xml` has no `indexedColors`.
pub const TUP_INDEXED_COLORS_DEFAULT: [&str; 64] = [
    "000000", "FFFFFF", "FF0000", "00FF00", "0000FF", "FFFF00", "FF00FF", "00FFFF", //
    "000000", "FFFFFF", "FF0000", "00FF00", "0000FF", "FFFF00", "FF00FF", "00FFFF", //
    "800000", "008000", "000080", "808000", "800080", "008080", "C0C0C0", "808080", //
    "9999FF", "993366", "FFFFCC", "CCFFFF", "660066", "FF8080", "0066CC", "CCCCFF", //
    "000080", "FF00FF", "FFFF00", "00FFFF", "800080", "800000", "008080", "0000FF", //
    "00CCFF", "CCFFFF", "CCFFCC", "FFFF99", "99CCFF", "FF99CC", "CC99FF", "FFCC99", //
    "3366FF", "33CCCC", "99CC00", "FFCC00", "FF9900", "FF6600", "666699", "969696", //
    "003366", "339966", "003300", "333300", "993300", "993366", "333399", "333333",
];

/// First custom number format id; lower ids are built-in.
pub const N_NUM_FMT_ID_CUSTOM_MIN: u32 = 164;

/// Border style names in `styles.xml`, indexed by border code.
///
/// Index order matches [`crate::util::derive_format_border`].
pub const TUP_BORDER_STYLE_NAMES: [&str; 14] = [
    "none",
    "thin",
    "medium",
    "dashed",
    "dotted",
    "thick",
    "double",
    "hair",
    "mediumDashed",
    "dashDot",
    "mediumDashDot",
    "dashDotDot",
    "mediumDashDotDot",
    "slantDashDot",
];
