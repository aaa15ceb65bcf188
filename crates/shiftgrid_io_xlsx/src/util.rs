//! Stateless helper utilities shared by the reader, capture and writer paths.

use std::collections::BTreeSet;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, FormatUnderline, XlsxError};

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_BORDER_STYLE_NAMES,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::{SpecCellFormat, SpecCellRange, XlsxIoError};

////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Create suffixed sheet name (`base_2`, `base_3`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx_1based: usize) -> String {
    let c_sheet_name_suffix = format!("_{part_idx_1based}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

/// Sanitize `name` and make it unique within `set_sheet_names_existing`.
///
/// The chosen name is recorded in the set.
pub fn derive_unique_sheet_name(
    name: &str,
    set_sheet_names_existing: &mut BTreeSet<String>,
) -> String {
    let c_name = sanitize_sheet_name(name, "_");
    if !set_sheet_names_existing.contains(&c_name) {
        set_sheet_names_existing.insert(c_name.clone());
        return c_name;
    }

    let mut n_idx = 2usize;
    loop {
        let candidate = create_sheet_identifier(&c_name, n_idx);
        if !set_sheet_names_existing.contains(&candidate) {
            set_sheet_names_existing.insert(candidate.clone());
            return candidate;
        }
        n_idx += 1;
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellReferences

/// Convert column letters (`A`, `AB`) to a zero-based column index.
pub fn derive_column_index(letters: &str) -> Result<u16, XlsxIoError> {
    if letters.is_empty() {
        return Err(XlsxIoError::CellReference(letters.to_string()));
    }
    let mut n_col: usize = 0;
    for chr in letters.chars() {
        if !chr.is_ascii_alphabetic() {
            return Err(XlsxIoError::CellReference(letters.to_string()));
        }
        n_col = n_col * 26 + (chr.to_ascii_uppercase() as usize - 'A' as usize + 1);
        if n_col > N_NCOLS_EXCEL_MAX {
            return Err(XlsxIoError::CellReference(letters.to_string()));
        }
    }
    cast_col_num(n_col - 1)
}

/// Parse `B3` (or `$B$3`) into zero-based `(row, col)`.
pub fn parse_cell_ref(cell_ref: &str) -> Result<(u32, u16), XlsxIoError> {
    let c_ref = cell_ref.replace('$', "");
    let n_split = c_ref
        .find(|chr: char| chr.is_ascii_digit())
        .ok_or_else(|| XlsxIoError::CellReference(cell_ref.to_string()))?;
    let (c_letters, c_digits) = c_ref.split_at(n_split);

    let col = derive_column_index(c_letters)
        .map_err(|_| XlsxIoError::CellReference(cell_ref.to_string()))?;
    let n_row_1based: usize = c_digits
        .parse()
        .map_err(|_| XlsxIoError::CellReference(cell_ref.to_string()))?;
    if n_row_1based == 0 {
        return Err(XlsxIoError::CellReference(cell_ref.to_string()));
    }
    let row = cast_row_num(n_row_1based - 1)
        .map_err(|_| XlsxIoError::CellReference(cell_ref.to_string()))?;
    Ok((row, col))
}

/// Parse `A1:C2` into an inclusive range. A single cell yields a 1x1 range.
pub fn parse_range_ref(range_ref: &str) -> Result<SpecCellRange, XlsxIoError> {
    let (c_first, c_last) = range_ref.split_once(':').unwrap_or((range_ref, range_ref));
    let (row_a, col_a) = parse_cell_ref(c_first)?;
    let (row_b, col_b) = parse_cell_ref(c_last)?;
    Ok(SpecCellRange {
        row_first: u32::min(row_a, row_b),
        col_first: u16::min(col_a, col_b),
        row_last: u32::max(row_a, row_b),
        col_last: u16::max(col_a, col_b),
    })
}

/// Checked conversion to a worksheet row index.
pub fn cast_row_num(value: usize) -> Result<u32, XlsxIoError> {
    if value >= N_NROWS_EXCEL_MAX {
        return Err(XlsxIoError::Write(format!("row index overflow: {value}")));
    }
    u32::try_from(value).map_err(|_| XlsxIoError::Write(format!("row index overflow: {value}")))
}

/// Checked conversion to a worksheet column index.
pub fn cast_col_num(value: usize) -> Result<u16, XlsxIoError> {
    if value >= N_NCOLS_EXCEL_MAX {
        return Err(XlsxIoError::Write(format!("column index overflow: {value}")));
    }
    u16::try_from(value).map_err(|_| XlsxIoError::Write(format!("column index overflow: {value}")))
}

/// Wrap a writer error.
pub fn derive_xlsx_error(err: XlsxError) -> XlsxIoError {
    XlsxIoError::Write(err.to_string())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormatConversion

/// Convert a style descriptor into a writer format.
pub fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }
    if spec.underline.unwrap_or(false) {
        format = format.set_underline(FormatUnderline::Single);
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    } else if let Some(val) = spec.num_format_index {
        format = format.set_num_format_index(val);
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if let Some(val) = spec.top {
        format = format.set_border_top(derive_format_border(val));
    }
    if let Some(val) = spec.bottom {
        format = format.set_border_bottom(derive_format_border(val));
    }
    if let Some(val) = spec.left {
        format = format.set_border_left(derive_format_border(val));
    }
    if let Some(val) = spec.right {
        format = format.set_border_right(derive_format_border(val));
    }
    if let Some(val) = &spec.border_color {
        format = format.set_border_color(val.as_str());
    }

    format
}

/// Map border code to writer border style.
pub fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        0 => FormatBorder::None,
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        8 => FormatBorder::MediumDashed,
        9 => FormatBorder::DashDot,
        10 => FormatBorder::MediumDashDot,
        11 => FormatBorder::DashDotDot,
        12 => FormatBorder::MediumDashDotDot,
        13 => FormatBorder::SlantDashDot,
        _ => FormatBorder::None,
    }
}

/// Map a `styles.xml` border style name to a border code.
pub fn derive_border_code(style_name: &str) -> i64 {
    TUP_BORDER_STYLE_NAMES
        .iter()
        .position(|c_name| *c_name == style_name)
        .map_or(0, |n_idx| n_idx as i64)
}

/// Map alignment keyword to writer alignment.
pub fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "center_across" => Some(FormatAlign::CenterAcross),
        "distributed" => Some(FormatAlign::Distributed),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        "vjustify" | "vertical_justify" => Some(FormatAlign::VerticalJustify),
        "vdistributed" | "vertical_distributed" => Some(FormatAlign::VerticalDistributed),
        _ => None,
    }
}

/// Map `<alignment horizontal=..>` to an alignment keyword.
pub fn derive_align_from_xml(horizontal: &str) -> Option<String> {
    let c_align = match horizontal {
        "general" => "general",
        "left" => "left",
        "center" => "center",
        "right" => "right",
        "fill" => "fill",
        "justify" => "justify",
        "centerContinuous" => "center_across",
        "distributed" => "distributed",
        _ => return None,
    };
    Some(c_align.to_string())
}

/// Map `<alignment vertical=..>` to an alignment keyword.
pub fn derive_valign_from_xml(vertical: &str) -> Option<String> {
    let c_valign = match vertical {
        "top" => "top",
        "center" => "vcenter",
        "bottom" => "bottom",
        "justify" => "vjustify",
        "distributed" => "vdistributed",
        _ => return None,
    };
    Some(c_valign.to_string())
}

/// Normalize an `ARGB`/`RGB` hex color from `styles.xml` to `#RRGGBB`.
pub fn normalize_xml_color(argb: &str) -> Option<String> {
    let c_hex = argb.trim();
    if !c_hex.chars().all(|chr| chr.is_ascii_hexdigit()) {
        return None;
    }
    let c_rgb = match c_hex.len() {
        8 => &c_hex[2..],
        6 => c_hex,
        _ => return None,
    };
    Some(format!("#{}", c_rgb.to_ascii_uppercase()))
}

/// Apply an OOXML `tint` to a `#RRGGBB` color.
///
/// Negative tints darken and positive tints lighten, both on HSL luminance.
pub fn apply_color_tint(rgb: &str, tint: f64) -> Option<String> {
    let c_hex = rgb.strip_prefix('#').unwrap_or(rgb);
    if c_hex.len() != 6 || !c_hex.chars().all(|chr| chr.is_ascii_hexdigit()) {
        return None;
    }
    if tint == 0.0 {
        return Some(format!("#{}", c_hex.to_ascii_uppercase()));
    }
    let derive_channel = |n_idx: usize| {
        u8::from_str_radix(&c_hex[n_idx..n_idx + 2], 16).map_or(0.0, |val| f64::from(val) / 255.0)
    };
    let (h, s, l) = convert_rgb_to_hsl(derive_channel(0), derive_channel(2), derive_channel(4));

    let tint = tint.clamp(-1.0, 1.0);
    let l = if tint < 0.0 {
        l * (1.0 + tint)
    } else {
        l * (1.0 - tint) + tint
    };
    let (r, g, b) = convert_hsl_to_rgb(h, s, l);
    let cast_channel = |val: f64| (val * 255.0).round().clamp(0.0, 255.0) as u8;
    Some(format!(
        "#{:02X}{:02X}{:02X}",
        cast_channel(r),
        cast_channel(g),
        cast_channel(b)
    ))
}

fn convert_rgb_to_hsl(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let n_max = r.max(g).max(b);
    let n_min = r.min(g).min(b);
    let l = (n_max + n_min) / 2.0;
    if n_max == n_min {
        return (0.0, 0.0, l);
    }

    let d = n_max - n_min;
    let s = if l > 0.5 {
        d / (2.0 - n_max - n_min)
    } else {
        d / (n_max + n_min)
    };
    let h = if n_max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if n_max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h / 6.0, s, l)
}

fn convert_hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (l, l, l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let derive_hue = |t: f64| {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    (derive_hue(h + 1.0 / 3.0), derive_hue(h), derive_hue(h - 1.0 / 3.0))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
