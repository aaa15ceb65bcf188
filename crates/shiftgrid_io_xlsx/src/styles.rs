//! `styles.xml` parsing into [`SpecCellFormat`] descriptors.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::conf::{N_NUM_FMT_ID_CUSTOM_MIN, TUP_INDEXED_COLORS_DEFAULT};
use crate::package::{derive_attr_value, derive_xml_error};
use crate::spec::{SpecCellFormat, XlsxIoError};
use crate::util::{
    apply_color_tint, derive_align_from_xml, derive_border_code, derive_valign_from_xml,
    normalize_xml_color,
};

/// One `<xf>` record of `cellXfs`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecCellXf {
    pub num_fmt_id: u32,
    pub font_id: usize,
    pub fill_id: usize,
    pub border_id: usize,
    /// Alignment children of the record.
    pub alignment: SpecCellFormat,
}

/// Parsed stylesheet tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecStylesheet {
    pub num_fmts: BTreeMap<u32, String>,
    pub fonts: Vec<SpecCellFormat>,
    pub fills: Vec<SpecCellFormat>,
    pub borders: Vec<SpecCellFormat>,
    pub cell_xfs: Vec<SpecCellXf>,
}

impl SpecStylesheet {
    /// Resolve the `s` attribute of a cell into a combined descriptor.
    ///
    /// Unknown indices resolve to the empty format.
    pub fn resolve(&self, xf_idx: usize) -> SpecCellFormat {
        let Some(xf) = self.cell_xfs.get(xf_idx) else {
            return SpecCellFormat::default();
        };

        let mut format = SpecCellFormat::default();
        if let Some(font) = self.fonts.get(xf.font_id) {
            format = format.merge(font);
        }
        if let Some(fill) = self.fills.get(xf.fill_id) {
            format = format.merge(fill);
        }
        if let Some(border) = self.borders.get(xf.border_id) {
            format = format.merge(border);
        }
        format = format.merge(&xf.alignment);

        if xf.num_fmt_id != 0 {
            if let Some(c_code) = self.num_fmts.get(&xf.num_fmt_id) {
                format.num_format = Some(c_code.clone());
            } else if xf.num_fmt_id < N_NUM_FMT_ID_CUSTOM_MIN {
                format.num_format_index = u8::try_from(xf.num_fmt_id).ok();
            }
        }
        format
    }
}

/// A `<color>`/`<fgColor>` reference before theme and palette lookup.
#[derive(Debug, Clone, PartialEq)]
struct SpecColorRef {
    rgb: Option<String>,
    theme: Option<usize>,
    indexed: Option<usize>,
    tint: f64,
}

impl SpecColorRef {
    /// `None` for `auto` and for elements without a color attribute.
    fn parse(e: &BytesStart<'_>, part: &str) -> Result<Option<Self>, XlsxIoError> {
        let color = Self {
            rgb: derive_attr_value(e, b"rgb", part)?,
            theme: derive_attr_value(e, b"theme", part)?.and_then(|val| val.parse().ok()),
            indexed: derive_attr_value(e, b"indexed", part)?.and_then(|val| val.parse().ok()),
            tint: derive_attr_value(e, b"tint", part)?
                .and_then(|val| val.parse().ok())
                .unwrap_or(0.0),
        };
        if color.rgb.is_none() && color.theme.is_none() && color.indexed.is_none() {
            return Ok(None);
        }
        Ok(Some(color))
    }

    /// Resolve to `#RRGGBB`. Indices outside the theme or palette give `None`,
    /// which covers the system colors `indexed="64"`/`"65"`.
    fn resolve(&self, l_theme_colors: &[Option<String>], l_palette: &[String]) -> Option<String> {
        let c_base = if let Some(c_rgb) = &self.rgb {
            normalize_xml_color(c_rgb)?
        } else if let Some(n_theme) = self.theme {
            l_theme_colors.get(n_theme).cloned().flatten()?
        } else {
            let c_hex = l_palette.get(self.indexed?)?;
            normalize_xml_color(c_hex)?
        };
        apply_color_tint(&c_base, self.tint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumColorTarget {
    Font,
    Fill,
    Border,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum EnumStyleSection {
    #[default]
    None,
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellXfs,
    /// `indexedColors` palette overrides.
    Colors,
    /// `dxfs`, `cellStyleXfs` and the like; contents ignored.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumBorderSide {
    Left,
    Right,
    Top,
    Bottom,
    Other,
}

#[derive(Debug, Default)]
struct SpecStyleParseState {
    section: EnumStyleSection,
    sheet: SpecStylesheet,
    font: SpecCellFormat,
    font_color: Option<SpecColorRef>,
    fill_pattern: Option<String>,
    fill_fg: Option<SpecColorRef>,
    border: SpecCellFormat,
    border_side: Option<EnumBorderSide>,
    border_color: Option<SpecColorRef>,
    xf: SpecCellXf,
    /// Color references awaiting resolution, keyed by table and index.
    l_color_refs: Vec<(EnumColorTarget, usize, SpecColorRef)>,
    l_indexed_colors: Vec<String>,
}

impl SpecStyleParseState {
    fn open(&mut self, e: &BytesStart<'_>, part: &str) -> Result<(), XlsxIoError> {
        let name = e.local_name();
        let name = name.as_ref();

        let section = match name {
            b"numFmts" => Some(EnumStyleSection::NumFmts),
            b"fonts" => Some(EnumStyleSection::Fonts),
            b"fills" => Some(EnumStyleSection::Fills),
            b"borders" => Some(EnumStyleSection::Borders),
            b"cellXfs" => Some(EnumStyleSection::CellXfs),
            b"colors" => Some(EnumStyleSection::Colors),
            b"cellStyleXfs" | b"cellStyles" | b"dxfs" | b"tableStyles" | b"extLst" => {
                Some(EnumStyleSection::Ignored)
            }
            _ => None,
        };
        if let Some(section) = section {
            if self.section == EnumStyleSection::None {
                self.section = section;
            }
            return Ok(());
        }

        match self.section {
            EnumStyleSection::NumFmts if name == b"numFmt" => {
                let id = derive_attr_value(e, b"numFmtId", part)?.and_then(|val| val.parse().ok());
                let code = derive_attr_value(e, b"formatCode", part)?;
                if let (Some(id), Some(code)) = (id, code) {
                    self.sheet.num_fmts.insert(id, code);
                }
            }
            EnumStyleSection::Fonts => self.open_font_child(e, name, part)?,
            EnumStyleSection::Fills => match name {
                b"fill" => {
                    self.fill_pattern = None;
                    self.fill_fg = None;
                }
                b"patternFill" => self.fill_pattern = derive_attr_value(e, b"patternType", part)?,
                b"fgColor" => self.fill_fg = SpecColorRef::parse(e, part)?,
                _ => {}
            },
            EnumStyleSection::Colors if name == b"rgbColor" => {
                self.l_indexed_colors
                    .push(derive_attr_value(e, b"rgb", part)?.unwrap_or_default());
            }
            EnumStyleSection::Borders => self.open_border_child(e, name, part)?,
            EnumStyleSection::CellXfs => match name {
                b"xf" => {
                    let derive_index = |key: &[u8]| -> Result<usize, XlsxIoError> {
                        Ok(derive_attr_value(e, key, part)?
                            .and_then(|val| val.parse().ok())
                            .unwrap_or(0))
                    };
                    self.xf = SpecCellXf {
                        num_fmt_id: derive_attr_value(e, b"numFmtId", part)?
                            .and_then(|val| val.parse().ok())
                            .unwrap_or(0),
                        font_id: derive_index(b"fontId")?,
                        fill_id: derive_index(b"fillId")?,
                        border_id: derive_index(b"borderId")?,
                        alignment: SpecCellFormat::default(),
                    };
                }
                b"alignment" => {
                    let alignment = &mut self.xf.alignment;
                    alignment.align = derive_attr_value(e, b"horizontal", part)?
                        .and_then(|val| derive_align_from_xml(&val));
                    alignment.valign = derive_attr_value(e, b"vertical", part)?
                        .and_then(|val| derive_valign_from_xml(&val));
                    if derive_attr_value(e, b"wrapText", part)?
                        .is_some_and(|val| derive_xml_flag(Some(val)))
                    {
                        alignment.text_wrap = Some(true);
                    }
                }
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }

    fn open_font_child(
        &mut self,
        e: &BytesStart<'_>,
        name: &[u8],
        part: &str,
    ) -> Result<(), XlsxIoError> {
        match name {
            b"font" => {
                self.font = SpecCellFormat::default();
                self.font_color = None;
            }
            b"b" => {
                if derive_xml_flag(derive_attr_value(e, b"val", part)?) {
                    self.font.bold = Some(true);
                }
            }
            b"i" => {
                if derive_xml_flag(derive_attr_value(e, b"val", part)?) {
                    self.font.italic = Some(true);
                }
            }
            b"u" => {
                if derive_attr_value(e, b"val", part)?.as_deref() != Some("none") {
                    self.font.underline = Some(true);
                }
            }
            b"sz" => {
                self.font.font_size =
                    derive_attr_value(e, b"val", part)?.and_then(|val| val.parse().ok());
            }
            b"name" => self.font.font_name = derive_attr_value(e, b"val", part)?,
            b"color" => self.font_color = SpecColorRef::parse(e, part)?,
            _ => {}
        }
        Ok(())
    }

    fn open_border_child(
        &mut self,
        e: &BytesStart<'_>,
        name: &[u8],
        part: &str,
    ) -> Result<(), XlsxIoError> {
        let side = match name {
            b"border" => {
                self.border = SpecCellFormat::default();
                self.border_color = None;
                return Ok(());
            }
            b"left" | b"start" => EnumBorderSide::Left,
            b"right" | b"end" => EnumBorderSide::Right,
            b"top" => EnumBorderSide::Top,
            b"bottom" => EnumBorderSide::Bottom,
            b"diagonal" | b"vertical" | b"horizontal" => EnumBorderSide::Other,
            b"color" => {
                if matches!(self.border_side, Some(side) if side != EnumBorderSide::Other)
                    && self.border_color.is_none()
                {
                    self.border_color = SpecColorRef::parse(e, part)?;
                }
                return Ok(());
            }
            _ => return Ok(()),
        };

        self.border_side = Some(side);
        let n_code = derive_attr_value(e, b"style", part)?
            .map_or(0, |val| derive_border_code(&val));
        if n_code > 0 {
            match side {
                EnumBorderSide::Left => self.border.left = Some(n_code),
                EnumBorderSide::Right => self.border.right = Some(n_code),
                EnumBorderSide::Top => self.border.top = Some(n_code),
                EnumBorderSide::Bottom => self.border.bottom = Some(n_code),
                EnumBorderSide::Other => {}
            }
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"numFmts" | b"fonts" | b"fills" | b"borders" | b"cellXfs" | b"colors"
            | b"cellStyleXfs" | b"cellStyles" | b"dxfs" | b"tableStyles" | b"extLst" => {
                if self.section_matches(name) {
                    self.section = EnumStyleSection::None;
                }
            }
            b"font" if self.section == EnumStyleSection::Fonts => {
                if let Some(color) = self.font_color.take() {
                    self.l_color_refs
                        .push((EnumColorTarget::Font, self.sheet.fonts.len(), color));
                }
                self.sheet.fonts.push(std::mem::take(&mut self.font));
            }
            b"fill" if self.section == EnumStyleSection::Fills => {
                if let Some(c_pattern) = self.fill_pattern.take()
                    && c_pattern != "none"
                    && let Some(color) = self.fill_fg.take()
                {
                    self.l_color_refs
                        .push((EnumColorTarget::Fill, self.sheet.fills.len(), color));
                }
                self.fill_fg = None;
                self.sheet.fills.push(SpecCellFormat::default());
            }
            b"left" | b"start" | b"right" | b"end" | b"top" | b"bottom" | b"diagonal" | b"vertical"
            | b"horizontal"
                if self.section == EnumStyleSection::Borders =>
            {
                self.border_side = None;
            }
            b"border" if self.section == EnumStyleSection::Borders => {
                self.border_side = None;
                if let Some(color) = self.border_color.take() {
                    self.l_color_refs
                        .push((EnumColorTarget::Border, self.sheet.borders.len(), color));
                }
                self.sheet.borders.push(std::mem::take(&mut self.border));
            }
            b"xf" if self.section == EnumStyleSection::CellXfs => {
                self.sheet.cell_xfs.push(std::mem::take(&mut self.xf));
            }
            _ => {}
        }
    }

    fn section_matches(&self, name: &[u8]) -> bool {
        matches!(
            (self.section, name),
            (EnumStyleSection::NumFmts, b"numFmts")
                | (EnumStyleSection::Fonts, b"fonts")
                | (EnumStyleSection::Fills, b"fills")
                | (EnumStyleSection::Borders, b"borders")
                | (EnumStyleSection::CellXfs, b"cellXfs")
                | (EnumStyleSection::Colors, b"colors")
        ) || (self.section == EnumStyleSection::Ignored
            && matches!(
                name,
                b"cellStyleXfs" | b"cellStyles" | b"dxfs" | b"tableStyles" | b"extLst"
            ))
    }

    /// Turn pending color references into `#RRGGBB` on their fonts, fills and borders.
    fn resolve_colors(&mut self, l_theme_colors: &[Option<String>]) {
        let l_palette = if self.l_indexed_colors.is_empty() {
            TUP_INDEXED_COLORS_DEFAULT
                .iter()
                .map(|c_hex| c_hex.to_string())
                .collect::<Vec<_>>()
        } else {
            std::mem::take(&mut self.l_indexed_colors)
        };

        for (target, n_idx, color) in std::mem::take(&mut self.l_color_refs) {
            let c_resolved = color.resolve(l_theme_colors, &l_palette);
            match target {
                EnumColorTarget::Font => {
                    if let Some(font) = self.sheet.fonts.get_mut(n_idx) {
                        font.font_color = c_resolved;
                    }
                }
                EnumColorTarget::Fill => {
                    if let Some(fill) = self.sheet.fills.get_mut(n_idx) {
                        fill.bg_color = c_resolved;
                    }
                }
                EnumColorTarget::Border => {
                    if let Some(border) = self.sheet.borders.get_mut(n_idx) {
                        border.border_color = c_resolved;
                    }
                }
            }
        }
    }
}

/// `<b/>` means on; `<b val="0"/>` means off.
fn derive_xml_flag(val: Option<String>) -> bool {
    match val.as_deref() {
        None => true,
        Some(c_val) => c_val != "0" && !c_val.eq_ignore_ascii_case("false"),
    }
}

/// Parse a stylesheet part.
///
/// `l_theme_colors` comes from the workbook theme (see `TUP_THEME_COLOR_SLOTS`);
/// pass an empty slice when the package has none.
pub fn parse_stylesheet(
    xml: &str,
    part: &str,
    l_theme_colors: &[Option<String>],
) -> Result<SpecStylesheet, XlsxIoError> {
    let mut reader = Reader::from_str(xml);
    let mut state = SpecStyleParseState::default();

    loop {
        match reader.read_event().map_err(|err| derive_xml_error(part, err))? {
            Event::Start(e) => state.open(&e, part)?,
            Event::Empty(e) => {
                state.open(&e, part)?;
                state.close(e.local_name().as_ref());
            }
            Event::End(e) => state.close(e.local_name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
    }
    state.resolve_colors(l_theme_colors);

    tracing::trace!(
        fonts = state.sheet.fonts.len(),
        fills = state.sheet.fills.len(),
        borders = state.sheet.borders.len(),
        cell_xfs = state.sheet.cell_xfs.len(),
        "parsed stylesheet"
    );
    Ok(state.sheet)
}
