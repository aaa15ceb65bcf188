//! Raw OOXML package access: zip parts, workbook relationships, shared strings.

use std::fmt::Display;
use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::conf::{
    C_PART_SHARED_STRINGS_DEFAULT, C_PART_STYLES_DEFAULT, C_PART_THEME_DEFAULT, C_PART_WORKBOOK,
    C_PART_WORKBOOK_RELS, TUP_THEME_COLOR_SLOTS,
};
use crate::spec::XlsxIoError;
use crate::util::normalize_xml_color;

/// One sheet entry of `workbook.xml` resolved to its package part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpecSheetPart {
    pub(crate) name: String,
    pub(crate) path_part: String,
}

/// Part locations needed to read cells and styles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpecWorkbookLayout {
    pub(crate) sheets: Vec<SpecSheetPart>,
    pub(crate) path_styles: String,
    pub(crate) path_shared_strings: String,
    pub(crate) path_theme: String,
}

pub(crate) struct XlsxPackage<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> XlsxPackage<'a> {
    pub(crate) fn open(v_bytes: &'a [u8]) -> Result<Self, XlsxIoError> {
        let archive = ZipArchive::new(Cursor::new(v_bytes))
            .map_err(|err| XlsxIoError::Open(err.to_string()))?;
        Ok(Self { archive })
    }

    /// Read a part as UTF-8 text; `None` when the part is absent.
    pub(crate) fn read_part_optional(
        &mut self,
        path_part: &str,
    ) -> Result<Option<String>, XlsxIoError> {
        let mut file = match self.archive.by_name(path_part) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(XlsxIoError::Open(format!("{path_part}: {err}"))),
        };
        let mut c_text = String::new();
        file.read_to_string(&mut c_text)
            .map_err(|err| XlsxIoError::Open(format!("{path_part}: {err}")))?;
        Ok(Some(c_text))
    }

    pub(crate) fn read_part(&mut self, path_part: &str) -> Result<String, XlsxIoError> {
        self.read_part_optional(path_part)?
            .ok_or_else(|| XlsxIoError::Open(format!("missing package part {path_part}")))
    }

    /// Resolve sheet names to worksheet parts via the workbook relationships.
    pub(crate) fn derive_workbook_layout(&mut self) -> Result<SpecWorkbookLayout, XlsxIoError> {
        let xml_rels = self.read_part(C_PART_WORKBOOK_RELS)?;
        let l_rels = parse_relationships(&xml_rels, C_PART_WORKBOOK_RELS)?;
        let xml_workbook = self.read_part(C_PART_WORKBOOK)?;
        let l_sheet_refs = parse_workbook_sheets(&xml_workbook, C_PART_WORKBOOK)?;

        let mut sheets = Vec::with_capacity(l_sheet_refs.len());
        for (c_name, c_rel_id) in l_sheet_refs {
            let Some(rel) = l_rels.iter().find(|rel| rel.id == c_rel_id) else {
                return Err(derive_xml_error(
                    C_PART_WORKBOOK,
                    format!("sheet {c_name:?} references unknown relationship {c_rel_id:?}"),
                ));
            };
            sheets.push(SpecSheetPart {
                name: c_name,
                path_part: derive_part_path(&rel.target),
            });
        }

        let derive_rel_path = |c_suffix: &str, c_default: &str| {
            l_rels
                .iter()
                .find(|rel| rel.rel_type.ends_with(c_suffix))
                .map_or_else(|| c_default.to_string(), |rel| derive_part_path(&rel.target))
        };

        Ok(SpecWorkbookLayout {
            sheets,
            path_styles: derive_rel_path("/styles", C_PART_STYLES_DEFAULT),
            path_shared_strings: derive_rel_path("/sharedStrings", C_PART_SHARED_STRINGS_DEFAULT),
            path_theme: derive_rel_path("/theme", C_PART_THEME_DEFAULT),
        })
    }
}

#[derive(Debug, Clone)]
struct SpecRelationship {
    id: String,
    rel_type: String,
    target: String,
}

/// Relationship targets are relative to `xl/` unless absolute.
fn derive_part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(c_absolute) => c_absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

fn parse_relationships(xml: &str, part: &str) -> Result<Vec<SpecRelationship>, XlsxIoError> {
    let mut reader = Reader::from_str(xml);
    let mut l_rels = Vec::new();
    loop {
        match reader.read_event().map_err(|err| derive_xml_error(part, err))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                l_rels.push(SpecRelationship {
                    id: derive_attr_value(&e, b"Id", part)?.unwrap_or_default(),
                    rel_type: derive_attr_value(&e, b"Type", part)?.unwrap_or_default(),
                    target: derive_attr_value(&e, b"Target", part)?.unwrap_or_default(),
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(l_rels)
}

fn parse_workbook_sheets(xml: &str, part: &str) -> Result<Vec<(String, String)>, XlsxIoError> {
    let mut reader = Reader::from_str(xml);
    let mut l_sheets = Vec::new();
    loop {
        match reader.read_event().map_err(|err| derive_xml_error(part, err))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let c_name = derive_attr_value(&e, b"name", part)?.unwrap_or_default();
                // `r:id`; the local name is `id`.
                let c_rel_id = derive_attr_value(&e, b"id", part)?.unwrap_or_default();
                l_sheets.push((c_name, c_rel_id));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(l_sheets)
}

/// Parse `sharedStrings.xml` into the string table. Rich-text runs are concatenated,
/// phonetic runs are dropped.
pub(crate) fn parse_shared_strings(xml: &str, part: &str) -> Result<Vec<String>, XlsxIoError> {
    let mut reader = Reader::from_str(xml);
    let mut l_strings = Vec::new();
    let mut c_current = String::new();
    let mut if_in_si = false;
    let mut if_in_t = false;
    let mut if_in_phonetic = false;

    loop {
        match reader.read_event().map_err(|err| derive_xml_error(part, err))? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => {
                    if_in_si = true;
                    c_current.clear();
                }
                b"rPh" => if_in_phonetic = true,
                b"t" if if_in_si && !if_in_phonetic => if_in_t = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => l_strings.push(String::new()),
            Event::Text(e) if if_in_t => {
                let c_text = e.unescape().map_err(|err| derive_xml_error(part, err))?;
                c_current.push_str(&c_text);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => if_in_t = false,
                b"rPh" => if_in_phonetic = false,
                b"si" => {
                    if_in_si = false;
                    l_strings.push(std::mem::take(&mut c_current));
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(l_strings)
}

/// Parse the color scheme of a theme part.
///
/// Entries follow `theme="N"` indexing; slots the scheme lacks are `None`.
pub(crate) fn parse_theme_colors(
    xml: &str,
    part: &str,
) -> Result<Vec<Option<String>>, XlsxIoError> {
    let mut reader = Reader::from_str(xml);
    let mut l_colors = vec![None; TUP_THEME_COLOR_SLOTS.len()];
    let mut slot_current: Option<usize> = None;
    let mut if_in_scheme = false;

    loop {
        match reader.read_event().map_err(|err| derive_xml_error(part, err))? {
            Event::Start(e) | Event::Empty(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"clrScheme" => if_in_scheme = true,
                    b"srgbClr" | b"sysClr" if if_in_scheme => {
                        let key: &[u8] = if name.as_ref() == b"srgbClr" {
                            b"val"
                        } else {
                            b"lastClr"
                        };
                        if let Some(n_slot) = slot_current
                            && l_colors[n_slot].is_none()
                        {
                            l_colors[n_slot] = derive_attr_value(&e, key, part)?
                                .and_then(|val| normalize_xml_color(&val));
                        }
                    }
                    c_name if if_in_scheme => {
                        if let Some(n_slot) = TUP_THEME_COLOR_SLOTS
                            .iter()
                            .position(|c_slot| c_slot.as_bytes() == c_name)
                        {
                            slot_current = Some(n_slot);
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"clrScheme" => break,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(l_colors)
}

/// Read an attribute by local name (namespace prefix ignored).
pub(crate) fn derive_attr_value(
    e: &BytesStart<'_>,
    key: &[u8],
    part: &str,
) -> Result<Option<String>, XlsxIoError> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|err| derive_xml_error(part, err))?;
        if attr.key.local_name().as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|err| derive_xml_error(part, err))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

pub(crate) fn derive_xml_error(part: &str, err: impl Display) -> XlsxIoError {
    XlsxIoError::Xml {
        part: part.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shared_strings_concatenates_runs() {
        let xml = r#"<?xml version="1.0"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3">
  <si><t>Plain</t></si>
  <si><r><t>Rich </t></r><r><t xml:space="preserve">text</t></r><rPh><t>x</t></rPh></si>
  <si/>
  <si><t>A &amp; B</t></si>
</sst>"#;
        let l_strings = parse_shared_strings(xml, "xl/sharedStrings.xml").unwrap();
        assert_eq!(l_strings, vec!["Plain", "Rich text", "", "A & B"]);
    }

    #[test]
    fn test_parse_theme_colors_swaps_light_and_dark() {
        let xml = r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
<a:themeElements><a:clrScheme name="Office">
  <a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
  <a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>
  <a:dk2><a:srgbClr val="1F497D"/></a:dk2>
  <a:lt2><a:srgbClr val="EEECE1"/></a:lt2>
  <a:accent1><a:srgbClr val="4F81BD"/></a:accent1>
</a:clrScheme></a:themeElements></a:theme>"#;
        let l_colors = parse_theme_colors(xml, "xl/theme/theme1.xml").unwrap();
        assert_eq!(l_colors.len(), 12);
        assert_eq!(l_colors[0].as_deref(), Some("#FFFFFF"));
        assert_eq!(l_colors[1].as_deref(), Some("#000000"));
        assert_eq!(l_colors[2].as_deref(), Some("#EEECE1"));
        assert_eq!(l_colors[3].as_deref(), Some("#1F497D"));
        assert_eq!(l_colors[4].as_deref(), Some("#4F81BD"));
        assert_eq!(l_colors[5], None);
    }

    #[test]
    fn test_relationship_targets_resolve_under_xl() {
        assert_eq!(derive_part_path("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(derive_part_path("/xl/styles.xml"), "xl/styles.xml");
    }

    #[test]
    fn test_parse_workbook_sheets_reads_prefixed_relationship_id() {
        let xml = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Footer" sheetId="1" r:id="rId3"/></sheets></workbook>"#;
        let l_sheets = parse_workbook_sheets(xml, "xl/workbook.xml").unwrap();
        assert_eq!(l_sheets, vec![("Footer".to_string(), "rId3".to_string())]);
    }
}
