//! Spreadsheet walker.
//!
//! Spreadsheet fonts are not per-run: every cell resolves its font through
//! a cell format (`xf`) into the shared `<fonts>` table of `xl/styles.xml`,
//! including empty cells and cells with no explicit style (style 0, font 0).
//! Replacing every entry of that table with one default descriptor is the
//! style-table expression of assigning a single fresh font to every cell of
//! every row of every worksheet.
//!
//! Unlike the word and presentation walkers, this is a wholesale overwrite:
//! the replacement descriptor carries only the default size and the
//! requested name, so per-cell size, bold, italic and color distinctions
//! are discarded. Differential formats (`<dxf>`, used by conditional
//! formatting) keep their own font elements and are left alone.

use crate::error::{Error, Result};
use crate::package::Package;
use crate::xml;
use quick_xml::Reader;
use quick_xml::events::Event;

const WORKBOOK_MAIN_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const STYLES_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";

/// Replace every font of the workbook's style table with the default
/// descriptor carrying the requested name.
pub(crate) fn apply_font(package: &mut Package, font: &str) -> Result<()> {
    if package.parts_of_type(WORKBOOK_MAIN_TYPE)?.is_empty() {
        return Err(Error::Load(
            "no workbook part; not an Excel workbook".to_string(),
        ));
    }
    let styles = package.parts_of_type(STYLES_TYPE)?;
    let name = styles
        .first()
        .ok_or_else(|| Error::Load("workbook has no stylesheet part".to_string()))?
        .clone();
    let part = package
        .part(&name)
        .ok_or_else(|| Error::Load(format!("missing part {name}")))?;

    let rewritten = rewrite_fonts(part, font)?;
    package.replace_part(&name, rewritten);
    Ok(())
}

/// Rewrite every `<font>` entry of the `<fonts>` collection in a
/// `xl/styles.xml` stream.
pub(crate) fn rewrite_fonts(xml_bytes: &[u8], font: &str) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml_bytes);
    reader.config_mut().trim_text(false);

    let mut out = Vec::with_capacity(xml_bytes.len());
    let mut buf = Vec::new();
    let mut in_fonts = false;
    // Some(depth): consuming the children of a replaced <font> entry.
    let mut skipping: Option<usize> = None;

    loop {
        let ev = reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::Processing(e.to_string()))?;
        match ev {
            Event::Eof => break,

            Event::Start(ref e) => {
                if let Some(depth) = skipping.as_mut() {
                    *depth += 1;
                } else if in_fonts && e.local_name().as_ref() == b"font" {
                    write_default_font(&mut out, font);
                    skipping = Some(0);
                } else {
                    if e.local_name().as_ref() == b"fonts" {
                        in_fonts = true;
                    }
                    xml::write_start(&mut out, e);
                }
            },

            Event::Empty(ref e) => {
                if skipping.is_some() {
                    // consumed
                } else if in_fonts && e.local_name().as_ref() == b"font" {
                    write_default_font(&mut out, font);
                } else {
                    xml::write_empty(&mut out, e);
                }
            },

            Event::End(ref e) => {
                if let Some(depth) = skipping.as_mut() {
                    if *depth == 0 {
                        skipping = None;
                    } else {
                        *depth -= 1;
                    }
                } else {
                    if e.local_name().as_ref() == b"fonts" {
                        in_fonts = false;
                    }
                    xml::write_end(&mut out, e.name().as_ref());
                }
            },

            _ => {
                if skipping.is_none() {
                    xml::write_event(&mut out, &ev);
                }
            },
        }
        buf.clear();
    }

    Ok(out)
}

/// Emit the single default font descriptor.
fn write_default_font(out: &mut Vec<u8>, font: &str) {
    out.extend_from_slice(b"<font><sz val=\"11\"/><name val=\"");
    out.extend_from_slice(xml::escape_xml(font).as_bytes());
    out.extend_from_slice(b"\"/></font>");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(xml: &str, font: &str) -> String {
        String::from_utf8(rewrite_fonts(xml.as_bytes(), font).unwrap()).unwrap()
    }

    #[test]
    fn every_font_entry_becomes_the_default_descriptor() {
        let input = concat!(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
            r#"<fonts count="3">"#,
            r#"<font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/><scheme val="minor"/></font>"#,
            r#"<font><b/><sz val="14"/><color rgb="FFFF0000"/><name val="Georgia"/></font>"#,
            r#"<font><i/><name val="Courier New"/></font>"#,
            r#"</fonts>"#,
            r#"<cellXfs count="1"><xf numFmtId="0" fontId="1" fillId="0" borderId="0"/></cellXfs>"#,
            r#"</styleSheet>"#,
        );
        let output = rewrite(input, "Arial");
        assert_eq!(
            output.matches(r#"<font><sz val="11"/><name val="Arial"/></font>"#).count(),
            3
        );
        // Nothing of the old descriptors survives.
        assert!(!output.contains("Georgia"));
        assert!(!output.contains("<b/>"));
        assert!(!output.contains("theme"));
        // Cell formats still reference the (now uniform) table.
        assert!(output.contains(r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="0"/>"#));
        // The collection header is preserved.
        assert!(output.contains(r#"<fonts count="3">"#));
    }

    #[test]
    fn empty_font_entry_is_replaced_too() {
        let input = r#"<styleSheet><fonts count="1"><font/></fonts></styleSheet>"#;
        let output = rewrite(input, "Arial");
        assert_eq!(
            output,
            r#"<styleSheet><fonts count="1"><font><sz val="11"/><name val="Arial"/></font></fonts></styleSheet>"#
        );
    }

    #[test]
    fn differential_format_fonts_are_left_alone() {
        let input = concat!(
            r#"<styleSheet>"#,
            r#"<fonts count="1"><font><name val="Calibri"/></font></fonts>"#,
            r#"<dxfs count="1"><dxf><font><b/><color rgb="FF9C0006"/></font></dxf></dxfs>"#,
            r#"</styleSheet>"#,
        );
        let output = rewrite(input, "Arial");
        assert!(output.contains(r#"<dxf><font><b/><color rgb="FF9C0006"/></font></dxf>"#));
        assert!(output.contains(r#"<font><sz val="11"/><name val="Arial"/></font>"#));
    }

    #[test]
    fn rewrite_is_idempotent() {
        let input = r#"<styleSheet><fonts count="2"><font><sz val="9"/><name val="Tahoma"/></font><font><b/><name val="Arial Black"/></font></fonts></styleSheet>"#;
        let once = rewrite_fonts(input.as_bytes(), "Arial").unwrap();
        let twice = rewrite_fonts(&once, "Arial").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn font_names_are_escaped() {
        let input = r#"<styleSheet><fonts count="1"><font/></fonts></styleSheet>"#;
        let output = rewrite(input, "A&B");
        assert!(output.contains(r#"<name val="A&amp;B"/>"#));
    }
}
