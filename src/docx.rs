//! Word-document walker.
//!
//! Sets the font name on every run (`w:r`) of the document body: paragraph
//! runs and table cell runs at any table nesting level. The font name lives
//! in `w:rPr/w:rFonts` as the `w:ascii` and `w:hAnsi` attributes; both are
//! overwritten, all other run properties (size, bold, italic, color, the
//! `w:eastAsia`/`w:cs` font slots) are preserved byte-for-byte. Missing
//! `w:rPr`/`w:rFonts` elements are created at their schema position
//! (`w:rFonts` directly after `w:rStyle` if present, else first).
//!
//! Headers, footers and footnotes live in separate package parts and are
//! not visited; text boxes (`w:txbxContent`) and math runs (`m:r`) inside
//! the body are skipped. Both limitations are deliberate and carried over
//! from the tool this crate replaces.

use crate::error::{Error, Result};
use crate::package::Package;
use crate::xml;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

const MAIN_DOCUMENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

/// Apply the font to every body run of the main document part.
pub(crate) fn apply_font(package: &mut Package, font: &str) -> Result<()> {
    let mains = package.parts_of_type(MAIN_DOCUMENT_TYPE)?;
    let name = mains
        .first()
        .ok_or_else(|| Error::Load("no main document part; not a Word document".to_string()))?
        .clone();
    let part = package
        .part(&name)
        .ok_or_else(|| Error::Load(format!("missing part {name}")))?;

    let rewritten = rewrite_runs(part, font)?;
    package.replace_part(&name, rewritten);
    Ok(())
}

/// Tracks where the rewriter stands relative to the current run.
enum RunState {
    Outside,
    /// `<w:r>` seen, first meaningful child not yet
    AfterRunStart,
    /// inside `<w:rPr>`; `depth` counts open descendant elements
    InProps { fonts_done: bool, depth: usize },
}

/// Rewrite the font of every body run in a `word/document.xml` stream.
pub(crate) fn rewrite_runs(xml_bytes: &[u8], font: &str) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml_bytes);
    reader.config_mut().trim_text(false);

    let mut out = Vec::with_capacity(xml_bytes.len() + 256);
    let mut buf = Vec::new();
    let mut state = RunState::Outside;
    // Runs inside text boxes are out of scope; > 0 disables rewriting.
    let mut txbx_depth = 0usize;

    loop {
        let ev = reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::Processing(e.to_string()))?;
        match ev {
            Event::Eof => break,

            Event::Start(ref e) => {
                let name = e.name();
                if name.as_ref() == b"w:txbxContent" {
                    txbx_depth += 1;
                    xml::write_start(&mut out, e);
                } else if txbx_depth > 0 {
                    xml::write_start(&mut out, e);
                } else {
                    match state {
                        RunState::Outside => {
                            xml::write_start(&mut out, e);
                            if name.as_ref() == b"w:r" {
                                state = RunState::AfterRunStart;
                            }
                        },
                        RunState::AfterRunStart => {
                            if name.as_ref() == b"w:rPr" {
                                xml::write_start(&mut out, e);
                                state = RunState::InProps {
                                    fonts_done: false,
                                    depth: 0,
                                };
                            } else {
                                // Run has no properties: create them.
                                write_new_props(&mut out, font);
                                xml::write_start(&mut out, e);
                                state = RunState::Outside;
                            }
                        },
                        RunState::InProps {
                            ref mut fonts_done,
                            ref mut depth,
                        } => {
                            if *depth == 0 {
                                if name.as_ref() == b"w:rFonts" {
                                    write_patched_fonts(&mut out, e, font, false)?;
                                    *fonts_done = true;
                                } else {
                                    if !*fonts_done && name.as_ref() != b"w:rStyle" {
                                        write_fonts(&mut out, font);
                                        *fonts_done = true;
                                    }
                                    xml::write_start(&mut out, e);
                                }
                            } else {
                                xml::write_start(&mut out, e);
                            }
                            *depth += 1;
                        },
                    }
                }
            },

            Event::Empty(ref e) => {
                let name = e.name();
                if txbx_depth > 0 {
                    xml::write_empty(&mut out, e);
                } else {
                    match state {
                        RunState::Outside => {
                            if name.as_ref() == b"w:r" {
                                // Contentless run: expand so it still gets properties.
                                xml::write_start(&mut out, e);
                                write_new_props(&mut out, font);
                                xml::write_end(&mut out, b"w:r");
                            } else {
                                xml::write_empty(&mut out, e);
                            }
                        },
                        RunState::AfterRunStart => {
                            if name.as_ref() == b"w:rPr" {
                                xml::write_start(&mut out, e);
                                write_fonts(&mut out, font);
                                xml::write_end(&mut out, b"w:rPr");
                            } else {
                                write_new_props(&mut out, font);
                                xml::write_empty(&mut out, e);
                            }
                            state = RunState::Outside;
                        },
                        RunState::InProps {
                            ref mut fonts_done,
                            depth,
                        } => {
                            if depth == 0 {
                                if name.as_ref() == b"w:rFonts" {
                                    write_patched_fonts(&mut out, e, font, true)?;
                                    *fonts_done = true;
                                } else {
                                    if !*fonts_done && name.as_ref() != b"w:rStyle" {
                                        write_fonts(&mut out, font);
                                        *fonts_done = true;
                                    }
                                    xml::write_empty(&mut out, e);
                                }
                            } else {
                                xml::write_empty(&mut out, e);
                            }
                        },
                    }
                }
            },

            Event::End(ref e) => {
                let name = e.name();
                if name.as_ref() == b"w:txbxContent" {
                    txbx_depth = txbx_depth.saturating_sub(1);
                    xml::write_end(&mut out, name.as_ref());
                } else if txbx_depth > 0 {
                    xml::write_end(&mut out, name.as_ref());
                } else {
                    match state {
                        RunState::Outside => {
                            xml::write_end(&mut out, name.as_ref());
                        },
                        RunState::AfterRunStart => {
                            // `<w:r></w:r>` with nothing inside.
                            write_new_props(&mut out, font);
                            xml::write_end(&mut out, name.as_ref());
                            state = RunState::Outside;
                        },
                        RunState::InProps {
                            fonts_done,
                            ref mut depth,
                        } => {
                            if *depth > 0 {
                                *depth -= 1;
                                xml::write_end(&mut out, name.as_ref());
                            } else {
                                // End of w:rPr.
                                if !fonts_done {
                                    write_fonts(&mut out, font);
                                }
                                xml::write_end(&mut out, name.as_ref());
                                state = RunState::Outside;
                            }
                        },
                    }
                }
            },

            Event::Text(ref t) => {
                if txbx_depth == 0
                    && matches!(state, RunState::AfterRunStart)
                    && !xml::is_whitespace_only(t.as_ref())
                {
                    write_new_props(&mut out, font);
                    state = RunState::Outside;
                }
                xml::write_event(&mut out, &ev);
            },

            Event::CData(_) | Event::GeneralRef(_) => {
                if txbx_depth == 0 && matches!(state, RunState::AfterRunStart) {
                    write_new_props(&mut out, font);
                    state = RunState::Outside;
                }
                xml::write_event(&mut out, &ev);
            },

            // Comments, PIs and the declaration never affect run structure.
            _ => xml::write_event(&mut out, &ev),
        }
        buf.clear();
    }

    Ok(out)
}

/// Emit `<w:rFonts w:ascii=".." w:hAnsi=".."/>`.
fn write_fonts(out: &mut Vec<u8>, font: &str) {
    let escaped = xml::escape_xml(font);
    out.extend_from_slice(b"<w:rFonts w:ascii=\"");
    out.extend_from_slice(escaped.as_bytes());
    out.extend_from_slice(b"\" w:hAnsi=\"");
    out.extend_from_slice(escaped.as_bytes());
    out.extend_from_slice(b"\"/>");
}

/// Emit a full `<w:rPr>` block containing only the font element.
fn write_new_props(out: &mut Vec<u8>, font: &str) {
    out.extend_from_slice(b"<w:rPr>");
    write_fonts(out, font);
    out.extend_from_slice(b"</w:rPr>");
}

/// Re-emit an existing `w:rFonts` with `w:ascii`/`w:hAnsi` overwritten.
///
/// Other font slots (`w:eastAsia`, `w:cs`, theme attributes) are preserved.
fn write_patched_fonts(out: &mut Vec<u8>, e: &BytesStart, font: &str, empty: bool) -> Result<()> {
    out.extend_from_slice(b"<w:rFonts");
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::Processing(err.to_string()))?;
        match attr.key.as_ref() {
            b"w:ascii" | b"w:hAnsi" => {},
            key => {
                out.push(b' ');
                out.extend_from_slice(key);
                out.extend_from_slice(b"=\"");
                out.extend_from_slice(&attr.value);
                out.push(b'"');
            },
        }
    }
    let escaped = xml::escape_xml(font);
    out.extend_from_slice(b" w:ascii=\"");
    out.extend_from_slice(escaped.as_bytes());
    out.extend_from_slice(b"\" w:hAnsi=\"");
    out.extend_from_slice(escaped.as_bytes());
    out.push(b'"');
    out.extend_from_slice(if empty { b"/>" } else { b">" });
    Ok(())
}
