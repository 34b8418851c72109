//! Presentation walker.
//!
//! Sets the font name on every DrawingML run (`a:r`) of every slide. In
//! slide XML one run rule uniformly covers plain text frames, table cells
//! (`a:tbl`) and shapes nested inside groups at any depth, because they all
//! carry their text as `a:p`/`a:r` trees. The font name lives in
//! `a:rPr/a:latin/@typeface`; other attributes of an existing `a:latin`
//! (pitch family, charset) are preserved, and a missing `a:rPr`/`a:latin`
//! is created at its schema position — before `a:ea`, `a:cs`, `a:sym`,
//! hyperlink and `a:rtl`/`a:extLst` children.
//!
//! Chart shapes store their text in separate chart parts. There the
//! rewrite is limited to runs inside `c:title` (chart title and axis
//! titles) and `c:dLbls`/`c:dLbl` (data labels); legend entries and other
//! chart text are deliberately left alone. Fields (`a:fld`) are not runs
//! and are never touched.
//!
//! Group nesting (`p:grpSp`) is tracked explicitly and capped, so a
//! pathologically nested slide aborts with a processing error instead of
//! running unbounded. Slide layouts, masters and notes pages are not
//! visited.

use crate::error::{Error, Result};
use crate::package::Package;
use crate::xml;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

const PRESENTATION_MAIN_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const SLIDE_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CHART_TYPE: &str = "application/vnd.openxmlformats-officedocument.drawingml.chart+xml";

/// Ceiling for `p:grpSp` nesting before the walk aborts.
const MAX_GROUP_DEPTH: usize = 64;

/// Which runs of a part the rewriter may touch.
#[derive(Clone, Copy, PartialEq)]
pub(crate) enum RunScope {
    /// Every run: slide parts
    All,
    /// Only runs inside `c:title` / `c:dLbls`: chart parts
    ChartText,
}

/// Apply the font to every slide and chart part of the presentation.
pub(crate) fn apply_font(package: &mut Package, font: &str) -> Result<()> {
    if package.parts_of_type(PRESENTATION_MAIN_TYPE)?.is_empty() {
        return Err(Error::Load(
            "no presentation part; not a PowerPoint presentation".to_string(),
        ));
    }

    let slides = package.parts_of_type(SLIDE_TYPE)?;
    let charts = package.parts_of_type(CHART_TYPE)?;

    for (names, scope) in [(slides, RunScope::All), (charts, RunScope::ChartText)] {
        for name in names {
            let part = package
                .part(&name)
                .ok_or_else(|| Error::Load(format!("missing part {name}")))?;
            let rewritten = rewrite_runs(part, font, scope)?;
            package.replace_part(&name, rewritten);
        }
    }
    Ok(())
}

/// Tracks where the rewriter stands relative to the current run.
enum RunState {
    Outside,
    /// `<a:r>` seen, first meaningful child not yet
    AfterRunStart,
    /// inside `<a:rPr>`; `depth` counts open descendant elements
    InProps { latin_done: bool, depth: usize },
}

/// Character-property children that must come after `a:latin`.
fn follows_latin(name: &[u8]) -> bool {
    matches!(
        name,
        b"a:ea" | b"a:cs" | b"a:sym" | b"a:hlinkClick" | b"a:hlinkMouseOver" | b"a:rtl"
            | b"a:extLst"
    )
}

/// Rewrite run fonts in a slide or chart part.
pub(crate) fn rewrite_runs(xml_bytes: &[u8], font: &str, scope: RunScope) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml_bytes);
    reader.config_mut().trim_text(false);

    let mut out = Vec::with_capacity(xml_bytes.len() + 256);
    let mut buf = Vec::new();
    let mut state = RunState::Outside;
    let mut group_depth = 0usize;
    // Chart scope: > 0 means inside c:title or c:dLbls/c:dLbl.
    let mut title_depth = 0usize;
    let mut label_depth = 0usize;

    loop {
        let ev = reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::Processing(e.to_string()))?;
        match ev {
            Event::Eof => break,

            Event::Start(ref e) => {
                let name = e.name();
                // Containers only ever open outside a run; counting them
                // here leaves the run machine below untouched.
                match name.as_ref() {
                    b"p:grpSp" => {
                        group_depth += 1;
                        if group_depth > MAX_GROUP_DEPTH {
                            return Err(Error::Processing(format!(
                                "shape group nesting exceeds {MAX_GROUP_DEPTH} levels"
                            )));
                        }
                    },
                    b"c:title" => title_depth += 1,
                    b"c:dLbls" | b"c:dLbl" => label_depth += 1,
                    _ => {},
                }

                let in_scope =
                    scope == RunScope::All || title_depth > 0 || label_depth > 0;
                match state {
                    RunState::Outside => {
                        xml::write_start(&mut out, e);
                        if name.as_ref() == b"a:r" && in_scope {
                            state = RunState::AfterRunStart;
                        }
                    },
                    RunState::AfterRunStart => {
                        if name.as_ref() == b"a:rPr" {
                            xml::write_start(&mut out, e);
                            state = RunState::InProps {
                                latin_done: false,
                                depth: 0,
                            };
                        } else {
                            write_new_props(&mut out, font);
                            xml::write_start(&mut out, e);
                            state = RunState::Outside;
                        }
                    },
                    RunState::InProps {
                        ref mut latin_done,
                        ref mut depth,
                    } => {
                        if *depth == 0 {
                            if name.as_ref() == b"a:latin" {
                                write_patched_latin(&mut out, e, font, false)?;
                                *latin_done = true;
                            } else {
                                if !*latin_done && follows_latin(name.as_ref()) {
                                    write_latin(&mut out, font);
                                    *latin_done = true;
                                }
                                xml::write_start(&mut out, e);
                            }
                        } else {
                            xml::write_start(&mut out, e);
                        }
                        *depth += 1;
                    },
                }
            },

            Event::Empty(ref e) => {
                let name = e.name();
                match state {
                    RunState::Outside => xml::write_empty(&mut out, e),
                    RunState::AfterRunStart => {
                        if name.as_ref() == b"a:rPr" {
                            // Expand so the latin element fits inside.
                            xml::write_start(&mut out, e);
                            write_latin(&mut out, font);
                            xml::write_end(&mut out, b"a:rPr");
                        } else {
                            write_new_props(&mut out, font);
                            xml::write_empty(&mut out, e);
                        }
                        state = RunState::Outside;
                    },
                    RunState::InProps {
                        ref mut latin_done,
                        depth,
                    } => {
                        if depth == 0 {
                            if name.as_ref() == b"a:latin" {
                                write_patched_latin(&mut out, e, font, true)?;
                                *latin_done = true;
                            } else {
                                if !*latin_done && follows_latin(name.as_ref()) {
                                    write_latin(&mut out, font);
                                    *latin_done = true;
                                }
                                xml::write_empty(&mut out, e);
                            }
                        } else {
                            xml::write_empty(&mut out, e);
                        }
                    },
                }
            },

            Event::End(ref e) => {
                let name = e.name();
                match name.as_ref() {
                    b"p:grpSp" => group_depth = group_depth.saturating_sub(1),
                    b"c:title" => title_depth = title_depth.saturating_sub(1),
                    b"c:dLbls" | b"c:dLbl" => label_depth = label_depth.saturating_sub(1),
                    _ => {},
                }
                match state {
                    RunState::Outside => xml::write_end(&mut out, name.as_ref()),
                    RunState::AfterRunStart => {
                        // `<a:r></a:r>` with nothing inside.
                        write_new_props(&mut out, font);
                        xml::write_end(&mut out, name.as_ref());
                        state = RunState::Outside;
                    },
                    RunState::InProps {
                        latin_done,
                        ref mut depth,
                    } => {
                        if *depth > 0 {
                            *depth -= 1;
                            xml::write_end(&mut out, name.as_ref());
                        } else {
                            // End of a:rPr.
                            if !latin_done {
                                write_latin(&mut out, font);
                            }
                            xml::write_end(&mut out, name.as_ref());
                            state = RunState::Outside;
                        }
                    },
                }
            },

            Event::Text(ref t) => {
                if matches!(state, RunState::AfterRunStart)
                    && !xml::is_whitespace_only(t.as_ref())
                {
                    write_new_props(&mut out, font);
                    state = RunState::Outside;
                }
                xml::write_event(&mut out, &ev);
            },

            Event::CData(_) | Event::GeneralRef(_) => {
                if matches!(state, RunState::AfterRunStart) {
                    write_new_props(&mut out, font);
                    state = RunState::Outside;
                }
                xml::write_event(&mut out, &ev);
            },

            _ => xml::write_event(&mut out, &ev),
        }
        buf.clear();
    }

    Ok(out)
}

/// Emit `<a:latin typeface=".."/>`.
fn write_latin(out: &mut Vec<u8>, font: &str) {
    out.extend_from_slice(b"<a:latin typeface=\"");
    out.extend_from_slice(xml::escape_xml(font).as_bytes());
    out.extend_from_slice(b"\"/>");
}

/// Emit a full `<a:rPr>` block containing only the latin font.
fn write_new_props(out: &mut Vec<u8>, font: &str) {
    out.extend_from_slice(b"<a:rPr>");
    write_latin(out, font);
    out.extend_from_slice(b"</a:rPr>");
}

/// Re-emit an existing `a:latin` with `typeface` overwritten.
fn write_patched_latin(out: &mut Vec<u8>, e: &BytesStart, font: &str, empty: bool) -> Result<()> {
    out.extend_from_slice(b"<a:latin");
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::Processing(err.to_string()))?;
        match attr.key.as_ref() {
            b"typeface" => {},
            key => {
                out.push(b' ');
                out.extend_from_slice(key);
                out.extend_from_slice(b"=\"");
                out.extend_from_slice(&attr.value);
                out.push(b'"');
            },
        }
    }
    out.extend_from_slice(b" typeface=\"");
    out.extend_from_slice(xml::escape_xml(font).as_bytes());
    out.push(b'"');
    out.extend_from_slice(if empty { b"/>" } else { b">" });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(xml: &str, font: &str, scope: RunScope) -> String {
        String::from_utf8(rewrite_runs(xml.as_bytes(), font, scope).unwrap()).unwrap()
    }

    #[test]
    fn patches_existing_latin_and_preserves_attributes() {
        let input = r#"<a:p><a:r><a:rPr lang="en-US" sz="1800" b="1"><a:latin typeface="Calibri" pitchFamily="34"/></a:rPr><a:t>Hi</a:t></a:r></a:p>"#;
        let output = rewrite(input, "Arial", RunScope::All);
        assert_eq!(
            output,
            r#"<a:p><a:r><a:rPr lang="en-US" sz="1800" b="1"><a:latin pitchFamily="34" typeface="Arial"/></a:rPr><a:t>Hi</a:t></a:r></a:p>"#
        );
    }

    #[test]
    fn expands_empty_props_element() {
        let input = r#"<a:r><a:rPr lang="en-US" sz="2400"/><a:t>x</a:t></a:r>"#;
        let output = rewrite(input, "Arial", RunScope::All);
        assert_eq!(
            output,
            r#"<a:r><a:rPr lang="en-US" sz="2400"><a:latin typeface="Arial"/></a:rPr><a:t>x</a:t></a:r>"#
        );
    }

    #[test]
    fn creates_props_for_bare_run() {
        let input = r#"<a:r><a:t>Hello</a:t></a:r>"#;
        let output = rewrite(input, "Arial", RunScope::All);
        assert_eq!(
            output,
            r#"<a:r><a:rPr><a:latin typeface="Arial"/></a:rPr><a:t>Hello</a:t></a:r>"#
        );
    }

    #[test]
    fn latin_is_inserted_before_trailing_siblings() {
        let input = r#"<a:r><a:rPr lang="en-US"><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill><a:cs typeface="Arial"/></a:rPr><a:t>x</a:t></a:r>"#;
        let output = rewrite(input, "Meiryo UI", RunScope::All);
        assert_eq!(
            output,
            r#"<a:r><a:rPr lang="en-US"><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill><a:latin typeface="Meiryo UI"/><a:cs typeface="Arial"/></a:rPr><a:t>x</a:t></a:r>"#
        );
    }

    #[test]
    fn table_cell_runs_are_rewritten() {
        let input = r#"<a:tbl><a:tr><a:tc><a:txBody><a:p><a:r><a:t>Cell</a:t></a:r></a:p></a:txBody></a:tc></a:tr></a:tbl>"#;
        let output = rewrite(input, "Arial", RunScope::All);
        assert!(output.contains(r#"<a:latin typeface="Arial"/>"#));
    }

    #[test]
    fn grouped_shapes_are_rewritten_at_any_depth() {
        let mut input = String::new();
        for _ in 0..5 {
            input.push_str(r#"<p:grpSp>"#);
        }
        input.push_str(r#"<p:sp><p:txBody><a:p><a:r><a:t>deep</a:t></a:r></a:p></p:txBody></p:sp>"#);
        for _ in 0..5 {
            input.push_str(r#"</p:grpSp>"#);
        }
        let output = rewrite(&input, "Arial", RunScope::All);
        assert!(output.contains(r#"<a:r><a:rPr><a:latin typeface="Arial"/></a:rPr><a:t>deep</a:t></a:r>"#));
    }

    #[test]
    fn pathological_group_nesting_is_rejected() {
        let mut input = String::new();
        for _ in 0..(MAX_GROUP_DEPTH + 1) {
            input.push_str(r#"<p:grpSp>"#);
        }
        let err = rewrite_runs(input.as_bytes(), "Arial", RunScope::All).unwrap_err();
        assert!(matches!(err, Error::Processing(_)));
    }

    #[test]
    fn fields_are_not_runs() {
        let input = r#"<a:p><a:fld id="{1}" type="slidenum"><a:rPr lang="en-US"/><a:t>3</a:t></a:fld></a:p>"#;
        let output = rewrite(input, "Arial", RunScope::All);
        assert_eq!(output, input);
    }

    #[test]
    fn chart_scope_touches_titles_and_labels_only() {
        let input = concat!(
            r#"<c:chart>"#,
            r#"<c:title><c:tx><c:rich><a:p><a:r><a:t>Title</a:t></a:r></a:p></c:rich></c:tx></c:title>"#,
            r#"<c:plotArea><c:valAx><c:title><c:tx><c:rich><a:p><a:r><a:t>Axis</a:t></a:r></a:p></c:rich></c:tx></c:title></c:valAx>"#,
            r#"<c:ser><c:dLbls><c:dLbl><c:txPr><a:p><a:r><a:t>Label</a:t></a:r></a:p></c:txPr></c:dLbl></c:dLbls></c:ser>"#,
            r#"</c:plotArea>"#,
            r#"<c:legend><c:txPr><a:p><a:r><a:t>Legend</a:t></a:r></a:p></c:txPr></c:legend>"#,
            r#"</c:chart>"#,
        );
        let output = rewrite(input, "Calibri", RunScope::ChartText);
        // Title, axis title and data label runs gain the font.
        assert_eq!(output.matches(r#"<a:latin typeface="Calibri"/>"#).count(), 3);
        // The legend run is untouched.
        assert!(output.contains(r#"<c:legend><c:txPr><a:p><a:r><a:t>Legend</a:t></a:r></a:p></c:txPr></c:legend>"#));
    }

    #[test]
    fn rewrite_is_idempotent() {
        let input = r#"<a:p><a:r><a:t>a</a:t></a:r><a:r><a:rPr sz="2000"><a:latin typeface="Calibri"/></a:rPr><a:t>b</a:t></a:r></a:p>"#;
        let once = rewrite_runs(input.as_bytes(), "Arial", RunScope::All).unwrap();
        let twice = rewrite_runs(&once, "Arial", RunScope::All).unwrap();
        assert_eq!(once, twice);
    }
}
