//! Raw XML event emission shared by the walkers.
//!
//! The walkers stream a part through quick-xml and write every event back
//! out as raw bytes, so untouched markup round-trips byte-for-byte. Only
//! the elements a walker synthesizes or patches are serialized by hand.

use quick_xml::events::{BytesStart, Event};

/// Write any event back out verbatim.
pub(crate) fn write_event(out: &mut Vec<u8>, ev: &Event) {
    match ev {
        Event::Start(e) => write_start(out, e),
        Event::Empty(e) => write_empty(out, e),
        Event::End(e) => write_end(out, e.name().as_ref()),
        Event::Text(e) => out.extend_from_slice(e.as_ref()),
        Event::CData(e) => {
            out.extend_from_slice(b"<![CDATA[");
            out.extend_from_slice(e.as_ref());
            out.extend_from_slice(b"]]>");
        },
        Event::GeneralRef(e) => {
            out.push(b'&');
            out.extend_from_slice(e.as_ref());
            out.push(b';');
        },
        Event::Comment(e) => {
            out.extend_from_slice(b"<!--");
            out.extend_from_slice(e.as_ref());
            out.extend_from_slice(b"-->");
        },
        Event::Decl(e) => {
            out.extend_from_slice(b"<?");
            out.extend_from_slice(e.as_ref());
            out.extend_from_slice(b"?>");
        },
        Event::PI(e) => {
            out.extend_from_slice(b"<?");
            out.extend_from_slice(e.as_ref());
            out.extend_from_slice(b"?>");
        },
        Event::DocType(e) => {
            out.extend_from_slice(b"<!DOCTYPE ");
            out.extend_from_slice(e.as_ref());
            out.push(b'>');
        },
        Event::Eof => {},
    }
}

/// Write a start tag verbatim (name and attributes as read).
pub(crate) fn write_start(out: &mut Vec<u8>, e: &BytesStart) {
    out.push(b'<');
    out.extend_from_slice(e.as_ref());
    out.push(b'>');
}

/// Write an empty-element tag verbatim.
pub(crate) fn write_empty(out: &mut Vec<u8>, e: &BytesStart) {
    out.push(b'<');
    out.extend_from_slice(e.as_ref());
    out.extend_from_slice(b"/>");
}

/// Write an end tag for the given name.
pub(crate) fn write_end(out: &mut Vec<u8>, name: &[u8]) {
    out.extend_from_slice(b"</");
    out.extend_from_slice(name);
    out.push(b'>');
}

/// Escape XML special characters for attribute values.
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Check if a byte slice contains only whitespace characters.
#[inline]
pub(crate) fn is_whitespace_only(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|&b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}
