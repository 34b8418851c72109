//! Font Unifier - rewrite the font applied to every text run in Office documents
//!
//! This library loads a modern Office file (.docx, .xlsx, .pptx), walks every
//! text-bearing node, overwrites its font-name property with one target font,
//! and hands back the mutated in-memory document for saving. The format is
//! decided once from the file extension; the output convention is
//! `{dir}/{stem}_modified{ext}`, always next to the source file.
//!
//! What each format's walk covers:
//!
//! - **Word (.docx)**: every run of every body paragraph and of every table
//!   cell paragraph. Headers, footers, footnotes and text boxes are not
//!   touched (deliberate limitation). Other run attributes are preserved.
//! - **Excel (.xlsx)**: every cell of every sheet, by replacing every entry
//!   of the shared font table wholesale — size, bold, italic and color are
//!   reset to defaults along with the name.
//! - **PowerPoint (.pptx)**: every run of every shape on every slide,
//!   recursing through grouped shapes; table cell text; and for charts the
//!   chart title, axis titles and data labels. Other run attributes are
//!   preserved.
//!
//! # Example - Normalize and save in one call
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let out = font_unifier::normalize_file("report.docx", "Arial", false)?;
//! println!("Saved as {}", out.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Keep the mutated document in memory
//!
//! ```no_run
//! use font_unifier::normalize;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = normalize("deck.pptx", "Meiryo UI")?;
//! doc.save("deck_unified.pptx")?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

/// Unified error type and result alias
pub mod error;

/// Format dispatch and output path derivation
pub mod format;

/// OOXML package (ZIP) reading and writing
pub mod package;

mod docx;
mod pptx;
mod xlsx;
mod xml;

pub use error::{Error, Result};
pub use format::{DocumentKind, output_path, unique_output_path};

use package::Package;

/// A normalized document held in memory, ready to be persisted.
///
/// Produced by [`normalize`]; discarded after [`save`](Document::save).
#[derive(Debug)]
pub struct Document {
    kind: DocumentKind,
    package: Package,
}

impl Document {
    /// The detected format of this document.
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Write the document to a file.
    ///
    /// An existing file at `path` is overwritten; use
    /// [`unique_output_path`] to pick a collision-free name first.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.package.save(path)
    }

    /// Serialize the document to bytes.
    pub fn save_to_bytes(&self) -> Result<Vec<u8>> {
        self.package.to_bytes()
    }
}

/// Load a document, set the font on every reachable text run, and return
/// the mutated document for the caller to persist.
///
/// The format is determined strictly from the file extension. Nothing is
/// written to disk; a failure anywhere leaves no output file.
///
/// # Arguments
/// * `path` - Path to an existing `.docx`, `.xlsx` or `.pptx` file
/// * `font_name` - Non-empty display name; not validated against any
///   installed font catalog
pub fn normalize<P: AsRef<Path>>(path: P, font_name: &str) -> Result<Document> {
    let path = path.as_ref();
    let kind = DocumentKind::from_path(path)?;
    check_font_name(font_name)?;
    let package = Package::open(path)?;
    normalize_package(package, kind, font_name)
}

/// Normalize a document already held in memory.
///
/// `kind` plays the role the file extension plays in [`normalize`].
pub fn normalize_bytes(bytes: Vec<u8>, kind: DocumentKind, font_name: &str) -> Result<Document> {
    let package = Package::from_bytes(bytes)?;
    normalize_package(package, kind, font_name)
}

fn check_font_name(font_name: &str) -> Result<()> {
    if font_name.trim().is_empty() {
        return Err(Error::Processing(
            "font name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn normalize_package(
    mut package: Package,
    kind: DocumentKind,
    font_name: &str,
) -> Result<Document> {
    check_font_name(font_name)?;

    match kind {
        DocumentKind::Word => docx::apply_font(&mut package, font_name)?,
        DocumentKind::Spreadsheet => xlsx::apply_font(&mut package, font_name)?,
        DocumentKind::Presentation => pptx::apply_font(&mut package, font_name)?,
    }

    Ok(Document { kind, package })
}

/// Normalize a file and save the result next to it.
///
/// The output name is `{stem}_modified{ext}`. With `overwrite` set, an
/// existing file at that path is replaced; otherwise a numbered suffix
/// (`_modified_2`, ...) guarantees a fresh name. Saving happens only after
/// the full walk succeeds.
///
/// Returns the path the document was written to.
pub fn normalize_file<P: AsRef<Path>>(
    path: P,
    font_name: &str,
    overwrite: bool,
) -> Result<PathBuf> {
    let path = path.as_ref();
    let document = normalize(path, font_name)?;
    let out = if overwrite {
        output_path(path)
    } else {
        unique_output_path(path)
    };
    document.save(&out)?;
    Ok(out)
}
