//! Document format dispatch and output path derivation.
//!
//! The target format is decided once, strictly from the file extension;
//! nothing downstream re-checks it. The output path convention is
//! `{dir}/{stem}_modified{ext}`, always next to the source file.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// The three supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Word document (.docx)
    Word,
    /// Excel workbook (.xlsx)
    Spreadsheet,
    /// PowerPoint presentation (.pptx)
    Presentation,
}

impl DocumentKind {
    /// Determine the document kind from a file extension.
    ///
    /// Matching is ASCII case-insensitive. Any extension other than
    /// `.docx`, `.xlsx` or `.pptx` is an unsupported-format error.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        match ext.to_ascii_lowercase().as_str() {
            "docx" => Ok(DocumentKind::Word),
            "xlsx" => Ok(DocumentKind::Spreadsheet),
            "pptx" => Ok(DocumentKind::Presentation),
            "" => Err(Error::UnsupportedFormat(format!(
                "{} has no file extension",
                path.display()
            ))),
            other => Err(Error::UnsupportedFormat(format!(".{other}"))),
        }
    }

    /// Canonical (lowercase) extension for this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Word => "docx",
            DocumentKind::Spreadsheet => "xlsx",
            DocumentKind::Presentation => "pptx",
        }
    }
}

/// Derive the conventional output path: `{dir}/{stem}_modified{ext}`.
///
/// The original extension is kept verbatim (including its case). A file at
/// the returned path is overwritten by a subsequent save.
pub fn output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    numbered_output_path(path.as_ref(), 1)
}

/// Derive an output path that does not collide with an existing file.
///
/// Probes `{stem}_modified{ext}`, then `{stem}_modified_2{ext}` and so on,
/// and returns the first path with no file at it.
pub fn unique_output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    let mut n = 1;
    loop {
        let candidate = numbered_output_path(path, n);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

fn numbered_output_path(path: &Path, n: u64) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    let name = if n <= 1 {
        format!("{stem}_modified.{ext}")
    } else {
        format!("{stem}_modified_{n}.{ext}")
    };
    path.with_file_name(name)
}
