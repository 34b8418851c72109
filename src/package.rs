//! OOXML package (ZIP archive) handling.
//!
//! Modern Office files are ZIP archives of XML parts. This module reads a
//! package into memory as an ordered list of parts, resolves parts by
//! content type via `[Content_Types].xml`, and writes the package back out.
//!
//! Parts are kept in their original archive order and written with a fixed
//! timestamp, so a package that is loaded and saved unchanged — or
//! normalized twice with the same font — round-trips byte-for-byte.

use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::{SimpleFileOptions, ZipWriter};

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// A single part (file) within an OOXML package.
#[derive(Debug)]
struct Part {
    /// Part name as stored in the archive, without a leading slash
    name: String,
    /// Raw part bytes
    data: Vec<u8>,
}

/// An OOXML package loaded fully into memory.
#[derive(Debug)]
pub struct Package {
    /// All parts in original archive order
    parts: Vec<Part>,
}

impl Package {
    /// Open a package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| Error::Load(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(data)
    }

    /// Load a package from raw bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data))
            .map_err(|e| Error::Load(format!("not a valid OOXML package: {e}")))?;

        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::Load(format!("corrupt archive entry: {e}")))?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::Load(format!("corrupt archive entry {}: {}", file.name(), e)))?;
            parts.push(Part {
                name: file.name().to_string(),
                data,
            });
        }

        let package = Self { parts };
        if package.part(CONTENT_TYPES_PART).is_none() {
            return Err(Error::Load(format!("missing {CONTENT_TYPES_PART}")));
        }
        Ok(package)
    }

    /// Get a part's bytes by name.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// Replace a part's bytes in place. Returns false if the part does not exist.
    pub fn replace_part(&mut self, name: &str, data: Vec<u8>) -> bool {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => {
                part.data = data;
                true
            },
            None => false,
        }
    }

    /// Find all part names carrying the given content type.
    ///
    /// Resolution uses the `<Override>` entries of `[Content_Types].xml`.
    /// The part classes this crate visits (main document, stylesheet,
    /// slides, charts) always carry explicit overrides, so `<Default>`
    /// extension mappings are not consulted.
    pub fn parts_of_type(&self, content_type: &str) -> Result<Vec<String>> {
        // Presence is validated at load time.
        let xml = self
            .part(CONTENT_TYPES_PART)
            .ok_or_else(|| Error::Load(format!("missing {CONTENT_TYPES_PART}")))?;

        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut names = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    if e.local_name().as_ref() == b"Override" {
                        let mut part_name: Option<String> = None;
                        let mut matches = false;
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"PartName" => {
                                    let value = attr
                                        .unescape_value()
                                        .map_err(|e| Error::Load(e.to_string()))?;
                                    // PartName is package-absolute; archive names are not.
                                    part_name =
                                        Some(value.trim_start_matches('/').to_string());
                                },
                                b"ContentType" => {
                                    matches = attr.value.as_ref() == content_type.as_bytes();
                                },
                                _ => {},
                            }
                        }
                        if matches && let Some(name) = part_name {
                            names.push(name);
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Load(format!("invalid {CONTENT_TYPES_PART}: {e}"))),
                _ => {},
            }
            buf.clear();
        }

        Ok(names)
    }

    /// Serialize the package to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        // Fixed timestamp keeps output deterministic.
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        for part in &self.parts {
            writer
                .start_file(part.name.as_str(), options)
                .map_err(|e| Error::Save(format!("{}: {}", part.name, e)))?;
            writer
                .write_all(&part.data)
                .map_err(|e| Error::Save(format!("{}: {}", part.name, e)))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| Error::Save(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    /// Write the package to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)
            .map_err(|e| Error::Save(format!("{}: {}", path.display(), e)))
    }
}
