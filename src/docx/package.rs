//! OPC package (ZIP container) reading and writing

use crate::error::{Error, Result};
use std::fs;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Upper bound on the buffer reserved up front for a part; the size an entry
/// declares is not trusted beyond this.
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

/// A single named part of the package
#[derive(Debug, Clone)]
pub struct Part {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
}

impl Part {
    /// Part name inside the archive (no leading slash)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw part bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// In-memory package keeping the original part order
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    /// Read a package from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let file = fs::File::open(path).map_err(|e| {
            Error::InvalidDocument(format!("Cannot open {}: {e}", path.display()))
        })?;
        Self::from_reader(file)
    }

    /// Read a package from an in-memory archive.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::InvalidDocument(format!("Not a ZIP package: {e}")))?;

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(preallocation(entry.size()));
            entry.read_to_end(&mut data)?;
            parts.push(Part {
                name: entry.name().trim_start_matches('/').to_string(),
                data,
                compression: entry.compression(),
            });
        }

        tracing::debug!(parts = parts.len(), "Loaded package");
        Ok(Self { parts })
    }

    /// Bytes of a part, if present.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.find(name).map(|i| self.parts[i].data.as_slice())
    }

    /// Whether a part exists (case-insensitive, as OPC part names are).
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Iterate over all parts in archive order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    /// Replace a part's bytes or append a new deflated part.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.find(name) {
            Some(i) => self.parts[i].data = data,
            None => self.parts.push(Part {
                name: name.trim_start_matches('/').to_string(),
                data,
                compression: CompressionMethod::Deflated,
            }),
        }
    }

    fn find(&self, name: &str) -> Option<usize> {
        let name = name.trim_start_matches('/');
        self.parts
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Write the archive to any seekable sink.
    pub fn write_to<W: Write + Seek>(&self, sink: W) -> Result<W> {
        let mut zip = ZipWriter::new(sink);
        for part in &self.parts {
            let method = match part.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            zip.start_file(
                part.name.as_str(),
                SimpleFileOptions::default().compression_method(method),
            )?;
            zip.write_all(&part.data)?;
        }
        Ok(zip.finish()?)
    }

    /// Serialize the archive to memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Serialize the archive to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }
}

fn preallocation(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOCATION)).unwrap_or(0)
}
