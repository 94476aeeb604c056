//! Minimal zip container codec, scoped to what jar patching needs.
//!
//! An archive is parsed fully into memory: the central directory is
//! authoritative, per-entry data is kept as the raw (still compressed)
//! stream, and [`ZipArchive::to_bytes`] rebuilds the container from scratch.
//! Stored and deflated entries are supported; zip64, encryption, and
//! multi-volume archives are rejected up front with
//! [`Error::UnsupportedFeature`] rather than misread.
//!
//! Entries keep their central-directory metadata (timestamps, attributes,
//! extra field, comment) across a rewrite. Local extra fields are not
//! preserved; jar tooling reads the central directory.

mod reader;
mod writer;

use std::io::{Read as _, Write as _};

use flate2::Compression;
use flate2::bufread::DeflateDecoder;
use flate2::write::DeflateEncoder;

use crate::{Error, Result};

pub(crate) const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
pub(crate) const CENTRAL_HEADER_SIG: u32 = 0x0201_4b50;
pub(crate) const EOCD_SIG: u32 = 0x0605_4b50;

pub(crate) const FLAG_ENCRYPTED: u16 = 0x0001;
pub(crate) const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;

/// DOS date 1980-01-01, the timestamp floor of the format.
const DEFAULT_MOD_DATE: u16 = 0x0021;

/// How an entry's data stream is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Method 0, data kept verbatim.
    Stored,
    /// Method 8, raw deflate.
    Deflated,
}

impl CompressionMethod {
    pub(crate) fn from_id(id: u16) -> Result<Self> {
        match id {
            0 => Ok(Self::Stored),
            8 => Ok(Self::Deflated),
            other => Err(Error::UnsupportedMethod { method: other }),
        }
    }

    pub(crate) fn id(self) -> u16 {
        match self {
            Self::Stored => 0,
            Self::Deflated => 8,
        }
    }
}

/// One archive entry: central-directory metadata plus the raw data stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    /// Entry path, `/`-separated; directory markers end with `/`.
    pub name: String,
    /// Originating tool and platform code.
    pub version_made_by: u16,
    /// Minimum tool version needed to extract.
    pub version_needed: u16,
    /// General-purpose flag bits.
    pub flags: u16,
    /// Data stream encoding.
    pub method: CompressionMethod,
    /// Modification time, DOS format.
    pub mod_time: u16,
    /// Modification date, DOS format.
    pub mod_date: u16,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Uncompressed data length.
    pub uncompressed_size: u32,
    /// Internal file attributes.
    pub internal_attributes: u16,
    /// Host-dependent external attributes (permission bits on Unix).
    pub external_attributes: u32,
    /// Central-directory extra field, carried through unmodified.
    pub extra: Vec<u8>,
    /// Entry comment, carried through unmodified.
    pub comment: Vec<u8>,
    /// The raw stream as it sits in the container.
    data: Vec<u8>,
}

/// A zip archive held fully in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZipArchive {
    entries: Vec<ZipEntry>,
    comment: Vec<u8>,
}

impl ZipArchive {
    /// Decodes an archive.
    ///
    /// The central directory is located via the end-of-central-directory
    /// record and is authoritative for sizes and offsets; data descriptors
    /// are ignored. Prepended data (self-extracting stubs) is tolerated.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        reader::parse_archive(bytes)
    }

    /// Re-encodes the archive, entries in their current order.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        writer::encode_archive(self)
    }

    /// Reads and verifies one entry's uncompressed data.
    ///
    /// The expanded bytes are checked against the central directory's size
    /// and CRC-32; a mismatch is [`Error::CrcMismatch`] or
    /// [`Error::InvalidArchive`].
    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        let entry = self.entry(path).ok_or_else(|| Error::EntryNotFound {
            path: path.to_string(),
        })?;
        let bytes = match entry.method {
            CompressionMethod::Stored => entry.data.clone(),
            CompressionMethod::Deflated => inflate(path, &entry.data)?,
        };
        if bytes.len() as u64 != u64::from(entry.uncompressed_size) {
            return Err(Error::InvalidArchive(format!(
                "entry '{path}' expanded to {} bytes, central directory says {}",
                bytes.len(),
                entry.uncompressed_size
            )));
        }
        let actual = crc32fast::hash(&bytes);
        if actual != entry.crc32 {
            return Err(Error::CrcMismatch {
                path: path.to_string(),
                expected: entry.crc32,
                actual,
            });
        }
        Ok(bytes)
    }

    /// Replaces an entry's data, deflating `bytes`; creates the entry if it
    /// does not exist yet.
    ///
    /// A replaced entry keeps its timestamps, attributes, extra field, and
    /// comment. Its data-descriptor flag is cleared, since sizes are now
    /// known up front.
    pub fn write(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        let uncompressed_size =
            u32::try_from(bytes.len()).map_err(|_| Error::UnsupportedFeature {
                feature: "zip64 archive",
            })?;
        let crc32 = crc32fast::hash(bytes);
        let data = deflate(bytes)?;

        match self.entries.iter_mut().find(|entry| entry.name == path) {
            Some(entry) => {
                entry.method = CompressionMethod::Deflated;
                entry.flags &= !FLAG_DATA_DESCRIPTOR;
                entry.crc32 = crc32;
                entry.uncompressed_size = uncompressed_size;
                entry.data = data;
            }
            None => self.entries.push(ZipEntry {
                name: path.to_string(),
                version_made_by: 20,
                version_needed: 20,
                flags: 0,
                method: CompressionMethod::Deflated,
                mod_time: 0,
                mod_date: DEFAULT_MOD_DATE,
                crc32,
                uncompressed_size,
                internal_attributes: 0,
                external_attributes: 0,
                extra: Vec::new(),
                comment: Vec::new(),
                data,
            }),
        }
        Ok(())
    }

    /// Removes one entry; `false` if it was not present.
    pub fn remove(&mut self, path: &str) -> bool {
        match self.entries.iter().position(|entry| entry.name == path) {
            Some(position) => {
                self.entries.remove(position);
                true
            }
            None => false,
        }
    }

    /// Removes `dir` and everything under it, children before parents.
    /// Returns the number of entries removed; 0 if nothing matched.
    ///
    /// `dir` is a directory path with or without its trailing `/`. A sibling
    /// whose name merely starts with the same text (`META-INFX/...` next to
    /// `META-INF`) is not touched.
    pub fn delete_subtree(&mut self, dir: &str) -> usize {
        let dir = dir.strip_suffix('/').unwrap_or(dir);
        let mut doomed: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| in_subtree(&entry.name, dir))
            .map(|entry| entry.name.clone())
            .collect();
        doomed.sort_by(|a, b| depth(b).cmp(&depth(a)).then_with(|| b.cmp(a)));
        for name in &doomed {
            if let Some(position) = self.entries.iter().position(|entry| &entry.name == name) {
                self.entries.remove(position);
            }
        }
        doomed.len()
    }

    /// `true` if `dir` exists as a directory entry or has anything under it.
    pub fn has_subtree(&self, dir: &str) -> bool {
        let dir = dir.strip_suffix('/').unwrap_or(dir);
        self.entries.iter().any(|entry| in_subtree(&entry.name, dir))
    }

    /// Looks up an entry by exact path.
    pub fn entry(&self, path: &str) -> Option<&ZipEntry> {
        self.entries.iter().find(|entry| entry.name == path)
    }

    /// `true` if an entry with this exact path exists.
    pub fn has_entry(&self, path: &str) -> bool {
        self.entry(path).is_some()
    }

    /// Entry paths in archive order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `true` if `name` is `dir` itself (as a directory entry, with or without
/// the trailing `/`) or lies underneath it. `dir` carries no trailing `/`.
fn in_subtree(name: &str, dir: &str) -> bool {
    name.strip_prefix(dir)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Nesting depth of a path, ignoring a trailing directory slash.
fn depth(name: &str) -> usize {
    name.trim_end_matches('/').matches('/').count()
}

fn deflate(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(6));
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

fn inflate(path: &str, data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    DeflateDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| Error::InvalidArchive(format!("entry '{path}' has a bad deflate stream: {e}")))?;
    Ok(out)
}
