//! Archive decoding: locate the end-of-central-directory record, walk the
//! central directory, and slice each entry's raw data out of the file.

use std::collections::HashSet;

use super::{
    CENTRAL_HEADER_SIG, CompressionMethod, EOCD_SIG, FLAG_ENCRYPTED, LOCAL_HEADER_SIG, ZipArchive,
    ZipEntry,
};
use crate::{Error, Result};

/// End-of-central-directory record length without the comment.
const EOCD_MIN_LEN: usize = 22;
/// The record plus the largest possible comment.
const EOCD_MAX_SCAN: usize = EOCD_MIN_LEN + u16::MAX as usize;

/// Little-endian cursor over the whole file.
struct Slice<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Slice<'a> {
    fn at(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| {
                Error::InvalidArchive(format!("archive truncated at offset {}", self.pos))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

pub(crate) fn parse_archive(bytes: &[u8]) -> Result<ZipArchive> {
    let eocd_pos = find_eocd(bytes)?;

    let mut r = Slice::at(bytes, eocd_pos + 4);
    let disk_number = r.u16()?;
    let cd_start_disk = r.u16()?;
    let entries_on_disk = r.u16()?;
    let total_entries = r.u16()?;
    let cd_size = r.u32()? as usize;
    let cd_offset = r.u32()?;
    let comment_len = r.u16()? as usize;
    let comment = r.take(comment_len)?.to_vec();

    if disk_number != 0 || cd_start_disk != 0 || entries_on_disk != total_entries {
        return Err(Error::UnsupportedFeature {
            feature: "multi-volume zip archive",
        });
    }
    if total_entries == u16::MAX || cd_size == u32::MAX as usize || cd_offset == u32::MAX {
        return Err(Error::UnsupportedFeature {
            feature: "zip64 archive",
        });
    }

    // Offsets in the file are relative to the start of the zip data, which
    // sits after any prepended bytes (a self-extractor stub, typically).
    let base = eocd_pos
        .checked_sub(cd_size)
        .and_then(|pos| pos.checked_sub(cd_offset as usize))
        .ok_or_else(|| {
            Error::InvalidArchive("central directory overlaps its end marker".to_string())
        })?;
    let cd_start = base + cd_offset as usize;

    let mut r = Slice::at(bytes, cd_start);
    let mut entries = Vec::with_capacity(total_entries as usize);
    let mut seen = HashSet::with_capacity(total_entries as usize);
    for _ in 0..total_entries {
        let entry = parse_central_record(&mut r, bytes, base)?;
        if !seen.insert(entry.name.clone()) {
            return Err(Error::InvalidArchive(format!(
                "duplicate entry '{}'",
                entry.name
            )));
        }
        entries.push(entry);
    }
    if r.pos() != cd_start + cd_size {
        return Err(Error::InvalidArchive(format!(
            "central directory size mismatch: expected {} bytes, walked {}",
            cd_size,
            r.pos() - cd_start
        )));
    }

    Ok(ZipArchive { entries, comment })
}

/// Scans backward for the end-of-central-directory record.
///
/// A matching signature only counts if its comment-length field reaches
/// exactly to the end of the file; that disambiguates a real record from
/// the same four bytes appearing inside an archive comment.
fn find_eocd(bytes: &[u8]) -> Result<usize> {
    if bytes.len() < EOCD_MIN_LEN {
        return Err(Error::InvalidArchive(
            "too small to be a zip archive".to_string(),
        ));
    }
    let floor = bytes.len().saturating_sub(EOCD_MAX_SCAN);
    let mut pos = bytes.len() - EOCD_MIN_LEN;
    loop {
        if bytes[pos..pos + 4] == EOCD_SIG.to_le_bytes() {
            let comment_len =
                u16::from_le_bytes([bytes[pos + 20], bytes[pos + 21]]) as usize;
            if pos + EOCD_MIN_LEN + comment_len == bytes.len() {
                return Ok(pos);
            }
        }
        if pos == floor {
            return Err(Error::InvalidArchive(
                "end of central directory record not found".to_string(),
            ));
        }
        pos -= 1;
    }
}

fn parse_central_record(r: &mut Slice<'_>, bytes: &[u8], base: usize) -> Result<ZipEntry> {
    let sig = r.u32()?;
    if sig != CENTRAL_HEADER_SIG {
        return Err(Error::InvalidArchive(format!(
            "bad central directory signature {sig:#010x}"
        )));
    }
    let version_made_by = r.u16()?;
    let version_needed = r.u16()?;
    let flags = r.u16()?;
    let method_id = r.u16()?;
    let mod_time = r.u16()?;
    let mod_date = r.u16()?;
    let crc32 = r.u32()?;
    let compressed_size = r.u32()?;
    let uncompressed_size = r.u32()?;
    let name_len = r.u16()? as usize;
    let extra_len = r.u16()? as usize;
    let comment_len = r.u16()? as usize;
    let disk_start = r.u16()?;
    let internal_attributes = r.u16()?;
    let external_attributes = r.u32()?;
    let local_offset = r.u32()?;
    let name_bytes = r.take(name_len)?;
    let extra = r.take(extra_len)?.to_vec();
    let comment = r.take(comment_len)?.to_vec();

    if flags & FLAG_ENCRYPTED != 0 {
        return Err(Error::UnsupportedFeature {
            feature: "encrypted zip entry",
        });
    }
    if disk_start != 0 {
        return Err(Error::UnsupportedFeature {
            feature: "multi-volume zip archive",
        });
    }
    if compressed_size == u32::MAX || uncompressed_size == u32::MAX || local_offset == u32::MAX {
        return Err(Error::UnsupportedFeature {
            feature: "zip64 archive",
        });
    }
    let method = CompressionMethod::from_id(method_id)?;
    let name = String::from_utf8(name_bytes.to_vec())
        .map_err(|_| Error::InvalidArchive("entry name is not valid UTF-8".to_string()))?;

    let data = read_local_data(bytes, base + local_offset as usize, compressed_size, &name)?;

    Ok(ZipEntry {
        name,
        version_made_by,
        version_needed,
        flags,
        method,
        mod_time,
        mod_date,
        crc32,
        uncompressed_size,
        internal_attributes,
        external_attributes,
        extra,
        comment,
        data,
    })
}

/// Slices an entry's raw stream out of the file.
///
/// The local header's own size and CRC fields are skipped; with a streamed
/// entry (data-descriptor flag) they hold zeros, and the central directory
/// already supplied the authoritative values.
fn read_local_data(
    bytes: &[u8],
    offset: usize,
    compressed_size: u32,
    name: &str,
) -> Result<Vec<u8>> {
    let mut r = Slice::at(bytes, offset);
    let sig = r.u32()?;
    if sig != LOCAL_HEADER_SIG {
        return Err(Error::InvalidArchive(format!(
            "entry '{name}': bad local header signature {sig:#010x}"
        )));
    }
    r.take(22)?; // version, flags, method, timestamp, crc, both sizes
    let name_len = r.u16()? as usize;
    let extra_len = r.u16()? as usize;
    r.take(name_len)?;
    r.take(extra_len)?;
    Ok(r.take(compressed_size as usize)?.to_vec())
}
