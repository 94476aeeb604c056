//! Archive encoding: local headers with data, then the central directory,
//! then the end-of-central-directory record.

use super::{CENTRAL_HEADER_SIG, EOCD_SIG, FLAG_DATA_DESCRIPTOR, LOCAL_HEADER_SIG, ZipArchive};
use crate::{Error, Result};

pub(crate) fn encode_archive(archive: &ZipArchive) -> Result<Vec<u8>> {
    let mut out = Vec::new();

    let mut local_offsets = Vec::with_capacity(archive.entries.len());
    for entry in &archive.entries {
        local_offsets.push(offset_guard(out.len())?);
        let name = entry.name.as_bytes();
        out.extend_from_slice(&LOCAL_HEADER_SIG.to_le_bytes());
        out.extend_from_slice(&entry.version_needed.to_le_bytes());
        // Sizes and CRC are written up front, so no data descriptor follows.
        out.extend_from_slice(&(entry.flags & !FLAG_DATA_DESCRIPTOR).to_le_bytes());
        out.extend_from_slice(&entry.method.id().to_le_bytes());
        out.extend_from_slice(&entry.mod_time.to_le_bytes());
        out.extend_from_slice(&entry.mod_date.to_le_bytes());
        out.extend_from_slice(&entry.crc32.to_le_bytes());
        out.extend_from_slice(&offset_guard(entry.data.len())?.to_le_bytes());
        out.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&u16_len(name.len(), "entry name")?.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // no local extra field
        out.extend_from_slice(name);
        out.extend_from_slice(&entry.data);
    }

    let cd_offset = offset_guard(out.len())?;
    for (entry, &local_offset) in archive.entries.iter().zip(&local_offsets) {
        let name = entry.name.as_bytes();
        out.extend_from_slice(&CENTRAL_HEADER_SIG.to_le_bytes());
        out.extend_from_slice(&entry.version_made_by.to_le_bytes());
        out.extend_from_slice(&entry.version_needed.to_le_bytes());
        out.extend_from_slice(&(entry.flags & !FLAG_DATA_DESCRIPTOR).to_le_bytes());
        out.extend_from_slice(&entry.method.id().to_le_bytes());
        out.extend_from_slice(&entry.mod_time.to_le_bytes());
        out.extend_from_slice(&entry.mod_date.to_le_bytes());
        out.extend_from_slice(&entry.crc32.to_le_bytes());
        out.extend_from_slice(&offset_guard(entry.data.len())?.to_le_bytes());
        out.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&u16_len(name.len(), "entry name")?.to_le_bytes());
        out.extend_from_slice(&u16_len(entry.extra.len(), "entry extra field")?.to_le_bytes());
        out.extend_from_slice(&u16_len(entry.comment.len(), "entry comment")?.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // disk number start
        out.extend_from_slice(&entry.internal_attributes.to_le_bytes());
        out.extend_from_slice(&entry.external_attributes.to_le_bytes());
        out.extend_from_slice(&local_offset.to_le_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(&entry.extra);
        out.extend_from_slice(&entry.comment);
    }
    let cd_size = offset_guard(out.len())? - cd_offset;

    let entry_count = u16::try_from(archive.entries.len())
        .ok()
        .filter(|&count| count != u16::MAX)
        .ok_or(Error::UnsupportedFeature {
            feature: "zip64 archive",
        })?;
    out.extend_from_slice(&EOCD_SIG.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // this disk
    out.extend_from_slice(&0u16.to_le_bytes()); // central directory start disk
    out.extend_from_slice(&entry_count.to_le_bytes());
    out.extend_from_slice(&entry_count.to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&u16_len(archive.comment.len(), "archive comment")?.to_le_bytes());
    out.extend_from_slice(&archive.comment);

    Ok(out)
}

/// A position or length that must fit the format's 32-bit fields; past that
/// the archive would need zip64.
fn offset_guard(len: usize) -> Result<u32> {
    u32::try_from(len)
        .ok()
        .filter(|&len| len != u32::MAX)
        .ok_or(Error::UnsupportedFeature {
            feature: "zip64 archive",
        })
}

fn u16_len(len: usize, what: &'static str) -> Result<u16> {
    u16::try_from(len).map_err(|_| Error::InvalidArchive(format!("{what} exceeds 65535 bytes")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_layout_for_single_entry() {
        let mut archive = ZipArchive::default();
        archive.write("a", b"x").unwrap();
        let bytes = archive.to_bytes().unwrap();

        assert_eq!(&bytes[0..4], &LOCAL_HEADER_SIG.to_le_bytes());
        let data_len = archive.entries[0].data.len();
        let central = 30 + 1 + data_len; // header + name + data
        assert_eq!(
            &bytes[central..central + 4],
            &CENTRAL_HEADER_SIG.to_le_bytes()
        );
        let eocd = bytes.len() - 22;
        assert_eq!(&bytes[eocd..eocd + 4], &EOCD_SIG.to_le_bytes());
        // Central directory offset field points at the central record.
        assert_eq!(
            u32::from_le_bytes([bytes[eocd + 16], bytes[eocd + 17], bytes[eocd + 18], bytes[eocd + 19]]),
            central as u32
        );
    }

    #[test]
    fn test_data_descriptor_flag_cleared() {
        let mut archive = ZipArchive::default();
        archive.write("a", b"x").unwrap();
        archive.entries[0].flags |= FLAG_DATA_DESCRIPTOR;
        let reparsed = ZipArchive::parse(&archive.to_bytes().unwrap()).unwrap();
        assert_eq!(reparsed.entry("a").unwrap().flags & FLAG_DATA_DESCRIPTOR, 0);
    }

    #[test]
    fn test_name_length_limit() {
        let mut archive = ZipArchive::default();
        archive.write(&"n".repeat(70_000), b"x").unwrap();
        let err = archive.to_bytes().unwrap_err();
        assert!(err.to_string().contains("entry name"));
    }
}
