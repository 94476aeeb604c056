//! On-disk jar handling: backup, entry access, and atomic write-back.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::zip::ZipArchive;
use crate::{Error, Result};

/// `path` with `~` appended to its file name; where
/// [`Jar::open_for_patch`] keeps the pre-patch snapshot.
pub fn backup_path(path: impl AsRef<Path>) -> PathBuf {
    let mut name = OsString::from(path.as_ref().as_os_str());
    name.push("~");
    PathBuf::from(name)
}

/// A jar opened for patching.
///
/// Opening snapshots the file to `<name>~` (once; an existing backup is
/// never overwritten) and loads the whole container into memory. Edits
/// accumulate there; [`Jar::close`] commits them back through a sibling
/// temporary file and a rename. Dropping the handle without calling
/// [`Jar::close`] discards every pending edit, which keeps the on-disk file
/// untouched when a patch step fails midway.
#[derive(Debug)]
pub struct Jar {
    path: PathBuf,
    archive: ZipArchive,
    dirty: bool,
}

impl Jar {
    /// Opens `path` for patching, writing the `~` backup first.
    pub fn open_for_patch(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let backup = backup_path(path);
        if !backup.exists() {
            fs::copy(path, &backup)?;
            log::debug!("Backed up '{}' to '{}'", path.display(), backup.display());
        }
        let bytes = fs::read(path)?;
        let archive = ZipArchive::parse(&bytes)?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
            dirty: false,
        })
    }

    /// Reads one entry's uncompressed bytes.
    pub fn read_entry(&self, entry_path: &str) -> Result<Vec<u8>> {
        self.archive.read(entry_path)
    }

    /// Replaces an entry's contents, creating the entry if absent.
    pub fn write_entry(&mut self, entry_path: &str, bytes: &[u8]) -> Result<()> {
        self.archive.write(entry_path, bytes)?;
        self.dirty = true;
        Ok(())
    }

    /// Removes a directory subtree, children before parents; no-op when the
    /// directory is absent. Returns the number of entries removed.
    pub fn delete_subtree(&mut self, dir: &str) -> usize {
        let removed = self.archive.delete_subtree(dir);
        if removed > 0 {
            self.dirty = true;
            log::debug!("Removed {removed} entries under '{dir}'");
        }
        removed
    }

    /// `true` if the container holds this exact entry path.
    pub fn has_entry(&self, entry_path: &str) -> bool {
        self.archive.has_entry(entry_path)
    }

    /// `true` if the directory exists or anything is stored under it.
    pub fn has_subtree(&self, dir: &str) -> bool {
        self.archive.has_subtree(dir)
    }

    /// Commits pending edits and consumes the handle.
    ///
    /// With no pending edits this writes nothing. Otherwise the rebuilt
    /// container goes to `<stem>.jar.tmp` first and is renamed over the
    /// original, so a crash mid-write cannot leave a half-written jar at
    /// the target path.
    pub fn close(self) -> Result<()> {
        if !self.dirty {
            log::debug!("No changes to '{}', skipping write-back", self.path.display());
            return Ok(());
        }
        let bytes = self.archive.to_bytes()?;
        let temp_path = self.path.with_extension("jar.tmp");

        let written = fs::write(&temp_path, &bytes)
            .map_err(Error::Io)
            .and_then(|()| fs::rename(&temp_path, &self.path).map_err(Error::Io));
        if let Err(e) = written {
            if temp_path.exists() {
                if let Err(cleanup) = fs::remove_file(&temp_path) {
                    log::warn!(
                        "Failed to clean up temporary file '{}': {}",
                        temp_path.display(),
                        cleanup
                    );
                }
            }
            return Err(e);
        }
        log::debug!("Wrote patched archive to '{}'", self.path.display());
        Ok(())
    }
}
