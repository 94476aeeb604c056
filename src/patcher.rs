//! The dispatcher that drives one patch end to end.
//!
//! [`apply_patch`] backs up the archive, decodes the target class, runs the
//! catalog entry against it, writes the result back, and strips signature
//! metadata when the edit invalidates it. The whole routine is idempotent:
//! a second run over the same archive reports
//! [`PatchOutcome::AlreadyPatched`] and leaves every byte as it found it.

use std::path::Path;

use crate::classfile::ClassFile;
use crate::jar::Jar;
use crate::patches::{self, PatchDescriptor};
use crate::{Error, Result};

/// Directory holding the jar manifest and signing metadata.
const METADATA_DIR: &str = "META-INF";

/// What one [`apply_patch`] run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The edit ran and the archive was rewritten in place.
    Applied,
    /// The archive was already in the patched state; nothing was written.
    AlreadyPatched,
}

/// Applies the named catalog patch to the archive at `archive_path`.
///
/// The original file is backed up next to itself before anything else
/// happens (see [`backup_path`][crate::jar::backup_path]); an existing
/// backup is never overwritten. A patch that finds its work already done
/// reports [`PatchOutcome::AlreadyPatched`] and writes nothing.
pub fn apply_patch(patch_name: &str, archive_path: impl AsRef<Path>) -> Result<PatchOutcome> {
    let patch = patches::find(patch_name).ok_or_else(|| Error::UnknownPatch {
        name: patch_name.to_string(),
    })?;
    apply(patch, archive_path.as_ref())
}

fn apply(patch: &PatchDescriptor, archive_path: &Path) -> Result<PatchOutcome> {
    log::debug!("Applying {} to '{}'", patch.name, archive_path.display());
    let mut jar = Jar::open_for_patch(archive_path)?;

    // A missing metadata tree means a previous run got through the whole
    // routine, including the strip at its end.
    if patch.strip_signatures && !jar.has_subtree(METADATA_DIR) {
        log::debug!("Signature metadata already stripped, nothing to do");
        jar.close()?;
        return Ok(PatchOutcome::AlreadyPatched);
    }

    let class_bytes = jar.read_entry(patch.class_path)?;
    let mut class = ClassFile::parse(&class_bytes)?;

    match patch.apply(&mut class) {
        Ok(()) => {}
        Err(e) if e.is_already_patched() => {
            log::debug!("'{}' is already patched", patch.class_path);
            jar.close()?;
            return Ok(PatchOutcome::AlreadyPatched);
        }
        Err(e) => return Err(e),
    }

    jar.write_entry(patch.class_path, &class.to_bytes())?;
    if patch.strip_signatures {
        jar.delete_subtree(METADATA_DIR);
    }
    jar.close()?;
    Ok(PatchOutcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_patch() {
        let err = apply_patch("No_Such_Patch", Path::new("missing.jar")).unwrap_err();
        assert!(matches!(err, Error::UnknownPatch { .. }));
    }

    #[test]
    fn test_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let err =
            apply_patch("CoreModManager_Sort_Patch", dir.path().join("absent.jar")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
