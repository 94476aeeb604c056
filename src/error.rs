//! Error types for jar patching operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when opening, parsing, and patching jar archives, along with
//! a convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. The
//! dispatcher catches exactly one variant itself ([`Error::AlreadyPatched`],
//! which it converts into a successful no-op); everything else propagates to
//! the caller:
//!
//! ```rust,no_run
//! use forgefix::{PatchOutcome, Result};
//!
//! fn repair(jar: &str) -> Result<()> {
//!     match forgefix::apply_patch("CoreModManager_Sort_Patch", jar)? {
//!         PatchOutcome::Applied => println!("patched {jar}"),
//!         PatchOutcome::AlreadyPatched => println!("{jar} was already patched"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Matching on Specific Failures
//!
//! For fine-grained handling, match on the variants:
//!
//! ```rust
//! use forgefix::Error;
//!
//! fn describe(error: &Error) -> &'static str {
//!     match error {
//!         Error::Io(_) => "file system problem",
//!         Error::EntryNotFound { .. } => "class missing from the jar",
//!         Error::CorruptClass { .. } => "class file did not parse",
//!         Error::PatchTargetNotFound { .. } => "library shape not recognized",
//!         _ => "other failure",
//!     }
//! }
//! ```

use std::io;

/// The main error type for jar patching operations.
///
/// This enum represents all possible errors that can occur while reading a
/// jar container, decoding a class file, applying a patch, or writing the
/// result back. Each variant includes relevant context to help diagnose the
/// issue.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | File system operations |
/// | Container | [`InvalidArchive`][Self::InvalidArchive], [`CrcMismatch`][Self::CrcMismatch], [`EntryNotFound`][Self::EntryNotFound] | Damaged or unexpected zip data |
/// | Compatibility | [`UnsupportedMethod`][Self::UnsupportedMethod], [`UnsupportedFeature`][Self::UnsupportedFeature] | Zip features out of scope |
/// | Class codec | [`CorruptClass`][Self::CorruptClass] | Malformed class file |
/// | Patch shape | [`PatchTargetNotFound`][Self::PatchTargetNotFound], [`TransplantConflict`][Self::TransplantConflict] | Library does not match what the patch expects |
/// | Dispatch | [`AlreadyPatched`][Self::AlreadyPatched], [`UnknownPatch`][Self::UnknownPatch] | Catalog lookup and idempotency |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    ///
    /// This wraps [`std::io::Error`] and is returned when reading the source
    /// jar, creating the backup copy, or committing the rewritten container
    /// fails. Common causes include:
    /// - File not found
    /// - Permission denied
    /// - Disk full
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive container is not a readable zip file.
    ///
    /// This error occurs when:
    /// - No end-of-central-directory record can be located
    /// - A central directory or local header record has a bad signature
    /// - Record fields are inconsistent with the file's actual size
    /// - Two entries share the same path
    ///
    /// The string describes what was expected vs. found, including the byte
    /// offset where relevant.
    #[error("Invalid zip archive: {0}")]
    InvalidArchive(String),

    /// An entry's decompressed bytes do not match its stored checksum.
    ///
    /// This indicates the jar was damaged during download or storage. The
    /// patch aborts rather than operating on corrupt input.
    #[error("CRC mismatch for entry '{path}': expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch {
        /// The entry path with the CRC mismatch.
        path: String,
        /// The checksum recorded in the central directory.
        expected: u32,
        /// The checksum of the decompressed data.
        actual: u32,
    },

    /// An entry uses a compression method other than stored or deflate.
    ///
    /// Jars produced by standard toolchains only ever use methods `0`
    /// (stored) and `8` (deflate); anything else is out of scope.
    #[error("Unsupported compression method {method}")]
    UnsupportedMethod {
        /// The raw method id from the central directory.
        method: u16,
    },

    /// The archive or class uses a feature this engine does not handle.
    ///
    /// This covers zip64 containers, encrypted entries, multi-disk archives,
    /// and class constructs the editor refuses to rewrite (such as widening a
    /// narrow constant load).
    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature {
        /// The name of the unsupported feature.
        feature: &'static str,
    },

    /// An entry was not found in the archive.
    ///
    /// Returned when the class a patch targets is absent from the jar, which
    /// usually means the wrong archive was passed on the command line.
    #[error("Entry not found: {path}")]
    EntryNotFound {
        /// The path that was not found.
        path: String,
    },

    /// The class file is corrupt, truncated, or structurally inconsistent.
    ///
    /// This error includes the byte offset (relative to the start of the
    /// class entry, or of the method body for bytecode errors) where decoding
    /// failed, plus a description of what went wrong.
    #[error("Corrupt class file at offset {offset:#x}: {reason}")]
    CorruptClass {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// The patch's idempotency precondition reports the work is already done.
    ///
    /// This is not a failure in any meaningful sense: the dispatcher catches
    /// it and converts it into [`PatchOutcome::AlreadyPatched`], so callers
    /// of [`apply_patch`] never observe it. It only escapes when the patch
    /// routines are driven directly.
    ///
    /// [`PatchOutcome::AlreadyPatched`]: crate::PatchOutcome::AlreadyPatched
    /// [`apply_patch`]: crate::apply_patch
    #[error("target is already patched")]
    AlreadyPatched,

    /// The class does not contain the shape the patch expects.
    ///
    /// Each patch is valid only while its target keeps a known layout (a
    /// specific method, a specific call site). When the layout is absent the
    /// patch must fail loudly rather than guess -- this is deliberately
    /// distinct from [`AlreadyPatched`][Self::AlreadyPatched], because it
    /// signals an unexpected input, not a previously applied patch.
    #[error("Patch target not found: {expected}")]
    PatchTargetNotFound {
        /// What the patch was looking for.
        expected: String,
    },

    /// The target class already declares a method the transplant would add.
    ///
    /// Copying a method into a class that already has one of the same name
    /// would produce an ambiguous class, so the transplant refuses.
    #[error("Transplant conflict: method '{name}' already exists in the target class")]
    TransplantConflict {
        /// The colliding method name.
        name: String,
    },

    /// The requested patch name is not in the catalog.
    #[error("Unknown patch: {name}")]
    UnknownPatch {
        /// The name that was requested.
        name: String,
    },
}

impl Error {
    /// Returns `true` if this error is the already-patched signal.
    ///
    /// The dispatcher uses this to convert the signal into a successful
    /// no-op; see [`Error::AlreadyPatched`].
    pub fn is_already_patched(&self) -> bool {
        matches!(self, Error::AlreadyPatched)
    }

    /// Returns `true` if this is a data corruption error.
    ///
    /// Corruption errors indicate the jar or a class inside it is damaged,
    /// as opposed to merely unexpected.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::InvalidArchive(_) | Error::CrcMismatch { .. } | Error::CorruptClass { .. }
        )
    }

    /// Returns `true` if this error is related to unsupported features.
    ///
    /// These errors indicate the archive uses container or class constructs
    /// outside this engine's scope, not that the data is damaged.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedMethod { .. } | Error::UnsupportedFeature { .. }
        )
    }

    /// Returns `true` if the patched library's shape did not match.
    ///
    /// Shape mismatches mean the patch recognized the archive but not the
    /// code inside it -- typically a library version the catalog entry was
    /// never written for.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(
            self,
            Error::PatchTargetNotFound { .. } | Error::TransplantConflict { .. }
        )
    }

    /// Returns the entry path associated with this error, if any.
    pub fn entry_path(&self) -> Option<&str> {
        match self {
            Error::EntryNotFound { path } => Some(path.as_str()),
            Error::CrcMismatch { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }

    /// Creates a CorruptClass error.
    ///
    /// This is a convenience constructor for creating corrupt class errors.
    pub fn corrupt_class(offset: u64, reason: impl Into<String>) -> Self {
        Error::CorruptClass {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a PatchTargetNotFound error.
    pub fn target_not_found(expected: impl Into<String>) -> Self {
        Error::PatchTargetNotFound {
            expected: expected.into(),
        }
    }
}

/// A specialized Result type for patching operations.
///
/// This is defined as `std::result::Result<T, Error>` for convenience.
pub type Result<T> = std::result::Result<T, Error>;
