//! Exit codes for the CLI tool.

use forgefix::Error;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Archive or class data is damaged or out of scope
pub const BAD_ARCHIVE: i32 = 3;
/// The library does not have the shape the patch expects
pub const BAD_LIBRARY: i32 = 4;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    BadArchive,
    BadLibrary,
    IoError,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::BadArchive => BAD_ARCHIVE,
            Self::BadLibrary => BAD_LIBRARY,
            Self::IoError => IO_ERROR,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a forgefix error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error {
        Error::Io(_) => ExitCode::IoError,
        Error::InvalidArchive(_) | Error::CrcMismatch { .. } => ExitCode::BadArchive,
        Error::UnsupportedMethod { .. } | Error::UnsupportedFeature { .. } => ExitCode::BadArchive,
        Error::CorruptClass { .. } => ExitCode::BadArchive,
        Error::EntryNotFound { .. } => ExitCode::BadLibrary,
        Error::PatchTargetNotFound { .. } | Error::TransplantConflict { .. } => {
            ExitCode::BadLibrary
        }
        Error::UnknownPatch { .. } => ExitCode::BadArgs,
        // The dispatcher converts this into a successful outcome before it
        // can reach the CLI; treat a stray one as success all the same.
        Error::AlreadyPatched => ExitCode::Success,
        // Future error variants - required by #[non_exhaustive]
        _ => ExitCode::FatalError,
    }
}
