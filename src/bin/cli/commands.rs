//! Command implementations for the CLI tool.

use std::path::Path;

use forgefix::{PatchOutcome, apply_patch, backup_path, patches};

use crate::exit_codes::{ExitCode, error_to_exit_code};

/// Patch command implementation
pub fn patch(patch_name: &str, archive_path: &Path) -> ExitCode {
    if !archive_path.is_file() {
        eprintln!("Error: '{}' is not a file", archive_path.display());
        return ExitCode::BadArgs;
    }

    match apply_patch(patch_name, archive_path) {
        Ok(PatchOutcome::Applied) => {
            println!(
                "Patched '{}' (original kept at '{}')",
                archive_path.display(),
                backup_path(archive_path).display()
            );
            ExitCode::Success
        }
        Ok(PatchOutcome::AlreadyPatched) => {
            println!("'{}' is already patched", archive_path.display());
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error: {e}");
            error_to_exit_code(&e)
        }
    }
}

/// List command implementation
pub fn list() -> ExitCode {
    for patch in patches::catalog() {
        println!("{}", patch.name);
        println!("  library: {}", patch.library);
        println!("  target:  {}", patch.class_path);
        println!("  repair:  {}", patch.summary);
        println!();
    }
    ExitCode::Success
}
