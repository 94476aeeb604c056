//! # forgefix
//!
//! An offline patcher for known-broken Minecraft Forge and modlauncher
//! jars.
//!
//! Later Java 8 releases broke two classes shipped in older Forge/FML and
//! modlauncher builds: a tweaker-list sort that trips over
//! `Collections.sort`, and a static initializer that reaches into a since
//! removed JDK-internal verifier class. This crate repairs both by
//! rewriting the affected class files in place, directly inside the jar on
//! disk. No JVM is started and nothing outside the targeted entries
//! changes; every attribute a patch does not touch round-trips byte for
//! byte.
//!
//! Each repair is a named entry in a fixed catalog pairing an idempotency
//! check with a bytecode edit (see [`patches::catalog`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use forgefix::{PatchOutcome, Result};
//!
//! fn main() -> Result<()> {
//!     let outcome = forgefix::apply_patch(
//!         "CoreModManager_Sort_Patch",
//!         "libraries/forge-1.12.2-universal.jar",
//!     )?;
//!     match outcome {
//!         PatchOutcome::Applied => println!("patched"),
//!         PatchOutcome::AlreadyPatched => println!("nothing to do"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Before the first edit the original file is copied to `<name>~` next to
//! itself; later runs never overwrite that backup. Re-running a patch is
//! safe and reports [`PatchOutcome::AlreadyPatched`] without writing
//! anything.
//!
//! ### Listing the Catalog
//!
//! ```rust
//! for patch in forgefix::patches::catalog() {
//!     println!("{}: {}", patch.name, patch.summary);
//! }
//! ```
//!
//! ## Scope
//!
//! The container layer speaks the plain zip subset that jars actually use:
//! stored and deflated entries, single volume, no zip64, no encryption.
//! The class codec decodes structure, not meaning -- attribute payloads
//! stay as raw bytes except for the `Code` attribute of a method being
//! rewritten.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod bytecode;
pub mod classfile;
pub mod error;
pub mod jar;
pub mod patcher;
pub mod patches;
pub mod transplant;
pub mod zip;

pub use error::{Error, Result};

// Re-export the dispatch API at crate root for convenience
pub use patcher::{PatchOutcome, apply_patch};
pub use patches::PatchDescriptor;

// Re-export the container and class layers for direct use
pub use classfile::ClassFile;
pub use jar::{Jar, backup_path};
pub use zip::ZipArchive;
