//! The patch catalog.
//!
//! Each patch is a fixed, named transformation against one known class in
//! one known library; the catalog grows by adding entries here, not by
//! configuration. A patch brings an idempotency predicate (is the class
//! already in the patched state?) and the edit itself, both operating on
//! the decoded class model. Archive-level concerns (backup, write-back,
//! signature stripping) belong to [`crate::patcher`].

mod secure_jar;
mod stable_sort;

use crate::classfile::ClassFile;
use crate::{Error, Result};

/// One catalog entry: where to patch and how.
#[derive(Clone, Copy)]
pub struct PatchDescriptor {
    /// The name the patch is invoked by.
    pub name: &'static str,
    /// The library this patch repairs, for display.
    pub library: &'static str,
    /// Archive entry holding the class to rewrite.
    pub class_path: &'static str,
    /// Name of the helper method transplanted into the class, if any.
    pub transplant: Option<&'static str>,
    /// One-line description of the repair.
    pub summary: &'static str,
    /// Whether signature metadata under `META-INF` must be stripped after
    /// the edit, since the rewritten entry would no longer verify.
    pub strip_signatures: bool,
    already_patched: fn(&ClassFile) -> bool,
    edit: fn(&mut ClassFile) -> Result<()>,
}

impl PatchDescriptor {
    /// `true` if the class is already in this patch's terminal state.
    pub fn is_already_patched(&self, class: &ClassFile) -> bool {
        (self.already_patched)(class)
    }

    /// Runs the edit against the decoded class.
    ///
    /// Fails with [`Error::AlreadyPatched`] when the precondition reports
    /// the class is already in the terminal state; the dispatcher converts
    /// that signal into a successful no-op.
    pub fn apply(&self, class: &mut ClassFile) -> Result<()> {
        if self.is_already_patched(class) {
            return Err(Error::AlreadyPatched);
        }
        (self.edit)(class)
    }
}

impl std::fmt::Debug for PatchDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchDescriptor")
            .field("name", &self.name)
            .field("class_path", &self.class_path)
            .finish_non_exhaustive()
    }
}

static CATALOG: [PatchDescriptor; 2] = [stable_sort::DESCRIPTOR, secure_jar::DESCRIPTOR];

/// Every patch this build knows, in a stable order.
pub fn catalog() -> &'static [PatchDescriptor] {
    &CATALOG
}

/// Looks up a patch by its exact name.
pub fn find(name: &str) -> Option<&'static PatchDescriptor> {
    CATALOG.iter().find(|patch| patch.name == name)
}
