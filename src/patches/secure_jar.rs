//! Disarms `SecureJarHandler`'s hold on a JDK-internal verifier class.
//!
//! Old cpw.mods.modlauncher builds reach into
//! `sun.security.util.ManifestEntryVerifier` by reflection during static
//! initialization and stash the captured field in the `JV` static. Later
//! Java 8 releases dropped that internal class, so loading
//! `SecureJarHandler` dies before the launcher gets anywhere. The repair
//! rewrites the initializer's tail to store `null` into `JV` and return,
//! then records a marker string in the constant pool so the class is
//! recognizable as already patched.

use super::PatchDescriptor;
use crate::bytecode::Instruction;
use crate::classfile::ClassFile;
use crate::{Error, Result};

pub(super) const DESCRIPTOR: PatchDescriptor = PatchDescriptor {
    name: "SecureJarHandler_ManifestEntryVerifier_Patch",
    library: "cpw.mods.modlauncher",
    class_path: "cpw/mods/modlauncher/SecureJarHandler.class",
    transplant: None,
    summary: "Nulls the captured ManifestEntryVerifier field so class initialization survives",
    strip_signatures: false,
    already_patched,
    edit,
};

/// Stored as a `String` constant in the patched class; its presence is the
/// patched-state check.
const PATCH_MARKER: &str = "forgefix.sunpatch";

fn already_patched(class: &ClassFile) -> bool {
    class.pool.has_string(PATCH_MARKER)
}

fn edit(class: &mut ClassFile) -> Result<()> {
    let clinit = class
        .find_method("<clinit>")
        .ok_or_else(|| Error::target_not_found("static initializer '<clinit>'"))?;
    let class_name = class
        .name()
        .ok_or_else(|| Error::corrupt_class(0, "class has no resolvable name"))?
        .to_string();
    let field_ref = class
        .pool
        .add_field_ref(&class_name, "JV", "Ljava/lang/reflect/Field;")?;

    let mut code = class.methods[clinit].code(&class.pool)?;
    code.truncate_and_append(
        1,
        vec![
            Instruction::aconst_null(),
            Instruction::putstatic(field_ref),
            Instruction::return_void(),
        ],
    );
    let pool = &class.pool;
    class.methods[clinit].set_code(pool, &code)?;

    class.pool.add_string(PATCH_MARKER)?;
    Ok(())
}
