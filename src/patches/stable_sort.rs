//! Repairs `CoreModManager.sortTweakList` in old Forge/FML builds.
//!
//! The method sorts its tweaker list through `java.util.Collections.sort`,
//! which on Java 8 goes through the list's own iterator machinery and
//! crashes against the list implementation FML hands it. The repair
//! transplants a self-contained replacement (copy out to an array, sort the
//! array, write the elements back by index) into `CoreModManager` and
//! redirects the one `Collections` call to it.

use super::PatchDescriptor;
use crate::bytecode::{Instruction, opcodes};
use crate::classfile::code::CODE_ATTRIBUTE;
use crate::classfile::{Attribute, ClassFile, CodeAttribute, ConstantPool, Member};
use crate::transplant::transplant_method;
use crate::{Error, Result};

pub(super) const DESCRIPTOR: PatchDescriptor = PatchDescriptor {
    name: "CoreModManager_Sort_Patch",
    library: "Minecraft Forge (FML relauncher)",
    class_path: "cpw/mods/fml/relauncher/CoreModManager.class",
    transplant: Some("sort"),
    summary: "Redirects sortTweakList's Collections.sort call to a transplanted stable sort",
    strip_signatures: true,
    already_patched,
    edit,
};

/// Signature of both the donor method and the call-site replacement.
const SORT_DESCRIPTOR: &str = "(Ljava/util/List;Ljava/util/Comparator;)V";

fn already_patched(class: &ClassFile) -> bool {
    class.has_method("sort")
}

fn edit(class: &mut ClassFile) -> Result<()> {
    let donor = donor_class()?;
    transplant_method(&donor, "sort", class)?;

    let target = class
        .find_method("sortTweakList")
        .ok_or_else(|| Error::target_not_found("method 'sortTweakList'"))?;
    let class_name = class
        .name()
        .ok_or_else(|| Error::corrupt_class(0, "class has no resolvable name"))?
        .to_string();
    let sort_ref = class
        .pool
        .add_method_ref(&class_name, "sort", SORT_DESCRIPTOR)?;

    let mut code = class.methods[target].code(&class.pool)?;
    let call_site = code
        .find_all(|ins| is_collections_call(&class.pool, ins))
        .next()
        .ok_or_else(|| {
            Error::target_not_found("static call into java/util/Collections in 'sortTweakList'")
        })?;
    code.body[call_site].set_pool_index(sort_ref)?;

    let pool = &class.pool;
    class.methods[target].set_code(pool, &code)
}

fn is_collections_call(pool: &ConstantPool, ins: &Instruction) -> bool {
    ins.opcode == opcodes::INVOKESTATIC
        && ins
            .pool_index()
            .and_then(|index| pool.resolve_ref(index))
            .is_some_and(|target| target.class == "java/util/Collections")
}

/// Builds the helper class holding the replacement sort.
///
/// The method body is what `javac` produces for
///
/// ```java
/// public static <T> void sort(List<T> list, Comparator<? super T> c) {
///     T[] array = (T[]) list.toArray();
///     Arrays.sort(array, c);
///     for (int i = 0; i < array.length; i++) {
///         list.set(i, array[i]);
///     }
/// }
/// ```
fn donor_class() -> Result<ClassFile> {
    let mut pool = ConstantPool::new();
    let this_class = pool.add_class("forgefix/StableSort")?;
    let super_class = pool.add_class("java/lang/Object")?;

    let to_array = pool.add_interface_method_ref(
        "java/util/List",
        "toArray",
        "()[Ljava/lang/Object;",
    )?;
    let arrays_sort = pool.add_method_ref(
        "java/util/Arrays",
        "sort",
        "([Ljava/lang/Object;Ljava/util/Comparator;)V",
    )?;
    let list_set = pool.add_interface_method_ref(
        "java/util/List",
        "set",
        "(ILjava/lang/Object;)Ljava/lang/Object;",
    )?;

    // Locals: 0 = list, 1 = comparator, 2 = array, 3 = i.
    let code = CodeAttribute {
        max_stack: 4,
        max_locals: 4,
        body: vec![
            Instruction::new(opcodes::ALOAD_0, Vec::new()),
            Instruction::invokeinterface(to_array, 1),
            Instruction::new(opcodes::ASTORE_2, Vec::new()),
            Instruction::new(opcodes::ALOAD_2, Vec::new()),
            Instruction::new(opcodes::ALOAD_1, Vec::new()),
            Instruction::invokestatic(arrays_sort),
            Instruction::new(opcodes::ICONST_0, Vec::new()),
            Instruction::new(opcodes::ISTORE_3, Vec::new()),
            // Loop head at offset 14; the exit branch skips to the return.
            Instruction::new(opcodes::ILOAD_3, Vec::new()),
            Instruction::new(opcodes::ALOAD_2, Vec::new()),
            Instruction::new(opcodes::ARRAYLENGTH, Vec::new()),
            Instruction::new(opcodes::IF_ICMPGE, 20i16.to_be_bytes().to_vec()),
            Instruction::new(opcodes::ALOAD_0, Vec::new()),
            Instruction::new(opcodes::ILOAD_3, Vec::new()),
            Instruction::new(opcodes::ALOAD_2, Vec::new()),
            Instruction::new(opcodes::ILOAD_3, Vec::new()),
            Instruction::new(opcodes::AALOAD, Vec::new()),
            Instruction::invokeinterface(list_set, 3),
            Instruction::new(opcodes::POP, Vec::new()),
            Instruction::new(opcodes::IINC, vec![3, 1]),
            Instruction::new(opcodes::GOTO, (-20i16).to_be_bytes().to_vec()),
            Instruction::return_void(),
        ],
        exception_table: Vec::new(),
        attributes: Vec::new(),
    };

    let name_index = pool.add_utf8("sort")?;
    let descriptor_index = pool.add_utf8(SORT_DESCRIPTOR)?;
    let code_name = pool.add_utf8(CODE_ATTRIBUTE)?;

    Ok(ClassFile {
        minor_version: 0,
        major_version: 50,
        pool,
        access_flags: 0x0021,
        this_class,
        super_class,
        interfaces: Vec::new(),
        fields: Vec::new(),
        methods: vec![Member {
            access_flags: 0x0009,
            name_index,
            descriptor_index,
            attributes: vec![Attribute {
                name_index: code_name,
                info: code.to_bytes(),
            }],
        }],
        attributes: Vec::new(),
    })
}
