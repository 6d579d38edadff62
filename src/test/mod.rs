//! Shared fixtures for unit tests.
//!
//! Each `create_*` function builds a small module covering one pruning situation.
//! Fixtures return the ids tests assert on so that no test needs to look types up
//! by name.

use crate::metadata::{
    builder::{FieldBuilder, MethodBuilder, TypeBuilder},
    ids::{FieldId, MethodId, TypeId},
    members::MemberAccess,
    method::{Instruction, OpCode},
    module::{AssemblyDef, Module},
    signatures::TypeSig,
};

/// An empty module `Lib.dll` with an assembly manifest named `Lib`.
pub fn create_assembly_module() -> Module {
    let mut module = Module::new("Lib.dll");
    module.assembly = Some(AssemblyDef::new("Lib"));
    module
}

/// Ids of the [`create_library`] fixture
pub struct Library {
    /// `public class N.Foo`
    pub foo: TypeId,
    /// `internal int _x`
    pub hidden_field: FieldId,
    /// `public void Bar() { nop; ret }`
    pub bar: MethodId,
}

/// `public class N.Foo { internal int _x; public void Bar() { nop; ret } }`
pub fn create_library() -> (Module, Library) {
    let mut module = create_assembly_module();
    let foo = TypeBuilder::class("N", "Foo").build(&mut module);
    let hidden_field = FieldBuilder::new("_x", TypeSig::I4)
        .access(MemberAccess::Assembly)
        .build(&mut module, foo);
    let bar = MethodBuilder::new("Bar")
        .body(vec![Instruction::simple(OpCode::Nop), Instruction::simple(OpCode::Ret)])
        .build(&mut module, foo);
    (
        module,
        Library {
            foo,
            hidden_field,
            bar,
        },
    )
}

/// Opcodes of a method body, empty when the method has none.
pub fn opcodes(module: &Module, id: MethodId) -> Vec<OpCode> {
    module
        .method(id)
        .body
        .as_ref()
        .map(|b| b.instructions.iter().map(|i| i.opcode).collect())
        .unwrap_or_default()
}
