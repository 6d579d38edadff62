//! Method bodies and the instruction subset the generator reads and emits.
//!
//! Bodies are held decoded. Branch targets and exception regions refer to
//! instruction indices, and byte offsets are recomputed by
//! [`MethodBody::update_offsets`] after a body is rebuilt.
//!
//! # Examples
//!
//! ```rust
//! use refasm::metadata::method::{Instruction, MethodBody, OpCode};
//!
//! let mut body = MethodBody::new(vec![
//!     Instruction::simple(OpCode::Ldnull),
//!     Instruction::simple(OpCode::Throw),
//! ]);
//! body.update_offsets();
//! assert_eq!(body.code_size, 2);
//! ```

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::metadata::{
    method::ExceptionHandler,
    signatures::{MethodRef, TypeSig},
};

/// CIL opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr)]
pub enum OpCode {
    /// No operation
    #[strum(serialize = "nop")]
    Nop,
    /// Load argument 0 onto the stack
    #[strum(serialize = "ldarg.0")]
    Ldarg0,
    /// Load argument 1 onto the stack
    #[strum(serialize = "ldarg.1")]
    Ldarg1,
    /// Load argument 2 onto the stack
    #[strum(serialize = "ldarg.2")]
    Ldarg2,
    /// Load argument 3 onto the stack
    #[strum(serialize = "ldarg.3")]
    Ldarg3,
    /// Load argument, short form
    #[strum(serialize = "ldarg.s")]
    LdargS,
    /// Load argument
    #[strum(serialize = "ldarg")]
    Ldarg,
    /// Push a null reference
    #[strum(serialize = "ldnull")]
    Ldnull,
    /// Push an int32 constant
    #[strum(serialize = "ldc.i4")]
    LdcI4,
    /// Push a string literal
    #[strum(serialize = "ldstr")]
    Ldstr,
    /// Duplicate the top of the stack
    #[strum(serialize = "dup")]
    Dup,
    /// Pop the top of the stack
    #[strum(serialize = "pop")]
    Pop,
    /// Call a method
    #[strum(serialize = "call")]
    Call,
    /// Call a method through the vtable
    #[strum(serialize = "callvirt")]
    Callvirt,
    /// Allocate an object and call its constructor
    #[strum(serialize = "newobj")]
    Newobj,
    /// Load an instance field
    #[strum(serialize = "ldfld")]
    Ldfld,
    /// Store an instance field
    #[strum(serialize = "stfld")]
    Stfld,
    /// Return from the method
    #[strum(serialize = "ret")]
    Ret,
    /// Unconditional branch
    #[strum(serialize = "br")]
    Br,
    /// Unconditional branch, short form
    #[strum(serialize = "br.s")]
    BrS,
    /// Leave a protected region
    #[strum(serialize = "leave")]
    Leave,
    /// Leave a protected region, short form
    #[strum(serialize = "leave.s")]
    LeaveS,
    /// End a finally or fault handler
    #[strum(serialize = "endfinally")]
    Endfinally,
    /// Throw the exception on the stack
    #[strum(serialize = "throw")]
    Throw,
}

impl OpCode {
    /// Encoded size of the opcode itself.
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            OpCode::Ldarg => 2,
            _ => 1,
        }
    }

    /// Encoded size of the inline operand.
    #[must_use]
    pub fn operand_size(self) -> usize {
        match self {
            OpCode::LdargS | OpCode::BrS | OpCode::LeaveS => 1,
            OpCode::Ldarg => 2,
            OpCode::LdcI4
            | OpCode::Ldstr
            | OpCode::Call
            | OpCode::Callvirt
            | OpCode::Newobj
            | OpCode::Ldfld
            | OpCode::Stfld
            | OpCode::Br
            | OpCode::Leave => 4,
            _ => 0,
        }
    }
}

/// Instruction operand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// No operand
    None,
    /// Integer constant
    Int32(i32),
    /// Argument index for the long and short `ldarg` forms
    ArgIndex(u16),
    /// String literal
    String(String),
    /// Method operand
    Method(MethodRef),
    /// Field or type token the generator passes through untouched
    Token(u32),
    /// Branch target as an instruction index
    Target(usize),
}

/// A single decoded instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Byte offset inside the body, valid after [`MethodBody::update_offsets`]
    #[serde(default)]
    pub offset: u32,
    /// Opcode
    pub opcode: OpCode,
    /// Operand
    pub operand: Operand,
}

impl Instruction {
    /// Creates an instruction without operand.
    #[must_use]
    pub fn simple(opcode: OpCode) -> Self {
        Instruction {
            offset: 0,
            opcode,
            operand: Operand::None,
        }
    }

    /// Creates an instruction with an operand.
    #[must_use]
    pub fn with_operand(opcode: OpCode, operand: Operand) -> Self {
        Instruction {
            offset: 0,
            opcode,
            operand,
        }
    }

    /// Creates a `call` to `method`.
    #[must_use]
    pub fn call(method: MethodRef) -> Self {
        Self::with_operand(OpCode::Call, Operand::Method(method))
    }

    /// Encoded size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.opcode.size() + self.opcode.operand_size()
    }

    /// True for any `ldarg` form loading argument 0, `this` in instance methods.
    #[must_use]
    pub fn is_ldarg_this(&self) -> bool {
        match (self.opcode, &self.operand) {
            (OpCode::Ldarg0, _) => true,
            (OpCode::LdargS | OpCode::Ldarg, Operand::ArgIndex(0)) => true,
            _ => false,
        }
    }

    /// The method operand of `call`, `callvirt` and `newobj`.
    #[must_use]
    pub fn method_operand(&self) -> Option<&MethodRef> {
        match (&self.opcode, &self.operand) {
            (OpCode::Call | OpCode::Callvirt | OpCode::Newobj, Operand::Method(method)) => Some(method),
            _ => None,
        }
    }
}

/// Local variable slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalVariable {
    /// Local type
    pub local_type: TypeSig,
    /// Pinned local
    pub is_pinned: bool,
}

/// A managed method body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodBody {
    /// Instructions in order
    pub instructions: Vec<Instruction>,
    /// Exception handler regions
    pub exception_handlers: Vec<ExceptionHandler>,
    /// Local variables
    #[serde(default)]
    pub locals: Vec<LocalVariable>,
    /// Maximum number of items on the operand stack
    pub max_stack: u16,
    /// Call default constructor on all local variables
    pub init_locals: bool,
    /// Size of all instructions in bytes, valid after [`MethodBody::update_offsets`]
    #[serde(default)]
    pub code_size: u32,
}

impl MethodBody {
    /// Creates a body from instructions with a max stack of 8.
    #[must_use]
    pub fn new(instructions: Vec<Instruction>) -> Self {
        MethodBody {
            instructions,
            exception_handlers: Vec::new(),
            locals: Vec::new(),
            max_stack: 8,
            init_locals: false,
            code_size: 0,
        }
    }

    /// Recomputes each instruction's offset and the total code size.
    pub fn update_offsets(&mut self) {
        let mut offset = 0u32;
        for instruction in &mut self.instructions {
            instruction.offset = offset;
            offset += instruction.size() as u32;
        }
        self.code_size = offset;
    }

    /// Byte offset of the instruction at `index`, or the code size for one past the end.
    #[must_use]
    pub fn offset_of(&self, index: usize) -> u32 {
        self.instructions
            .get(index)
            .map_or(self.code_size, |instruction| instruction.offset)
    }

    /// True for the `ldnull; throw` stub.
    #[must_use]
    pub fn is_throw_null(&self) -> bool {
        self.exception_handlers.is_empty()
            && self.instructions.len() == 2
            && self.instructions[0].opcode == OpCode::Ldnull
            && self.instructions[1].opcode == OpCode::Throw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ids::MethodId;

    #[test]
    fn test_update_offsets() {
        let mut body = MethodBody::new(vec![
            Instruction::simple(OpCode::Ldarg0),
            Instruction::call(MethodRef::Def(MethodId::new(0))),
            Instruction::simple(OpCode::Ret),
        ]);
        body.update_offsets();

        assert_eq!(body.instructions[1].offset, 1);
        assert_eq!(body.instructions[2].offset, 6);
        assert_eq!(body.code_size, 7);
        assert_eq!(body.offset_of(3), 7);
    }

    #[test]
    fn test_ldarg_this_forms() {
        assert!(Instruction::simple(OpCode::Ldarg0).is_ldarg_this());
        assert!(Instruction::with_operand(OpCode::LdargS, Operand::ArgIndex(0)).is_ldarg_this());
        assert!(!Instruction::with_operand(OpCode::Ldarg, Operand::ArgIndex(1)).is_ldarg_this());
        assert!(!Instruction::simple(OpCode::Ldarg1).is_ldarg_this());
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(OpCode::LeaveS.to_string(), "leave.s");
        let name: &'static str = OpCode::Endfinally.into();
        assert_eq!(name, "endfinally");
    }

    #[test]
    fn test_throw_null_detection() {
        let body = MethodBody::new(vec![Instruction::simple(OpCode::Ldnull), Instruction::simple(OpCode::Throw)]);
        assert!(body.is_throw_null());
    }
}
