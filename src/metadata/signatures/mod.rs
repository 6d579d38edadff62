//! Type and method signatures.
//!
//! [`TypeSig`] is the one representation used for every place a type is named:
//! field types, parameter and return types, base types, interface
//! implementations, generic constraints, attribute argument types and typeof
//! values. It distinguishes types defined in this module ([`TypeSig::Def`], fully
//! navigable through the arena) from opaque references into other modules
//! ([`TypeSig::Ref`]).
//!
//! [`MethodRef`] plays the same role for methods: instruction operands,
//! override declarations and attribute constructors.
//!
//! # Examples
//!
//! ```rust
//! use refasm::metadata::signatures::TypeSig;
//!
//! let list = TypeSig::generic_inst(
//!     TypeSig::external("System.Runtime", "System.Collections.Generic", "List`1"),
//!     vec![TypeSig::I4],
//! );
//! assert!(!list.is_primitive());
//! assert!(TypeSig::by_ref(TypeSig::I4).element().is_some_and(TypeSig::is_primitive));
//! ```

mod types;

pub use types::*;
