//! Custom attribute instances and their argument values.
//!
//! Attributes are stored decoded: a constructor reference plus typed positional
//! and named arguments. Argument values can nest, either as `typeof` values or
//! as arrays whose elements carry their own declared type, and the reachability
//! rules walk those nested values.
//!
//! [`AttributeOwner`] names every attribute list in the graph so that pruning code
//! can address them uniformly through
//! [`crate::metadata::module::Module::attributes_mut`].

mod types;

pub use types::*;

/// `System.Runtime.CompilerServices.CompilerGeneratedAttribute`
pub const COMPILER_GENERATED_ATTRIBUTE: &str =
    "System.Runtime.CompilerServices.CompilerGeneratedAttribute";
/// `System.Runtime.CompilerServices.InternalsVisibleToAttribute`
pub const INTERNALS_VISIBLE_TO_ATTRIBUTE: &str =
    "System.Runtime.CompilerServices.InternalsVisibleToAttribute";
/// `System.Runtime.CompilerServices.IsReadOnlyAttribute`
pub const IS_READ_ONLY_ATTRIBUTE: &str = "System.Runtime.CompilerServices.IsReadOnlyAttribute";
/// `System.Runtime.CompilerServices.ReferenceAssemblyAttribute`
pub const REFERENCE_ASSEMBLY_ATTRIBUTE: &str =
    "System.Runtime.CompilerServices.ReferenceAssemblyAttribute";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::signatures::{MemberRef, MethodRef, MethodSig, TypeSig};

    #[test]
    fn test_nested_argument_values() {
        let ctor = MethodRef::Member(MemberRef {
            declaring_type: TypeSig::external("System.Runtime", "System", "ObsoleteAttribute"),
            name: ".ctor".into(),
            signature: MethodSig::instance_void(),
        });
        let mut attr = CustomAttribute::new(ctor);
        attr.fixed_args.push(CustomAttributeArgument::new(
            TypeSig::sz_array(TypeSig::external("System.Runtime", "System", "Type")),
            AttributeValue::Array(vec![CustomAttributeArgument::new(
                TypeSig::external("System.Runtime", "System", "Type"),
                AttributeValue::Type(TypeSig::I4),
            )]),
        ));

        match &attr.fixed_args[0].value {
            AttributeValue::Array(items) => assert_eq!(items.len(), 1),
            other => panic!("unexpected value {other:?}"),
        }
        assert!(attr.named_args.is_empty());
    }
}
