//! Method definitions, their parameters, overrides and bodies.
//!
//! Constructor kinds are not stored; they derive from the method name and the
//! static flag:
//!
//! - `.ctor` and not static: instance constructor
//! - `.cctor` and static: static constructor (type initializer)

mod body;
mod exceptions;
mod types;

pub use body::*;
pub use exceptions::*;
pub use types::*;

use serde::{Deserialize, Serialize};

use crate::metadata::{
    customattributes::CustomAttribute,
    generics::GenericParam,
    ids::TypeId,
    members::MemberAccess,
    signatures::{MethodSig, TypeSig},
};

/// Name of instance constructors
pub const CONSTRUCTOR_NAME: &str = ".ctor";
/// Name of static constructors
pub const STATIC_CONSTRUCTOR_NAME: &str = ".cctor";
/// Name of finalizers
pub const FINALIZER_NAME: &str = "Finalize";

/// A method defined on a type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    /// Method name
    pub name: String,
    /// Accessibility
    pub access: MemberAccess,
    /// Attribute flags
    pub modifiers: MethodModifiers,
    /// Implementation flags
    pub impl_flags: MethodImplFlags,
    /// Parameters, excluding `this`
    pub params: Vec<Param>,
    /// Return parameter
    #[serde(default)]
    pub ret: ReturnParam,
    /// Generic parameters
    pub generic_params: Vec<GenericParam>,
    /// Explicit method implementation records
    pub overrides: Vec<MethodOverride>,
    /// Body, `None` for abstract, runtime and extern methods
    pub body: Option<MethodBody>,
    /// Native interop binding
    pub impl_map: Option<ImplMap>,
    /// Owning type
    pub declaring_type: TypeId,
    /// Attributes applied to the method
    pub custom_attributes: Vec<CustomAttribute>,
    /// Tombstone set once the method has been detached from its owner
    #[serde(default)]
    pub removed: bool,
}

impl MethodDef {
    /// Creates a public instance method returning `void` with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, declaring_type: TypeId) -> Self {
        MethodDef {
            name: name.into(),
            access: MemberAccess::Public,
            modifiers: MethodModifiers::HIDE_BY_SIG,
            impl_flags: MethodImplFlags::empty(),
            params: Vec::new(),
            ret: ReturnParam::default(),
            generic_params: Vec::new(),
            overrides: Vec::new(),
            body: None,
            impl_map: None,
            declaring_type,
            custom_attributes: Vec::new(),
            removed: false,
        }
    }

    /// True for static methods.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(MethodModifiers::STATIC)
    }

    /// True for abstract methods.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(MethodModifiers::ABSTRACT)
    }

    /// True for virtual methods.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.modifiers.contains(MethodModifiers::VIRTUAL)
    }

    /// True for `.ctor` methods that are not static.
    #[must_use]
    pub fn is_instance_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME && !self.is_static()
    }

    /// True for the static `.cctor`.
    #[must_use]
    pub fn is_static_constructor(&self) -> bool {
        self.name == STATIC_CONSTRUCTOR_NAME && self.is_static()
    }

    /// True if the method returns a value.
    #[must_use]
    pub fn has_return_type(&self) -> bool {
        !self.ret.return_type.is_void()
    }

    /// True if any parameter is out without in.
    #[must_use]
    pub fn has_out_only_param(&self) -> bool {
        self.params.iter().any(Param::is_out_only)
    }

    /// True if the method carries explicit implementation records.
    #[must_use]
    pub fn has_overrides(&self) -> bool {
        !self.overrides.is_empty()
    }

    /// True for managed IL implementations.
    #[must_use]
    pub fn is_il(&self) -> bool {
        self.impl_flags.is_il() && !self.impl_flags.contains(MethodImplFlags::UNMANAGED)
    }

    /// True if every parameter is optional, which includes parameterless methods.
    #[must_use]
    pub fn all_params_optional(&self) -> bool {
        self.params.iter().all(Param::is_optional)
    }

    /// The method signature.
    #[must_use]
    pub fn signature(&self) -> MethodSig {
        MethodSig {
            has_this: !self.is_static(),
            generic_param_count: self.generic_params.len() as u32,
            return_type: self.ret.return_type.clone(),
            params: self.params.iter().map(|p| p.param_type.clone()).collect(),
        }
    }

    /// Iterates over the parameter and return types.
    pub fn signature_types(&self) -> impl Iterator<Item = &TypeSig> {
        self.params
            .iter()
            .map(|p| &p.param_type)
            .chain(std::iter::once(&self.ret.return_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_kinds() {
        let mut ctor = MethodDef::new(CONSTRUCTOR_NAME, TypeId::new(1));
        assert!(ctor.is_instance_constructor());
        ctor.modifiers |= MethodModifiers::STATIC;
        assert!(!ctor.is_instance_constructor());

        let mut cctor = MethodDef::new(STATIC_CONSTRUCTOR_NAME, TypeId::new(1));
        assert!(!cctor.is_static_constructor());
        cctor.modifiers |= MethodModifiers::STATIC;
        assert!(cctor.is_static_constructor());
    }

    #[test]
    fn test_out_only_params() {
        let mut method = MethodDef::new("TryGet", TypeId::new(1));
        let mut out = Param::new("value", TypeSig::by_ref(TypeSig::I4));
        out.flags = ParamFlags::OUT;
        method.params.push(out);
        assert!(method.has_out_only_param());

        method.params[0].flags |= ParamFlags::IN;
        assert!(!method.has_out_only_param());
    }

    #[test]
    fn test_impl_flags_reset() {
        let flags = MethodImplFlags::RUNTIME | MethodImplFlags::INTERNAL_CALL | MethodImplFlags::NO_INLINING;
        let managed = flags.as_managed_il();
        assert!(managed.is_il());
        assert_eq!(managed, MethodImplFlags::NO_INLINING);
    }

    #[test]
    fn test_signature() {
        let mut method = MethodDef::new("Add", TypeId::new(1));
        method.params.push(Param::new("a", TypeSig::I4));
        method.ret.return_type = TypeSig::I4;
        let sig = method.signature();
        assert!(sig.has_this);
        assert_eq!(sig.params, vec![TypeSig::I4]);
        assert!(method.has_return_type());
    }
}
