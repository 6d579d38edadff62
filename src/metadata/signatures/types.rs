use serde::{Deserialize, Serialize};

use crate::metadata::ids::{MethodId, TypeId};

/// An opaque reference to a type defined in another module.
///
/// The contents of the referenced module are never inspected: a reference is
/// trusted as long as it carries a resolution scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalTypeRef {
    /// Name of the assembly or module the type lives in, `None` if unresolved
    pub scope: Option<String>,
    /// Namespace of the type
    pub namespace: String,
    /// Simple name of the type
    pub name: String,
}

impl ExternalTypeRef {
    /// Creates a resolved reference to `namespace.name` in `scope`.
    #[must_use]
    pub fn new(
        scope: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        ExternalTypeRef {
            scope: Some(scope.into()),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Returns `Namespace.Name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

/// Represents a type in field, parameter, return, constraint and attribute signatures
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeSig {
    /// void
    Void,
    /// bool
    Boolean,
    /// char
    Char,
    /// signed 8bit integer
    I1,
    /// unsigned 8bit integer
    U1,
    /// signed 16bit integer
    I2,
    /// unsigned 16bit integer
    U2,
    /// signed 32bit integer
    I4,
    /// unsigned 32bit integer
    U4,
    /// signed 64bit integer
    I8,
    /// unsigned 64bit integer
    U8,
    /// 32bit floating-point
    R4,
    /// 64bit floating-point
    R8,
    /// signed integer, sized to executing platform
    I,
    /// unsigned integer, sized to executing platform
    U,
    /// System.String
    String,
    /// System.Object
    Object,
    /// Type is referenced during runtime
    TypedByRef,
    /// A type defined in this module
    Def(TypeId),
    /// A type defined in another module
    Ref(ExternalTypeRef),
    /// Generic type and its arguments
    GenericInst(Box<TypeSig>, Vec<TypeSig>),
    /// A pointer to a type
    Ptr(Box<TypeSig>),
    /// Type by reference
    ByRef(Box<TypeSig>),
    /// Single dimension array
    SzArray(Box<TypeSig>),
    /// Multi dimension array with its rank
    Array(Box<TypeSig>, u32),
    /// Pinned local
    Pinned(Box<TypeSig>),
    /// Type carrying a modreq / modopt
    Modified {
        /// `modreq` if true, `modopt` otherwise
        required: bool,
        /// The modifier type
        modifier: Box<TypeSig>,
        /// The modified type
        inner: Box<TypeSig>,
    },
    /// Generic type parameter
    GenericParamType(u32),
    /// Generic method parameter
    GenericParamMethod(u32),
}

impl TypeSig {
    /// Creates a resolved external reference.
    #[must_use]
    pub fn external(
        scope: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        TypeSig::Ref(ExternalTypeRef::new(scope, namespace, name))
    }

    /// Creates an `element[]` signature.
    #[must_use]
    pub fn sz_array(element: TypeSig) -> Self {
        TypeSig::SzArray(Box::new(element))
    }

    /// Creates a `element&` signature.
    #[must_use]
    pub fn by_ref(element: TypeSig) -> Self {
        TypeSig::ByRef(Box::new(element))
    }

    /// Creates a `definition<args..>` signature.
    #[must_use]
    pub fn generic_inst(definition: TypeSig, args: Vec<TypeSig>) -> Self {
        TypeSig::GenericInst(Box::new(definition), args)
    }

    /// Removes pinned and custom modifier wrappers.
    #[must_use]
    pub fn strip_modifiers(&self) -> &TypeSig {
        let mut current = self;
        loop {
            match current {
                TypeSig::Pinned(inner) | TypeSig::Modified { inner, .. } => current = inner,
                other => return other,
            }
        }
    }

    /// Returns the element type of pointer, by-ref and array signatures.
    #[must_use]
    pub fn element(&self) -> Option<&TypeSig> {
        match self {
            TypeSig::Ptr(inner)
            | TypeSig::ByRef(inner)
            | TypeSig::SzArray(inner)
            | TypeSig::Array(inner, _) => Some(inner),
            _ => None,
        }
    }

    /// True for the primitive value types: bool, char, integers, floats and native ints.
    ///
    /// This is a shallow check and does not look through enums or structs made
    /// only of primitives.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self.strip_modifiers(),
            TypeSig::Boolean
                | TypeSig::Char
                | TypeSig::I1
                | TypeSig::U1
                | TypeSig::I2
                | TypeSig::U2
                | TypeSig::I4
                | TypeSig::U4
                | TypeSig::I8
                | TypeSig::U8
                | TypeSig::R4
                | TypeSig::R8
                | TypeSig::I
                | TypeSig::U
        )
    }

    /// True for `void`.
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self.strip_modifiers(), TypeSig::Void)
    }

    /// True if the signature mentions the local type `id` anywhere.
    #[must_use]
    pub fn references(&self, id: TypeId) -> bool {
        match self {
            TypeSig::Def(def) => *def == id,
            TypeSig::GenericInst(definition, args) => {
                definition.references(id) || args.iter().any(|arg| arg.references(id))
            }
            TypeSig::Ptr(inner)
            | TypeSig::ByRef(inner)
            | TypeSig::SzArray(inner)
            | TypeSig::Array(inner, _)
            | TypeSig::Pinned(inner) => inner.references(id),
            TypeSig::Modified {
                modifier, inner, ..
            } => modifier.references(id) || inner.references(id),
            _ => false,
        }
    }
}

/// Method signature used by member references and signature comparisons
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSig {
    /// Instance method, `this` is passed implicitly
    pub has_this: bool,
    /// Number of generic parameters
    pub generic_param_count: u32,
    /// The return type
    pub return_type: TypeSig,
    /// The parameter types
    pub params: Vec<TypeSig>,
}

impl MethodSig {
    /// `instance void ()`, the shape of a parameterless constructor or finalizer.
    #[must_use]
    pub fn instance_void() -> Self {
        MethodSig {
            has_this: true,
            generic_param_count: 0,
            return_type: TypeSig::Void,
            params: Vec::new(),
        }
    }
}

/// A reference to a method declared in another module or on an instantiated type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberRef {
    /// The type declaring the method
    pub declaring_type: TypeSig,
    /// Method name
    pub name: String,
    /// Method signature
    pub signature: MethodSig,
}

/// A method operand, override declaration or attribute constructor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodRef {
    /// A method defined in this module
    Def(MethodId),
    /// A member reference
    Member(MemberRef),
}
