//! Type definitions.
//!
//! A [`TypeDef`] owns ordered id lists of its members and nested types. Visibility
//! follows the ECMA-335 `TypeAttributes.VisibilityMask` values; the remaining
//! semantic flags are kept in [`TypeFlags`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::metadata::{
    customattributes::CustomAttribute,
    generics::GenericParam,
    ids::{EventId, FieldId, MethodId, PropertyId, TypeId},
    signatures::TypeSig,
};

/// Bitmask for `VISIBILITY` extraction from raw type attributes
pub const TYPE_VISIBILITY_MASK: u32 = 0x0000_0007;

/// The semantic category of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum TypeKind {
    /// Reference type
    #[strum(serialize = "class")]
    Class,
    /// Value type deriving from `System.ValueType`
    #[strum(serialize = "struct")]
    Struct,
    /// Value type deriving from `System.Enum`
    #[strum(serialize = "enum")]
    Enum,
    /// Interface
    #[strum(serialize = "interface")]
    Interface,
    /// Reference type deriving from `System.MulticastDelegate`
    #[strum(serialize = "delegate")]
    Delegate,
}

impl TypeKind {
    /// True for structs and enums.
    #[must_use]
    pub fn is_value_type(self) -> bool {
        matches!(self, TypeKind::Struct | TypeKind::Enum)
    }
}

/// Type visibility, ordered as the raw `VisibilityMask` values
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
pub enum TypeVisibility {
    /// Class has no public scope
    #[strum(serialize = "internal")]
    NotPublic = 0,
    /// Class has public scope
    #[strum(serialize = "public")]
    Public = 1,
    /// Class is nested with public visibility
    #[strum(serialize = "nested public")]
    NestedPublic = 2,
    /// Class is nested with private visibility
    #[strum(serialize = "nested private")]
    NestedPrivate = 3,
    /// Class is nested with family visibility
    #[strum(serialize = "nested protected")]
    NestedFamily = 4,
    /// Class is nested with assembly visibility
    #[strum(serialize = "nested internal")]
    NestedAssembly = 5,
    /// Class is nested with family and assembly visibility
    #[strum(serialize = "nested private protected")]
    NestedFamAndAssem = 6,
    /// Class is nested with family or assembly visibility
    #[strum(serialize = "nested protected internal")]
    NestedFamOrAssem = 7,
}

impl TypeVisibility {
    /// Extract visibility from raw type attributes
    #[must_use]
    pub fn from_type_attributes(flags: u32) -> Self {
        match flags & TYPE_VISIBILITY_MASK {
            1 => TypeVisibility::Public,
            2 => TypeVisibility::NestedPublic,
            3 => TypeVisibility::NestedPrivate,
            4 => TypeVisibility::NestedFamily,
            5 => TypeVisibility::NestedAssembly,
            6 => TypeVisibility::NestedFamAndAssem,
            7 => TypeVisibility::NestedFamOrAssem,
            _ => TypeVisibility::NotPublic,
        }
    }

    /// True for every visibility except the two top-level ones.
    #[must_use]
    pub fn is_nested(self) -> bool {
        !matches!(self, TypeVisibility::NotPublic | TypeVisibility::Public)
    }
}

bitflags! {
    /// Type semantic flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TypeFlags: u32 {
        /// Class is abstract
        const ABSTRACT = 0x0000_0080;
        /// Class cannot be extended
        const SEALED = 0x0000_0100;
        /// Class name is special
        const SPECIAL_NAME = 0x0000_0400;
        /// Class/Interface is imported
        const IMPORT = 0x0000_1000;
        /// Class is serializable
        const SERIALIZABLE = 0x0000_2000;
        /// Initialize the class before first static field access
        const BEFORE_FIELD_INIT = 0x0010_0000;
    }
}

/// An interface implementation record with its own attribute list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceImpl {
    /// The implemented interface
    pub interface: TypeSig,
    /// Attributes applied to the implementation record
    pub custom_attributes: Vec<CustomAttribute>,
}

impl InterfaceImpl {
    /// Creates an implementation record without attributes.
    #[must_use]
    pub fn new(interface: TypeSig) -> Self {
        InterfaceImpl {
            interface,
            custom_attributes: Vec::new(),
        }
    }
}

/// A type defined in the module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    /// Namespace, empty for nested types and the global type
    pub namespace: String,
    /// Simple name
    pub name: String,
    /// Semantic category
    pub kind: TypeKind,
    /// Visibility
    pub visibility: TypeVisibility,
    /// Semantic flags
    pub flags: TypeFlags,
    /// Base type, `None` for interfaces, `<Module>` and `System.Object`
    pub base_type: Option<TypeSig>,
    /// Enclosing type for nested types
    pub declaring_type: Option<TypeId>,
    /// Implemented interfaces
    pub interfaces: Vec<InterfaceImpl>,
    /// Generic parameters
    pub generic_params: Vec<GenericParam>,
    /// Fields in declaration order
    pub fields: Vec<FieldId>,
    /// Methods in declaration order
    pub methods: Vec<MethodId>,
    /// Properties in declaration order
    pub properties: Vec<PropertyId>,
    /// Events in declaration order
    pub events: Vec<EventId>,
    /// Nested types in declaration order
    pub nested_types: Vec<TypeId>,
    /// Attributes applied to the type
    pub custom_attributes: Vec<CustomAttribute>,
    /// Tombstone set once the type has been detached from its owner
    #[serde(default)]
    pub removed: bool,
}

impl TypeDef {
    /// Creates an empty public class.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TypeDef {
            namespace: namespace.into(),
            name: name.into(),
            kind: TypeKind::Class,
            visibility: TypeVisibility::Public,
            flags: TypeFlags::empty(),
            base_type: None,
            declaring_type: None,
            interfaces: Vec::new(),
            generic_params: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            nested_types: Vec::new(),
            custom_attributes: Vec::new(),
            removed: false,
        }
    }

    /// True for sealed abstract classes, the C# `static class`.
    #[must_use]
    pub fn is_static_class(&self) -> bool {
        self.flags.contains(TypeFlags::ABSTRACT | TypeFlags::SEALED)
    }

    /// True for interfaces.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// True for structs and enums.
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        self.kind.is_value_type()
    }

    /// True for delegate types.
    #[must_use]
    pub fn is_delegate(&self) -> bool {
        self.kind == TypeKind::Delegate
    }

    /// True if the type has no members, nested types or attributes left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
            && self.methods.is_empty()
            && self.properties.is_empty()
            && self.events.is_empty()
            && self.nested_types.is_empty()
            && self.interfaces.is_empty()
            && self.generic_params.is_empty()
            && self.custom_attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_from_raw() {
        assert_eq!(TypeVisibility::from_type_attributes(0x0010_0001), TypeVisibility::Public);
        assert_eq!(TypeVisibility::from_type_attributes(0x5), TypeVisibility::NestedAssembly);
        assert!(TypeVisibility::NestedPrivate.is_nested());
        assert!(!TypeVisibility::NotPublic.is_nested());
    }

    #[test]
    fn test_static_class() {
        let mut ty = TypeDef::new("N", "Helpers");
        assert!(!ty.is_static_class());
        ty.flags = TypeFlags::ABSTRACT | TypeFlags::SEALED;
        assert!(ty.is_static_class());
        assert!(ty.is_empty());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(TypeVisibility::NestedFamOrAssem.to_string(), "nested protected internal");
        assert_eq!(TypeKind::Struct.to_string(), "struct");
    }
}
