//! Member access levels, fields, properties and events.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::metadata::{
    customattributes::CustomAttribute,
    ids::{MethodId, TypeId},
    signatures::TypeSig,
};

/// Bitmask for `ACCESS` extraction from raw field or method attributes
pub const MEMBER_ACCESS_MASK: u32 = 0x0007;

/// Member accessibility, ordered from least to most visible
///
/// The ordering matches the raw `MemberAccessMask` values, so comparisons such as
/// `access >= MemberAccess::Family` follow the metadata semantics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
pub enum MemberAccess {
    /// Member not referenceable
    #[strum(serialize = "compiler-controlled")]
    CompilerControlled = 0,
    /// Accessible only by the parent type
    #[strum(serialize = "private")]
    Private = 1,
    /// Accessible by sub-types only in this assembly
    #[strum(serialize = "private protected")]
    FamAndAssem = 2,
    /// Accessible by anyone in the assembly
    #[strum(serialize = "internal")]
    Assembly = 3,
    /// Accessible only by type and sub-types
    #[strum(serialize = "protected")]
    Family = 4,
    /// Accessible by sub-types anywhere, plus anyone in the assembly
    #[strum(serialize = "protected internal")]
    FamOrAssem = 5,
    /// Accessible by anyone who has visibility to this scope
    #[strum(serialize = "public")]
    Public = 6,
}

impl MemberAccess {
    /// Extract access from raw field or method attributes
    #[must_use]
    pub fn from_member_attributes(flags: u32) -> Self {
        match flags & MEMBER_ACCESS_MASK {
            1 => MemberAccess::Private,
            2 => MemberAccess::FamAndAssem,
            3 => MemberAccess::Assembly,
            4 => MemberAccess::Family,
            5 => MemberAccess::FamOrAssem,
            6 => MemberAccess::Public,
            _ => MemberAccess::CompilerControlled,
        }
    }
}

bitflags! {
    /// Field attribute flags, without the access bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FieldFlags: u32 {
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Field can only be initialized, not written to after init
        const INIT_ONLY = 0x0020;
        /// Value is compile time constant
        const LITERAL = 0x0040;
        /// Field does not have to be serialized when type is remoted
        const NOT_SERIALIZED = 0x0080;
        /// Field is special
        const SPECIAL_NAME = 0x0200;
        /// Runtime should check name encoding
        const RT_SPECIAL_NAME = 0x0400;
        /// Field has marshalling information
        const HAS_FIELD_MARSHAL = 0x1000;
        /// Field has default
        const HAS_DEFAULT = 0x8000;
        /// Field has RVA
        const HAS_FIELD_RVA = 0x0100;
    }
}

/// A field defined on a type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Accessibility
    pub access: MemberAccess,
    /// Attribute flags
    pub flags: FieldFlags,
    /// Field type
    pub field_type: TypeSig,
    /// Owning type
    pub declaring_type: TypeId,
    /// Attributes applied to the field
    pub custom_attributes: Vec<CustomAttribute>,
    /// Tombstone set once the field has been detached from its owner
    #[serde(default)]
    pub removed: bool,
}

impl FieldDef {
    /// True for static fields.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(FieldFlags::STATIC)
    }
}

/// A property and its accessor methods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    /// Property name
    pub name: String,
    /// Property type
    pub property_type: TypeSig,
    /// Getter method
    pub getter: Option<MethodId>,
    /// Setter method
    pub setter: Option<MethodId>,
    /// Other accessors
    pub others: Vec<MethodId>,
    /// Owning type
    pub declaring_type: TypeId,
    /// Attributes applied to the property
    pub custom_attributes: Vec<CustomAttribute>,
    /// Tombstone set once the property has been detached from its owner
    #[serde(default)]
    pub removed: bool,
}

impl PropertyDef {
    /// True once every accessor is gone.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.getter.is_none() && self.setter.is_none() && self.others.is_empty()
    }

    /// Drops every accessor for which `is_live` returns false.
    ///
    /// Returns the number of accessor references cleared.
    pub fn retain_accessors(&mut self, mut is_live: impl FnMut(MethodId) -> bool) -> usize {
        let mut cleared = 0;
        for slot in [&mut self.getter, &mut self.setter] {
            if slot.is_some_and(|id| !is_live(id)) {
                *slot = None;
                cleared += 1;
            }
        }
        let before = self.others.len();
        self.others.retain(|id| is_live(*id));
        cleared + (before - self.others.len())
    }
}

/// An event and its accessor methods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    /// Event name
    pub name: String,
    /// Event handler type
    pub event_type: TypeSig,
    /// Add accessor
    pub add: Option<MethodId>,
    /// Remove accessor
    pub remove: Option<MethodId>,
    /// Raise accessor
    pub raise: Option<MethodId>,
    /// Other accessors
    pub others: Vec<MethodId>,
    /// Owning type
    pub declaring_type: TypeId,
    /// Attributes applied to the event
    pub custom_attributes: Vec<CustomAttribute>,
    /// Tombstone set once the event has been detached from its owner
    #[serde(default)]
    pub removed: bool,
}

impl EventDef {
    /// True once every accessor is gone.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_none() && self.remove.is_none() && self.raise.is_none() && self.others.is_empty()
    }

    /// Drops every accessor for which `is_live` returns false.
    ///
    /// Returns the number of accessor references cleared.
    pub fn retain_accessors(&mut self, mut is_live: impl FnMut(MethodId) -> bool) -> usize {
        let mut cleared = 0;
        for slot in [&mut self.add, &mut self.remove, &mut self.raise] {
            if slot.is_some_and(|id| !is_live(id)) {
                *slot = None;
                cleared += 1;
            }
        }
        let before = self.others.len();
        self.others.retain(|id| is_live(*id));
        cleared + (before - self.others.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_ordering() {
        assert!(MemberAccess::Public > MemberAccess::FamOrAssem);
        assert!(MemberAccess::Family > MemberAccess::Assembly);
        assert!(MemberAccess::FamAndAssem > MemberAccess::Private);
        assert_eq!(MemberAccess::from_member_attributes(0x0086), MemberAccess::Public);
    }

    #[test]
    fn test_property_accessor_retention() {
        let mut prop = PropertyDef {
            name: "Value".into(),
            property_type: TypeSig::I4,
            getter: Some(MethodId::new(1)),
            setter: Some(MethodId::new(2)),
            others: vec![MethodId::new(3)],
            declaring_type: TypeId::new(0),
            custom_attributes: Vec::new(),
            removed: false,
        };

        let cleared = prop.retain_accessors(|id| id == MethodId::new(1));
        assert_eq!(cleared, 2);
        assert!(!prop.is_empty());

        prop.retain_accessors(|_| false);
        assert!(prop.is_empty());
    }

    #[test]
    fn test_event_empty() {
        let event = EventDef {
            name: "Changed".into(),
            event_type: TypeSig::external("System.Runtime", "System", "EventHandler"),
            add: None,
            remove: None,
            raise: None,
            others: Vec::new(),
            declaring_type: TypeId::new(0),
            custom_attributes: Vec::new(),
            removed: false,
        };
        assert!(event.is_empty());
    }
}
