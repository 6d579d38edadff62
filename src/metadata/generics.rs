//! Generic parameters and their constraints.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::metadata::{
    customattributes::CustomAttribute,
    ids::{MethodId, TypeId},
    signatures::TypeSig,
};

bitflags! {
    /// Generic parameter variance and special constraint flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct GenericParamFlags: u16 {
        /// The generic parameter is covariant
        const COVARIANT = 0x0001;
        /// The generic parameter is contravariant
        const CONTRAVARIANT = 0x0002;
        /// The generic parameter has the class special constraint
        const REFERENCE_TYPE_CONSTRAINT = 0x0004;
        /// The generic parameter has the valuetype special constraint
        const NOT_NULLABLE_VALUE_TYPE_CONSTRAINT = 0x0008;
        /// The generic parameter has the .ctor special constraint
        const DEFAULT_CONSTRUCTOR_CONSTRAINT = 0x0010;
    }
}

/// The entity declaring a generic parameter list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericParamOwner {
    /// A generic type
    Type(TypeId),
    /// A generic method
    Method(MethodId),
}

/// A constraint on a generic parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericParamConstraint {
    /// The constraint type
    pub constraint: TypeSig,
    /// Attributes applied to the constraint
    pub custom_attributes: Vec<CustomAttribute>,
}

/// A generic parameter of a type or method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericParam {
    /// Parameter name
    pub name: String,
    /// Zero-based ordinal
    pub number: u16,
    /// Variance and special constraints
    pub flags: GenericParamFlags,
    /// Type constraints
    pub constraints: Vec<GenericParamConstraint>,
    /// Attributes applied to the parameter
    pub custom_attributes: Vec<CustomAttribute>,
}

impl GenericParam {
    /// Creates an unconstrained parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, number: u16) -> Self {
        GenericParam {
            name: name.into(),
            number,
            flags: GenericParamFlags::empty(),
            constraints: Vec::new(),
            custom_attributes: Vec::new(),
        }
    }

    /// Adds a type constraint.
    #[must_use]
    pub fn with_constraint(mut self, constraint: TypeSig) -> Self {
        self.constraints.push(GenericParamConstraint {
            constraint,
            custom_attributes: Vec::new(),
        });
        self
    }
}
