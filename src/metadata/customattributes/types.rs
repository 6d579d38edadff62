use serde::{Deserialize, Serialize};

use crate::metadata::{
    generics::GenericParamOwner,
    ids::{EventId, FieldId, MethodId, PropertyId, TypeId},
    signatures::{MethodRef, TypeSig},
};

/// Value carried by a custom attribute argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Null string, type or array
    Null,
    /// Boolean value
    Bool(bool),
    /// Character value
    Char(char),
    /// Signed integer value, also used for enum underlying values
    Int(i64),
    /// Unsigned integer value
    UInt(u64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// `typeof(T)` value
    Type(TypeSig),
    /// Array of values, each with its own element type
    Array(Vec<CustomAttributeArgument>),
}

/// A positional argument or the payload of a named argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAttributeArgument {
    /// Declared type of the argument
    pub arg_type: TypeSig,
    /// The value
    pub value: AttributeValue,
}

impl CustomAttributeArgument {
    /// Creates an argument of `arg_type` holding `value`.
    #[must_use]
    pub fn new(arg_type: TypeSig, value: AttributeValue) -> Self {
        CustomAttributeArgument { arg_type, value }
    }
}

/// A named field or property assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAttributeNamedArgument {
    /// `true` for a field, `false` for a property
    pub is_field: bool,
    /// Field or property name
    pub name: String,
    /// Declared type and value
    pub argument: CustomAttributeArgument,
}

/// An attribute instance
///
/// The attribute type is the declaring type of `constructor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAttribute {
    /// Attribute constructor
    pub constructor: MethodRef,
    /// Positional arguments
    pub fixed_args: Vec<CustomAttributeArgument>,
    /// Named arguments
    pub named_args: Vec<CustomAttributeNamedArgument>,
}

impl CustomAttribute {
    /// Creates an attribute instance without arguments.
    #[must_use]
    pub fn new(constructor: MethodRef) -> Self {
        CustomAttribute {
            constructor,
            fixed_args: Vec::new(),
            named_args: Vec::new(),
        }
    }
}

/// Every place an attribute list hangs off the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeOwner {
    /// The assembly manifest
    Assembly,
    /// The module
    Module,
    /// A type
    Type(TypeId),
    /// The interface implementation at an index of a type's list
    InterfaceImpl(TypeId, usize),
    /// A method
    Method(MethodId),
    /// The parameter at an index of a method's list
    Param(MethodId, usize),
    /// The return parameter of a method
    Return(MethodId),
    /// The generic parameter at an index
    GenericParam(GenericParamOwner, usize),
    /// The constraint at an index of a generic parameter
    GenericParamConstraint(GenericParamOwner, usize, usize),
    /// A field
    Field(FieldId),
    /// A property
    Property(PropertyId),
    /// An event
    Event(EventId),
}
