//! Method flags and supporting types.
//!
//! # Key Types
//! - [`MethodModifiers`]: Method attribute flags without the access bits
//! - [`MethodImplFlags`]: Implementation code type, management and options
//! - [`ParamFlags`]: Parameter direction and optionality
//! - [`Param`], [`ReturnParam`], [`ImplMap`], [`MethodOverride`]

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::metadata::{
    customattributes::CustomAttribute,
    signatures::{MethodRef, TypeSig},
};

/// Bitmask for `CODE_TYPE` extraction
pub const METHOD_IMPL_CODE_TYPE_MASK: u16 = 0x0003;
/// Implementation flags that survive body replacement: inlining, synchronization
/// and preserve-sig options
pub const METHOD_IMPL_PRESERVED_MASK: u16 = 0x01f8;

bitflags! {
    /// Method attribute flags, without the access bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct MethodModifiers: u32 {
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method always gets a new slot in the vtable
        const NEW_SLOT = 0x0100;
        /// Method can only be overriden if also accessible
        const STRICT = 0x0200;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// CLI provides 'special' behavior, depending upon the name of the method
        const RT_SPECIAL_NAME = 0x1000;
        /// Implementation is forwarded through PInvoke
        const PINVOKE_IMPL = 0x2000;
        /// Method has security associate with it
        const HAS_SECURITY = 0x4000;
    }
}

bitflags! {
    /// Method implementation flags
    ///
    /// The two low bits form the code type (`IL` is zero, so it has no flag of its own).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct MethodImplFlags: u16 {
        /// Method impl is native
        const NATIVE = 0x0001;
        /// Method impl is OPTIL
        const OPTIL = 0x0002;
        /// Method impl is provided by the runtime
        const RUNTIME = 0x0003;
        /// Method impl is unmanaged, otherwise managed
        const UNMANAGED = 0x0004;
        /// Method cannot be inlined
        const NO_INLINING = 0x0008;
        /// Method is defined; used primarily in merge scenarios
        const FORWARD_REF = 0x0010;
        /// Method is a synchronized method
        const SYNCHRONIZED = 0x0020;
        /// Method will not be optimized when generating native code
        const NO_OPTIMIZATION = 0x0040;
        /// Method signature is exported exactly as declared
        const PRESERVE_SIG = 0x0080;
        /// Method should be inlined if possible
        const AGGRESSIVE_INLINING = 0x0100;
        /// Method may contain hot code and should be aggressively optimized
        const AGGRESSIVE_OPTIMIZATION = 0x0200;
        /// Method is implemented by the runtime itself
        const INTERNAL_CALL = 0x1000;
    }
}

impl MethodImplFlags {
    /// True when the code type bits say IL.
    #[must_use]
    pub fn is_il(self) -> bool {
        self.bits() & METHOD_IMPL_CODE_TYPE_MASK == 0
    }

    /// Reset to managed IL, keeping only the inlining, synchronization and
    /// preserve-sig options.
    #[must_use]
    pub fn as_managed_il(self) -> Self {
        Self::from_bits_truncate(self.bits() & METHOD_IMPL_PRESERVED_MASK)
    }
}

bitflags! {
    /// Parameter attribute flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ParamFlags: u16 {
        /// Parameter is [In]
        const IN = 0x0001;
        /// Parameter is [Out]
        const OUT = 0x0002;
        /// Parameter is optional
        const OPTIONAL = 0x0010;
        /// Parameter has a default value
        const HAS_DEFAULT = 0x1000;
        /// Parameter has marshalling information
        const HAS_FIELD_MARSHAL = 0x2000;
    }
}

/// A method parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub param_type: TypeSig,
    /// Direction and optionality
    pub flags: ParamFlags,
    /// Attributes applied to the parameter
    pub custom_attributes: Vec<CustomAttribute>,
}

impl Param {
    /// Creates a plain parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, param_type: TypeSig) -> Self {
        Param {
            name: name.into(),
            param_type,
            flags: ParamFlags::empty(),
            custom_attributes: Vec::new(),
        }
    }

    /// True for parameters marked out and not marked in.
    #[must_use]
    pub fn is_out_only(&self) -> bool {
        self.flags.contains(ParamFlags::OUT) && !self.flags.contains(ParamFlags::IN)
    }

    /// True if callers may omit the argument.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.flags.contains(ParamFlags::OPTIONAL)
    }
}

/// The return parameter of a method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnParam {
    /// Return type, `Void` for none
    pub return_type: TypeSig,
    /// Attributes applied to the return value
    pub custom_attributes: Vec<CustomAttribute>,
}

impl Default for ReturnParam {
    fn default() -> Self {
        ReturnParam {
            return_type: TypeSig::Void,
            custom_attributes: Vec::new(),
        }
    }
}

/// Native interop binding of a P/Invoke method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplMap {
    /// Native module name
    pub module: String,
    /// Exported entry point name
    pub entry_point: String,
}

/// An explicit method implementation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodOverride {
    /// The interface or base method being implemented
    pub declaration: MethodRef,
}
